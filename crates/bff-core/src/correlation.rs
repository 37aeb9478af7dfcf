//! # Correlation Context Carrier
//!
//! Makes the current request's [`CorrelationId`] visible to every piece of
//! async work spawned on its behalf, without threading it through call
//! signatures.
//!
//! The id lives in a tokio task-local that is scoped to a single future
//! (see [`with_correlation_id`]). The association therefore follows the
//! future across `.await` points and worker threads, and ends when the
//! future completes or is dropped. Nothing is stored per thread, so a
//! worker that polls two requests back to back never sees the first id
//! while running the second.
//!
//! Branches joined with `tokio::join!` run inside the same task and see the
//! same id. Work handed to `tokio::spawn` is a new task and sees nothing
//! unless started through [`spawn_with_correlation`].

use std::future::Future;

use tokio::task::futures::TaskLocalFuture;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::model::CorrelationId;

tokio::task_local! {
    static CURRENT: CorrelationId;
}

/// Run `fut` with `id` as the current correlation id.
///
/// Scopes nest: an inner scope shadows the outer one until it completes.
pub fn with_correlation_id<F>(id: CorrelationId, fut: F) -> TaskLocalFuture<CorrelationId, F>
where
    F: Future,
{
    CURRENT.scope(id, fut)
}

/// The correlation id of the enclosing scope, or `None` outside any scope.
pub fn current_correlation_id() -> Option<CorrelationId> {
    CURRENT.try_with(CorrelationId::clone).ok()
}

/// Spawn a detached task that inherits the caller's correlation id and span.
pub fn spawn_with_correlation<F>(fut: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let inherited = current_correlation_id();
    let task = async move {
        match inherited {
            Some(id) => with_correlation_id(id, fut).await,
            None => fut.await,
        }
    };
    tokio::spawn(task.in_current_span())
}

/// Tracing span for one inbound request, tagged with its correlation id.
pub fn request_span(id: &CorrelationId) -> tracing::Span {
    tracing::info_span!("bff_request", tracking_id = %id)
}
