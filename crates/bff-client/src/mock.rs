//! In-memory stand-ins for the two downstream services.
//!
//! Scripted per holder code, with optional latency. Each fake records the
//! correlation id it observed (after any injected delay, so the value has
//! survived a suspension point) and counts started versus completed calls,
//! which lets callers assert both propagation and cancellation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bff_core::correlation::current_correlation_id;
use bff_core::model::{CorrelationId, HolderRecord, HoldingRecord};
use parking_lot::Mutex;

use crate::error::ClientError;
use crate::holders::HolderSource;
use crate::holdings::HoldingsSource;

/// Call bookkeeping shared by both fakes.
#[derive(Debug, Default)]
struct CallLog {
    started: AtomicUsize,
    completed: AtomicUsize,
    observed: Mutex<Vec<(String, Option<CorrelationId>)>>,
}

impl CallLog {
    async fn around<T>(&self, code: &str, delay: Option<Duration>, answer: T) -> T {
        self.started.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.observed
            .lock()
            .push((code.to_string(), current_correlation_id()));
        self.completed.fetch_add(1, Ordering::SeqCst);
        answer
    }
}

// -- Holders ------------------------------------------------------------------

/// Scripted [`HolderSource`]. Unknown codes answer `Ok(None)`.
#[derive(Debug, Default)]
pub struct MockHolderSource {
    responses: HashMap<String, Result<Option<HolderRecord>, ClientError>>,
    delay: Option<Duration>,
    log: CallLog,
}

impl MockHolderSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `holder` for its own code.
    pub fn with_holder(mut self, holder: HolderRecord) -> Self {
        self.responses.insert(holder.code.clone(), Ok(Some(holder)));
        self
    }

    /// Fail lookups of `code` with `err`.
    pub fn with_error(mut self, code: &str, err: ClientError) -> Self {
        self.responses.insert(code.to_string(), Err(err));
        self
    }

    /// Sleep this long before answering every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn started_calls(&self) -> usize {
        self.log.started.load(Ordering::SeqCst)
    }

    pub fn completed_calls(&self) -> usize {
        self.log.completed.load(Ordering::SeqCst)
    }

    /// `(code, correlation id)` for every completed call, in completion order.
    pub fn observed(&self) -> Vec<(String, Option<CorrelationId>)> {
        self.log.observed.lock().clone()
    }
}

#[async_trait]
impl HolderSource for MockHolderSource {
    async fn fetch_holder(&self, code: &str) -> Result<Option<HolderRecord>, ClientError> {
        let answer = self.responses.get(code).cloned().unwrap_or(Ok(None));
        self.log.around(code, self.delay, answer).await
    }
}

// -- Holdings -----------------------------------------------------------------

/// Scripted [`HoldingsSource`]. Unknown codes answer `Ok(vec![])`.
#[derive(Debug, Default)]
pub struct MockHoldingsSource {
    responses: HashMap<String, Result<Vec<HoldingRecord>, ClientError>>,
    delay: Option<Duration>,
    log: CallLog,
}

impl MockHoldingsSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holdings(mut self, code: &str, holdings: Vec<HoldingRecord>) -> Self {
        self.responses.insert(code.to_string(), Ok(holdings));
        self
    }

    pub fn with_error(mut self, code: &str, err: ClientError) -> Self {
        self.responses.insert(code.to_string(), Err(err));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn started_calls(&self) -> usize {
        self.log.started.load(Ordering::SeqCst)
    }

    pub fn completed_calls(&self) -> usize {
        self.log.completed.load(Ordering::SeqCst)
    }

    pub fn observed(&self) -> Vec<(String, Option<CorrelationId>)> {
        self.log.observed.lock().clone()
    }
}

#[async_trait]
impl HoldingsSource for MockHoldingsSource {
    async fn fetch_holdings(&self, code: &str) -> Result<Vec<HoldingRecord>, ClientError> {
        let answer = self.responses.get(code).cloned().unwrap_or(Ok(Vec::new()));
        self.log.around(code, self.delay, answer).await
    }
}
