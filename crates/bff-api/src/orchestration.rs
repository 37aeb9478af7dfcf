//! # Holder Aggregation
//!
//! Fans one holder code out to both downstream services at once and joins
//! the answers into an [`AggregatedResult`].
//!
//! ## Join Policy
//!
//! Both calls always run to completion (or cancellation) before a decision
//! is made. No partial result is ever returned.
//!
//! | Holder          | Holdings   | Outcome                          |
//! |-----------------|------------|----------------------------------|
//! | absent          | any        | `HolderNotFound`                 |
//! | failed          | any        | the holder failure               |
//! | found           | failed     | the holdings failure             |
//! | found           | list (≥ 0) | success, `count = len(holdings)` |
//!
//! Both futures are polled by `tokio::join!` inside the caller's task, so
//! each branch sees the caller's correlation scope, and dropping the
//! aggregate future drops both in-flight calls.

use std::fmt;
use std::sync::Arc;

use bff_client::{ClientError, HolderSource, HoldingsSource};
use bff_core::correlation::current_correlation_id;
use bff_core::model::{AggregatedResult, CorrelationId};
use thiserror::Error;

/// Why an aggregation produced no result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregationError {
    /// The holder service positively reported no such holder.
    #[error("holder not found: {code}")]
    HolderNotFound { code: String },

    /// One of the downstream calls failed.
    #[error(transparent)]
    Downstream(#[from] ClientError),
}

/// Concurrent holder + holdings lookup.
#[derive(Clone)]
pub struct Aggregator {
    holders: Arc<dyn HolderSource>,
    holdings: Arc<dyn HoldingsSource>,
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator").finish_non_exhaustive()
    }
}

impl Aggregator {
    pub fn new(holders: Arc<dyn HolderSource>, holdings: Arc<dyn HoldingsSource>) -> Self {
        Self { holders, holdings }
    }

    /// Fetch a holder and their holdings concurrently and join the results.
    ///
    /// The result carries the current correlation id, or a freshly
    /// generated one when called outside any request scope.
    pub async fn aggregate(&self, code: &str) -> Result<AggregatedResult, AggregationError> {
        let (holder, holdings) = tokio::join!(
            self.holders.fetch_holder(code),
            self.holdings.fetch_holdings(code),
        );

        let holder = match holder {
            Ok(Some(holder)) => holder,
            Ok(None) => {
                tracing::info!(code, "holder not found");
                return Err(AggregationError::HolderNotFound {
                    code: code.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };
        let holdings = holdings?;

        let correlation_id = current_correlation_id().unwrap_or_else(CorrelationId::generate);
        Ok(AggregatedResult::new(correlation_id, holder, holdings))
    }
}
