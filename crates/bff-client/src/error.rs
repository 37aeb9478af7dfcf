//! Downstream call failures.
//!
//! Two kinds only. Callers above the adapters decide status codes; the
//! adapters just say whether the service was slow or broken.

use thiserror::Error;

/// Failure of a single downstream call.
///
/// A missing holder is not an error (`Ok(None)`), and neither is an empty
/// holdings list (`Ok(vec![])`). Everything else that prevents a usable
/// answer lands here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The connect or full-exchange deadline elapsed.
    #[error("{endpoint} timed out after {elapsed_ms}ms")]
    Timeout { endpoint: String, elapsed_ms: u64 },

    /// Connection refused, non-2xx status, unreadable body, or similar.
    #[error("{endpoint} unavailable: {reason}")]
    Unavailable { endpoint: String, reason: String },
}

impl ClientError {
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Timeout { endpoint, .. } | Self::Unavailable { endpoint, .. } => endpoint,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
