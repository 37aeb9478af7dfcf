//! # bff-client -- Typed adapters for the gateway's downstream services
//!
//! Two services sit behind the gateway:
//! - **Holders**: one account holder by unique code ([`holders`]).
//! - **Holdings**: every product a holder owns ([`holdings`]).
//!
//! Each is reached through a narrow async trait ([`HolderSource`],
//! [`HoldingsSource`]) with an HTTP implementation and a scripted fake in
//! [`mock`]. The gateway only ever sees the traits.
//!
//! ## Call Contract
//!
//! - The current correlation id (if any) is sent on every call in the
//!   configured header, on that request only.
//! - Connect and full-exchange deadlines are bounded; exceeding either is
//!   [`ClientError::Timeout`].
//! - Transport failures, non-2xx answers and unreadable bodies are
//!   [`ClientError::Unavailable`] and are never folded into an empty result.
//! - A 404 from the holder service is `Ok(None)`. An empty array from the
//!   holdings service is `Ok(vec![])`.

pub mod config;
pub mod error;
pub mod holders;
pub mod holdings;
pub(crate) mod http;
pub mod mock;

pub use config::{ConfigError, DownstreamConfig};
pub use error::ClientError;
pub use holders::{HolderSource, HttpHolderClient};
pub use holdings::{HoldingsSource, HttpHoldingsClient};

/// Both HTTP adapters, sharing one connection pool.
#[derive(Debug, Clone)]
pub struct DownstreamClients {
    holders: HttpHolderClient,
    holdings: HttpHoldingsClient,
}

impl DownstreamClients {
    /// Build both adapters from configuration.
    pub fn new(config: DownstreamConfig) -> Result<Self, ConfigError> {
        let http = http::DownstreamHttp::new(&config)?;
        Ok(Self {
            holders: HttpHolderClient::new(http.clone(), config.holders_url, config.holders_path),
            holdings: HttpHoldingsClient::new(http, config.holdings_url, config.holdings_path),
        })
    }

    /// Access the holder-service adapter.
    pub fn holders(&self) -> &HttpHolderClient {
        &self.holders
    }

    /// Access the holdings-service adapter.
    pub fn holdings(&self) -> &HttpHoldingsClient {
        &self.holdings
    }

    /// Split into the two adapters, e.g. to put each behind its own `Arc`.
    pub fn into_parts(self) -> (HttpHolderClient, HttpHoldingsClient) {
        (self.holders, self.holdings)
    }
}
