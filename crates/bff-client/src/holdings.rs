//! Holdings service adapter.
//!
//! `GET {holdings_url}/{holdings_path}/{code}` returns a JSON array of the
//! holder's holdings. An empty array is a normal answer. The service has
//! no notion of "unknown holder", so a 404 here is a failure.

use async_trait::async_trait;
use bff_core::model::HoldingRecord;
use url::Url;

use crate::error::ClientError;
use crate::http::{resource_url, DownstreamHttp, NotFound};

/// Capability to list the holdings of a holder code.
#[async_trait]
pub trait HoldingsSource: Send + Sync {
    async fn fetch_holdings(&self, code: &str) -> Result<Vec<HoldingRecord>, ClientError>;
}

/// HTTP implementation of [`HoldingsSource`].
#[derive(Debug, Clone)]
pub struct HttpHoldingsClient {
    http: DownstreamHttp,
    base_url: Url,
    path: String,
}

impl HttpHoldingsClient {
    pub(crate) fn new(http: DownstreamHttp, base_url: Url, path: String) -> Self {
        Self {
            http,
            base_url,
            path,
        }
    }
}

#[async_trait]
impl HoldingsSource for HttpHoldingsClient {
    async fn fetch_holdings(&self, code: &str) -> Result<Vec<HoldingRecord>, ClientError> {
        let url = resource_url(&self.base_url, &self.path, code)?;
        let holdings = self
            .http
            .get_json::<Vec<HoldingRecord>>("holdings", url, NotFound::Failure)
            .await?;
        // NotFound::Failure never yields None.
        Ok(holdings.unwrap_or_default())
    }
}
