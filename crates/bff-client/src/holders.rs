//! Account-holder service adapter.
//!
//! `GET {holders_url}/{holders_path}/{code}` returns one holder object, or
//! 404 when no holder has that code.

use async_trait::async_trait;
use bff_core::model::HolderRecord;
use url::Url;

use crate::error::ClientError;
use crate::http::{resource_url, DownstreamHttp, NotFound};

/// Capability to look up a holder by code.
///
/// Implementations must be `Send + Sync` so the gateway can share one
/// instance across request tasks behind an `Arc`.
#[async_trait]
pub trait HolderSource: Send + Sync {
    /// `Ok(None)` when the service positively reports no such holder.
    async fn fetch_holder(&self, code: &str) -> Result<Option<HolderRecord>, ClientError>;
}

/// HTTP implementation of [`HolderSource`].
#[derive(Debug, Clone)]
pub struct HttpHolderClient {
    http: DownstreamHttp,
    base_url: Url,
    path: String,
}

impl HttpHolderClient {
    pub(crate) fn new(http: DownstreamHttp, base_url: Url, path: String) -> Self {
        Self {
            http,
            base_url,
            path,
        }
    }
}

#[async_trait]
impl HolderSource for HttpHolderClient {
    async fn fetch_holder(&self, code: &str) -> Result<Option<HolderRecord>, ClientError> {
        let url = resource_url(&self.base_url, &self.path, code)?;
        self.http.get_json("holders", url, NotFound::Absent).await
    }
}
