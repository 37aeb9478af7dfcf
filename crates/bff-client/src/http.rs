//! Shared GET-and-decode path for both adapters.
//!
//! Every outbound call goes through [`DownstreamHttp::get_json`], which
//! forwards the current correlation id, opens a `downstream_call` span for
//! the lifetime of the call, and folds reqwest failures into [`ClientError`].

use std::time::Instant;

use bff_core::correlation::current_correlation_id;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::Instrument;
use url::Url;

use crate::config::{ConfigError, DownstreamConfig};
use crate::error::ClientError;

/// How a 404 from the service should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NotFound {
    /// 404 means "no such resource" and is a valid answer.
    Absent,
    /// 404 is a service failure like any other non-2xx.
    Failure,
}

/// Pooled HTTP client plus the per-call conventions both adapters share.
#[derive(Debug, Clone)]
pub(crate) struct DownstreamHttp {
    http: reqwest::Client,
    correlation_header: HeaderName,
}

impl DownstreamHttp {
    pub(crate) fn new(config: &DownstreamConfig) -> Result<Self, ConfigError> {
        let correlation_header = HeaderName::from_bytes(config.correlation_header.as_bytes())
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "correlation_header".into(),
                    config.correlation_header.clone(),
                )
            })?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.service_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                .map_err(|_| ConfigError::InvalidValue("service_token".into(), "[REDACTED]".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::ClientInit(e.to_string()))?;

        Ok(Self {
            http,
            correlation_header,
        })
    }

    /// GET `url` and decode the JSON body.
    ///
    /// Returns `Ok(None)` only for a 404 under [`NotFound::Absent`].
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: Url,
        not_found: NotFound,
    ) -> Result<Option<T>, ClientError> {
        let endpoint = format!("GET {}", url.path());
        let span = tracing::info_span!("downstream_call", service, endpoint = %endpoint);

        async move {
            let started = Instant::now();
            let mut request = self.http.get(url);
            if let Some(id) = current_correlation_id() {
                request = request.header(self.correlation_header.clone(), id.as_str());
            }

            let response = request
                .send()
                .await
                .map_err(|e| transport_error(&endpoint, started, e))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND && not_found == NotFound::Absent {
                tracing::debug!(status = status.as_u16(), "resource absent");
                return Ok(None);
            }
            if !status.is_success() {
                tracing::warn!(status = status.as_u16(), "downstream returned error status");
                return Err(ClientError::Unavailable {
                    endpoint,
                    reason: format!("status {}", status.as_u16()),
                });
            }

            let body = response
                .json::<T>()
                .await
                .map_err(|e| transport_error(&endpoint, started, e))?;
            tracing::debug!(
                status = status.as_u16(),
                elapsed_ms = elapsed_ms(started),
                "downstream call completed"
            );
            Ok(Some(body))
        }
        .instrument(span)
        .await
    }
}

/// Append `path` segments and the percent-encoded `code` to `base`.
pub(crate) fn resource_url(base: &Url, path: &str, code: &str) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::Unavailable {
            endpoint: base.to_string(),
            reason: "base URL cannot carry a path".into(),
        })?
        .pop_if_empty()
        .extend(path.split('/').filter(|s| !s.is_empty()))
        .push(code);
    Ok(url)
}

fn transport_error(endpoint: &str, started: Instant, err: reqwest::Error) -> ClientError {
    if timed_out(&err) {
        tracing::warn!(elapsed_ms = elapsed_ms(started), "downstream call timed out");
        ClientError::Timeout {
            endpoint: endpoint.to_string(),
            elapsed_ms: elapsed_ms(started),
        }
    } else {
        let reason = if err.is_decode() {
            format!("malformed response body: {err}")
        } else {
            err.to_string()
        };
        tracing::warn!(reason = %reason, "downstream call failed");
        ClientError::Unavailable {
            endpoint: endpoint.to_string(),
            reason,
        }
    }
}

/// Both deadlines count: the connect timeout and the whole-exchange timeout.
/// An OS-level `TimedOut` anywhere in the source chain is a timeout as well.
fn timed_out(err: &reqwest::Error) -> bool {
    if err.is_timeout() {
        return true;
    }
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::TimedOut)
        {
            return true;
        }
        source = cause.source();
    }
    false
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
