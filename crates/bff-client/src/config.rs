//! Downstream service configuration.
//!
//! Base URLs, resource paths, timeouts, and the outbound correlation header
//! for the holder and holdings services. Defaults point at local ports.
//! Override via environment variables or explicit construction for tests.

use std::time::Duration;

use url::Url;
use zeroize::Zeroizing;

/// Default connect timeout for both services.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default bound on a whole request/response exchange.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);
/// Default header used to forward the correlation id downstream.
pub const DEFAULT_CORRELATION_HEADER: &str = "X-Tracking-Id";

/// Configuration for both downstream adapters.
///
/// Custom `Debug` implementation redacts the `service_token` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct DownstreamConfig {
    /// Base URL of the holder service.
    pub holders_url: Url,
    /// Base URL of the holdings service.
    pub holdings_url: Url,
    /// Resource path under `holders_url`; the holder code is appended.
    pub holders_path: String,
    /// Resource path under `holdings_url`; the holder code is appended.
    pub holdings_path: String,
    pub connect_timeout: Duration,
    /// Bound on the full exchange, body read included.
    pub read_timeout: Duration,
    /// Header name carrying the correlation id on outbound calls. Checked
    /// when the HTTP client is built.
    pub correlation_header: String,
    /// Bearer token presented to both services, if they require one.
    pub service_token: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for DownstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownstreamConfig")
            .field("holders_url", &self.holders_url)
            .field("holdings_url", &self.holdings_url)
            .field("holders_path", &self.holders_path)
            .field("holdings_path", &self.holdings_path)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("correlation_header", &self.correlation_header)
            .field("service_token", &self.service_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl DownstreamConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `BFF_HOLDERS_URL` (default: `http://127.0.0.1:8081`)
    /// - `BFF_HOLDINGS_URL` (default: `http://127.0.0.1:8082`)
    /// - `BFF_HOLDERS_PATH` (default: `holders`)
    /// - `BFF_HOLDINGS_PATH` (default: `holdings/holder`)
    /// - `BFF_CONNECT_TIMEOUT_MS` (default: 10000)
    /// - `BFF_READ_TIMEOUT_MS` (default: 30000)
    /// - `BFF_TRACKING_HEADER` (default: `X-Tracking-Id`)
    /// - `BFF_SERVICE_TOKEN` (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            holders_url: env_url("BFF_HOLDERS_URL", "http://127.0.0.1:8081")?,
            holdings_url: env_url("BFF_HOLDINGS_URL", "http://127.0.0.1:8082")?,
            holders_path: std::env::var("BFF_HOLDERS_PATH").unwrap_or_else(|_| "holders".into()),
            holdings_path: std::env::var("BFF_HOLDINGS_PATH")
                .unwrap_or_else(|_| "holdings/holder".into()),
            connect_timeout: env_millis("BFF_CONNECT_TIMEOUT_MS", DEFAULT_CONNECT_TIMEOUT)?,
            read_timeout: env_millis("BFF_READ_TIMEOUT_MS", DEFAULT_READ_TIMEOUT)?,
            correlation_header: std::env::var("BFF_TRACKING_HEADER")
                .unwrap_or_else(|_| DEFAULT_CORRELATION_HEADER.to_string()),
            service_token: std::env::var("BFF_SERVICE_TOKEN")
                .ok()
                .filter(|t| !t.is_empty())
                .map(Zeroizing::new),
        })
    }

    /// Create a configuration pointing to local mock servers (for testing).
    ///
    /// The holder service is expected on `base_port`, holdings on `base_port + 1`.
    pub fn local_mock(base_port: u16) -> Result<Self, ConfigError> {
        let make_url = |port: u16| -> Result<Url, ConfigError> {
            Url::parse(&format!("http://127.0.0.1:{port}"))
                .map_err(|e| ConfigError::InvalidUrl("localhost".to_string(), e.to_string()))
        };
        Ok(Self::with_urls(make_url(base_port)?, make_url(base_port + 1)?))
    }

    /// Defaults for everything except the two base URLs.
    pub fn with_urls(holders_url: Url, holdings_url: Url) -> Self {
        Self {
            holders_url,
            holdings_url,
            holders_path: "holders".into(),
            holdings_path: "holdings/holder".into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            correlation_header: DEFAULT_CORRELATION_HEADER.into(),
            service_token: None,
        }
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    let url = Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(var.to_string(), "not a base URL".into()));
    }
    Ok(url)
}

fn env_millis(var: &str, default: Duration) -> Result<Duration, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .ok_or_else(|| ConfigError::InvalidValue(var.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(String, String),
    #[error("failed to build HTTP client: {0}")]
    ClientInit(String),
}
