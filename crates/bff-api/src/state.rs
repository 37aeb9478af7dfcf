//! # Application State
//!
//! Everything a handler needs, shared read-only across requests: the
//! identifier codec, the aggregator over both downstream adapters, and the
//! gateway's own configuration. Nothing here is mutated after startup, so
//! requests take no locks.

use std::sync::Arc;

use bff_client::{HolderSource, HoldingsSource};
use bff_core::codec::{IdentifierCodec, KeyError};
use zeroize::Zeroizing;

use crate::orchestration::Aggregator;

/// Application configuration.
///
/// Custom `Debug` redacts the `auth_token` to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token required on the aggregation routes.
    /// If `None`, authentication is disabled.
    pub auth_token: Option<Zeroizing<String>>,
    /// Mount `GET /api/clientes/encode/{code}`. Development aid; off by default.
    pub expose_encoder: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("expose_encoder", &self.expose_encoder)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            expose_encoder: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PORT` (default: 8080)
    /// - `AUTH_TOKEN` (optional)
    /// - `BFF_EXPOSE_ENCODER` (`true`/`false`, default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".into(), raw))?,
            Err(_) => 8080,
        };
        let expose_encoder = match std::env::var("BFF_EXPOSE_ENCODER") {
            Ok(raw) => parse_flag(&raw)
                .ok_or_else(|| ConfigError::InvalidValue("BFF_EXPOSE_ENCODER".into(), raw))?,
            Err(_) => false,
        };
        Ok(Self {
            port,
            auth_token: std::env::var("AUTH_TOKEN")
                .ok()
                .filter(|t| !t.is_empty())
                .map(Zeroizing::new),
            expose_encoder,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Load the identifier codec from `BFF_ENCRYPTION_KEY` (base64, 32 bytes).
pub fn codec_from_env() -> Result<IdentifierCodec, ConfigError> {
    let raw = Zeroizing::new(
        std::env::var("BFF_ENCRYPTION_KEY").map_err(|_| ConfigError::MissingEncryptionKey)?,
    );
    IdentifierCodec::from_base64_key(&raw).map_err(ConfigError::InvalidEncryptionKey)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BFF_ENCRYPTION_KEY environment variable is required")]
    MissingEncryptionKey,
    #[error("invalid BFF_ENCRYPTION_KEY: {0}")]
    InvalidEncryptionKey(KeyError),
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(String, String),
}

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub codec: Arc<IdentifierCodec>,
    pub aggregator: Aggregator,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        codec: IdentifierCodec,
        holders: Arc<dyn HolderSource>,
        holdings: Arc<dyn HoldingsSource>,
    ) -> Self {
        Self {
            config,
            codec: Arc::new(codec),
            aggregator: Aggregator::new(holders, holdings),
        }
    }
}
