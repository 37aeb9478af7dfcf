//! # API Error Types
//!
//! The single place where failures become HTTP responses. Every handler
//! returns `Result<_, AppError>`; `IntoResponse` matches the variants once.
//!
//! Downstream failures are logged here with full detail and rendered to the
//! caller as a generic message. Error bodies carry the request's tracking id
//! so a caller can quote it when reporting a problem.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bff_client::ClientError;
use bff_core::codec::{DecodeError, EncodeError};
use bff_core::correlation::current_correlation_id;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::orchestration::AggregationError;

/// Message shown for any opaque identifier that fails to decode.
pub const DECODE_FAILED_MESSAGE: &str = "Error al desencriptar código";
/// Message shown when the holder does not exist. The code stays in the logs.
pub const NOT_FOUND_MESSAGE: &str = "Cliente no encontrado";
/// Message shown for every server-side failure.
pub const INTERNAL_MESSAGE: &str = "Error interno";

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Always `"error"`.
    pub status: String,
    /// Human-readable message. Never contains downstream error text.
    pub message: String,
    /// Correlation id of the failed request.
    #[serde(rename = "trackingId", skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
}

impl ErrorBody {
    /// Build an error body tagged with the current request's tracking id.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            tracking_id: current_correlation_id().map(|id| id.as_str().to_string()),
        }
    }
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// The opaque identifier in the path could not be decoded (400).
    #[error("identifier decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// A code could not be turned into an opaque identifier (400).
    #[error("identifier encode failed: {0}")]
    Encode(#[from] EncodeError),

    /// No holder with this code (404).
    #[error("holder not found: {0}")]
    HolderNotFound(String),

    /// A downstream service missed its deadline (500).
    #[error("downstream timeout: {0}")]
    DownstreamTimeout(ClientError),

    /// A downstream service failed (500).
    #[error("downstream unavailable: {0}")]
    DownstreamUnavailable(ClientError),

    /// Missing or invalid bearer token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Decode(_) => (StatusCode::BAD_REQUEST, "DECODE_FAILED"),
            Self::Encode(_) => (StatusCode::BAD_REQUEST, "ENCODE_FAILED"),
            Self::HolderNotFound(_) => (StatusCode::NOT_FOUND, "HOLDER_NOT_FOUND"),
            Self::DownstreamTimeout(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DOWNSTREAM_TIMEOUT"),
            Self::DownstreamUnavailable(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DOWNSTREAM_UNAVAILABLE")
            }
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        }
    }

    /// Caller-facing message.
    fn public_message(&self) -> String {
        match self {
            Self::Decode(_) => DECODE_FAILED_MESSAGE.to_string(),
            Self::Encode(_) => "Error al encriptar código".to_string(),
            Self::HolderNotFound(_) => NOT_FOUND_MESSAGE.to_string(),
            Self::DownstreamTimeout(_) | Self::DownstreamUnavailable(_) => {
                INTERNAL_MESSAGE.to_string()
            }
            Self::Unauthorized(reason) => reason.clone(),
        }
    }
}

impl From<AggregationError> for AppError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::HolderNotFound { code } => Self::HolderNotFound(code),
            AggregationError::Downstream(e) if e.is_timeout() => Self::DownstreamTimeout(e),
            AggregationError::Downstream(e) => Self::DownstreamUnavailable(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Log server-side failures for operator visibility.
        if status.is_server_error() {
            tracing::error!(code, error = %self, "request failed");
        } else {
            tracing::debug!(code, error = %self, "request rejected");
        }

        (status, Json(ErrorBody::new(self.public_message()))).into_response()
    }
}
