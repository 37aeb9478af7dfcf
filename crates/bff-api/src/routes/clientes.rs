//! # Holder Aggregation Routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/api/clientes/{token}` | [`get_cliente`] |
//! | GET | `/api/clientes/encode/{code}` | [`encode_code`] (only when enabled) |

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use bff_core::codec::DecodeError;
use bff_core::model::AggregatedResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

/// Opaque identifier issued by the encoder route.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EncodedToken {
    pub token: String,
}

/// Aggregation routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/clientes/{token}", get(get_cliente))
}

/// Development encoder route. Mounted only when `expose_encoder` is set.
pub fn encoder_router() -> Router<AppState> {
    Router::new().route("/api/clientes/encode/{code}", get(encode_code))
}

/// GET /api/clientes/{token}: Holder with all their holdings.
#[utoipa::path(
    get,
    path = "/api/clientes/{token}",
    params(
        ("token" = String, Path, description = "Opaque holder identifier"),
        ("X-Tracking-Id" = Option<String>, Header, description = "Correlation id; generated when absent"),
    ),
    responses(
        (status = 200, description = "Holder and holdings", body = AggregatedResult),
        (status = 400, description = "Identifier could not be decoded", body = crate::error::ErrorBody),
        (status = 404, description = "Holder not found", body = crate::error::ErrorBody),
        (status = 500, description = "Downstream failure", body = crate::error::ErrorBody),
    ),
    tag = "clientes"
)]
pub async fn get_cliente(
    State(state): State<AppState>,
    token: Result<Path<String>, PathRejection>,
) -> Result<Json<AggregatedResult>, AppError> {
    // A token whose percent-decoding is not UTF-8 is just another bad token.
    let Path(token) = token.map_err(|rejection| {
        tracing::warn!(error = %rejection, "opaque identifier rejected");
        AppError::Decode(DecodeError::Malformed("invalid path encoding"))
    })?;
    let code = state.codec.decode(&token).map_err(|e| {
        tracing::warn!(error = %e, "opaque identifier rejected");
        AppError::from(e)
    })?;

    let result = state.aggregator.aggregate(&code).await?;
    tracing::info!(code = %code, holdings = result.count(), "aggregation completed");
    Ok(Json(result))
}

/// GET /api/clientes/encode/{code}: Issue the opaque identifier for a code.
#[utoipa::path(
    get,
    path = "/api/clientes/encode/{code}",
    params(("code" = String, Path, description = "Plaintext holder code")),
    responses(
        (status = 200, description = "Opaque identifier", body = EncodedToken),
        (status = 400, description = "Code could not be encoded", body = crate::error::ErrorBody),
    ),
    tag = "clientes"
)]
pub async fn encode_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<EncodedToken>, AppError> {
    let token = state.codec.encode(&code)?;
    Ok(Json(EncodedToken { token }))
}
