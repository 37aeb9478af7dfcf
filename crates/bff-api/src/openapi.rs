//! # OpenAPI Document Assembly
//!
//! Assembles the utoipa-documented routes into a single OpenAPI 3.1 document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

/// Assembled OpenAPI spec for the gateway.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "BFF Gateway — Holder Aggregation",
        version = "0.1.0",
        description = "Joins account-holder and holdings data behind opaque identifiers, with per-request tracking ids.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        crate::routes::clientes::get_cliente,
        crate::routes::clientes::encode_code,
    ),
    components(schemas(
        bff_core::model::AggregatedResult,
        bff_core::model::HolderRecord,
        bff_core::model::HoldingRecord,
        crate::routes::clientes::EncodedToken,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "clientes", description = "Holder aggregation"),
    )
)]
pub struct ApiDoc;

/// Router serving the OpenAPI document.
pub fn router() -> Router {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
