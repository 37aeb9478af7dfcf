//! # Request Tracking
//!
//! Establishes the correlation id for every request on the aggregation
//! surface and keeps it in force until the response is built.
//!
//! The id comes from the `X-Tracking-Id` request header when that header
//! carries a non-blank value, and is generated otherwise. The rest of the
//! request (auth, handler, downstream calls, error rendering) runs inside
//! the correlation scope and the `bff_request` span. The id is echoed in
//! the `X-Tracking-Id` response header on every outcome.

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use bff_core::correlation::{request_span, with_correlation_id};
use bff_core::model::CorrelationId;
use tracing::Instrument;

/// Inbound and echoed correlation header.
pub const TRACKING_HEADER: HeaderName = HeaderName::from_static("x-tracking-id");

/// Run the rest of the request inside a correlation scope.
pub async fn tracking_middleware(mut request: Request, next: Next) -> Response {
    let supplied = request
        .headers()
        .get(&TRACKING_HEADER)
        .and_then(|v| v.to_str().ok());
    let id = CorrelationId::from_header(supplied);
    request.extensions_mut().insert(id.clone());

    let span = request_span(&id);
    let mut response = with_correlation_id(id.clone(), next.run(request))
        .instrument(span)
        .await;

    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        response.headers_mut().insert(TRACKING_HEADER, value);
    }
    response
}
