//! # bff-api: Holder Aggregation Gateway
//!
//! Backend-for-frontend in front of two services: one that knows account
//! holders and one that knows their holdings. A caller asks for a holder by
//! opaque identifier and gets back the holder plus every holding in one
//! response, without ever seeing the internal holder code.
//!
//! ## API Surface
//!
//! | Path                           | Module                     | Auth |
//! |--------------------------------|----------------------------|------|
//! | `/api/clientes/{token}`        | [`routes::clientes`]       | yes  |
//! | `/api/clientes/encode/{code}`  | [`routes::clientes`] (opt) | yes  |
//! | `/openapi.json`                | [`openapi`]                | no   |
//! | `/health/liveness`, `/health/readiness` | this module       | no   |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → TrackingMiddleware → AuthMiddleware → Handler
//! ```
//!
//! Tracking runs before auth so a rejected request still gets a tracking id
//! in its body and response header.

pub mod auth;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod orchestration;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes and the OpenAPI document are mounted outside the auth and
/// tracking middleware.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let mut api = Router::new().merge(routes::clientes::router());
    if state.config.expose_encoder {
        api = api.merge(routes::clientes::encoder_router());
    }
    let api = api
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::tracking::tracking_middleware))
        .layer(axum::Extension(auth_config))
        .with_state(state);

    // Unauthenticated health probes.
    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new()
        .merge(health)
        .merge(openapi::router())
        .merge(api)
        .layer(TraceLayer::new_for_http())
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
