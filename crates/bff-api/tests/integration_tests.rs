//! # Integration Tests for bff-api
//!
//! Drives the assembled router end to end: the aggregation scenarios over
//! scripted downstream fakes, tracking-id propagation and isolation across
//! concurrent requests, cancellation, the bearer gate, the encoder route,
//! and a wiremock-backed run through the real HTTP adapters.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use bff_api::state::{AppConfig, AppState};
use bff_client::mock::{MockHolderSource, MockHoldingsSource};
use bff_client::{ClientError, DownstreamClients, DownstreamConfig};
use bff_core::codec::IdentifierCodec;
use bff_core::model::{CorrelationId, HolderRecord, HoldingRecord};
use http_body_util::BodyExt;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: [u8; 32] = [0x5a; 32];

fn codec() -> IdentifierCodec {
    IdentifierCodec::new(&KEY).unwrap()
}

fn token_for(code: &str) -> String {
    codec().encode(code).unwrap()
}

fn holder(code: &str) -> HolderRecord {
    HolderRecord {
        id: Some(1),
        code: code.into(),
        given_names: Some("Juan".into()),
        surnames: Some("Pérez".into()),
        document_type: Some("CC".into()),
        document_number: Some("12345678".into()),
        status: Some("ACTIVO".into()),
    }
}

fn savings(code: &str) -> HoldingRecord {
    HoldingRecord {
        id: Some(1),
        holder_code: Some(code.into()),
        product_type: Some("Cuenta Ahorros".into()),
        name: Some("Ahorros Plus".into()),
        balance: Some(5000.into()),
        status: Some("ACTIVO".into()),
    }
}

/// Helper: build the test app over shared fakes with the given config.
fn test_app_with(
    config: AppConfig,
    holders: Arc<MockHolderSource>,
    holdings: Arc<MockHoldingsSource>,
) -> axum::Router {
    let state = AppState::new(config, codec(), holders, holdings);
    bff_api::app(state)
}

/// Helper: build the test app with auth disabled.
fn test_app(holders: Arc<MockHolderSource>, holdings: Arc<MockHoldingsSource>) -> axum::Router {
    test_app_with(AppConfig::default(), holders, holdings)
}

/// Helper: the usual CLI001 fixture with one savings account.
fn cli001_fakes() -> (Arc<MockHolderSource>, Arc<MockHoldingsSource>) {
    (
        Arc::new(MockHolderSource::new().with_holder(holder("CLI001"))),
        Arc::new(MockHoldingsSource::new().with_holdings("CLI001", vec![savings("CLI001")])),
    )
}

fn get(uri: &str, tracking: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = tracking {
        builder = builder.header("X-Tracking-Id", value);
    }
    builder.body(Body::empty()).unwrap()
}

/// Helper: read response body as string.
async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Helper: status, echoed tracking header, and JSON body.
async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, String, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let tracking = response
        .headers()
        .get("x-tracking-id")
        .expect("tracking header echoed")
        .to_str()
        .unwrap()
        .to_string();
    let body = serde_json::from_str(&body_string(response).await).unwrap();
    (status, tracking, body)
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let (holders, holdings) = cli001_fakes();
    let response = test_app(holders, holdings)
        .oneshot(get("/health/liveness", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let (holders, holdings) = cli001_fakes();
    let response = test_app(holders, holdings)
        .oneshot(get("/health/readiness", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Aggregation --------------------------------------------------------------

#[tokio::test]
async fn test_holder_with_one_holding() {
    let (holders, holdings) = cli001_fakes();
    let app = test_app(holders.clone(), holdings.clone());

    let uri = format!("/api/clientes/{}", token_for("CLI001"));
    let (status, tracking, body) = send(app, get(&uri, Some("test-tracking"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(tracking, "test-tracking");
    assert_eq!(body["trackingId"], "test-tracking");
    assert_eq!(body["cliente"]["codigoUnico"], "CLI001");
    assert_eq!(body["cliente"]["nombres"], "Juan");
    assert_eq!(body["productos"].as_array().unwrap().len(), 1);
    assert_eq!(body["productos"][0]["nombre"], "Ahorros Plus");
    assert_eq!(body["productos"][0]["saldo"].as_f64(), Some(5000.0));
    assert_eq!(body["cantidadProductos"], 1);

    let expected = vec![("CLI001".to_string(), Some(CorrelationId::new("test-tracking")))];
    assert_eq!(holders.observed(), expected);
    assert_eq!(holdings.observed(), expected);
}

#[tokio::test]
async fn test_holder_with_no_holdings() {
    let holders = Arc::new(MockHolderSource::new().with_holder(holder("CLI002")));
    let holdings = Arc::new(MockHoldingsSource::new());
    let app = test_app(holders, holdings);

    let uri = format!("/api/clientes/{}", token_for("CLI002"));
    let (status, _, body) = send(app, get(&uri, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["productos"], serde_json::json!([]));
    assert_eq!(body["cantidadProductos"], 0);
}

#[tokio::test]
async fn test_holder_not_found() {
    // Holdings for the code exist, but an absent holder still wins.
    let holders = Arc::new(MockHolderSource::new());
    let holdings =
        Arc::new(MockHoldingsSource::new().with_holdings("CLI999", vec![savings("CLI999")]));
    let app = test_app(holders, holdings);

    let uri = format!("/api/clientes/{}", token_for("CLI999"));
    let (status, tracking, body) = send(app, get(&uri, Some("test-tracking"))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(tracking, "test-tracking");
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Cliente no encontrado");
    assert!(!body.to_string().contains("CLI999"));
    assert_eq!(body["trackingId"], "test-tracking");
    assert!(body.get("cliente").is_none());
}

#[tokio::test]
async fn test_holder_timeout_is_generic_500() {
    let holders = Arc::new(MockHolderSource::new().with_error(
        "CLI001",
        ClientError::Timeout {
            endpoint: "GET /holders/CLI001".into(),
            elapsed_ms: 30_000,
        },
    ));
    let holdings =
        Arc::new(MockHoldingsSource::new().with_holdings("CLI001", vec![savings("CLI001")]));
    let app = test_app(holders, holdings);

    let uri = format!("/api/clientes/{}", token_for("CLI001"));
    let (status, _, body) = send(app, get(&uri, None)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Error interno");
    let raw = body.to_string();
    assert!(!raw.contains("timed out") && !raw.contains("/holders/"), "leaked: {raw}");
}

#[tokio::test]
async fn test_holdings_failure_propagates() {
    let holders = Arc::new(MockHolderSource::new().with_holder(holder("CLI001")));
    let holdings = Arc::new(MockHoldingsSource::new().with_error(
        "CLI001",
        ClientError::Unavailable {
            endpoint: "GET /holdings/holder/CLI001".into(),
            reason: "status 503".into(),
        },
    ));
    let app = test_app(holders, holdings);

    let uri = format!("/api/clientes/{}", token_for("CLI001"));
    let (status, _, body) = send(app, get(&uri, None)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error interno");
    assert!(body.get("productos").is_none());
}

// -- Opaque identifiers -------------------------------------------------------

#[tokio::test]
async fn test_undecodable_identifier_is_400() {
    let (holders, holdings) = cli001_fakes();
    let app = test_app(holders.clone(), holdings.clone());

    let (status, tracking, body) =
        send(app.clone(), get("/api/clientes/not-a-token", Some("bad-id"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(tracking, "bad-id");
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Error al desencriptar código");
    assert_eq!(body["trackingId"], "bad-id");

    // A token minted under another key fails the same way.
    let foreign = IdentifierCodec::new(&[1u8; 32]).unwrap().encode("CLI001").unwrap();
    let (status, _, _) = send(app, get(&format!("/api/clientes/{foreign}"), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(holders.started_calls(), 0);
    assert_eq!(holdings.started_calls(), 0);
}

#[tokio::test]
async fn test_identifier_with_invalid_utf8_escape_is_400() {
    let (holders, holdings) = cli001_fakes();
    let app = test_app(holders.clone(), holdings.clone());

    for uri in ["/api/clientes/%FF", "/api/clientes/%C3%28abc"] {
        let response = app.clone().oneshot(get(uri, Some("bad-utf8"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(
            response.headers()["content-type"],
            "application/json",
            "{uri}"
        );
        assert_eq!(response.headers()["x-tracking-id"], "bad-utf8");

        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Error al desencriptar código");
        assert_eq!(body["trackingId"], "bad-utf8");
    }

    assert_eq!(holders.started_calls(), 0);
    assert_eq!(holdings.started_calls(), 0);
}

#[tokio::test]
async fn test_plaintext_code_is_not_accepted() {
    let (holders, holdings) = cli001_fakes();
    let (status, _, _) = send(test_app(holders, holdings), get("/api/clientes/CLI001", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// -- Tracking ids -------------------------------------------------------------

#[tokio::test]
async fn test_generated_tracking_id_reaches_every_call() {
    let (holders, holdings) = cli001_fakes();
    let app = test_app(holders.clone(), holdings.clone());

    let uri = format!("/api/clientes/{}", token_for("CLI001"));
    let (status, tracking, body) = send(app, get(&uri, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(uuid::Uuid::parse_str(&tracking).is_ok(), "got {tracking}");
    assert_eq!(body["trackingId"], tracking.as_str());

    let expected = Some(CorrelationId::new(tracking.clone()));
    assert_eq!(holders.observed()[0].1, expected);
    assert_eq!(holdings.observed()[0].1, expected);
}

#[tokio::test]
async fn test_blank_tracking_header_is_replaced() {
    let (holders, holdings) = cli001_fakes();
    let uri = format!("/api/clientes/{}", token_for("CLI001"));
    let (_, tracking, body) = send(test_app(holders, holdings), get(&uri, Some("  "))).await;
    assert!(uuid::Uuid::parse_str(&tracking).is_ok(), "got {tracking:?}");
    assert_eq!(body["trackingId"], tracking.as_str());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_keep_their_own_tracking_id() {
    const N: usize = 32;
    let mut holder_fake = MockHolderSource::new().with_delay(Duration::from_millis(15));
    let mut holdings_fake = MockHoldingsSource::new().with_delay(Duration::from_millis(5));
    for i in 0..N {
        let code = format!("CLI{i:03}");
        holder_fake = holder_fake.with_holder(holder(&code));
        holdings_fake = holdings_fake.with_holdings(&code, vec![savings(&code)]);
    }
    let holders = Arc::new(holder_fake);
    let holdings = Arc::new(holdings_fake);
    let app = test_app(holders.clone(), holdings.clone());

    let mut handles = Vec::new();
    for i in 0..N {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let uri = format!("/api/clientes/{}", token_for(&format!("CLI{i:03}")));
            let request = get(&uri, Some(&format!("req-{i}")));
            (i, send(app, request).await)
        }));
    }

    for handle in handles {
        let (i, (status, tracking, body)) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tracking, format!("req-{i}"));
        assert_eq!(body["trackingId"], format!("req-{i}"));
        assert_eq!(body["cliente"]["codigoUnico"], format!("CLI{i:03}"));
    }

    // Every downstream call saw the id of the request that issued it.
    for (code, id) in holders.observed().into_iter().chain(holdings.observed()) {
        let n: usize = code.trim_start_matches("CLI").parse().unwrap();
        assert_eq!(id, Some(CorrelationId::new(format!("req-{n}"))), "{code}");
    }
    assert_eq!(holders.completed_calls(), N);
    assert_eq!(holdings.completed_calls(), N);
}

// -- Cancellation -------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_dropped_request_cancels_both_downstream_calls() {
    let holders = Arc::new(
        MockHolderSource::new()
            .with_holder(holder("CLI001"))
            .with_delay(Duration::from_secs(5)),
    );
    let holdings = Arc::new(MockHoldingsSource::new().with_delay(Duration::from_secs(5)));
    let app = test_app(holders.clone(), holdings.clone());

    let uri = format!("/api/clientes/{}", token_for("CLI001"));
    let outcome =
        tokio::time::timeout(Duration::from_millis(100), app.oneshot(get(&uri, None))).await;
    assert!(outcome.is_err(), "request should still be pending");
    assert_eq!(holders.started_calls(), 1);
    assert_eq!(holdings.started_calls(), 1);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(holders.completed_calls(), 0);
    assert_eq!(holdings.completed_calls(), 0);
}

// -- Authentication -----------------------------------------------------------

#[tokio::test]
async fn test_bearer_gate() {
    let config = AppConfig {
        auth_token: Some(zeroize::Zeroizing::new("s3cret".into())),
        ..AppConfig::default()
    };
    let (holders, holdings) = cli001_fakes();
    let app = test_app_with(config, holders, holdings);
    let uri = format!("/api/clientes/{}", token_for("CLI001"));

    let (status, tracking, body) = send(app.clone(), get(&uri, Some("auth-check"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(tracking, "auth-check");
    assert_eq!(body["status"], "error");
    assert_eq!(body["trackingId"], "auth-check");

    let request = Request::builder()
        .uri(&uri)
        .header("Authorization", "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);

    // Health stays open.
    let response = app.oneshot(get("/health/liveness", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Encoder route ------------------------------------------------------------

#[tokio::test]
async fn test_encoder_route_disabled_by_default() {
    let (holders, holdings) = cli001_fakes();
    let response = test_app(holders, holdings)
        .oneshot(get("/api/clientes/encode/CLI001", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_encoder_route_issues_usable_tokens() {
    let config = AppConfig {
        expose_encoder: true,
        ..AppConfig::default()
    };
    let (holders, holdings) = cli001_fakes();
    let app = test_app_with(config, holders, holdings);

    let (status, _, body) = send(app.clone(), get("/api/clientes/encode/CLI001", None)).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(token, token_for("CLI001"));

    let (status, _, body) = send(app, get(&format!("/api/clientes/{token}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cliente"]["codigoUnico"], "CLI001");
}

// -- OpenAPI ------------------------------------------------------------------

#[tokio::test]
async fn test_openapi_spec() {
    let (holders, holdings) = cli001_fakes();
    let response = test_app(holders, holdings)
        .oneshot(get("/openapi.json", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("/api/clientes/{token}"));
}

// -- Real adapters over HTTP --------------------------------------------------

/// Helper: the app wired to HTTP adapters pointed at one wiremock server.
fn http_app(server: &MockServer, read_timeout: Duration) -> axum::Router {
    let mut config =
        DownstreamConfig::with_urls(server.uri().parse().unwrap(), server.uri().parse().unwrap());
    config.read_timeout = read_timeout;
    let (holders, holdings) = DownstreamClients::new(config).unwrap().into_parts();
    let state = AppState::new(AppConfig::default(), codec(), Arc::new(holders), Arc::new(holdings));
    bff_api::app(state)
}

#[tokio::test]
async fn test_http_generated_tracking_id_sent_downstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/holders/CLI001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 1,
            "codigoUnico": "CLI001",
            "nombres": "Juan",
            "apellidos": "Pérez",
            "estado": "ACTIVO"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/holdings/holder/CLI001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": 1,
            "codigoCliente": "CLI001",
            "tipoProducto": "Cuenta Ahorros",
            "nombre": "Ahorros Plus",
            "saldo": 5000,
            "estado": "ACTIVO"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let app = http_app(&server, Duration::from_secs(5));
    let uri = format!("/api/clientes/{}", token_for("CLI001"));
    let (status, tracking, body) = send(app, get(&uri, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cantidadProductos"], 1);
    assert_eq!(body["trackingId"], tracking.as_str());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        let sent = request.headers.get("x-tracking-id").unwrap().to_str().unwrap();
        assert_eq!(sent, tracking);
    }
}

#[tokio::test]
async fn test_http_holder_timeout_is_generic_500() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/holders/CLI001"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "codigoUnico": "CLI001" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/holdings/holder/CLI001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let app = http_app(&server, Duration::from_millis(100));
    let uri = format!("/api/clientes/{}", token_for("CLI001"));
    let (status, _, body) = send(app, get(&uri, Some("slow-holder"))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Error interno");
    assert_eq!(body["trackingId"], "slow-holder");
}
