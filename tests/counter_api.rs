use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use kaizen_backend::{
    AppState,
    config::Config,
    router::create_router,
    routes::counter::CountResponse,
    store::{CounterStore, MemoryCounterStore},
};
use tower::ServiceExt;

fn app_with(store: Option<Arc<MemoryCounterStore>>) -> Router {
    let store = store.map(|s| s as Arc<dyn CounterStore>);
    create_router(AppState::new(Config::from_lookup(|_| None), store))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

fn request(method: Method) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri("/api/count")
        .body(Body::empty())
        .unwrap()
}

fn parse(body: &[u8]) -> CountResponse {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn get_returns_current_count_without_caching() {
    let store = Arc::new(MemoryCounterStore::with_value(Some(41)));
    let (status, headers, body) = send(app_with(Some(store)), request(Method::GET)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), CountResponse::ok(41));
    assert_eq!(headers[header::CACHE_CONTROL], "no-store, max-age=0");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn get_on_absent_counter_reads_zero() {
    let store = Arc::new(MemoryCounterStore::new());
    let (status, _, body) = send(app_with(Some(store)), request(Method::GET)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        serde_json::from_slice::<serde_json::Value>(&body).unwrap(),
        serde_json::json!({ "count": 0 })
    );
}

#[tokio::test]
async fn unconfigured_store_answers_503() {
    let (status, headers, body) = send(app_with(None), request(Method::GET)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        serde_json::from_slice::<serde_json::Value>(&body).unwrap(),
        serde_json::json!({ "count": 0, "error": "Firebase not configured" })
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let (status, _, body) = send(app_with(None), request(Method::POST)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(parse(&body), CountResponse::degraded("Firebase not configured"));
}

#[tokio::test]
async fn failing_store_answers_500() {
    let store = Arc::new(MemoryCounterStore::with_value(Some(41)));
    store.set_unreachable(true);
    let (status, headers, body) = send(app_with(Some(store)), request(Method::GET)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        serde_json::from_slice::<serde_json::Value>(&body).unwrap(),
        serde_json::json!({ "count": 0, "error": "Failed to fetch counter" })
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn post_increments_and_returns_new_value() {
    let store = Arc::new(MemoryCounterStore::with_value(Some(41)));
    let app = app_with(Some(store.clone()));

    let (status, headers, body) = send(app.clone(), request(Method::POST)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), CountResponse::ok(42));
    assert_eq!(headers[header::CACHE_CONTROL], "no-store, max-age=0");

    let (_, _, body) = send(app, request(Method::GET)).await;
    assert_eq!(parse(&body), CountResponse::ok(42));
}

#[tokio::test]
async fn failed_increment_reports_generic_error() {
    let store = Arc::new(MemoryCounterStore::new());
    store.set_unreachable(true);
    let (status, _, body) = send(app_with(Some(store)), request(Method::POST)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(parse(&body), CountResponse::degraded("Failed to increment counter"));
}

#[tokio::test]
async fn concurrent_posts_lose_no_updates() {
    let store = Arc::new(MemoryCounterStore::new());
    let app = app_with(Some(store.clone()));

    let requests: Vec<_> = (0..32)
        .map(|_| tokio::spawn(send(app.clone(), request(Method::POST))))
        .collect();
    for handle in requests {
        let (status, _, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(store.read().await.unwrap(), 32);
}

#[tokio::test]
async fn options_declares_capabilities_without_side_effects() {
    let store = Arc::new(MemoryCounterStore::with_value(Some(7)));
    let (status, headers, body) =
        send(app_with(Some(store.clone())), request(Method::OPTIONS)).await;

    assert!(status.is_success());
    assert!(body.is_empty());
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
    assert!(methods.contains("GET") && methods.contains("POST"));
    let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS].to_str().unwrap();
    assert!(allowed.eq_ignore_ascii_case("content-type"));
    assert_eq!(store.read().await.unwrap(), 7);
}

#[tokio::test]
async fn browser_preflight_is_answered_for_any_origin() {
    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/count")
        .header(header::ORIGIN, "https://dashboard.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(app_with(None), preflight).await;

    assert!(status.is_success());
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
    assert!(methods.contains("POST"));
}

#[tokio::test]
async fn base_uri_comes_from_config() {
    let config = Config::from_lookup(|key| (key == "API_BASE_URI").then(|| "/v1".to_string()));
    let store: Arc<dyn CounterStore> = Arc::new(MemoryCounterStore::with_value(Some(3)));
    let app = create_router(AppState::new(config, Some(store)));

    let req = Request::builder()
        .uri("/v1/count")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), CountResponse::ok(3));
}
