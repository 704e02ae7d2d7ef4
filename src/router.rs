use axum::{
    Router,
    http::{Method, header},
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};

use crate::{AppState, middleware::log_errors, routes};

// 计数器相关的路由
pub fn counter_routes() -> Router<AppState> {
    Router::new().route(
        "/count",
        get(routes::counter::get_count).post(routes::counter::increment_count),
    )
}

// 任意来源均可调用；OPTIONS 预检/能力探测由 CorsLayer 直接应答，不进入 handler
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// 创建主路由
pub fn create_router(state: AppState) -> Router {
    let base_uri = state.config.api_base_uri.clone();

    Router::new()
        .nest(&base_uri, counter_routes())
        .layer(axum::middleware::from_fn(log_errors))
        .layer(cors_layer())
        .with_state(state)
}
