use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::routes::counter::CountResponse;

pub const NO_STORE: &str = "no-store, max-age=0";

// 计数器响应一律禁止缓存，跨域头由 CorsLayer 统一添加
fn count_response(status: StatusCode, body: CountResponse) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
    response
}

pub fn success_to_count_response(count: u64) -> Response {
    count_response(StatusCode::OK, CountResponse::ok(count))
}

pub fn error_to_count_response(status: StatusCode, msg: &str) -> Response {
    count_response(status, CountResponse::degraded(msg))
}
