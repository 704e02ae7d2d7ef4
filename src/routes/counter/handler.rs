use axum::{extract::State, response::Response};

use crate::{AppState, error::AppError, utils::success_to_count_response};

// 获取当前计数；未配置返回 503，调用失败返回 500
pub async fn get_count(State(state): State<AppState>) -> Result<Response, AppError> {
    let store = state.store().ok_or(AppError::NotConfigured)?;

    match store.read().await {
        Ok(count) => Ok(success_to_count_response(count)),
        Err(err) => {
            tracing::error!("Error fetching counter: {}", err);
            Err(AppError::FetchFailed)
        }
    }
}

// 原子自增并返回新值
pub async fn increment_count(State(state): State<AppState>) -> Result<Response, AppError> {
    let store = state.store().ok_or(AppError::NotConfigured)?;

    match store.increment().await {
        Ok(count) => {
            tracing::info!("Counter incremented to {}", count);
            Ok(success_to_count_response(count))
        }
        Err(err) => {
            tracing::error!("Error incrementing counter: {}", err);
            Err(AppError::IncrementFailed)
        }
    }
}
