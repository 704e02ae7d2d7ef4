use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::utils::error_to_count_response;

pub const NOT_CONFIGURED_MESSAGE: &str = "Firebase not configured";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch counter";
pub const INCREMENT_FAILED_MESSAGE: &str = "Failed to increment counter";

/// 计数器存储层错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("counter store unreachable: {0}")]
    Unreachable(String),
    #[error("counter value is not a valid counter: {0}")]
    Corrupt(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.kind() == redis::ErrorKind::TypeError {
            StoreError::Corrupt(err.to_string())
        } else {
            StoreError::Unreachable(err.to_string())
        }
    }
}

/// HTTP 边界上的错误，全部转换为降级响应
#[derive(Debug)]
pub enum AppError {
    NotConfigured,
    FetchFailed,
    IncrementFailed,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            AppError::FetchFailed | AppError::IncrementFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AppError::NotConfigured => NOT_CONFIGURED_MESSAGE,
            AppError::FetchFailed => FETCH_FAILED_MESSAGE,
            AppError::IncrementFailed => INCREMENT_FAILED_MESSAGE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error_to_count_response(self.status(), self.message())
    }
}
