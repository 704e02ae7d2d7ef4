use serde::{Deserialize, Serialize};

/// 计数器接口的统一响应体
///
/// 成功时只有 `count`；降级时 `count` 为 0 并附带 `error`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CountResponse {
    pub fn ok(count: u64) -> Self {
        Self { count, error: None }
    }

    pub fn degraded(message: &str) -> Self {
        Self {
            count: 0,
            error: Some(message.to_string()),
        }
    }
}
