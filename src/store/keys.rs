/// 计数器在存储中的固定键
pub const COUNTER_KEY: &str = "counter";

/// 计数器变更推送频道
pub const COUNTER_CHANNEL: &str = "counter:updates";

/// 单个订阅缓冲的事件数
pub const SUBSCRIPTION_BUFFER: usize = 16;
