// 计数器存储模块
// 抽象出读取、订阅与原子自增三种能力，具体后端可替换

pub mod keys;
pub mod memory;
pub mod redis_store;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{config::Config, error::StoreError};

pub use self::memory::MemoryCounterStore;
pub use self::redis_store::RedisCounterStore;

const MEMORY_SCHEME: &str = "memory://";

/// 订阅推送的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterEvent {
    Value(u64),
    Error(String),
}

/// 计数器存储能力
///
/// `increment` 必须由后端保证原子性：并发调用下不能丢失更新。
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// 读取当前值，键不存在时为 0
    async fn read(&self) -> Result<u64, StoreError>;

    /// 建立推送订阅，首个事件为当前值
    async fn subscribe(&self) -> Result<CounterSubscription, StoreError>;

    /// 原子地加一，返回自增后的值
    async fn increment(&self) -> Result<u64, StoreError>;
}

/// 订阅句柄，drop 即释放监听
pub struct CounterSubscription {
    events: mpsc::Receiver<CounterEvent>,
    forwarder: Option<JoinHandle<()>>,
}

impl CounterSubscription {
    pub(crate) fn new(events: mpsc::Receiver<CounterEvent>, forwarder: JoinHandle<()>) -> Self {
        Self {
            events,
            forwarder: Some(forwarder),
        }
    }

    /// 等待下一个事件；订阅结束时返回 None
    pub async fn next(&mut self) -> Option<CounterEvent> {
        self.events.recv().await
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
            tracing::debug!("counter subscription released");
        }
        self.events.close();
    }
}

impl Drop for CounterSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

/// 根据配置连接存储；未配置或初始化失败时返回 None
pub fn connect(config: &Config) -> Option<Arc<dyn CounterStore>> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not configured, counter store disabled");
        return None;
    };

    if let Some(seed) = url.strip_prefix(MEMORY_SCHEME) {
        let seed = seed.parse::<u64>().ok();
        tracing::info!(
            "Using in-process counter store (seed: {:?}, {})",
            seed,
            config.store_identity()
        );
        return Some(Arc::new(MemoryCounterStore::with_value(seed)));
    }

    match RedisCounterStore::open(url) {
        Ok(store) => {
            tracing::info!("Counter store initialised ({})", config.store_identity());
            Some(Arc::new(store))
        }
        Err(err) => {
            tracing::warn!("Counter store initialization failed: {}", err);
            None
        }
    }
}
