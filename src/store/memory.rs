use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast, mpsc};

use super::{
    CounterEvent, CounterStore, CounterSubscription,
    keys::SUBSCRIPTION_BUFFER,
};
use crate::error::StoreError;

/// 进程内计数器存储
///
/// 互斥锁保证自增原子性，广播频道负责推送变更。
/// `set_unreachable` 用于模拟存储不可达。
pub struct MemoryCounterStore {
    value: Mutex<Option<u64>>,
    changes: broadcast::Sender<u64>,
    unreachable: AtomicBool,
}

impl Default for MemoryCounterStore {
    fn default() -> Self {
        Self::with_value(None)
    }
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` 表示键不存在
    pub fn with_value(value: Option<u64>) -> Self {
        let (changes, _) = broadcast::channel(SUBSCRIPTION_BUFFER);
        Self {
            value: Mutex::new(value),
            changes,
            unreachable: AtomicBool::new(false),
        }
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn ensure_reachable(&self) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Unreachable("memory store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn read(&self) -> Result<u64, StoreError> {
        self.ensure_reachable()?;
        Ok(self.value.lock().await.unwrap_or(0))
    }

    async fn subscribe(&self) -> Result<CounterSubscription, StoreError> {
        self.ensure_reachable()?;

        // 持锁期间订阅并读取，避免错过两者之间的变更
        let (mut changes, current) = {
            let value = self.value.lock().await;
            (self.changes.subscribe(), value.unwrap_or(0))
        };

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        tx.send(CounterEvent::Value(current))
            .await
            .map_err(|_| StoreError::Unreachable("subscription closed".into()))?;

        let forwarder = tokio::spawn(async move {
            loop {
                let event = match changes.recv().await {
                    Ok(value) => CounterEvent::Value(value),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!("subscriber lagged, skipped {} updates", skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        Ok(CounterSubscription::new(rx, forwarder))
    }

    async fn increment(&self) -> Result<u64, StoreError> {
        self.ensure_reachable()?;

        let mut value = self.value.lock().await;
        let current = value.unwrap_or(0);
        let next = current
            .checked_add(1)
            .ok_or_else(|| StoreError::Corrupt(format!("counter overflow at {}", current)))?;
        *value = Some(next);
        // 没有订阅者时发送失败，忽略即可
        let _ = self.changes.send(next);
        Ok(next)
    }
}
