use std::{pin::pin, sync::Arc};

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use redis::{AsyncCommands, Client as RedisClient};
use tokio::sync::mpsc;

use super::{
    CounterEvent, CounterStore, CounterSubscription,
    keys::{COUNTER_CHANNEL, COUNTER_KEY, SUBSCRIPTION_BUFFER},
};
use crate::error::StoreError;

/// Redis 计数器存储
///
/// 读用 GET，自增用 INCR（Redis 单命令原子），自增成功后把新值 PUBLISH 到变更频道。
#[derive(Clone)]
pub struct RedisCounterStore {
    redis: Arc<RedisClient>,
}

impl RedisCounterStore {
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let client = RedisClient::open(url)
            .map_err(|e| StoreError::Unreachable(format!("invalid store url: {}", e)))?;
        Ok(Self::new(Arc::new(client)))
    }

    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }
}

fn to_count(raw: i64) -> Result<u64, StoreError> {
    u64::try_from(raw).map_err(|_| StoreError::Corrupt(raw.to_string()))
}

fn parse_payload(payload: &str) -> CounterEvent {
    match payload.trim().parse::<u64>() {
        Ok(value) => CounterEvent::Value(value),
        Err(_) => CounterEvent::Error(format!("unexpected counter payload: {}", payload)),
    }
}

/// 把 pub/sub 负载转成订阅事件
///
/// INCR 与 PUBLISH 分两次往返，并发自增时推送可能乱序到达；
/// 计数只增不减，所以低于已推送值的负载直接丢弃。
async fn forward_payloads<S>(payloads: S, mut last_seen: u64, tx: mpsc::Sender<CounterEvent>)
where
    S: Stream<Item = Result<String, String>>,
{
    let mut payloads = pin!(payloads);
    while let Some(payload) = payloads.next().await {
        let event = match payload {
            Ok(payload) => parse_payload(&payload),
            Err(e) => CounterEvent::Error(e),
        };
        if let CounterEvent::Value(value) = event {
            if value <= last_seen {
                tracing::debug!("Skipping stale counter update {} (seen {})", value, last_seen);
                continue;
            }
            last_seen = value;
        }
        if tx.send(event).await.is_err() {
            return;
        }
    }
    tracing::warn!("Counter pub/sub stream ended");
    let _ = tx
        .send(CounterEvent::Error("counter subscription closed".into()))
        .await;
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn read(&self) -> Result<u64, StoreError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let value: Option<i64> = conn.get(COUNTER_KEY).await?;
        value.map_or(Ok(0), to_count)
    }

    async fn subscribe(&self) -> Result<CounterSubscription, StoreError> {
        // 先订阅再读当前值，中间的变更会作为推送补上
        let mut pubsub = self.redis.get_async_pubsub().await?;
        pubsub.subscribe(COUNTER_CHANNEL).await?;
        let current = self.read().await?;

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        tx.send(CounterEvent::Value(current))
            .await
            .map_err(|_| StoreError::Unreachable("subscription closed".into()))?;

        let payloads = pubsub
            .into_on_message()
            .map(|msg| msg.get_payload::<String>().map_err(|e| e.to_string()));
        let forwarder = tokio::spawn(forward_payloads(payloads, current, tx));

        Ok(CounterSubscription::new(rx, forwarder))
    }

    async fn increment(&self) -> Result<u64, StoreError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let raw: i64 = conn.incr(COUNTER_KEY, 1).await?;
        let value = to_count(raw)?;

        // 自增已生效，推送失败只记录日志
        let published: Result<i64, redis::RedisError> = conn.publish(COUNTER_CHANNEL, value).await;
        if let Err(e) = published {
            tracing::warn!("Failed to publish counter update {}: {}", value, e);
        }

        Ok(value)
    }
}
