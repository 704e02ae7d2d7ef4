// 计数器客户端
// 订阅实时计数，按本地凭据限制每个客户端只投一次

pub mod receipt;

use std::sync::Arc;

use crate::{
    error::{FETCH_FAILED_MESSAGE, NOT_CONFIGURED_MESSAGE},
    store::{CounterEvent, CounterStore, CounterSubscription},
};

pub use receipt::{FileReceiptStore, MemoryReceiptStore, RECEIPT_KEY, ReceiptStore};

/// 单次会话内的投票状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteState {
    Unvoted,
    Voting,
    Voted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterDisplay {
    Loading,
    Value(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connection {
    /// 尚未挂载，订阅未建立
    Pending,
    Connected,
    Degraded(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// 自增成功，携带自增后的值
    Voted(u64),
    /// 不满足投票条件，未调用存储
    Ignored,
    /// 自增失败，已回到 Unvoted 可重试
    Failed,
}

/// 投票成功后的庆祝效果，与正确性无关
pub type Celebration = Arc<dyn Fn(u64) + Send + Sync>;

pub struct CounterClient {
    store: Option<Arc<dyn CounterStore>>,
    receipts: Arc<dyn ReceiptStore>,
    state: VoteState,
    display: CounterDisplay,
    connection: Connection,
    show_success: bool,
    subscription: Option<CounterSubscription>,
    celebration: Option<Celebration>,
}

// 投票进行中若 future 被丢弃，状态退回 Unvoted
struct VotingGuard<'a> {
    state: &'a mut VoteState,
    settled: bool,
}

impl<'a> VotingGuard<'a> {
    fn begin(state: &'a mut VoteState) -> Self {
        *state = VoteState::Voting;
        Self {
            state,
            settled: false,
        }
    }

    fn settle(mut self, next: VoteState) {
        *self.state = next;
        self.settled = true;
    }
}

impl Drop for VotingGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            *self.state = VoteState::Unvoted;
        }
    }
}

impl CounterClient {
    pub fn new(store: Option<Arc<dyn CounterStore>>, receipts: Arc<dyn ReceiptStore>) -> Self {
        let voted = receipts.has_voted();
        Self {
            store,
            receipts,
            state: if voted {
                VoteState::Voted
            } else {
                VoteState::Unvoted
            },
            display: CounterDisplay::Loading,
            connection: Connection::Pending,
            show_success: voted,
            subscription: None,
            celebration: None,
        }
    }

    pub fn with_celebration(mut self, celebration: Celebration) -> Self {
        self.celebration = Some(celebration);
        self
    }

    pub fn state(&self) -> VoteState {
        self.state
    }

    pub fn display(&self) -> CounterDisplay {
        self.display
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn warning(&self) -> Option<&str> {
        match &self.connection {
            Connection::Pending | Connection::Connected => None,
            Connection::Degraded(message) => Some(message),
        }
    }

    pub fn show_success(&self) -> bool {
        self.show_success
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// 挂载：恢复本地凭据并建立订阅
    pub async fn mount(&mut self) {
        if self.receipts.has_voted() {
            self.state = VoteState::Voted;
            self.show_success = true;
        }

        let Some(store) = self.store.clone() else {
            tracing::warn!("Counter store not configured, voting disabled");
            self.connection = Connection::Degraded(NOT_CONFIGURED_MESSAGE.into());
            return;
        };

        match store.subscribe().await {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                self.connection = Connection::Connected;
            }
            Err(e) => {
                tracing::error!("Counter listener error: {}", e);
                self.connection = Connection::Degraded(FETCH_FAILED_MESSAGE.into());
            }
        }
    }

    /// 处理下一条推送；订阅已释放或结束时返回 None
    pub async fn next_update(&mut self) -> Option<CounterEvent> {
        let subscription = self.subscription.as_mut()?;
        let event = subscription.next().await;

        match &event {
            Some(CounterEvent::Value(value)) => {
                self.display = CounterDisplay::Value(*value);
            }
            Some(CounterEvent::Error(message)) => {
                tracing::error!("Counter listener error: {}", message);
                self.connection = Connection::Degraded(FETCH_FAILED_MESSAGE.into());
                self.subscription = None;
            }
            None => {
                self.subscription = None;
            }
        }

        event
    }

    /// 需已挂载且订阅正常；凭据每次都重新检查
    pub fn can_vote(&self) -> bool {
        self.state == VoteState::Unvoted
            && !self.receipts.has_voted()
            && self.connection == Connection::Connected
            && self.store.is_some()
    }

    pub async fn vote(&mut self) -> VoteOutcome {
        if !self.can_vote() {
            tracing::debug!("Vote ignored in state {:?}", self.state);
            return VoteOutcome::Ignored;
        }
        let Some(store) = self.store.clone() else {
            return VoteOutcome::Ignored;
        };

        let guard = VotingGuard::begin(&mut self.state);

        match store.increment().await {
            Ok(count) => {
                // 计数已生效，凭据写失败也保持 Voted
                if let Err(e) = self.receipts.record_vote() {
                    tracing::warn!("Failed to persist vote receipt: {}", e);
                }
                guard.settle(VoteState::Voted);
                self.show_success = true;

                if let Some(celebration) = self.celebration.clone() {
                    tokio::spawn(async move { celebration(count) });
                }
                VoteOutcome::Voted(count)
            }
            Err(e) => {
                tracing::error!("Error incrementing counter: {}", e);
                guard.settle(VoteState::Unvoted);
                VoteOutcome::Failed
            }
        }
    }

    /// 卸载：释放订阅
    pub fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}
