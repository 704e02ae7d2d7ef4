use config::Config;
use std::sync::Arc;
use store::CounterStore;

pub mod client;
pub mod config;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod store;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// 未配置存储时为 None，接口返回降级响应
    pub store: Option<Arc<dyn CounterStore>>,
}

impl AppState {
    pub fn new(config: Config, store: Option<Arc<dyn CounterStore>>) -> Self {
        Self { config, store }
    }

    pub fn store(&self) -> Option<&Arc<dyn CounterStore>> {
        self.store.as_ref()
    }
}
