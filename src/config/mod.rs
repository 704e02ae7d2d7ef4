use std::env;
use std::path::PathBuf;

const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_API_BASE_URI: &str = "/api";
const DEFAULT_RECEIPT_DIR: &str = ".kaizen";

#[derive(Debug, Clone)]
pub struct Config {
    /// 计数器存储地址，缺失即视为“未配置”
    pub database_url: Option<String>,
    pub api_key: Option<String>,
    pub auth_domain: Option<String>,
    pub project_id: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub receipt_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源构建配置（测试中不必修改进程环境）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // 空字符串与未设置等价
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Config {
            database_url: non_empty("DATABASE_URL"),
            api_key: non_empty("FIREBASE_API_KEY"),
            auth_domain: non_empty("FIREBASE_AUTH_DOMAIN"),
            project_id: non_empty("FIREBASE_PROJECT_ID"),
            server_host: non_empty("SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.into()),
            server_port: non_empty("SERVER_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            api_base_uri: non_empty("API_BASE_URI")
                .map(|uri| normalize_base_uri(&uri))
                .unwrap_or_else(|| DEFAULT_API_BASE_URI.into()),
            receipt_dir: non_empty("VOTE_RECEIPT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RECEIPT_DIR)),
        }
    }

    pub fn is_store_configured(&self) -> bool {
        self.database_url.is_some()
    }

    /// 用于日志的连接标识，不输出 API key 本身
    pub fn store_identity(&self) -> String {
        format!(
            "project={}, auth_domain={}, api_key={}",
            self.project_id.as_deref().unwrap_or("-"),
            self.auth_domain.as_deref().unwrap_or("-"),
            if self.api_key.is_some() { "set" } else { "unset" },
        )
    }
}

// 保证以 "/" 开头且不以 "/" 结尾，便于 nest
fn normalize_base_uri(uri: &str) -> String {
    let trimmed = uri.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_API_BASE_URI.into();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
