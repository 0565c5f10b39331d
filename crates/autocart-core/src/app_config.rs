use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub tasks_path: PathBuf,
    pub stores_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    /// Fixed user-agent for every session; `None` picks a browser UA per session.
    pub user_agent: Option<String>,
    /// `0` runs every task at once.
    pub max_concurrent_tasks: usize,
    /// Pipeline attempts per task before giving up; `0` means unbounded.
    pub max_attempts: u32,
    pub restart_backoff_base_ms: u64,
    pub restart_backoff_max_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_max_wait_secs: u64,
    pub shipping_rate_polls: u32,
}
