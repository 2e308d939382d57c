use std::time::Duration;

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u64_or(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Settings for talking to the statistics ledger. Everything is
/// environment-tunable with the same knobs the rest of the deployment
/// uses.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub base_url: String,
    pub finalize_path: String,
    pub api_key: String,
    pub timeout: Duration,
    pub max_retry_attempts: u32,
    pub backoff_base: u64,
    pub max_retry_wait: Duration,
}

impl NotifierConfig {
    pub fn from_env() -> Self {
        let timeout_secs = std::env::var("PLAYER_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| env_u64_or("HTTP_TIMEOUT", 5));

        Self {
            base_url: env_or("LEDGER_SERVICE_URL", "http://player_service:8002"),
            finalize_path: env_or("LEDGER_FINALIZE_PATH", "/matches"),
            api_key: env_or("SERVICE_API_KEY", "default_key"),
            timeout: Duration::from_secs(timeout_secs),
            max_retry_attempts: env_u64_or("MAX_RETRY_ATTEMPTS", 3) as u32,
            backoff_base: env_u64_or("RETRY_BACKOFF_BASE", 2),
            max_retry_wait: Duration::from_secs(env_u64_or("MAX_RETRY_WAIT", 10)),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.finalize_path)
    }
}
