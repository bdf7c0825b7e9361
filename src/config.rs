use serde::Deserialize;
use std::time::Duration;

use crate::services::queue::QueueSettings;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the paper feed / recommendation API
    #[serde(default = "default_paper_api_url")]
    pub paper_api_url: String,

    /// Redis connection URL. Session history lives in memory when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Number of papers requested per fallback batch
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,

    /// A recommendation batch is requested every this many actions
    #[serde(default = "default_recommend_every")]
    pub recommend_every: u64,

    /// How long feedback actions stay blocked after one is accepted
    #[serde(default = "default_lock_duration_ms")]
    pub lock_duration_ms: u64,

    /// Upstream request timeout
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_paper_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_batch_limit() -> usize {
    5
}

fn default_recommend_every() -> u64 {
    5
}

fn default_lock_duration_ms() -> u64 {
    500
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paper_api_url: default_paper_api_url(),
            redis_url: None,
            batch_limit: default_batch_limit(),
            recommend_every: default_recommend_every(),
            lock_duration_ms: default_lock_duration_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn queue_settings(&self) -> QueueSettings {
        QueueSettings {
            batch_limit: self.batch_limit.max(1),
            recommend_every: self.recommend_every.max(1),
        }
    }

    pub fn lock_duration(&self) -> Duration {
        Duration::from_millis(self.lock_duration_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
