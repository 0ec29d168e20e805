//! Backend HTTP client configuration.

use serde::Deserialize;

/// Connection settings for the generation backend.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token sent with every request.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Extra attempts for idempotent reads. Submissions never retry.
    #[serde(default = "default_read_retries")]
    pub read_retries: u32,
    /// Delay between read retries in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".into()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_connect_timeout_ms() -> u64 {
    5000
}

const fn default_read_retries() -> u32 {
    2
}

const fn default_retry_delay_ms() -> u64 {
    250
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_ms: default_connect_timeout_ms(),
            read_retries: default_read_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}
