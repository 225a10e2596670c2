use std::time::Duration;

use serde::Deserialize;

/// Connection and polling settings for the external Judge0 service.
///
/// Shared by the judge client (which is constructed from it) and the server
/// config (which loads it from the `judge` section).
#[derive(Debug, Deserialize, Clone)]
pub struct JudgeConfig {
    /// Base URL of the Judge0 API. Default: "http://localhost:2358".
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Value for the `X-Auth-Token` header, if the instance requires one.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Sleep between poll rounds, in milliseconds. Default: 1000.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Maximum number of poll rounds before giving up. Default: 120.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    /// Overall deadline for polling, in seconds. Default: 180.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    /// Per-request HTTP timeout, in seconds. Default: 10.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:2358".into()
}
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_max_poll_attempts() -> u32 {
    120
}
fn default_poll_timeout_secs() -> u64 {
    180
}
fn default_request_timeout_secs() -> u64 {
    10
}

impl JudgeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_token: None,
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            poll_timeout_secs: default_poll_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
