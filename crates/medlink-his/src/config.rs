//! HIS client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection settings for the HIS.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HisConfig {
    /// Base URL, e.g. `https://hospital-a.api.co.th`. Trailing slashes are ignored.
    pub base_url: String,

    /// Whole-request timeout in milliseconds.
    pub timeout_ms: u64,

    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for HisConfig {
    fn default() -> Self {
        Self {
            base_url: "https://hospital-a.api.co.th".into(),
            timeout_ms: 10_000,
            connect_timeout_ms: 5_000,
        }
    }
}

impl HisConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_timeout_ms(mut self, timeout: u64) -> Self {
        self.timeout_ms = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
