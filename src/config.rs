//! Dashboard configuration
//!
//! Defaults, overridable from the environment (`TRACKER_API_URL`,
//! `TRACKER_POLL_MS`) and then from command-line flags in the binaries.

use std::time::Duration;
use tracing::debug;

use crate::core::MAX_TRAIL_LENGTH;
use crate::error::ConfigError;

/// Default tracking backend (override with TRACKER_API_URL env var)
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// 50ms = 20Hz nominal sampling
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

pub const ENV_API_URL: &str = "TRACKER_API_URL";
pub const ENV_POLL_MS: &str = "TRACKER_POLL_MS";

#[derive(Clone, Debug, PartialEq)]
pub struct DashboardConfig {
    /// Base URL of the tracking backend, without trailing slash
    pub api_base_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub trail_length: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            trail_length: MAX_TRAIL_LENGTH,
        }
    }
}

impl DashboardConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            config = config.with_api_url(&url);
        }
        if let Some(ms) = lookup(ENV_POLL_MS) {
            let ms: u64 = ms.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                var: ENV_POLL_MS,
                value: ms.clone(),
            })?;
            config.poll_interval = Duration::from_millis(ms);
        }

        config.validate()?;
        debug!(?config, "Configuration resolved");
        Ok(config)
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_base_url = url.trim().trim_end_matches('/').to_string();
        self
    }

    /// Apply command-line values on top, then validate again
    pub fn with_overrides(
        mut self,
        api_url: Option<&str>,
        poll_ms: Option<u64>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = api_url {
            self = self.with_api_url(url);
        }
        if let Some(ms) = poll_ms {
            self.poll_interval = Duration::from_millis(ms);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.api_base_url;
        // Plain HTTP only: the client is built without a TLS backend
        let has_host = url
            .strip_prefix("http://")
            .is_some_and(|rest| !rest.is_empty());
        if !has_host {
            return Err(ConfigError::InvalidUrl(url.clone()));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.trail_length == 0 {
            return Err(ConfigError::ZeroTrailLength);
        }
        Ok(())
    }

    pub fn status_url(&self) -> String {
        format!("{}/status", self.api_base_url)
    }

    pub fn target_url(&self) -> String {
        format!("{}/config/target", self.api_base_url)
    }

    pub fn sensitivity_url(&self) -> String {
        format!("{}/config/sensitivity", self.api_base_url)
    }
}
