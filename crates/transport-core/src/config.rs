//! Runtime configuration.
//!
//! Values come from environment variables, with defaults matching a local
//! development API:
//! - TRANSPORT_API_URL (default: "http://127.0.0.1:8000/transporte")
//! - TRANSPORT_API_TIMEOUT_SECS (default: 10)
//! - TRANSPORT_DEBOUNCE_MS (default: 300)
//! - TRANSPORT_PAGE_SIZE (default: 6)
//! - TRANSPORT_POLL_SECS (default: 10)
//! - TRANSPORT_CONFIRM_UPDATES (default: "true")
//! - TRANSPORT_PREFS_PATH (default: "transport-prefs.json")
//! - TRANSPORT_ADMIN_EMAILS (comma-separated, default: "admin@example.com")

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use transport_gateway::{GatewayConfig, DEFAULT_API_URL};

use crate::confirmation::UpdatePolicy;
use crate::query::DEFAULT_PAGE_SIZE;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub api_timeout: Duration,
    /// Delay before the list view is recomputed after a change
    pub debounce: Duration,
    pub page_size: usize,
    /// Period of the background reload while watching
    pub poll_interval: Duration,
    pub update_policy: UpdatePolicy,
    pub prefs_path: PathBuf,
    pub admin_emails: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_timeout: Duration::from_secs(10),
            debounce: Duration::from_millis(300),
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval: Duration::from_secs(10),
            update_policy: UpdatePolicy::Confirm,
            prefs_path: PathBuf::from("transport-prefs.json"),
            admin_emails: vec!["admin@example.com".to_string()],
        }
    }
}

fn parse_var<T: FromStr>(
    key: &'static str,
    value: Option<String>,
) -> Result<Option<T>, ConfigError> {
    match value {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("TRANSPORT_API_URL") {
            config.api_url = url;
        }
        let timeout_key = "TRANSPORT_API_TIMEOUT_SECS";
        if let Some(secs) = parse_var::<u64>(timeout_key, lookup(timeout_key))? {
            config.api_timeout = Duration::from_secs(secs);
        }
        let debounce_key = "TRANSPORT_DEBOUNCE_MS";
        if let Some(ms) = parse_var::<u64>(debounce_key, lookup(debounce_key))? {
            config.debounce = Duration::from_millis(ms);
        }
        let page_key = "TRANSPORT_PAGE_SIZE";
        if let Some(size) = parse_var::<usize>(page_key, lookup(page_key))? {
            if size == 0 {
                return Err(ConfigError::Invalid {
                    key: page_key,
                    value: size.to_string(),
                });
            }
            config.page_size = size;
        }
        let poll_key = "TRANSPORT_POLL_SECS";
        if let Some(secs) = parse_var::<u64>(poll_key, lookup(poll_key))? {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    key: poll_key,
                    value: secs.to_string(),
                });
            }
            config.poll_interval = Duration::from_secs(secs);
        }
        let confirm_key = "TRANSPORT_CONFIRM_UPDATES";
        let confirm_value = lookup(confirm_key).map(|v| v.to_lowercase());
        if let Some(confirm) = parse_var::<bool>(confirm_key, confirm_value)? {
            config.update_policy = if confirm {
                UpdatePolicy::Confirm
            } else {
                UpdatePolicy::Immediate
            };
        }
        if let Some(path) = lookup("TRANSPORT_PREFS_PATH") {
            config.prefs_path = PathBuf::from(path);
        }
        if let Some(emails) = lookup("TRANSPORT_ADMIN_EMAILS") {
            config.admin_emails = emails
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_poll_interval(mut self, every: Duration) -> Self {
        self.poll_interval = every;
        self
    }

    pub fn with_update_policy(mut self, policy: UpdatePolicy) -> Self {
        self.update_policy = policy;
        self
    }

    pub fn with_prefs_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.prefs_path = path.into();
        self
    }

    pub fn with_admin_emails(mut self, emails: Vec<String>) -> Self {
        self.admin_emails = emails;
        self
    }

    /// Settings for the HTTP gateway.
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(self.api_url.clone()).with_timeout(self.api_timeout)
    }
}
