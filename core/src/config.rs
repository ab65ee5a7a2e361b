//! Client configuration loaded from the environment.

use std::env;

use url::Url;

use crate::retry::RetryPolicy;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API_BASE_URL is not a valid URL: {0}")]
    InvalidBaseUrl(String),

    #[error("USER_LOOKUP_MAX_RETRIES must be a non-negative integer, got {0:?}")]
    InvalidMaxRetries(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the backend proxy, without trailing slash.
    pub api_base_url: String,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(
            env::var("API_BASE_URL").ok().as_deref(),
            env::var("USER_LOOKUP_MAX_RETRIES").ok().as_deref(),
        )
    }

    fn from_vars(base_url: Option<&str>, max_retries: Option<&str>) -> Result<Self, ConfigError> {
        let api_base_url = match base_url.map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => {
                Url::parse(raw).map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;
                raw.trim_end_matches('/').to_string()
            }
            None => DEFAULT_API_BASE_URL.to_string(),
        };

        let mut retry = RetryPolicy::default();
        if let Some(raw) = max_retries {
            let max = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidMaxRetries(raw.to_string()))?;
            retry = retry.with_max_retries(max);
        }

        Ok(Self {
            api_base_url,
            retry,
        })
    }
}
