use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default Hacker News Firebase API root.
pub const DEFAULT_API_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";
/// Default Hacker News website root, used for text-only post links.
pub const DEFAULT_WEB_BASE_URL: &str = "https://news.ycombinator.com";
/// Default append-only diagnostic log.
pub const DEFAULT_LOG_FILE: &str = "hackernews.log";
/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,hackernews_json=debug";

const MAX_FETCH_WORKERS: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Endpoints
    pub api_base_url: String,
    pub web_base_url: String,

    // Logging
    pub log_file: PathBuf,
    pub log_filter: String,

    // Fetching
    pub request_timeout: Duration,
    pub fetch_workers: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional; absent ones fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: env_or("HN_API_BASE_URL", DEFAULT_API_BASE_URL),
            web_base_url: env_or("HN_WEB_BASE_URL", DEFAULT_WEB_BASE_URL),
            log_file: PathBuf::from(env_or("HN_LOG_FILE", DEFAULT_LOG_FILE)),
            log_filter: env_or("RUST_LOG", DEFAULT_LOG_FILTER),
            request_timeout: Duration::from_secs(parse_env_u64("HN_REQUEST_TIMEOUT_SECS", 30)?),
            fetch_workers: usize::try_from(parse_env_u64("HN_FETCH_WORKERS", 1)?).map_err(|_| {
                ConfigError::InvalidValue {
                    name: "HN_FETCH_WORKERS".to_string(),
                    message: "value does not fit in usize".to_string(),
                }
            })?,
        })
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a base URL is not an absolute http(s) URL, the
    /// timeout is zero, or the worker count is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url("HN_API_BASE_URL", &self.api_base_url)?;
        validate_base_url("HN_WEB_BASE_URL", &self.web_base_url)?;

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "HN_REQUEST_TIMEOUT_SECS".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if self.fetch_workers == 0 || self.fetch_workers > MAX_FETCH_WORKERS {
            return Err(ConfigError::InvalidValue {
                name: "HN_FETCH_WORKERS".to_string(),
                message: format!("must be between 1 and {MAX_FETCH_WORKERS}"),
            });
        }

        Ok(())
    }

    /// URL of the ranked top-stories identifier list.
    pub fn list_url(&self) -> String {
        format!("{}/topstories.json", trim_base(&self.api_base_url))
    }

    /// URL of the JSON document for a single item.
    pub fn item_url(&self, id: u64) -> String {
        format!("{}/item/{id}.json", trim_base(&self.api_base_url))
    }

    /// Discussion page for an item, used when the item carries no link.
    pub fn fallback_url(&self, id: u64) -> String {
        format!("{}/item?id={id}", trim_base(&self.web_base_url))
    }

    /// Defaults pointing at the public API, with logging to a throwaway path.
    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            web_base_url: DEFAULT_WEB_BASE_URL.to_string(),
            log_file: std::env::temp_dir().join("hackernews-test.log"),
            log_filter: "debug".to_string(),
            request_timeout: Duration::from_secs(5),
            fetch_workers: 1,
        }
    }
}

fn trim_base(base: &str) -> &str {
    base.trim_end_matches('/')
}

fn validate_base_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        name: name.to_string(),
        message: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    Ok(())
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        Err(_) => Ok(default),
    }
}
