//! HTTP implementation of [`JsonSource`].
//!
//! One blocking GET per call, no retry.  Every failure is logged here so that
//! callers only need to decide how to degrade.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, error};

use super::{FetchError, JsonSource};

/// Fetches JSON documents over HTTP using a shared [`reqwest`] blocking
/// client.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Build a source whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl JsonSource for HttpSource {
    fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        debug!(url, "Retrieving JSON");

        let response = self.client.get(url).send().map_err(|source| {
            error!(url, "Error GETting from URL: {source}");
            FetchError::Transport {
                url: url.to_string(),
                source,
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(url, status = status.as_u16(), "Error retrieving URL");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(|source| {
            error!(url, "Error reading response body: {source}");
            FetchError::Transport {
                url: url.to_string(),
                source,
            }
        })?;

        let value: Value = serde_json::from_slice(&body).map_err(|e| {
            error!(url, "No JSON found in response: {e}");
            FetchError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            }
        })?;

        if value.is_null() {
            error!(url, "Response JSON was null");
            return Err(FetchError::Null {
                url: url.to_string(),
            });
        }

        debug!(url, json = %value, "Retrieved JSON");
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
