//! JSON source abstraction layer.
//!
//! This module defines the [`JsonSource`] trait, its error type, and the
//! [`Post`] record every source ultimately feeds.  The only concrete source
//! is [`HttpSource`]; tests substitute an in-memory map.
//!
//! ## For contributors
//!
//! A source answers exactly one question: "what JSON lives at this URL?".
//! It must never panic and never retry.  Callers treat any `Err` as "no data"
//! and degrade, so implementations are responsible for logging the failure
//! before returning it.

mod http;
mod post;

pub use http::HttpSource;
pub use post::Post;

use serde_json::Value;
use thiserror::Error;

/// Why a single fetch produced no data.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, DNS, timeout, or any other transport-level failure.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with something other than `200 OK`.
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    /// The body could not be decoded as JSON.
    #[error("response from {url} is not valid JSON: {message}")]
    Decode { url: String, message: String },

    /// The body was the JSON literal `null`; the API answers unknown items
    /// this way.
    #[error("response from {url} was null")]
    Null { url: String },
}

/// Trait that every JSON source must implement.
///
/// Sources are shared across fetch workers, so implementations must be
/// [`Send`] and [`Sync`].
pub trait JsonSource: Send + Sync {
    /// Perform a single GET against `url` and return the decoded body.
    fn fetch_json(&self, url: &str) -> Result<Value, FetchError>;
}
