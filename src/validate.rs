//! Field validators.
//!
//! Each validator takes a raw JSON value straight out of an item document and
//! returns the normalised value, or `None` when the field fails validation.
//! None of them panic; a failure is always logged and turned into `None`.

use serde_json::Value;
use tracing::{debug, error, warn};
use url::{Host, Url};

/// Longest string kept in the output, in characters.
pub const MAX_STRING_CHARS: usize = 256;

/// Cap a string at [`MAX_STRING_CHARS`] characters.
///
/// Empty strings and JSON `null` are logged but passed through unchanged
/// (`Some("")` and `None` respectively).  A value that is not a string at
/// all is a validation failure.
pub fn validate_string(value: &Value) -> Option<String> {
    debug!(value = %value, "Validating string");

    match value {
        Value::Null => {
            error!("String is missing");
            None
        }
        Value::String(s) if s.is_empty() => {
            error!("String is empty");
            Some(String::new())
        }
        Value::String(s) => {
            if s.chars().count() > MAX_STRING_CHARS {
                warn!("String too long. Truncating to {MAX_STRING_CHARS} characters");
                Some(s.chars().take(MAX_STRING_CHARS).collect())
            } else {
                Some(s.clone())
            }
        }
        other => {
            error!(value = %other, "Non-string provided to validate_string");
            None
        }
    }
}

/// Accept only non-negative JSON integers.
pub fn validate_int(value: &Value) -> Option<u64> {
    debug!(value = %value, "Validating integer");

    match value {
        Value::Number(n) if n.is_u64() => n.as_u64(),
        Value::Number(n) if n.is_i64() => {
            error!(value = %n, "Integer is negative");
            None
        }
        other => {
            error!(value = %other, "Non-integer provided to validate_int");
            None
        }
    }
}

/// Schemes a post link may use.
const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "ftp"];

/// Accept only `http`, `https` or `ftp` URLs whose host is an IP address or
/// a dotted domain name.
///
/// The original string is returned untouched; parsing is used purely as a
/// check so the output never differs from what the API sent.
pub fn validate_uri(value: &Value) -> Option<String> {
    debug!(value = %value, "Validating URL");

    let Value::String(raw) = value else {
        error!(value = %value, "Non-string provided to validate_uri");
        return None;
    };

    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => {
            error!(url = %raw, "Invalid URL: {e}");
            return None;
        }
    };

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        error!(url = %raw, scheme = url.scheme(), "Invalid URL: unsupported scheme");
        return None;
    }

    match url.host() {
        Some(Host::Ipv4(_) | Host::Ipv6(_)) => Some(raw.clone()),
        Some(Host::Domain(domain)) if is_dotted_domain(domain) => Some(raw.clone()),
        _ => {
            error!(url = %raw, "Invalid URL: host is not a qualified domain or IP address");
            None
        }
    }
}

/// `example.com` yes; `localhost`, `example.` and `.com` no.
fn is_dotted_domain(domain: &str) -> bool {
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}
