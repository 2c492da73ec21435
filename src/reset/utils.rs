//! Small helpers for request validation, throttle keys, and message bodies.

use base64ct::{Base64UrlUnpadded, Encoding};
use regex::Regex;
use url::Url;

/// Storage keys are capped so pathological inputs cannot blow up the key column.
const MAX_STORAGE_KEY_LEN: usize = 500;
const NO_IP: &str = "noip";

/// Trim surrounding whitespace; the provider owns case handling for lookups.
pub(super) fn normalize_email(email: &str) -> &str {
    email.trim()
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Accept only absolute http(s) URLs as redirect targets.
pub(super) fn valid_redirect_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https") && url.host_str().is_some()
    })
}

/// Throttle key for self-serve requests: `self:<email>:<ip>`.
///
/// The email is lowercased so case variations share one bucket.
pub(super) fn self_serve_throttle_key(email: &str, client_ip: Option<&str>) -> String {
    let ip = client_ip
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(NO_IP);
    format!("self:{}:{ip}", email.to_lowercase())
}

/// Encode a throttle key for storage (URL-safe base64, truncated).
pub(super) fn storage_key(key: &str) -> String {
    let mut encoded = Base64UrlUnpadded::encode_string(key.as_bytes());
    encoded.truncate(MAX_STORAGE_KEY_LEN);
    encoded
}

/// Escape a value interpolated into an HTML email body.
pub(super) fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
