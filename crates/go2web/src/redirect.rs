//! Redirect detection and `Location` resolution

use crate::response::DecodedResponse;
use crate::target::normalize_url;
use url::Url;

/// Status codes that are followed when a `Location` header is present
pub const REDIRECT_STATUSES: &[u16] = &[301, 302, 303, 307, 308];

/// True if the parsed status code is a followed redirect
pub fn is_redirect_status(status: Option<u16>) -> bool {
    status.is_some_and(|code| REDIRECT_STATUSES.contains(&code))
}

/// Resolve a `Location` value against the URL that produced it
///
/// Absolute http(s) locations are returned as-is. Anything else is joined
/// onto `current`, so `/next`, `next`, `?page=2` and `//host/path` all work.
pub fn resolve_location(current: &str, location: &str) -> Option<String> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }

    let lower = location.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(location.to_string());
    }

    let base = Url::parse(&normalize_url(current)).ok()?;
    base.join(location).ok().map(String::from)
}

/// Next URL to request, if `response` is a redirect with a usable `Location`
pub fn redirect_target(response: &DecodedResponse, current: &str) -> Option<String> {
    if !is_redirect_status(response.status) {
        return None;
    }
    resolve_location(current, response.header("location")?)
}
