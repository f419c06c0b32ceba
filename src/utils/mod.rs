//! Utility functions and helpers.

pub mod http;
pub mod time;

use url::Url;

/// Base that relative Reddit permalinks are resolved against.
pub const REDDIT_WEB_BASE: &str = "https://reddit.com";

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Turn an API permalink such as `/r/penpals/comments/x/` into a full URL.
///
/// Empty input stays empty; absolute URLs pass through untouched.
pub fn absolute_permalink(permalink: &str) -> String {
    let permalink = permalink.trim();
    if permalink.is_empty() {
        return String::new();
    }
    match Url::parse(REDDIT_WEB_BASE) {
        Ok(base) => resolve_url(&base, permalink),
        Err(_) => permalink.to_string(),
    }
}
