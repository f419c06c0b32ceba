//! Application configuration structures.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Reddit endpoints and HTTP behavior
    #[serde(default)]
    pub reddit: RedditConfig,

    /// Pagination and rate limiting of listing requests
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Fetch result caching
    #[serde(default)]
    pub cache: CacheConfig,

    /// Result presentation settings
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.reddit.token_url)?;
        url::Url::parse(&self.reddit.api_base_url)?;
        if self.reddit.request_timeout_secs == 0 {
            return Err(AppError::validation(
                "reddit.request_timeout_secs must be > 0",
            ));
        }
        if self.fetch.batch_size == 0 || self.fetch.batch_size > defaults::MAX_BATCH_SIZE {
            return Err(AppError::validation(format!(
                "fetch.batch_size must be within 1..={}",
                defaults::MAX_BATCH_SIZE
            )));
        }
        if self.fetch.request_delay_ms < defaults::MIN_REQUEST_DELAY_MS {
            return Err(AppError::validation(format!(
                "fetch.request_delay_ms must be >= {}",
                defaults::MIN_REQUEST_DELAY_MS
            )));
        }
        if self.fetch.max_posts == 0 {
            return Err(AppError::validation("fetch.max_posts must be > 0"));
        }
        if self.fetch.overall_timeout_secs == 0 {
            return Err(AppError::validation(
                "fetch.overall_timeout_secs must be > 0",
            ));
        }
        if self.display.page_size == 0 {
            return Err(AppError::validation("display.page_size must be > 0"));
        }
        Ok(())
    }
}

/// Reddit endpoints and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    /// OAuth2 token endpoint
    #[serde(default = "defaults::token_url")]
    pub token_url: String,

    /// Base URL for authenticated API calls
    #[serde(default = "defaults::api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            token_url: defaults::token_url(),
            api_base_url: defaults::api_base_url(),
            request_timeout_secs: defaults::request_timeout(),
        }
    }
}

/// Listing pagination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Posts collected per subreddit
    #[serde(default = "defaults::max_posts")]
    pub max_posts: usize,

    /// Items requested per listing call (Reddit caps this at 100)
    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,

    /// Delay between listing calls in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Upper bound for one complete subreddit fetch
    #[serde(default = "defaults::overall_timeout")]
    pub overall_timeout_secs: u64,
}

impl FetchConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn overall_timeout(&self) -> Duration {
        Duration::from_secs(self.overall_timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_posts: defaults::max_posts(),
            batch_size: defaults::batch_size(),
            request_delay_ms: defaults::request_delay(),
            overall_timeout_secs: defaults::overall_timeout(),
        }
    }
}

/// Fetch result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live for a cached subreddit fetch
    #[serde(default = "defaults::cache_ttl")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: defaults::cache_ttl(),
        }
    }
}

/// Presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Posts per page
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,

    /// Marker inserted before a highlighted keyword
    #[serde(default = "defaults::highlight_marker")]
    pub highlight_open: String,

    /// Marker inserted after a highlighted keyword
    #[serde(default = "defaults::highlight_marker")]
    pub highlight_close: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::page_size(),
            highlight_open: defaults::highlight_marker(),
            highlight_close: defaults::highlight_marker(),
        }
    }
}

/// Reddit application credentials, read from the process environment.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub app_name: String,
}

impl Credentials {
    /// Read `CLIENT_ID`, `CLIENT_SECRET`, `REDDIT_USERNAME` and `APP_NAME`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build credentials from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::config(format!("{key} must be set")))
        };
        let optional = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            client_id: required("CLIENT_ID")?,
            client_secret: required("CLIENT_SECRET")?,
            username: optional("REDDIT_USERNAME", "unknown"),
            app_name: optional("APP_NAME", "penpals-insights"),
        })
    }

    /// User-Agent string in the format Reddit asks script apps to send.
    pub fn user_agent(&self) -> String {
        format!("script:{}:v1.0 (by /u/{})", self.app_name, self.username)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("username", &self.username)
            .field("app_name", &self.app_name)
            .finish()
    }
}

mod defaults {
    pub const MAX_BATCH_SIZE: usize = 100;
    pub const MIN_REQUEST_DELAY_MS: u64 = 600;

    // Reddit defaults
    pub fn token_url() -> String {
        "https://www.reddit.com/api/v1/access_token".into()
    }
    pub fn api_base_url() -> String {
        "https://oauth.reddit.com".into()
    }
    pub fn request_timeout() -> u64 {
        30
    }

    // Fetch defaults
    pub fn max_posts() -> usize {
        1000
    }
    pub fn batch_size() -> usize {
        MAX_BATCH_SIZE
    }
    pub fn request_delay() -> u64 {
        MIN_REQUEST_DELAY_MS
    }
    pub fn overall_timeout() -> u64 {
        180
    }

    // Cache defaults
    pub fn cache_ttl() -> u64 {
        20 * 60
    }

    // Display defaults
    pub fn page_size() -> usize {
        100
    }
    pub fn highlight_marker() -> String {
        "**".into()
    }
}
