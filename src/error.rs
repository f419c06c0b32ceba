// src/error.rs

//! Unified error handling for the penpals library.

use std::fmt;

use thiserror::Error;

/// Result type alias for penpals operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Token exchange failed or credentials were rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A single listing request failed
    #[error("Fetch error for {context}: {message}")]
    Fetch { context: String, message: String },

    /// The overall fetch budget was exceeded
    #[error("Fetch timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// A fetch completed without collecting any posts
    #[error("No posts fetched from r/{subreddit}")]
    EmptyResult { subreddit: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSV reading or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Keyword pattern could not be compiled
    #[error("Invalid keyword pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create an authentication error.
    pub fn auth(message: impl fmt::Display) -> Self {
        Self::Auth(message.to_string())
    }

    /// Create a fetch error with context.
    pub fn fetch(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an empty-result error for a subreddit.
    pub fn empty(subreddit: impl fmt::Display) -> Self {
        Self::EmptyResult {
            subreddit: subreddit.to_string(),
        }
    }

    /// Whether the caller may simply try the same request again.
    ///
    /// Network and empty-result failures are transient. Configuration and
    /// local data errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Auth(_)
                | Self::Fetch { .. }
                | Self::Timeout { .. }
                | Self::EmptyResult { .. }
                | Self::Http(_)
        )
    }
}
