// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::RedditConfig;

/// Create a configured asynchronous HTTP client.
///
/// Reddit rejects requests that lack a descriptive User-Agent.
pub fn create_async_client(config: &RedditConfig, user_agent: &str) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_async_client() {
        let config = RedditConfig::default();
        assert!(create_async_client(&config, "script:test:v1.0 (by /u/tester)").is_ok());
    }
}
