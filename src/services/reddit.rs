// src/services/reddit.rs

//! Reddit OAuth2 and listing client.
//!
//! Talks to two endpoints: the client-credentials token endpoint and the
//! `/r/{subreddit}/new` listing. Everything else about pagination lives in
//! [`PostFetcher`](super::PostFetcher).

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{Config, Credentials, RawPost, Subreddit};
use crate::utils::http::create_async_client;

/// Kind tag Reddit uses for link/self posts.
const POST_KIND: &str = "t3";

/// Bearer token obtained from the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Parameters of one listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub subreddit: Subreddit,
    /// Items to request, at most 100
    pub limit: usize,
    /// Cursor returned by the previous call
    pub after: Option<String>,
}

/// One page of a listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub posts: Vec<RawPost>,
    /// Cursor for the next page, `None` once the listing is exhausted
    pub after: Option<String>,
}

/// Upstream API seam used by the fetcher.
#[async_trait]
pub trait RedditApi: Send + Sync {
    /// Exchange client credentials for a bearer token.
    async fn authenticate(&self) -> Result<AccessToken>;

    /// Fetch one page of the "new" listing.
    async fn fetch_batch(&self, token: &AccessToken, request: &BatchRequest) -> Result<Listing>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListingEnvelope {
    data: Option<ListingData>,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    after: Option<String>,
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    kind: String,
    #[serde(default)]
    data: Value,
}

/// HTTP implementation of [`RedditApi`].
pub struct RedditClient {
    client: Client,
    credentials: Credentials,
    token_url: String,
    api_base_url: String,
}

impl RedditClient {
    /// Create a client for the configured endpoints.
    pub fn new(config: &Config, credentials: Credentials) -> Result<Self> {
        let client = create_async_client(&config.reddit, &credentials.user_agent())?;
        Ok(Self {
            client,
            credentials,
            token_url: config.reddit.token_url.clone(),
            api_base_url: config.reddit.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn listing_url(&self, subreddit: Subreddit) -> String {
        format!("{}/r/{}/new", self.api_base_url, subreddit)
    }
}

#[async_trait]
impl RedditApi for RedditClient {
    async fn authenticate(&self) -> Result<AccessToken> {
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(AppError::auth)?
            .error_for_status()
            .map_err(AppError::auth)?;

        let body: TokenResponse = response.json().await.map_err(AppError::auth)?;
        match body.access_token {
            Some(token) if !token.is_empty() => {
                log::debug!("Obtained Reddit access token");
                Ok(AccessToken::new(token))
            }
            _ => Err(AppError::auth(
                body.error
                    .unwrap_or_else(|| "token response had no access_token".to_string()),
            )),
        }
    }

    async fn fetch_batch(&self, token: &AccessToken, request: &BatchRequest) -> Result<Listing> {
        let context = format!("r/{}", request.subreddit);
        let limit = request.limit.to_string();
        let mut query = vec![("limit", limit.as_str()), ("raw_json", "1")];
        if let Some(after) = request.after.as_deref() {
            query.push(("after", after));
        }

        let body: Value = self
            .client
            .get(self.listing_url(request.subreddit))
            .bearer_auth(token.as_str())
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::fetch(&context, e))?
            .error_for_status()
            .map_err(|e| AppError::fetch(&context, e))?
            .json()
            .await
            .map_err(|e| AppError::fetch(&context, e))?;

        parse_listing(body)
    }
}

/// Turn a listing payload into raw posts and the next cursor.
///
/// Children that are not posts are ignored; posts whose data does not fit
/// [`RawPost`] are skipped with a warning.
pub fn parse_listing(body: Value) -> Result<Listing> {
    let envelope: ListingEnvelope = serde_json::from_value(body)?;
    let Some(data) = envelope.data else {
        return Ok(Listing::default());
    };

    let posts = data
        .children
        .into_iter()
        .filter(|thing| thing.kind == POST_KIND)
        .filter_map(|thing| match serde_json::from_value::<RawPost>(thing.data) {
            Ok(post) => Some(post),
            Err(e) => {
                log::warn!("Skipping malformed post in listing: {}", e);
                None
            }
        })
        .collect();

    Ok(Listing {
        posts,
        after: data.after.filter(|cursor| !cursor.is_empty()),
    })
}
