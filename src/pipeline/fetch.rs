// src/pipeline/fetch.rs

//! Cached, time-bounded loading of subreddit feeds.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{AppError, Result};
use crate::models::{Config, Post, Subreddit};
use crate::pipeline::normalize::{deduplicate, normalize};
use crate::services::{FetchResult, PostCache, PostFetcher, RedditApi};

/// How a feed load ended.
#[derive(Debug)]
pub enum FetchOutcome {
    Posts(Arc<FetchResult>),
    /// The fetch completed but collected nothing
    Empty,
    /// Credentials were rejected or the token endpoint failed
    AuthFailed(String),
    /// The overall time budget ran out
    TimedOut,
    Failed(AppError),
}

impl FetchOutcome {
    fn from_result(result: Result<Arc<FetchResult>>) -> Self {
        match result {
            Ok(posts) => Self::Posts(posts),
            Err(AppError::EmptyResult { .. }) => Self::Empty,
            Err(AppError::Auth(message)) => Self::AuthFailed(message),
            Err(AppError::Timeout { .. }) => Self::TimedOut,
            Err(other) => Self::Failed(other),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Posts(_))
    }

    /// Every failure kind may be retried by loading again.
    pub fn is_retryable(&self) -> bool {
        !self.is_success()
    }

    /// Convert back into a plain result.
    ///
    /// `subreddit` and `timeout` fill in the error variants that carry no
    /// payload of their own.
    pub fn into_result(self, subreddit: Subreddit, timeout: Duration) -> Result<Arc<FetchResult>> {
        match self {
            Self::Posts(posts) => Ok(posts),
            Self::Empty => Err(AppError::empty(subreddit)),
            Self::AuthFailed(message) => Err(AppError::Auth(message)),
            Self::TimedOut => Err(AppError::Timeout {
                seconds: timeout.as_secs(),
            }),
            Self::Failed(error) => Err(error),
        }
    }
}

/// Fetches, cleans and caches the posts of the tracked subreddits.
pub struct Feed<A> {
    fetcher: PostFetcher<A>,
    cache: PostCache,
    max_posts: usize,
    timeout: Duration,
}

impl<A: RedditApi> Feed<A> {
    pub fn new(api: A, config: &Config) -> Self {
        Self {
            fetcher: PostFetcher::new(api, &config.fetch),
            cache: PostCache::new(config.cache.ttl()),
            max_posts: config.fetch.max_posts,
            timeout: config.fetch.overall_timeout(),
        }
    }

    pub fn cache(&self) -> &PostCache {
        &self.cache
    }

    pub fn fetcher(&self) -> &PostFetcher<A> {
        &self.fetcher
    }

    /// Overall time budget of one fetch attempt.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Deduplicated posts of `subreddit`, served from cache while fresh.
    ///
    /// Only non-empty results are cached. When the time budget runs out the
    /// in-flight fetch is dropped.
    pub async fn load(&self, subreddit: Subreddit) -> FetchOutcome {
        self.load_until(subreddit, Instant::now() + self.timeout).await
    }

    /// Like [`Feed::load`], but bounded by an absolute deadline.
    pub async fn load_until(&self, subreddit: Subreddit, deadline: Instant) -> FetchOutcome {
        if Instant::now() >= deadline {
            return self.timed_out(subreddit);
        }
        let fetch = self.cache.get_or_fetch(subreddit, || self.fetch_clean(subreddit));
        match tokio::time::timeout_at(deadline, fetch).await {
            Ok(result) => FetchOutcome::from_result(result),
            Err(_) => self.timed_out(subreddit),
        }
    }

    /// Load several subreddits one after the other within a single budget.
    ///
    /// Once the shared deadline passes, every remaining subreddit reports
    /// [`FetchOutcome::TimedOut`].
    pub async fn load_many(&self, subreddits: &[Subreddit]) -> Vec<(Subreddit, FetchOutcome)> {
        let deadline = Instant::now() + self.timeout;
        let mut outcomes = Vec::with_capacity(subreddits.len());
        for &subreddit in subreddits {
            outcomes.push((subreddit, self.load_until(subreddit, deadline).await));
        }
        outcomes
    }

    /// Load every tracked subreddit within one budget.
    pub async fn load_all(&self) -> Vec<(Subreddit, FetchOutcome)> {
        self.load_many(&Subreddit::ALL).await
    }

    fn timed_out(&self, subreddit: Subreddit) -> FetchOutcome {
        log::warn!(
            "Fetching r/{} timed out after {}s",
            subreddit,
            self.timeout.as_secs()
        );
        FetchOutcome::TimedOut
    }

    async fn fetch_clean(&self, subreddit: Subreddit) -> Result<Vec<Post>> {
        let raw = self.fetcher.fetch_posts(subreddit, self.max_posts).await?;
        let fetched = raw.len();
        let posts = deduplicate(normalize(raw, subreddit));

        if posts.is_empty() {
            log::warn!("No posts fetched from r/{}", subreddit);
            return Err(AppError::empty(subreddit));
        }
        log::info!(
            "r/{}: {} posts after removing {} repeat authors",
            subreddit,
            posts.len(),
            fetched - posts.len()
        );
        Ok(posts)
    }
}
