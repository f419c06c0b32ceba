// src/services/fetcher.rs

//! Paginated post fetcher.
//!
//! Walks the "new" listing of a subreddit batch by batch, following the
//! cursor each call returns, until enough posts are collected or the listing
//! runs dry.

use std::time::Duration;

use crate::error::Result;
use crate::models::{FetchConfig, RawPost, Subreddit};
use crate::services::reddit::{AccessToken, BatchRequest, Listing, RedditApi};

/// Largest page the listing endpoint serves.
pub const MAX_BATCH_SIZE: usize = 100;

/// Fetches raw posts through a [`RedditApi`].
pub struct PostFetcher<A> {
    api: A,
    batch_size: usize,
    delay: Duration,
}

impl<A: RedditApi> PostFetcher<A> {
    /// Create a fetcher using the configured batch size and rate-limit delay.
    pub fn new(api: A, config: &FetchConfig) -> Self {
        Self {
            api,
            batch_size: config.batch_size.clamp(1, MAX_BATCH_SIZE),
            delay: config.request_delay(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Collect up to `max_count` of the newest posts of `subreddit`.
    ///
    /// Authentication failures abort the fetch. A failing batch ends the
    /// walk early and whatever was gathered so far is returned.
    pub async fn fetch_posts(&self, subreddit: Subreddit, max_count: usize) -> Result<Vec<RawPost>> {
        let token = self.api.authenticate().await?;

        let mut posts: Vec<RawPost> = Vec::with_capacity(max_count.min(1000));
        let mut after: Option<String> = None;
        let mut batch_num = 0usize;

        while posts.len() < max_count {
            let remaining = max_count - posts.len();
            let request = BatchRequest {
                subreddit,
                limit: remaining.min(self.batch_size),
                after: after.take(),
            };
            batch_num += 1;

            let listing = self.fetch_batch_or_end(&token, &request).await;
            if listing.posts.is_empty() {
                log::debug!("r/{}: batch {} was empty, stopping", subreddit, batch_num);
                break;
            }

            log::debug!(
                "r/{}: batch {} returned {} posts",
                subreddit,
                batch_num,
                listing.posts.len()
            );
            posts.extend(listing.posts);
            after = listing.after;

            if after.is_none() || posts.len() >= max_count {
                break;
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        posts.truncate(max_count);
        log::info!("r/{}: fetched {} posts in {} batches", subreddit, posts.len(), batch_num);
        Ok(posts)
    }

    /// Run one listing call, turning any failure into an empty final page.
    async fn fetch_batch_or_end(&self, token: &AccessToken, request: &BatchRequest) -> Listing {
        match self.api.fetch_batch(token, request).await {
            Ok(listing) => listing,
            Err(error) => {
                log::warn!("Failed to fetch listing batch for r/{}: {}", request.subreddit, error);
                Listing::default()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::AppError;

    /// In-memory listing served in fixed pages.
    pub(crate) struct FakeApi {
        pub pages: Vec<Vec<RawPost>>,
        pub fail_auth: bool,
        /// Zero-based call index that fails, if any
        pub fail_on_call: Option<usize>,
        pub auth_calls: AtomicUsize,
        pub requests: Mutex<Vec<BatchRequest>>,
    }

    impl FakeApi {
        pub fn with_posts(total: usize, page_size: usize) -> Self {
            let all: Vec<RawPost> = (0..total)
                .map(|i| RawPost {
                    id: Some(format!("p{i}")),
                    title: Some(format!("Post {i}")),
                    author: Some(format!("user{i}")),
                    created_utc: Some(1_700_000_000.0 - i as f64 * 60.0),
                    ..RawPost::default()
                })
                .collect();
            Self {
                pages: all.chunks(page_size.max(1)).map(|c| c.to_vec()).collect(),
                fail_auth: false,
                fail_on_call: None,
                auth_calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RedditApi for FakeApi {
        async fn authenticate(&self) -> Result<AccessToken> {
            self.auth_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_auth {
                return Err(AppError::auth("401 Unauthorized"));
            }
            Ok(AccessToken::new("token"))
        }

        async fn fetch_batch(&self, _token: &AccessToken, request: &BatchRequest) -> Result<Listing> {
            let call = {
                let mut requests = self.requests.lock().unwrap();
                requests.push(request.clone());
                requests.len() - 1
            };
            if self.fail_on_call == Some(call) {
                return Err(AppError::fetch("fake", "503 Service Unavailable"));
            }

            let page = match request.after.as_deref() {
                None => 0,
                Some(cursor) => cursor.trim_start_matches("page").parse::<usize>().unwrap(),
            };
            let posts: Vec<RawPost> = self
                .pages
                .get(page)
                .map(|p| p.iter().take(request.limit).cloned().collect())
                .unwrap_or_default();
            let after = (page + 1 < self.pages.len()).then(|| format!("page{}", page + 1));
            Ok(Listing { posts, after })
        }
    }

    fn config() -> FetchConfig {
        FetchConfig::default()
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_requested_total() {
        let fetcher = PostFetcher::new(FakeApi::with_posts(1000, 100), &config());
        let posts = fetcher.fetch_posts(Subreddit::Penpals, 250).await.unwrap();

        assert_eq!(posts.len(), 250);
        let requests = fetcher.api().requests.lock().unwrap().clone();
        let limits: Vec<usize> = requests.iter().map(|r| r.limit).collect();
        assert_eq!(limits, vec![100, 100, 50]);
        assert_eq!(requests[0].after, None);
        assert_eq!(requests[1].after.as_deref(), Some("page1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_cursor_exhausted() {
        let fetcher = PostFetcher::new(FakeApi::with_posts(150, 100), &config());
        let posts = fetcher.fetch_posts(Subreddit::Penpals, 1000).await.unwrap();

        assert_eq!(posts.len(), 150);
        assert_eq!(fetcher.api().request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_failure_returns_partial_results() {
        let mut api = FakeApi::with_posts(500, 100);
        api.fail_on_call = Some(2);
        let fetcher = PostFetcher::new(api, &config());
        let posts = fetcher.fetch_posts(Subreddit::PenpalsOver30, 1000).await.unwrap();

        assert_eq!(posts.len(), 200);
        assert_eq!(fetcher.api().request_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_batch_failure_yields_empty() {
        let mut api = FakeApi::with_posts(500, 100);
        api.fail_on_call = Some(0);
        let fetcher = PostFetcher::new(api, &config());
        let posts = fetcher.fetch_posts(Subreddit::Penpals, 1000).await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_failure_aborts() {
        let mut api = FakeApi::with_posts(10, 100);
        api.fail_auth = true;
        let fetcher = PostFetcher::new(api, &config());
        let result = fetcher.fetch_posts(Subreddit::Penpals, 100).await;

        assert!(matches!(result, Err(AppError::Auth(_))));
        assert_eq!(fetcher.api().request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_batches_only() {
        let fetcher = PostFetcher::new(FakeApi::with_posts(300, 100), &config());
        let start = tokio::time::Instant::now();
        let posts = fetcher.fetch_posts(Subreddit::Penpals, 300).await.unwrap();

        assert_eq!(posts.len(), 300);
        // Three batches, two pauses; none after the last batch.
        assert_eq!(start.elapsed(), Duration::from_millis(1200));
    }
}
