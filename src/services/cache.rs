// src/services/cache.rs

//! Per-subreddit fetch result cache.
//!
//! Entries expire lazily: a stale entry is only noticed, and replaced, when
//! the subreddit is requested again. Concurrent misses on the same key may
//! each run a fetch; the last one to finish wins.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::Result;
use crate::models::{Post, Subreddit};

/// Posts fetched for one subreddit at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub subreddit: Subreddit,
    pub posts: Vec<Post>,
    /// Wall-clock time the fetch completed
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    result: Arc<FetchResult>,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() >= ttl
    }
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Time-limited memo of fetch results keyed by subreddit.
#[derive(Debug)]
pub struct PostCache {
    entries: RwLock<HashMap<Subreddit, CacheEntry>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PostCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached result for `subreddit` if it has not expired.
    pub async fn get(&self, subreddit: Subreddit) -> Option<Arc<FetchResult>> {
        let entries = self.entries.read().await;
        entries
            .get(&subreddit)
            .filter(|entry| !entry.is_expired(self.ttl))
            .map(|entry| Arc::clone(&entry.result))
    }

    /// Return the cached result or run `fetch` and cache what it returns.
    ///
    /// Errors from `fetch` are passed through and leave the cache untouched.
    pub async fn get_or_fetch<F, Fut>(&self, subreddit: Subreddit, fetch: F) -> Result<Arc<FetchResult>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Post>>>,
    {
        if let Some(result) = self.get(subreddit).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::debug!("Cache hit for r/{}", subreddit);
            return Ok(result);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        log::debug!("Cache miss for r/{}", subreddit);

        // The lock is not held while fetching.
        let posts = fetch().await?;
        let result = Arc::new(FetchResult {
            subreddit,
            posts,
            fetched_at: Utc::now(),
        });

        self.entries.write().await.insert(
            subreddit,
            CacheEntry {
                result: Arc::clone(&result),
                stored_at: Instant::now(),
            },
        );
        Ok(result)
    }

    /// Drop the entry for one subreddit.
    pub async fn invalidate(&self, subreddit: Subreddit) {
        self.entries.write().await.remove(&subreddit);
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use crate::error::AppError;

    const TTL: Duration = Duration::from_secs(20 * 60);

    fn sample_posts(tag: &str) -> Vec<Post> {
        vec![Post {
            id: tag.into(),
            title: format!("post {tag}"),
            body: String::new(),
            author: "alice".into(),
            created_at: None,
            created_raw: None,
            score: 0,
            num_comments: 0,
            permalink: String::new(),
            subreddit: Subreddit::Penpals,
            flair_text: String::new(),
            over_18: false,
            locked: false,
        }]
    }

    async fn load(cache: &PostCache, calls: &AtomicUsize) -> Arc<FetchResult> {
        cache
            .get_or_fetch(Subreddit::Penpals, || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Ok(sample_posts(&format!("fetch{n}")))
            })
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl() {
        let cache = PostCache::new(TTL);
        let calls = AtomicUsize::new(0);

        let first = load(&cache, &calls).await;
        tokio::time::advance(Duration::from_secs(19 * 60)).await;
        let second = load(&cache, &calls).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_after_ttl() {
        let cache = PostCache::new(TTL);
        let calls = AtomicUsize::new(0);

        let first = load(&cache, &calls).await;
        tokio::time::advance(Duration::from_secs(21 * 60)).await;
        let second = load(&cache, &calls).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(first.posts[0].id, "fetch0");
        assert_eq!(second.posts[0].id, "fetch1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_are_not_cached() {
        let cache = PostCache::new(TTL);
        let result = cache
            .get_or_fetch(Subreddit::Penpals, || async { Err(AppError::empty("penpals")) })
            .await;
        assert!(matches!(result, Err(AppError::EmptyResult { .. })));
        assert!(cache.get(Subreddit::Penpals).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let cache = PostCache::new(TTL);
        let calls = AtomicUsize::new(0);
        load(&cache, &calls).await;

        assert!(cache.get(Subreddit::Penpals).await.is_some());
        assert!(cache.get(Subreddit::PenpalsOver30).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_refetch() {
        let cache = PostCache::new(TTL);
        let calls = AtomicUsize::new(0);

        load(&cache, &calls).await;
        cache.invalidate(Subreddit::Penpals).await;
        load(&cache, &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        cache.clear().await;
        assert!(cache.get(Subreddit::Penpals).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_leave_one_entry() {
        let cache = Arc::new(PostCache::new(TTL));
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move { load(&cache, &calls).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let cached = cache.get(Subreddit::Penpals).await.unwrap();
        assert_eq!(cached.posts.len(), 1);
        assert!(calls.load(Ordering::SeqCst) >= 1);
    }
}
