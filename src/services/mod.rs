//! Service layer: Reddit access, paginated fetching and result caching.

pub mod cache;
pub mod fetcher;
pub mod reddit;

pub use cache::{CacheStats, FetchResult, PostCache};
pub use fetcher::PostFetcher;
pub use reddit::{AccessToken, BatchRequest, Listing, RedditApi, RedditClient};
