//! Post processing pipeline.
//!
//! - `fetch`: cached, time-bounded feed loading
//! - `normalize`: raw record cleanup and per-author deduplication
//! - `matcher`: keyword and age matching
//! - `rank`: recency window, ordering and pagination
//! - `query`: one search over a loaded feed

pub mod fetch;
pub mod matcher;
pub mod normalize;
pub mod query;
pub mod rank;

pub use fetch::{Feed, FetchOutcome};
pub use matcher::{KeywordSet, Matcher, WordPattern};
pub use normalize::{deduplicate, normalize};
pub use query::{QueryResult, run_query, run_query_per_subreddit};
pub use rank::{Page, filter_by_recency, paginate, sort_posts};
