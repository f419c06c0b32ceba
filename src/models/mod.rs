// src/models/mod.rs

//! Domain models for the penpals library.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod filter;
mod post;

// Re-export all public types
pub use config::{CacheConfig, Config, Credentials, DisplayConfig, FetchConfig, RedditConfig};
pub use filter::{AgeRange, FilterSpec, Recency, SortMode};
pub use post::{DELETED_AUTHOR, Post, RawPost, Subreddit};
