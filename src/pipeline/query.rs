// src/pipeline/query.rs

//! One search over a loaded feed: match, window, order, page.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{FilterSpec, Post, Subreddit};
use crate::pipeline::matcher::Matcher;
use crate::pipeline::rank::{Page, filter_by_recency, paginate, sort_posts};

/// A page of results plus the matcher that produced it, for highlighting.
#[derive(Debug)]
pub struct QueryResult<'a> {
    pub page: Page<'a>,
    pub matcher: Matcher,
    /// Posts that passed every filter, across all pages
    pub matched: usize,
}

/// Run `spec` against `posts`.
///
/// `now` anchors the recency window so results are reproducible.
pub fn run_query<'a>(
    posts: &'a [Post],
    spec: &FilterSpec,
    page_size: usize,
    now: DateTime<Utc>,
) -> Result<QueryResult<'a>> {
    let matcher = Matcher::new(spec)?;
    let matched = matcher.filter(posts);
    Ok(rank(posts.len(), matched, matcher, spec, page_size, now))
}

fn rank<'a>(
    total: usize,
    matched: Vec<&'a Post>,
    matcher: Matcher,
    spec: &FilterSpec,
    page_size: usize,
    now: DateTime<Utc>,
) -> QueryResult<'a> {
    let mut kept = filter_by_recency(matched, spec.recency, now);
    sort_posts(&mut kept, spec.sort);

    log::debug!(
        "Query kept {} of {} posts (keywords: {:?}, ages: {:?}, recency: {:?})",
        kept.len(),
        total,
        spec.keywords,
        spec.age_range,
        spec.recency
    );

    QueryResult {
        page: paginate(&kept, spec.page, page_size),
        matcher,
        matched: kept.len(),
    }
}

/// Run `spec` separately for each subreddit in `subreddits`.
///
/// Every subreddit gets its own ranking and page; posts from other
/// subreddits are ignored.
pub fn run_query_per_subreddit<'a>(
    posts: &'a [Post],
    subreddits: &[Subreddit],
    spec: &FilterSpec,
    page_size: usize,
    now: DateTime<Utc>,
) -> Result<Vec<(Subreddit, QueryResult<'a>)>> {
    subreddits
        .iter()
        .map(|&subreddit| {
            let matcher = Matcher::new(spec)?;
            let matched = matcher.filter(posts.iter().filter(|p| p.subreddit == subreddit));
            let result = rank(posts.len(), matched, matcher, spec, page_size, now);
            Ok((subreddit, result))
        })
        .collect()
}
