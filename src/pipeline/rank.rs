// src/pipeline/rank.rs

//! Recency filtering, ordering and pagination of matched posts.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::models::{Post, Recency, SortMode};
use crate::pipeline::normalize::newest_first;
use crate::utils::time::whole_days;

/// Keep posts whose age fits the recency window.
///
/// Posts without a usable date are always kept.
pub fn filter_by_recency<'a>(
    posts: Vec<&'a Post>,
    recency: Recency,
    now: DateTime<Utc>,
) -> Vec<&'a Post> {
    let Some(max_days) = recency.max_days() else {
        return posts;
    };

    posts
        .into_iter()
        .filter(|post| match post.created_at {
            None => true,
            Some(at) => {
                let days = whole_days(at, now);
                match recency {
                    Recency::Today => days == 0,
                    _ => days <= max_days,
                }
            }
        })
        .collect()
}

/// Title used for alphabetical ordering, `None` when the title is blank.
///
/// A leading tag such as `[25F]` is skipped so the title sorts by the text
/// after it. Without a closing bracket, or with nothing after the tag, only
/// the `[` itself is dropped.
fn title_sort_key(title: &str) -> Option<String> {
    let title = title.trim();
    if title.is_empty() {
        return None;
    }
    let key = match title.strip_prefix('[') {
        Some(rest) => match rest.split_once(']') {
            Some((_, after)) if !after.trim().is_empty() => after.trim_start(),
            _ if !rest.is_empty() => rest,
            _ => title,
        },
        None => title,
    };
    Some(key.to_lowercase())
}

/// Order posts in place. The sort is stable.
pub fn sort_posts(posts: &mut [&Post], mode: SortMode) {
    match mode {
        SortMode::Recency => posts.sort_by(|a, b| newest_first(&a.created_at, &b.created_at)),
        SortMode::Title => posts.sort_by_cached_key(|post| {
            // Blank titles sort after every real one.
            let key = title_sort_key(&post.title);
            (key.is_none(), key)
        }),
    }
}

/// Compare two posts the way [`sort_posts`] orders them.
pub fn compare(a: &Post, b: &Post, mode: SortMode) -> Ordering {
    match mode {
        SortMode::Recency => newest_first(&a.created_at, &b.created_at),
        SortMode::Title => {
            let (ka, kb) = (title_sort_key(&a.title), title_sort_key(&b.title));
            (ka.is_none(), ka).cmp(&(kb.is_none(), kb))
        }
    }
}

/// One slice of a result list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    pub posts: Vec<&'a Post>,
    /// Zero-based index after clamping
    pub index: usize,
    pub total_pages: usize,
    pub total_posts: usize,
    pub page_size: usize,
}

impl Page<'_> {
    /// Human-friendly range such as "101-200", 1-based and inclusive.
    pub fn label(&self) -> String {
        page_label(self.index, self.page_size, self.total_posts)
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }
}

/// Label for page `index` of a `total`-post list.
pub fn page_label(index: usize, page_size: usize, total: usize) -> String {
    if total == 0 {
        return "0-0".to_string();
    }
    let start = index * page_size + 1;
    let end = ((index + 1) * page_size).min(total);
    format!("{start}-{end}")
}

/// Number of pages needed for `total` posts, never less than one.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

/// Slice out page `index`, clamping out-of-range indices to the last page.
pub fn paginate<'a>(posts: &[&'a Post], index: usize, page_size: usize) -> Page<'a> {
    let page_size = page_size.max(1);
    let total_pages = page_count(posts.len(), page_size);
    let index = index.min(total_pages - 1);
    let start = (index * page_size).min(posts.len());
    let end = (start + page_size).min(posts.len());

    Page {
        posts: posts[start..end].to_vec(),
        index,
        total_pages,
        total_posts: posts.len(),
        page_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Subreddit;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap()
    }

    fn post(id: &str, title: &str, created_at: Option<DateTime<Utc>>) -> Post {
        Post {
            id: id.into(),
            title: title.into(),
            body: String::new(),
            author: id.into(),
            created_at,
            created_raw: None,
            score: 0,
            num_comments: 0,
            permalink: String::new(),
            subreddit: Subreddit::Penpals,
            flair_text: String::new(),
            over_18: false,
            locked: false,
        }
    }

    fn aged(id: &str, hours: i64) -> Post {
        post(id, id, Some(now() - Duration::hours(hours)))
    }

    fn ids<'a>(posts: &[&'a Post]) -> Vec<&'a str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_recency_windows() {
        let posts = vec![
            aged("hour", 1),
            aged("day", 30),
            aged("week", 7 * 24 + 5),
            aged("eight", 8 * 24 + 1),
            aged("month", 30 * 24 + 3),
            aged("old", 40 * 24),
        ];
        let refs: Vec<&Post> = posts.iter().collect();

        let today = filter_by_recency(refs.clone(), Recency::Today, now());
        assert_eq!(ids(&today), vec!["hour"]);

        let week = filter_by_recency(refs.clone(), Recency::LastWeek, now());
        assert_eq!(ids(&week), vec!["hour", "day", "week"]);

        let month = filter_by_recency(refs.clone(), Recency::LastMonth, now());
        assert_eq!(ids(&month), vec!["hour", "day", "week", "eight", "month"]);

        let all = filter_by_recency(refs, Recency::NoFilter, now());
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn test_undated_posts_pass_every_window() {
        let undated = post("undated", "x", None);
        for recency in [
            Recency::Today,
            Recency::LastWeek,
            Recency::LastMonth,
            Recency::NoFilter,
        ] {
            let kept = filter_by_recency(vec![&undated], recency, now());
            assert_eq!(kept.len(), 1, "{recency:?}");
        }
    }

    #[test]
    fn test_future_post_is_not_today() {
        let future = post("future", "x", Some(now() + Duration::hours(2)));
        assert!(filter_by_recency(vec![&future], Recency::Today, now()).is_empty());
        assert_eq!(filter_by_recency(vec![&future], Recency::LastWeek, now()).len(), 1);
    }

    #[test]
    fn test_sort_by_recency() {
        let posts = vec![aged("b", 5), post("none", "x", None), aged("a", 1), aged("c", 9)];
        let mut refs: Vec<&Post> = posts.iter().collect();
        sort_posts(&mut refs, SortMode::Recency);
        assert_eq!(ids(&refs), vec!["a", "b", "c", "none"]);
    }

    #[test]
    fn test_sort_by_title_skips_leading_bracket() {
        let posts = vec![
            post("bracket", "[25F] hello", None),
            post("apple", "Apple seeks friend", None),
            post("blank", "   ", None),
            post("zebra", "zebra crossing", None),
            post("lone", "[", None),
        ];
        let mut refs: Vec<&Post> = posts.iter().collect();
        sort_posts(&mut refs, SortMode::Title);
        assert_eq!(ids(&refs), vec!["lone", "apple", "bracket", "zebra", "blank"]);
    }

    #[test]
    fn test_compare_matches_sort() {
        let a = post("a", "apple", None);
        let b = post("b", "[banana]", None);
        assert_eq!(compare(&a, &b, SortMode::Title), Ordering::Less);
        assert_eq!(compare(&b, &a, SortMode::Title), Ordering::Greater);
    }

    #[test]
    fn test_paginate_clamps_index() {
        let posts: Vec<Post> = (0..250).map(|i| aged(&format!("p{i}"), i)).collect();
        let refs: Vec<&Post> = posts.iter().collect();

        let last = paginate(&refs, 2, 100);
        let beyond = paginate(&refs, 5, 100);
        assert_eq!(last, beyond);
        assert_eq!(beyond.index, 2);
        assert_eq!(beyond.posts.len(), 50);
        assert_eq!(beyond.total_pages, 3);
        assert_eq!(beyond.label(), "201-250");
        assert!(!beyond.has_next());
        assert!(beyond.has_previous());

        let first = paginate(&refs, 0, 100);
        assert_eq!(first.posts.len(), 100);
        assert_eq!(first.posts[0].id, "p0");
        assert_eq!(first.label(), "1-100");
    }

    #[test]
    fn test_paginate_empty() {
        let page = paginate(&[], 3, 100);
        assert_eq!(page.index, 0);
        assert_eq!(page.total_pages, 1);
        assert!(page.posts.is_empty());
        assert_eq!(page.label(), "0-0");
    }
}
