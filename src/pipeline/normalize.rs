// src/pipeline/normalize.rs

//! Raw post normalization and per-author deduplication.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::models::{DELETED_AUTHOR, Post, RawPost, Subreddit};
use crate::utils::absolute_permalink;
use crate::utils::time::{from_epoch, parse_timestamp};

/// Map raw records onto the canonical [`Post`] schema.
pub fn normalize(raw: Vec<RawPost>, subreddit: Subreddit) -> Vec<Post> {
    raw.into_iter()
        .map(|post| normalize_one(post, subreddit))
        .collect()
}

fn normalize_one(raw: RawPost, subreddit: Subreddit) -> Post {
    // Epoch seconds win when both representations are present.
    let created_at = raw
        .created_utc
        .and_then(from_epoch)
        .or_else(|| raw.created_time.as_deref().and_then(parse_timestamp));

    let author = raw
        .author
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| DELETED_AUTHOR.to_string());

    Post {
        id: raw.id.unwrap_or_default(),
        title: raw.title.unwrap_or_default(),
        body: raw.body.or(raw.selftext).unwrap_or_default(),
        author,
        created_at,
        created_raw: raw.created_time.filter(|t| !t.trim().is_empty()),
        score: raw.score.unwrap_or_default(),
        num_comments: raw.num_comments.unwrap_or_default(),
        permalink: absolute_permalink(raw.permalink.as_deref().unwrap_or_default()),
        subreddit,
        flair_text: raw.flair_text.unwrap_or_default(),
        over_18: raw.over_18.unwrap_or_default(),
        locked: raw.locked.unwrap_or_default(),
    }
}

/// Newest first; undated posts after every dated one.
pub(crate) fn newest_first(a: &Option<DateTime<Utc>>, b: &Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Keep the most recent post per author.
///
/// Posts by `[deleted]` accounts are all kept, since each may be a different
/// person. The result is ordered newest first; ties keep their input order.
pub fn deduplicate(posts: Vec<Post>) -> Vec<Post> {
    let (anonymized, mut named): (Vec<Post>, Vec<Post>) =
        posts.into_iter().partition(Post::is_anonymized);

    named.sort_by(|a, b| newest_first(&a.created_at, &b.created_at));

    let mut seen = HashSet::new();
    let mut result: Vec<Post> = named
        .into_iter()
        .filter(|post| seen.insert(post.author.clone()))
        .collect();
    result.extend(anonymized);

    result.sort_by(|a, b| newest_first(&a.created_at, &b.created_at));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(id: &str, author: &str, epoch: f64) -> RawPost {
        RawPost {
            id: Some(id.into()),
            title: Some(format!("title {id}")),
            author: Some(author.into()),
            created_utc: Some(epoch),
            ..RawPost::default()
        }
    }

    fn posts(raws: Vec<RawPost>) -> Vec<Post> {
        normalize(raws, Subreddit::Penpals)
    }

    fn ids(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_normalize_defaults_missing_fields() {
        let post = normalize_one(RawPost::default(), Subreddit::PenpalsOver30);
        assert_eq!(post.id, "");
        assert_eq!(post.body, "");
        assert_eq!(post.author, DELETED_AUTHOR);
        assert_eq!(post.score, 0);
        assert_eq!(post.created_at, None);
        assert_eq!(post.permalink, "");
        assert_eq!(post.subreddit, Subreddit::PenpalsOver30);
    }

    #[test]
    fn test_normalize_unifies_body_fields() {
        let from_api = RawPost {
            selftext: Some("api body".into()),
            ..RawPost::default()
        };
        let from_export = RawPost {
            body: Some("export body".into()),
            selftext: Some("ignored".into()),
            ..RawPost::default()
        };
        let out = posts(vec![from_api, from_export]);
        assert_eq!(out[0].body, "api body");
        assert_eq!(out[1].body, "export body");
    }

    #[test]
    fn test_normalize_derives_timestamps() {
        let from_string = RawPost {
            created_time: Some("2025-08-24 22:32:22".into()),
            ..RawPost::default()
        };
        let from_epoch = RawPost {
            created_utc: Some(1_756_074_742.0),
            ..RawPost::default()
        };
        let out = posts(vec![from_string, from_epoch]);
        let expected = Utc.with_ymd_and_hms(2025, 8, 24, 22, 32, 22).unwrap();
        assert_eq!(out[0].created_at, Some(expected));
        assert_eq!(out[0].created_utc(), Some(1_756_074_742));
        assert_eq!(out[1].created_time().as_deref(), Some("2025-08-24 22:32:22"));
    }

    #[test]
    fn test_normalize_keeps_unparsable_date_for_display() {
        let odd = RawPost {
            created_time: Some("last tuesday-ish".into()),
            ..RawPost::default()
        };
        let post = normalize_one(odd, Subreddit::Penpals);
        assert_eq!(post.created_at, None);
        assert_eq!(post.created_raw.as_deref(), Some("last tuesday-ish"));
    }

    #[test]
    fn test_normalize_resolves_permalink() {
        let post = normalize_one(
            RawPost {
                permalink: Some("/r/penpals/comments/abc/hi/".into()),
                ..RawPost::default()
            },
            Subreddit::Penpals,
        );
        assert_eq!(post.permalink, "https://reddit.com/r/penpals/comments/abc/hi/");
    }

    #[test]
    fn test_dedup_keeps_newest_per_author() {
        let input = posts(vec![
            raw("old", "alice", 100.0),
            raw("bob1", "bob", 150.0),
            raw("new", "alice", 300.0),
            raw("mid", "alice", 200.0),
        ]);
        let out = deduplicate(input);
        assert_eq!(ids(&out), vec!["new", "bob1"]);
    }

    #[test]
    fn test_dedup_keeps_every_deleted_author_post() {
        let input = posts(vec![
            raw("d1", DELETED_AUTHOR, 100.0),
            raw("a", "alice", 250.0),
            raw("d2", DELETED_AUTHOR, 300.0),
            raw("d3", DELETED_AUTHOR, 200.0),
        ]);
        let out = deduplicate(input);
        assert_eq!(ids(&out), vec!["d2", "a", "d3", "d1"]);
    }

    #[test]
    fn test_dedup_ties_keep_input_order() {
        let input = posts(vec![raw("first", "alice", 100.0), raw("second", "alice", 100.0)]);
        assert_eq!(ids(&deduplicate(input)), vec!["first"]);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let input = posts(vec![
            raw("a1", "alice", 100.0),
            raw("a2", "alice", 400.0),
            raw("d1", DELETED_AUTHOR, 300.0),
            raw("d2", DELETED_AUTHOR, 300.0),
            raw("b1", "bob", 200.0),
            RawPost {
                id: Some("undated".into()),
                author: Some("carol".into()),
                ..RawPost::default()
            },
        ]);
        let once = deduplicate(input);
        let twice = deduplicate(once.clone());
        assert_eq!(once, twice);
        assert_eq!(ids(&once), vec!["a2", "d1", "d2", "b1", "undated"]);
    }
}
