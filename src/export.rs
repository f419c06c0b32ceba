// src/export.rs

//! CSV export of fetched posts and import of such files for offline search.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::models::{Post, RawPost};

/// Column set of an export file, in order.
pub const EXPORT_FIELDS: [&str; 11] = [
    "id",
    "title",
    "author",
    "created_time",
    "score",
    "num_comments",
    "permalink",
    "selftext",
    "flair_text",
    "over_18",
    "locked",
];

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: &'a str,
    title: &'a str,
    author: &'a str,
    created_time: String,
    score: i64,
    num_comments: i64,
    permalink: &'a str,
    selftext: &'a str,
    flair_text: &'a str,
    over_18: bool,
    locked: bool,
}

impl<'a> From<&'a Post> for ExportRow<'a> {
    fn from(post: &'a Post) -> Self {
        Self {
            id: &post.id,
            title: &post.title,
            author: &post.author,
            created_time: post.created_time().unwrap_or_default(),
            score: post.score,
            num_comments: post.num_comments,
            permalink: &post.permalink,
            selftext: &post.body,
            flair_text: &post.flair_text,
            over_18: post.over_18,
            locked: post.locked,
        }
    }
}

/// Write `posts` as CSV with a header row. Returns the number of rows.
pub fn write_posts<'a, W: Write>(
    writer: W,
    posts: impl IntoIterator<Item = &'a Post>,
) -> Result<usize> {
    // Written by hand so an empty export still carries its header.
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(EXPORT_FIELDS)?;

    let mut count = 0;
    for post in posts {
        csv_writer.serialize(ExportRow::from(post))?;
        count += 1;
    }
    csv_writer.flush()?;
    Ok(count)
}

/// Read posts from CSV. Unknown columns are ignored, missing ones default.
///
/// Rows that cannot be read are skipped with a warning. Only an unreadable
/// header fails the import.
pub fn read_posts<R: Read>(reader: R) -> Result<Vec<RawPost>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    csv_reader.headers()?;

    let posts = csv_reader
        .deserialize::<RawPost>()
        .filter_map(|row| match row {
            Ok(post) => Some(post),
            Err(e) => {
                log::warn!("Skipping malformed CSV row: {}", e);
                None
            }
        })
        .collect();
    Ok(posts)
}

/// Export `posts` to a file at `path`, replacing it if present.
pub fn export_csv<'a>(
    path: impl AsRef<Path>,
    posts: impl IntoIterator<Item = &'a Post>,
) -> Result<usize> {
    let path = path.as_ref();
    let count = write_posts(File::create(path)?, posts)?;
    log::info!("Exported {} posts to {}", count, path.display());
    Ok(count)
}

/// Import a previously exported file.
pub fn import_csv(path: impl AsRef<Path>) -> Result<Vec<RawPost>> {
    let path = path.as_ref();
    let posts = read_posts(File::open(path)?)?;
    log::info!("Imported {} posts from {}", posts.len(), path.display());
    Ok(posts)
}
