//! Post data structures.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::utils::time::TIMESTAMP_FORMAT;

/// Author value Reddit reports once the poster's account is gone.
pub const DELETED_AUTHOR: &str = "[deleted]";

/// One of the two tracked communities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subreddit {
    Penpals,
    PenpalsOver30,
}

impl Subreddit {
    /// Every tracked community, in display order.
    pub const ALL: [Subreddit; 2] = [Subreddit::Penpals, Subreddit::PenpalsOver30];

    /// Name as it appears in Reddit URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Subreddit::Penpals => "penpals",
            Subreddit::PenpalsOver30 => "penpalsover30",
        }
    }
}

impl Subreddit {
    /// Parse a command-line selection, where "all" means every tracked one.
    pub fn parse_selection(value: &str) -> Result<Vec<Subreddit>, AppError> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(Subreddit::ALL.to_vec());
        }
        Ok(vec![value.parse()?])
    }
}

impl fmt::Display for Subreddit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subreddit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_start_matches("r/").to_lowercase();
        match name.as_str() {
            "penpals" => Ok(Subreddit::Penpals),
            "penpalsover30" => Ok(Subreddit::PenpalsOver30),
            _ => Err(AppError::validation(format!("Unknown subreddit: {s}"))),
        }
    }
}

/// A post as delivered by the listing API or read back from a CSV export.
///
/// Every field is optional or defaulted so that odd payloads degrade into
/// empty values instead of failing the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawPost {
    pub id: Option<String>,
    pub title: Option<String>,
    /// Body text under the name used by exports
    pub body: Option<String>,
    /// Body text under the name used by the API
    pub selftext: Option<String>,
    pub author: Option<String>,
    /// Seconds since the Unix epoch
    pub created_utc: Option<f64>,
    /// Formatted timestamp (`%Y-%m-%d %H:%M:%S`)
    pub created_time: Option<String>,
    pub score: Option<i64>,
    pub num_comments: Option<i64>,
    pub permalink: Option<String>,
    #[serde(alias = "link_flair_text")]
    pub flair_text: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub over_18: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub locked: Option<bool>,
}

/// Accept JSON booleans as well as textual forms such as `True`, `false`,
/// `1` or `0`. Anything unrecognized reads as absent.
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientBool;

    impl<'de> Visitor<'de> for LenientBool {
        type Value = Option<bool>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a boolean or a boolean-like string")
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
            Ok(Some(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(match value {
                0 => Some(false),
                1 => Some(true),
                _ => None,
            })
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            self.visit_i64(value.min(2) as i64)
        }

        fn visit_f64<E: de::Error>(self, _value: f64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(match value.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            })
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, inner: D2) -> Result<Self::Value, D2::Error> {
            inner.deserialize_any(LenientBool)
        }
    }

    deserializer.deserialize_any(LenientBool)
}

/// Canonical post record used throughout the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub body: String,
    pub author: String,
    /// `None` only when neither timestamp representation could be parsed
    pub created_at: Option<DateTime<Utc>>,
    /// Formatted timestamp exactly as received, kept for fallback display
    pub created_raw: Option<String>,
    pub score: i64,
    pub num_comments: i64,
    pub permalink: String,
    pub subreddit: Subreddit,
    pub flair_text: String,
    pub over_18: bool,
    pub locked: bool,
}

impl Post {
    /// Whether the author account has been deleted.
    pub fn is_anonymized(&self) -> bool {
        self.author == DELETED_AUTHOR
    }

    /// Title and body joined for free-text matching.
    pub fn full_text(&self) -> String {
        format!("{} {}", self.title, self.body).trim().to_string()
    }

    /// Creation time formatted as `%Y-%m-%d %H:%M:%S`.
    pub fn created_time(&self) -> Option<String> {
        self.created_at
            .map(|at| at.format(TIMESTAMP_FORMAT).to_string())
            .or_else(|| self.created_raw.clone())
    }

    /// Creation time in seconds since the Unix epoch.
    pub fn created_utc(&self) -> Option<i64> {
        self.created_at.map(|at| at.timestamp())
    }
}
