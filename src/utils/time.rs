// src/utils/time.rs

//! Timestamp parsing and human-readable post ages.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

/// Format used for `created_time` strings in exports.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SECONDS_PER_DAY: i64 = 86_400;

/// Parse a formatted timestamp.
///
/// Accepts `%Y-%m-%d %H:%M:%S` (read as UTC) and RFC 3339.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        })
}

/// Convert epoch seconds (possibly fractional) into a UTC timestamp.
pub fn from_epoch(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.trunc() as i64;
    let nanos = ((seconds - seconds.trunc()) * 1e9).round() as u32;
    DateTime::from_timestamp(whole, nanos.min(999_999_999))
}

/// Whole days elapsed from `then` to `now`, rounded towards negative infinity.
///
/// Timestamps in the future yield negative values.
pub fn whole_days(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - then).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Render the age of a post as "3 days ago" and similar.
pub fn relative_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff: TimeDelta = now - then;
    let seconds = diff.num_seconds();
    let minutes = seconds.div_euclid(60);
    let hours = minutes.div_euclid(60);
    let days = seconds.div_euclid(SECONDS_PER_DAY);
    let weeks = days / 7;
    let months = days / 30;
    let years = days / 365;

    if seconds < 60 {
        "just now".to_string()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days < 7 {
        plural(days, "day")
    } else if weeks < 4 {
        plural(weeks, "week")
    } else if months < 12 {
        plural(months, "month")
    } else {
        plural(years, "year")
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

/// Date label for a post, falling back to the raw timestamp string.
pub fn display_date(
    created_at: Option<DateTime<Utc>>,
    raw: Option<&str>,
    now: DateTime<Utc>,
) -> String {
    match (created_at, raw) {
        (Some(at), _) => relative_age(at, now),
        (None, Some(raw)) if raw.chars().count() > 8 => raw.chars().take(10).collect(),
        _ => "Unknown date".to_string(),
    }
}

/// Coarse age bucket used to color date badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Posted today or yesterday
    Fresh,
    /// Up to a month old
    Recent,
    /// Older than a month
    Stale,
}

impl Freshness {
    /// Classify a post age. Undated posts count as fresh.
    pub fn classify(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(at) = created_at else {
            return Freshness::Fresh;
        };
        match whole_days(at, now) {
            days if days <= 1 => Freshness::Fresh,
            days if days <= 30 => Freshness::Recent,
            _ => Freshness::Stale,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Freshness::Fresh => "fresh",
            Freshness::Recent => "recent",
            Freshness::Stale => "stale",
        }
    }
}
