//! Per-query filter parameters.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Inclusive age bounds matched against post titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u32,
    pub max: u32,
}

impl AgeRange {
    /// Youngest age a filter may ask for.
    pub const MIN_AGE: u32 = 18;

    /// Oldest age a filter may ask for.
    pub const MAX_AGE: u32 = 99;

    /// Create a range, rejecting inverted or out-of-bounds values.
    pub fn new(min: u32, max: u32) -> Result<Self> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    /// Check the bounds of a range that did not come through [`AgeRange::new`].
    pub fn validate(&self) -> Result<()> {
        if self.min > self.max {
            return Err(AppError::validation(format!(
                "Age range is inverted: {} > {}",
                self.min, self.max
            )));
        }
        if self.min < Self::MIN_AGE || self.max > Self::MAX_AGE {
            return Err(AppError::validation(format!(
                "Age range {}-{} is outside {}-{}",
                self.min,
                self.max,
                Self::MIN_AGE,
                Self::MAX_AGE
            )));
        }
        Ok(())
    }

    /// Every age in the range rendered as a keyword.
    pub fn keywords(&self) -> Vec<String> {
        (self.min..=self.max).map(|age| age.to_string()).collect()
    }
}

/// How far back a post may be to stay in the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recency {
    Today,
    LastWeek,
    LastMonth,
    #[default]
    NoFilter,
}

impl Recency {
    /// Largest whole-day age still accepted, `None` when unbounded.
    pub fn max_days(&self) -> Option<i64> {
        match self {
            Recency::Today => Some(0),
            Recency::LastWeek => Some(7),
            Recency::LastMonth => Some(30),
            Recency::NoFilter => None,
        }
    }
}

impl FromStr for Recency {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace([' ', '_'], "-").as_str() {
            "today" => Ok(Recency::Today),
            "last-week" | "week" => Ok(Recency::LastWeek),
            "last-month" | "month" => Ok(Recency::LastMonth),
            "no-filter" | "none" | "all" | "all-time" => Ok(Recency::NoFilter),
            _ => Err(AppError::validation(format!("Unknown recency filter: {s}"))),
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    /// Newest first
    #[default]
    Recency,
    /// Alphabetical by title, ignoring a leading `[`
    Title,
}

impl FromStr for SortMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "recency" | "date" | "new" => Ok(SortMode::Recency),
            "title" | "alpha" => Ok(SortMode::Title),
            _ => Err(AppError::validation(format!("Unknown sort mode: {s}"))),
        }
    }
}

/// Everything a caller can ask of one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Free-text keywords, matched against title and body
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Age bounds, matched against the title only
    #[serde(default)]
    pub age_range: Option<AgeRange>,

    #[serde(default)]
    pub recency: Recency,

    #[serde(default)]
    pub sort: SortMode,

    /// Zero-based page, clamped by the paginator
    #[serde(default)]
    pub page: usize,
}

impl FilterSpec {
    /// Split comma-separated input into trimmed, non-empty keywords.
    pub fn parse_keywords(input: &str) -> Vec<String> {
        input
            .split(',')
            .map(str::trim)
            .filter(|kw| !kw.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Age keywords for the configured range, empty when no range is set.
    pub fn age_keywords(&self) -> Vec<String> {
        self.age_range.map(|r| r.keywords()).unwrap_or_default()
    }
}
