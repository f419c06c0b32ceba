// src/pipeline/matcher.rs

//! Keyword and age matching.
//!
//! Keywords are expanded into a set of lowercase candidate words which are
//! compiled into case-insensitive patterns. Free-text keywords are matched
//! against title and body, age keywords against the title alone.

use std::collections::BTreeSet;
use std::ops::Range;

use regex::{Regex, RegexBuilder};

use crate::error::Result;
use crate::models::{FilterSpec, Post};

/// Words too common to be useful on their own.
pub const STOP_WORDS: &[&str] = &[
    "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is", "are", "was",
    "were", "be", "a", "an", "this", "that", "it", "he", "she",
];

/// Candidates shorter than this are ignored.
const MIN_WORD_LEN: usize = 2;

/// Candidates at least this long also match common suffixed forms.
const PREFIX_MATCH_LEN: usize = 4;

const SUFFIXES: &str = "(?:ing|ed|er|s|ly)?";

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// How a candidate word must be delimited in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    /// Whole word, no suffixes
    Exact,
    /// Word prefix followed by an optional suffix and a word boundary
    Prefix,
    /// Number not touching other digits
    Digits,
}

/// Compiled pattern for a single candidate word.
#[derive(Debug, Clone)]
pub struct WordPattern {
    word: String,
    regex: Regex,
    boundary: Boundary,
}

impl WordPattern {
    /// Compile the pattern for a lowercase candidate word.
    pub fn new(word: &str) -> Result<Self> {
        let escaped = regex::escape(word);
        let boundary = if word.chars().all(|c| c.is_ascii_digit()) {
            Boundary::Digits
        } else if word.chars().count() >= PREFIX_MATCH_LEN {
            Boundary::Prefix
        } else {
            Boundary::Exact
        };
        let pattern = match boundary {
            Boundary::Prefix => format!(r"{escaped}{SUFFIXES}\b"),
            Boundary::Exact | Boundary::Digits => escaped,
        };
        let regex = RegexBuilder::new(&pattern).case_insensitive(true).build()?;

        Ok(Self {
            word: word.to_string(),
            regex,
            boundary,
        })
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    /// Whether the word occurs anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.find_at(text, 0).is_some()
    }

    /// Byte ranges of every non-overlapping occurrence in `text`.
    pub fn find_all(&self, text: &str) -> Vec<Range<usize>> {
        let mut found = Vec::new();
        let mut start = 0;
        while let Some(range) = self.find_at(text, start) {
            start = range.end;
            found.push(range);
        }
        found
    }

    /// First occurrence starting at or after byte offset `start`.
    ///
    /// The regex engine has no look-around, so the leading (and for exact
    /// words, trailing) guard is checked here and the search resumes one
    /// character later when it fails.
    fn find_at(&self, text: &str, mut start: usize) -> Option<Range<usize>> {
        while start <= text.len() {
            let found = self.regex.find_at(text, start)?;
            let before = text[..found.start()].chars().next_back();
            let after = text[found.end()..].chars().next();

            let accepted = match self.boundary {
                Boundary::Prefix => !before.is_some_and(is_word_char),
                Boundary::Exact => {
                    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
                }
                Boundary::Digits => {
                    !before.is_some_and(|c| c.is_ascii_digit())
                        && !after.is_some_and(|c| c.is_ascii_digit())
                }
            };
            if accepted {
                return Some(found.range());
            }

            start = found.start() + text[found.start()..].chars().next().map_or(1, char::len_utf8);
        }
        None
    }
}

/// Candidate words derived from a keyword list.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    patterns: Vec<WordPattern>,
}

impl KeywordSet {
    /// Expand keywords into candidate words and compile them.
    ///
    /// Each keyword contributes its full lowercase form plus every
    /// whitespace-separated token. Candidates shorter than two characters and
    /// stop words are dropped.
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Result<Self> {
        let mut words = BTreeSet::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if keyword.chars().count() < MIN_WORD_LEN {
                continue;
            }
            for token in keyword.split_whitespace() {
                if token.chars().count() >= MIN_WORD_LEN {
                    words.insert(token.to_string());
                }
            }
            words.insert(keyword);
        }
        words.retain(|word| !STOP_WORDS.contains(&word.as_str()));

        // Longest first, so highlighting prefers the most specific word.
        let mut words: Vec<String> = words.into_iter().collect();
        words.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));

        let patterns = words
            .iter()
            .map(|word| WordPattern::new(word))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Candidate words, longest first.
    pub fn words(&self) -> Vec<&str> {
        self.patterns.iter().map(WordPattern::word).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether any candidate word occurs in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(text))
    }

    /// Non-overlapping match ranges, longer candidates taking precedence.
    pub fn match_ranges(&self, text: &str) -> Vec<Range<usize>> {
        let mut taken: Vec<Range<usize>> = Vec::new();
        for pattern in &self.patterns {
            for range in pattern.find_all(text) {
                let overlaps = taken
                    .iter()
                    .any(|t| range.start < t.end && t.start < range.end);
                if !overlaps && !range.is_empty() {
                    taken.push(range);
                }
            }
        }
        taken.sort_by_key(|r| r.start);
        taken
    }
}

/// Decides whether posts satisfy a [`FilterSpec`].
///
/// When both keywords and an age range are given a post must satisfy both.
/// With neither, every post passes.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    keywords: Option<KeywordSet>,
    ages: Option<KeywordSet>,
}

impl Matcher {
    /// Compile the keyword and age patterns of a filter.
    pub fn new(spec: &FilterSpec) -> Result<Self> {
        let keywords: Vec<&str> = spec
            .keywords
            .iter()
            .map(|kw| kw.trim())
            .filter(|kw| !kw.is_empty())
            .collect();
        if let Some(range) = &spec.age_range {
            range.validate()?;
        }
        let ages = spec.age_keywords();

        Ok(Self {
            keywords: (!keywords.is_empty())
                .then(|| KeywordSet::new(&keywords))
                .transpose()?,
            ages: (!ages.is_empty()).then(|| KeywordSet::new(&ages)).transpose()?,
        })
    }

    /// Whether the filter has anything to check.
    pub fn is_active(&self) -> bool {
        self.keywords.is_some() || self.ages.is_some()
    }

    /// Whether `post` passes the keyword and age filters.
    pub fn matches(&self, post: &Post) -> bool {
        let keyword_ok = self
            .keywords
            .as_ref()
            .is_none_or(|set| set.is_match(&post.full_text()));
        let age_ok = self
            .ages
            .as_ref()
            .is_none_or(|set| set.is_match(&post.title));
        keyword_ok && age_ok
    }

    /// Keep only the posts that match.
    pub fn filter<'a>(&self, posts: impl IntoIterator<Item = &'a Post>) -> Vec<&'a Post> {
        posts.into_iter().filter(|post| self.matches(post)).collect()
    }

    /// Wrap every free-text keyword hit in `text` with the given markers.
    ///
    /// Original casing of the matched text is kept. Age keywords are not
    /// highlighted.
    pub fn highlight(&self, text: &str, open: &str, close: &str) -> String {
        let Some(set) = &self.keywords else {
            return text.to_string();
        };

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for range in set.match_ranges(text) {
            out.push_str(&text[cursor..range.start]);
            out.push_str(open);
            out.push_str(&text[range.clone()]);
            out.push_str(close);
            cursor = range.end;
        }
        out.push_str(&text[cursor..]);
        out
    }
}
