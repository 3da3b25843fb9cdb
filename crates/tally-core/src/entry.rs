//! Parsed log entries and the collections that hold them.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::date::Date;
use crate::span::TimeSpan;

/// Validation errors for tags.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TagError {
    #[error("tag cannot be empty")]
    Empty,

    #[error("tag '{value}' contains whitespace")]
    Whitespace { value: String },
}

/// A normalized tag name: no leading `#`, non-empty, no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    /// Creates a tag, stripping a single leading `#` if present.
    pub fn new(name: impl Into<String>) -> Result<Self, TagError> {
        let name = name.into();
        let name = match name.strip_prefix('#') {
            Some(stripped) => stripped.to_string(),
            None => name,
        };
        if name.is_empty() {
            return Err(TagError::Empty);
        }
        if name.chars().any(|c| c.is_ascii_whitespace()) {
            return Err(TagError::Whitespace { value: name });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Tag {
    type Error = TagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}

impl std::str::FromStr for Tag {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One time entry from a log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub date: Date,
    pub span: TimeSpan,
    /// Free text before the first tag; `None` when nothing remains.
    pub description: Option<String>,
    /// Tags in order of appearance. Duplicates are kept.
    pub tags: Vec<Tag>,
    /// Percentage annotation in 0-100; 0 when absent.
    pub percentage: u8,
    /// 1-based line in the source text, 0 when unknown.
    pub line_number: usize,
}

impl LogEntry {
    #[must_use]
    pub const fn duration_minutes(&self) -> u32 {
        self.span.duration_minutes()
    }

    /// Returns true if any tag matches `tag` exactly.
    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// An append-only, ordered sequence of entries from one parse or scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogCollection {
    entries: Vec<LogEntry>,
}

impl LogCollection {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// Appends every entry of `other`, preserving its order.
    pub fn append(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Sum of all entry durations.
    pub fn total_minutes(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| u64::from(e.duration_minutes()))
            .sum()
    }
}

impl FromIterator<LogEntry> for LogCollection {
    fn from_iter<I: IntoIterator<Item = LogEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a LogCollection {
    type Item = &'a LogEntry;
    type IntoIter = std::slice::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for LogCollection {
    type Item = LogEntry;
    type IntoIter = std::vec::IntoIter<LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_strips_hash_and_rejects_bad_input() {
        assert_eq!(Tag::new("#work").unwrap().as_str(), "work");
        assert_eq!(Tag::new("work").unwrap().as_str(), "work");
        assert_eq!(Tag::new(""), Err(TagError::Empty));
        assert_eq!(Tag::new("#"), Err(TagError::Empty));
        assert!(Tag::new("two words").is_err());
        assert!(Tag::new("tab\there").is_err());
    }

    #[test]
    fn tag_serde_roundtrip() {
        let tag = Tag::new("client-a").unwrap();
        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(json, "\"client-a\"");
        let parsed: Tag = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tag);
        assert!(serde_json::from_str::<Tag>("\"\"").is_err());
    }
}
