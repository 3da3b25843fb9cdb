//! Date-range and tag filtering.

use crate::date::Date;
use crate::entry::{LogCollection, LogEntry, Tag};

/// A conjunction of optional constraints. An empty filter accepts everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Inclusive lower bound.
    pub from: Option<Date>,
    /// Inclusive upper bound.
    pub to: Option<Date>,
    /// Entries must carry this tag.
    pub tag: Option<Tag>,
}

impl EntryFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none() && self.tag.is_none()
    }

    /// Returns true if `entry` satisfies every constraint.
    pub fn accepts(&self, entry: &LogEntry) -> bool {
        self.from.is_none_or(|from| entry.date >= from)
            && self.to.is_none_or(|to| entry.date <= to)
            && self.tag.as_ref().is_none_or(|tag| entry.has_tag(tag))
    }

    /// Builds a new collection of the accepted entries, in order.
    pub fn apply(&self, entries: &LogCollection) -> LogCollection {
        let filtered: LogCollection = entries
            .iter()
            .filter(|entry| self.accepts(entry))
            .cloned()
            .collect();
        tracing::debug!(
            kept = filtered.len(),
            dropped = entries.len() - filtered.len(),
            "filtered entries"
        );
        filtered
    }
}
