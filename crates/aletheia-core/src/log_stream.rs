//! Append-only narration log
//!
//! Insertion order is display order. Entries are never removed or
//! reordered after append; the whole stream is only cleared when a new
//! run begins.

use crate::error::LogStreamError;
use crate::types::{Agent, LogEntry, LogEntryId};
use chrono::Utc;
use serde::Serialize;

/// Ordered record of narration entries for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LogStream {
    entries: Vec<LogEntry>,
}

impl LogStream {
    /// Create an empty stream
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a prebuilt entry
    ///
    /// # Errors
    /// - `LogStreamError::TimestampRegression` if the entry is older than
    ///   the last appended one
    pub fn append(&mut self, entry: LogEntry) -> Result<LogEntryId, LogStreamError> {
        if let Some(last) = self.entries.last() {
            if entry.timestamp() < last.timestamp() {
                return Err(LogStreamError::TimestampRegression);
            }
        }
        let id = entry.id();
        self.entries.push(entry);
        Ok(id)
    }

    /// Create and append an entry stamped now
    ///
    /// The stamp never goes below the previous entry's, even if the wall
    /// clock steps backwards.
    pub fn record(&mut self, agent: Agent, message: impl Into<String>) -> &LogEntry {
        let now = Utc::now();
        let timestamp = match self.entries.last() {
            Some(last) if last.timestamp() > now => last.timestamp(),
            _ => now,
        };
        self.entries.push(LogEntry::at(agent, message, timestamp));
        &self.entries[self.entries.len() - 1]
    }

    /// All entries in display order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Iterate entries in display order
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.entries.iter()
    }

    /// Most recent entry
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been appended
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Reserved for the start of a new run.
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a LogStream {
    type Item = &'a LogEntry;
    type IntoIter = std::slice::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn record_preserves_order() {
        let mut log = LogStream::new();
        log.record(Agent::System, "first");
        log.record(Agent::Consensus, "second");
        log.record(Agent::Skeptic, "third");

        let messages: Vec<_> = log.iter().map(LogEntry::message).collect();
        assert_eq!(messages, ["first", "second", "third"]);
        assert_eq!(log.last().map(LogEntry::agent), Some(Agent::Skeptic));
    }

    #[test]
    fn timestamps_never_decrease() {
        let mut log = LogStream::new();
        for i in 0..50 {
            log.record(Agent::System, format!("entry {i}"));
        }
        assert!(log
            .entries()
            .windows(2)
            .all(|w| w[0].timestamp() <= w[1].timestamp()));
    }

    #[test]
    fn record_clamps_behind_future_entry() {
        let mut log = LogStream::new();
        let future = Utc::now() + Duration::seconds(30);
        log.append(LogEntry::at(Agent::System, "ahead", future)).unwrap();

        let entry = log.record(Agent::System, "now");
        assert_eq!(entry.timestamp(), future);
    }

    #[test]
    fn append_rejects_regression() {
        let mut log = LogStream::new();
        let now = Utc::now();
        log.append(LogEntry::at(Agent::System, "a", now)).unwrap();
        let err = log
            .append(LogEntry::at(Agent::System, "b", now - Duration::seconds(1)))
            .unwrap_err();
        assert_eq!(err, LogStreamError::TimestampRegression);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn ids_are_unique() {
        let mut log = LogStream::new();
        let a = log.record(Agent::System, "a").id();
        let b = log.record(Agent::System, "b").id();
        assert_ne!(a, b);
    }

    #[test]
    fn clear_empties_stream() {
        let mut log = LogStream::new();
        log.record(Agent::System, "a");
        log.clear();
        assert!(log.is_empty());
    }
}
