//! # Document History
//!
//! Bounded, linear undo/redo over serialized document snapshots.
//!
//! ## Design
//!
//! - Every successful mutation appends the new snapshot and moves the cursor to it
//! - Undo/redo/jump only move the cursor; they never add records
//! - A new record after undo discards the redo branch
//! - When a plain append would exceed the limit, the oldest record is dropped
//!
//! Records are independent JSON strings; nothing here points into the live tree.

use tracing::trace;

use crate::errors::HistoryError;

/// Default number of snapshots kept
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHistory {
    records: Vec<String>,

    /// `None` only when the history has been emptied
    position: Option<usize>,

    limit: usize,
}

impl DocumentHistory {
    /// Seed a history with its first snapshot.
    pub fn new(initial: impl Into<String>, limit: usize) -> Result<Self, HistoryError> {
        let initial = initial.into();
        if initial.is_empty() {
            return Err(HistoryError::EmptyInitialHistoryJson {});
        }
        if limit == 0 {
            return Err(HistoryError::InvalidHistoryLimit { limit });
        }

        Ok(Self {
            records: vec![initial],
            position: Some(0),
            limit,
        })
    }

    /// Append a snapshot at the cursor.
    pub fn add(&mut self, record: impl Into<String>) {
        let has_redo_branch = matches!(self.position, Some(p) if p + 1 < self.records.len());

        if has_redo_branch {
            if let Some(position) = self.position {
                self.records.truncate(position + 1);
            }
        } else if self.records.len() >= self.limit {
            self.records.remove(0);
        }

        self.records.push(record.into());
        self.position = Some(self.records.len() - 1);
        trace!(position = ?self.position, len = self.records.len(), "history record added");
    }

    /// Step back one record. `None` when already at the oldest record.
    pub fn undo(&mut self) -> Option<&str> {
        match self.position {
            Some(p) if p > 0 => {
                self.position = Some(p - 1);
                self.records.get(p - 1).map(String::as_str)
            }
            _ => None,
        }
    }

    /// Step forward one record. `None` when already at the newest record.
    pub fn redo(&mut self) -> Option<&str> {
        match self.position {
            Some(p) if p + 1 < self.records.len() => {
                self.position = Some(p + 1);
                self.records.get(p + 1).map(String::as_str)
            }
            _ => None,
        }
    }

    /// Move the cursor to `index`. `Ok(None)` when the cursor is already there.
    pub fn jump_to(&mut self, index: usize) -> Result<Option<&str>, HistoryError> {
        if index >= self.records.len() {
            return Err(HistoryError::HistoryIndexOutOfRange {
                index: i64::try_from(index).unwrap_or(i64::MAX),
                length: self.records.len(),
            });
        }
        if self.position == Some(index) {
            return Ok(None);
        }

        self.position = Some(index);
        Ok(self.records.get(index).map(String::as_str))
    }

    /// Replace every record; the cursor snaps to the last one.
    pub fn set_history(&mut self, records: Vec<String>) {
        self.position = records.len().checked_sub(1);
        self.records = records;
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.position = None;
    }

    pub fn records(&self) -> &[String] {
        &self.records
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Record under the cursor.
    pub fn current(&self) -> Option<&str> {
        self.position
            .and_then(|p| self.records.get(p))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.position, Some(p) if p > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.position, Some(p) if p + 1 < self.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_with(records: &[&str], limit: usize) -> DocumentHistory {
        let mut history = DocumentHistory::new(records[0], limit).unwrap();
        for record in &records[1..] {
            history.add(*record);
        }
        history
    }

    #[test]
    fn test_history_creation() {
        let history = DocumentHistory::new("s0", 10).unwrap();
        assert_eq!(history.records(), &["s0".to_string()]);
        assert_eq!(history.position(), Some(0));
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_creation_errors() {
        assert_eq!(
            DocumentHistory::new("", 10),
            Err(HistoryError::EmptyInitialHistoryJson {})
        );
        assert_eq!(
            DocumentHistory::new("s0", 0),
            Err(HistoryError::InvalidHistoryLimit { limit: 0 })
        );
    }

    #[test]
    fn test_undo_and_redo_move_cursor() {
        let mut history = history_with(&["s0", "s1", "s2"], 10);

        assert_eq!(history.undo(), Some("s1"));
        assert_eq!(history.undo(), Some("s0"));
        assert_eq!(history.undo(), None);
        assert_eq!(history.position(), Some(0));

        assert_eq!(history.redo(), Some("s1"));
        assert_eq!(history.redo(), Some("s2"));
        assert_eq!(history.redo(), None);
        assert_eq!(history.position(), Some(2));
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_add_after_undo_discards_redo_branch() {
        let mut history = history_with(&["s0", "s1", "s2"], 10);
        history.undo();
        history.undo();

        history.add("s3");

        assert_eq!(history.records(), &["s0".to_string(), "s3".to_string()]);
        assert_eq!(history.position(), Some(1));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let history = history_with(&["s0", "s1", "s2", "s3"], 3);

        assert_eq!(
            history.records(),
            &["s1".to_string(), "s2".to_string(), "s3".to_string()]
        );
        assert_eq!(history.position(), Some(2));
    }

    #[test]
    fn test_truncation_skips_eviction() {
        let mut history = history_with(&["s0", "s1", "s2"], 3);
        history.undo();

        history.add("s3");

        assert_eq!(
            history.records(),
            &["s0".to_string(), "s1".to_string(), "s3".to_string()]
        );
    }

    #[test]
    fn test_jump_to() {
        let mut history = history_with(&["s0", "s1", "s2"], 10);

        assert_eq!(history.jump_to(0), Ok(Some("s0")));
        assert_eq!(history.jump_to(0), Ok(None));
        assert_eq!(history.position(), Some(0));
        assert_eq!(
            history.jump_to(3),
            Err(HistoryError::HistoryIndexOutOfRange { index: 3, length: 3 })
        );
    }

    #[test]
    fn test_set_history_and_clear() {
        let mut history = DocumentHistory::new("s0", 10).unwrap();

        history.set_history(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(history.position(), Some(1));
        assert_eq!(history.current(), Some("b"));

        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.position(), None);
        assert_eq!(history.current(), None);

        history.add("fresh");
        assert_eq!(history.position(), Some(0));
    }

    #[test]
    fn test_set_empty_history_resets_cursor() {
        let mut history = DocumentHistory::new("s0", 10).unwrap();
        history.set_history(Vec::new());
        assert_eq!(history.position(), None);
    }
}
