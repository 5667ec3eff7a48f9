//! Undo History
//!
//! Bounded linear log of full content snapshots with a cursor at the
//! displayed entry.

use tracing::debug;

/// Default number of retained snapshots
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Snapshot history
#[derive(Debug, Clone)]
pub struct History<S> {
    entries: Vec<S>,
    cursor: usize,
    limit: usize,
}

impl<S: Clone + PartialEq> History<S> {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Record a snapshot after a mutation.
    ///
    /// Returns `false` when the snapshot equals the displayed entry.
    pub fn record(&mut self, snapshot: S) -> bool {
        if self.current() == Some(&snapshot) {
            return false;
        }

        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(snapshot);
        self.cursor = self.entries.len() - 1;

        if self.entries.len() > self.limit {
            self.entries.remove(0);
            self.cursor -= 1;
        }

        debug!("History recorded: {} entries, cursor {}", self.entries.len(), self.cursor);
        true
    }

    /// Step back one entry
    pub fn undo(&mut self) -> Option<&S> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        debug!("Undo to entry {}", self.cursor);
        self.entries.get(self.cursor)
    }

    /// Step forward one entry
    pub fn redo(&mut self) -> Option<&S> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        debug!("Redo to entry {}", self.cursor);
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Displayed entry
    pub fn current(&self) -> Option<&S> {
        self.entries.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

impl<S: Clone + PartialEq> Default for History<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_dedupes_adjacent() {
        let mut history = History::new();
        assert!(history.record("a".to_string()));
        assert!(!history.record("a".to_string()));
        assert_eq!(history.len(), 1);
        assert!(history.record("b".to_string()));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_bounded_history_evicts_oldest() {
        let mut history = History::new();
        for i in 0..60 {
            history.record(i);
        }
        assert_eq!(history.len(), 50);
        assert_eq!(history.cursor(), 49);
        assert_eq!(history.current(), Some(&59));

        let mut oldest = None;
        while let Some(entry) = history.undo() {
            oldest = Some(*entry);
        }
        assert_eq!(oldest, Some(10));
    }

    #[test]
    fn test_undo_then_record_drops_redo() {
        let mut history = History::new();
        history.record(1);
        history.record(2);
        history.record(3);

        assert_eq!(history.undo(), Some(&2));
        history.record(4);
        assert!(history.redo().is_none());
        assert_eq!(history.len(), 3);
        assert_eq!(history.current(), Some(&4));
    }

    #[test]
    fn test_undo_redo_bounds() {
        let mut history: History<u32> = History::new();
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());

        history.record(1);
        assert!(history.undo().is_none());
        history.record(2);
        assert_eq!(history.undo(), Some(&1));
        assert_eq!(history.redo(), Some(&2));
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_record_equal_to_displayed_after_undo() {
        let mut history = History::new();
        history.record(1);
        history.record(2);
        history.undo();
        assert!(!history.record(1));
        assert!(history.can_redo());
    }

    #[test]
    fn test_small_limit() {
        let mut history = History::with_limit(2);
        history.record(1);
        history.record(2);
        history.record(3);
        assert_eq!(history.len(), 2);
        assert_eq!(history.cursor(), 1);
        assert_eq!(history.undo(), Some(&2));
    }
}
