//! Bounded undo history of full pre-mutation snapshots.
//!
//! Every mutating warehouse call records a complete snapshot of the affected
//! room's slot array and the pending-items list before it touches anything.
//! Undo is a wholesale restore of that snapshot, correct regardless of how
//! complex the original mutation was. Snapshots share the store's `Arc`, so
//! recording one is O(1).

use std::collections::VecDeque;

use crate::model::HistoryEntry;

/// Default depth of the undo stack.
pub const DEFAULT_HISTORY_DEPTH: usize = 10;

/// Bounded stack of undo snapshots.
///
/// Pushing past the bound silently discards the oldest entry.
#[derive(Clone, Debug)]
pub struct HistoryManager {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryManager {
    /// Creates a history manager with the given depth (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Creates a history manager with the default depth.
    pub fn with_default_depth() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }

    /// Pushes a snapshot, evicting the oldest entry past the bound.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Pops the most recent snapshot, consuming it.
    ///
    /// # Returns
    /// `None` when there is nothing to undo (informational, not an error).
    pub fn pop_latest(&mut self) -> Option<HistoryEntry> {
        self.entries.pop_back()
    }

    /// Current number of undoable entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured depth bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::with_default_depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HistoryKind, Room, Slot};
    use crate::types::GridPos;
    use std::sync::Arc;

    fn entry(description: &str) -> HistoryEntry {
        let room = Room::new("Godown A", "GA", 2, 2).unwrap();
        let slots = vec![Slot::empty(&room, GridPos::new(1, 1))];
        HistoryEntry::new(
            HistoryKind::Allocation,
            room.id,
            Arc::new(slots),
            Vec::new(),
            description,
        )
    }

    #[test]
    fn pop_returns_entries_newest_first() {
        let mut history = HistoryManager::with_default_depth();
        history.record(entry("first"));
        history.record(entry("second"));

        assert_eq!(history.pop_latest().unwrap().description, "second");
        assert_eq!(history.pop_latest().unwrap().description, "first");
        assert!(history.pop_latest().is_none());
    }

    #[test]
    fn recording_past_the_bound_evicts_the_oldest_silently() {
        let mut history = HistoryManager::new(3);
        for i in 0..5 {
            history.record(entry(&format!("op-{}", i)));
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.pop_latest().unwrap().description, "op-4");
        assert_eq!(history.pop_latest().unwrap().description, "op-3");
        assert_eq!(history.pop_latest().unwrap().description, "op-2");
        assert!(history.pop_latest().is_none());
    }

    #[test]
    fn default_depth_is_ten() {
        let mut history = HistoryManager::with_default_depth();
        assert_eq!(history.capacity(), DEFAULT_HISTORY_DEPTH);
        for i in 0..12 {
            history.record(entry(&format!("op-{}", i)));
        }
        assert_eq!(history.len(), 10);
    }

    #[test]
    fn capacity_has_a_floor_of_one() {
        let history = HistoryManager::new(0);
        assert_eq!(history.capacity(), 1);
    }
}
