use std::collections::VecDeque;
use std::sync::Arc;

use crate::spec::Schema;

/// Immutable capture of a past schema. Shared between the stacks and the
/// store, never mutated.
pub type Snapshot = Arc<Schema>;

/// Bounded linear undo/redo history.
///
/// `past` runs oldest to newest and `future` nearest to farthest. Each stack
/// keeps at most `capacity` snapshots; the oldest past entry is evicted
/// first. A capacity of zero disables history.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Snapshot>,
    future: VecDeque<Snapshot>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            past: VecDeque::with_capacity(capacity),
            future: VecDeque::new(),
            capacity,
        }
    }

    /// Rebuilds a history from stored stacks, dropping whatever exceeds
    /// `capacity` (oldest past, farthest future).
    pub fn from_parts(past: Vec<Snapshot>, future: Vec<Snapshot>, capacity: usize) -> Self {
        let mut past: VecDeque<_> = past.into();
        while past.len() > capacity {
            past.pop_front();
        }
        let mut future: VecDeque<_> = future.into();
        future.truncate(capacity);
        Self {
            past,
            future,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past(&self) -> impl ExactSizeIterator<Item = &Snapshot> {
        self.past.iter()
    }

    pub fn future(&self) -> impl ExactSizeIterator<Item = &Snapshot> {
        self.future.iter()
    }

    /// Records `previous` as the state before a new mutation. The redo
    /// stack is discarded.
    pub fn record(&mut self, previous: Snapshot) {
        self.future.clear();
        if self.capacity == 0 {
            return;
        }
        if self.past.len() == self.capacity {
            self.past.pop_front();
        }
        self.past.push_back(previous);
    }

    /// Swaps `present` with the newest past snapshot. `false` when there is
    /// nothing to undo.
    pub fn undo(&mut self, present: &mut Snapshot) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let current = std::mem::replace(present, previous);
        self.future.push_front(current);
        self.future.truncate(self.capacity);
        true
    }

    /// Swaps `present` with the nearest future snapshot.
    pub fn redo(&mut self, present: &mut Snapshot) -> bool {
        let Some(next) = self.future.pop_front() else {
            return false;
        };
        let current = std::mem::replace(present, next);
        if self.past.len() == self.capacity {
            self.past.pop_front();
        }
        self.past.push_back(current);
        true
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(super::config::DEFAULT_HISTORY_CAPACITY)
    }
}
