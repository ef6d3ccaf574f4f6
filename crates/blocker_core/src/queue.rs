use std::collections::VecDeque;

use crate::{Identity, MatchResult, NodeHandle, Record};

/// A matched record waiting for the moderation action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub identity: Identity,
    pub record: Record,
    pub matched: MatchResult,
    /// Transient reference into the tree; may be gone by the time the entry is dequeued.
    pub node: NodeHandle,
}

/// Strict FIFO of pending entries. Deduplication happens upstream through the processed set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionQueue {
    entries: VecDeque<QueueEntry>,
}

impl ActionQueue {
    pub fn enqueue(&mut self, entry: QueueEntry) {
        self.entries.push_back(entry);
    }

    pub fn pop_front(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }
}
