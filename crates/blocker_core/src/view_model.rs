use crate::{Identity, Mode, Step};

/// Running totals for the session, reported by the binary when it exits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub enqueued: usize,
    pub blocked: usize,
    pub failed: usize,
    pub discarded: usize,
    pub manually_closed: usize,
    pub manual_expired: usize,
}

impl SessionStats {
    /// Entries that left the queue and finished, whatever the outcome.
    pub fn settled(&self) -> usize {
        self.blocked + self.failed + self.discarded + self.manually_closed + self.manual_expired
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionView {
    pub processing: bool,
    pub mode: Mode,
    pub enabled: bool,
    pub rule_count: usize,
    pub step: Option<Step>,
    pub active_identity: Option<Identity>,
    pub queued: Vec<Identity>,
    pub processed: usize,
    pub stats: SessionStats,
}
