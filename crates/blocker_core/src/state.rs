use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use blocker_logging::{blocker_debug, blocker_error, blocker_info, blocker_trace};

use crate::executor::{ActiveAction, Resolution};
use crate::view_model::{SessionStats, SessionView};
use crate::{
    find_match, ActionId, ActionQueue, Candidate, Identity, Mode, ModeController, QueueEntry,
    RuleSet,
};

/// Snapshot of everything the settings collaborator tells the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub rules: RuleSet,
    pub mode: Mode,
    /// Master switch; scan batches are ignored while false.
    pub enabled: bool,
    /// Identities the store already records as blocked.
    pub blocked_identities: BTreeSet<Identity>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rules: RuleSet::default(),
            mode: Mode::default(),
            enabled: true,
            blocked_identities: BTreeSet::new(),
        }
    }
}

/// Settle windows and backoffs between executor steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timings {
    pub menu_settle: Duration,
    pub confirm_settle: Duration,
    pub success_grace: Duration,
    pub failure_backoff: Duration,
    /// `None` waits for the confirmation surface to close without limit.
    pub manual_confirm_deadline: Option<Duration>,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            menu_settle: Duration::from_millis(500),
            confirm_settle: Duration::from_millis(500),
            success_grace: Duration::from_millis(1500),
            failure_backoff: Duration::from_millis(1000),
            manual_confirm_deadline: Some(Duration::from_secs(120)),
        }
    }
}

/// All mutable state of one page session. Owned by the pipeline and threaded through
/// [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    rules: RuleSet,
    enabled: bool,
    mode: ModeController,
    known_blocked: HashSet<Identity>,
    processed: HashSet<Identity>,
    queue: ActionQueue,
    /// `Some` exactly while the processing gate is held.
    active: Option<ActiveAction>,
    last_action_id: ActionId,
    timings: Timings,
    stats: SessionStats,
}

impl Session {
    pub fn new(settings: Settings, timings: Timings) -> Self {
        let mut session = Self {
            timings,
            ..Self::default()
        };
        session.apply_settings(settings);
        session
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            processing: self.is_processing(),
            mode: self.mode.current(),
            enabled: self.enabled,
            rule_count: self.rules.len(),
            step: self.active.as_ref().map(|action| action.step),
            active_identity: self.active.as_ref().map(|action| action.entry.identity.clone()),
            queued: self.queue.iter().map(|entry| entry.identity.clone()).collect(),
            processed: self.processed.len(),
            stats: self.stats.clone(),
        }
    }

    pub fn is_processing(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&ActiveAction> {
        self.active.as_ref()
    }

    pub fn mode(&self) -> Mode {
        self.mode.current()
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn has_processed(&self, identity: &Identity) -> bool {
        self.processed.contains(identity)
    }

    /// True when nothing is queued and no action holds the gate.
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn apply_settings(&mut self, settings: Settings) {
        if self.mode.set(settings.mode) {
            blocker_info!("Mode is now {:?}", settings.mode);
        }
        if self.rules != settings.rules {
            blocker_info!("Loaded {} keyword rules", settings.rules.len());
        }
        self.rules = settings.rules;
        self.enabled = settings.enabled;
        self.known_blocked = settings.blocked_identities.into_iter().collect();
    }

    /// Runs the match decision over one scan batch and queues new matches.
    /// Returns how many entries were queued.
    pub(crate) fn admit(&mut self, candidates: Vec<Candidate>) -> usize {
        let mut admitted = 0;
        for Candidate { node, record } in candidates {
            let Some(matched) = find_match(&record, &self.rules) else {
                continue;
            };
            let Some(identity) = record.identity.clone() else {
                blocker_debug!(
                    "Match on {:?} but the profile link is not resolvable yet",
                    record.display_name
                );
                continue;
            };
            if self.processed.contains(&identity) {
                blocker_trace!("{} already processed", identity);
                continue;
            }
            if self.known_blocked.contains(&identity) {
                blocker_debug!("{} is already blocked", identity);
                continue;
            }

            blocker_info!(
                "Queued {} ({} matched {:?})",
                identity,
                matched.reason.as_str(),
                matched.rule
            );
            self.processed.insert(identity.clone());
            self.queue.enqueue(QueueEntry {
                identity,
                record,
                matched,
                node,
            });
            self.stats.enqueued += 1;
            admitted += 1;
        }
        admitted
    }

    pub(crate) fn pop_next(&mut self) -> Option<QueueEntry> {
        self.queue.pop_front()
    }

    /// Takes the processing gate for `entry`.
    pub(crate) fn begin_action(&mut self, entry: QueueEntry) -> &ActiveAction {
        self.last_action_id += 1;
        self.active.insert(ActiveAction::new(self.last_action_id, entry))
    }

    pub(crate) fn active_mut(&mut self, action_id: ActionId) -> Option<&mut ActiveAction> {
        self.active.as_mut().filter(|action| action.id == action_id)
    }

    /// Releases the processing gate. The only place `active` is cleared.
    pub(crate) fn finish_action(&mut self) {
        let Some(action) = self.active.take() else {
            blocker_error!("Processing gate released twice");
            return;
        };
        match action.resolution {
            Some(Resolution::Blocked) => self.stats.blocked += 1,
            Some(Resolution::Failed(_)) => self.stats.failed += 1,
            Some(Resolution::Stale) => self.stats.discarded += 1,
            Some(Resolution::ManualClosed) => self.stats.manually_closed += 1,
            Some(Resolution::ManualExpired) => self.stats.manual_expired += 1,
            None => {}
        }
    }
}
