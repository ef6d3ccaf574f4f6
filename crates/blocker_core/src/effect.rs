use std::time::Duration;

use crate::{ActionId, Identity, MatchReason, NodeHandle, Timer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Check that `node` is still attached, then find and trigger its "more actions" affordance.
    OpenMenu { action_id: ActionId, node: NodeHandle },
    /// Find a visible menu item with a block label and trigger it.
    SelectBlockOption { action_id: ActionId },
    /// Find the confirmation control and trigger it.
    ConfirmBlock { action_id: ActionId },
    /// Find the confirmation surface left for the user and report it back.
    WatchConfirmation { action_id: ActionId },
    StartTimer {
        action_id: ActionId,
        timer: Timer,
        delay: Duration,
    },
    CancelTimers { action_id: ActionId },
    /// Fire-and-forget counter bump in the settings store.
    IncrementBlockedCount,
    ReportBlocked {
        identity: Identity,
        reason: MatchReason,
        rule: String,
    },
}
