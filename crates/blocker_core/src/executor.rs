//! Step machine for a single moderation action.
//!
//! The machine never touches the tree. It asks for tree work through [`Effect`]s and
//! learns the outcome through [`StepReport`]s and [`Timer`] expirations, which keeps every
//! transition a pure function of (step, event, mode).

use std::time::Duration;

use blocker_logging::{blocker_debug, blocker_info, blocker_warn};

use crate::{Effect, Mode, NodeHandle, QueueEntry, Timings};

pub type ActionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Idle,
    MenuOpened,
    OptionSelected,
    Confirmed,
    AwaitingManualConfirm,
    Failed,
    Done,
}

/// Which locator came up empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorMiss {
    /// No "more actions" affordance inside the entry's node.
    Affordance,
    /// No visible menu item carried a recognised block label.
    BlockOption,
    /// No confirmation control on the confirmation surface.
    ConfirmControl,
}

/// Outcome of an effect that touched the tree, reported back by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepReport {
    /// The entry's node was no longer attached when the action started.
    Stale,
    MenuOpened,
    OptionSelected,
    Confirmed,
    /// The confirmation surface left open for the user, if one was found.
    ConfirmationShown(Option<NodeHandle>),
    Missed(LocatorMiss),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    MenuSettle,
    ConfirmSettle,
    SuccessGrace,
    FailureBackoff,
    ManualConfirmDeadline,
}

/// How an action ended; recorded when the processing gate is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Blocked,
    Failed(LocatorMiss),
    Stale,
    ManualClosed,
    ManualExpired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAction {
    pub id: ActionId,
    pub entry: QueueEntry,
    pub step: Step,
    pub resolution: Option<Resolution>,
    /// Confirmation surface this action waits on in manual mode.
    pub sheet: Option<NodeHandle>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ActionEvent {
    Report(StepReport),
    TimerElapsed(Timer),
    ConfirmationClosed(Vec<NodeHandle>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The action stays in flight.
    Pending(Vec<Effect>),
    /// The action is over: the gate is released and the queue advances after these effects.
    Release(Vec<Effect>),
    /// The event does not apply to the current step.
    Ignored,
}

impl ActiveAction {
    pub(crate) fn new(id: ActionId, entry: QueueEntry) -> Self {
        Self {
            id,
            entry,
            step: Step::Idle,
            resolution: None,
            sheet: None,
        }
    }

    pub(crate) fn start(&self) -> Vec<Effect> {
        blocker_info!(
            "Blocking {} (rule {:?} matched {})",
            self.entry.identity,
            self.entry.matched.rule,
            self.entry.matched.reason.as_str()
        );
        vec![Effect::OpenMenu {
            action_id: self.id,
            node: self.entry.node,
        }]
    }

    pub(crate) fn handle(&mut self, event: ActionEvent, mode: Mode, timings: &Timings) -> Outcome {
        match (self.step, event) {
            (Step::Idle, ActionEvent::Report(StepReport::Stale)) => {
                blocker_warn!("Node for {} left the tree; discarding", self.entry.identity);
                self.finish(Resolution::Stale, Vec::new())
            }
            (Step::Idle, ActionEvent::Report(StepReport::MenuOpened)) => {
                self.step = Step::MenuOpened;
                Outcome::Pending(vec![self.timer(Timer::MenuSettle, timings.menu_settle)])
            }
            (Step::MenuOpened, ActionEvent::TimerElapsed(Timer::MenuSettle)) => {
                Outcome::Pending(vec![Effect::SelectBlockOption { action_id: self.id }])
            }
            (Step::MenuOpened, ActionEvent::Report(StepReport::OptionSelected)) => {
                self.step = Step::OptionSelected;
                Outcome::Pending(vec![self.timer(Timer::ConfirmSettle, timings.confirm_settle)])
            }
            (Step::OptionSelected, ActionEvent::TimerElapsed(Timer::ConfirmSettle)) => {
                self.decide_confirmation(mode, timings)
            }
            (Step::OptionSelected, ActionEvent::Report(StepReport::Confirmed)) => {
                self.step = Step::Confirmed;
                blocker_info!("Blocked {}", self.entry.identity);
                Outcome::Pending(vec![
                    Effect::IncrementBlockedCount,
                    Effect::ReportBlocked {
                        identity: self.entry.identity.clone(),
                        reason: self.entry.matched.reason,
                        rule: self.entry.matched.rule.clone(),
                    },
                    self.timer(Timer::SuccessGrace, timings.success_grace),
                ])
            }
            (Step::Confirmed, ActionEvent::TimerElapsed(Timer::SuccessGrace)) => {
                self.finish(Resolution::Blocked, Vec::new())
            }
            (
                Step::Idle | Step::MenuOpened | Step::OptionSelected,
                ActionEvent::Report(StepReport::Missed(miss)),
            ) => {
                blocker_warn!(
                    "{:?} not found while blocking {}; giving up on this entry",
                    miss,
                    self.entry.identity
                );
                self.step = Step::Failed;
                self.resolution = Some(Resolution::Failed(miss));
                Outcome::Pending(vec![
                    self.timer(Timer::FailureBackoff, timings.failure_backoff)
                ])
            }
            (Step::Failed, ActionEvent::TimerElapsed(Timer::FailureBackoff)) => {
                let resolution = self
                    .resolution
                    .unwrap_or(Resolution::Failed(LocatorMiss::Affordance));
                self.finish(resolution, Vec::new())
            }
            (
                Step::AwaitingManualConfirm,
                ActionEvent::Report(StepReport::ConfirmationShown(sheet)),
            ) => {
                blocker_debug!("Watching confirmation {:?} for {}", sheet, self.entry.identity);
                self.sheet = sheet;
                Outcome::Pending(Vec::new())
            }
            (Step::AwaitingManualConfirm, ActionEvent::ConfirmationClosed(sheets))
                if self.sheet.is_some_and(|sheet| !sheets.contains(&sheet)) =>
            {
                blocker_debug!(
                    "Closed confirmation {:?} is not the one for {}",
                    sheets,
                    self.entry.identity
                );
                Outcome::Ignored
            }
            (Step::AwaitingManualConfirm, ActionEvent::ConfirmationClosed(_)) => {
                blocker_info!("Confirmation for {} closed", self.entry.identity);
                let cancel = Effect::CancelTimers { action_id: self.id };
                self.finish(Resolution::ManualClosed, vec![cancel])
            }
            (
                Step::AwaitingManualConfirm,
                ActionEvent::TimerElapsed(Timer::ManualConfirmDeadline),
            ) => {
                blocker_warn!(
                    "Confirmation for {} still open after the deadline; releasing the queue",
                    self.entry.identity
                );
                self.finish(Resolution::ManualExpired, Vec::new())
            }
            (step, event) => {
                blocker_debug!("Ignoring {:?} in step {:?}", event, step);
                Outcome::Ignored
            }
        }
    }

    fn decide_confirmation(&mut self, mode: Mode, timings: &Timings) -> Outcome {
        match mode {
            Mode::Automatic => Outcome::Pending(vec![Effect::ConfirmBlock { action_id: self.id }]),
            Mode::Manual => {
                self.step = Step::AwaitingManualConfirm;
                blocker_info!("Waiting for the user to confirm blocking {}", self.entry.identity);
                let mut effects: Vec<Effect> = timings
                    .manual_confirm_deadline
                    .map(|delay| self.timer(Timer::ManualConfirmDeadline, delay))
                    .into_iter()
                    .collect();
                effects.push(Effect::WatchConfirmation { action_id: self.id });
                Outcome::Pending(effects)
            }
        }
    }

    fn finish(&mut self, resolution: Resolution, effects: Vec<Effect>) -> Outcome {
        self.step = Step::Done;
        self.resolution = Some(resolution);
        Outcome::Release(effects)
    }

    fn timer(&self, timer: Timer, delay: Duration) -> Effect {
        Effect::StartTimer {
            action_id: self.id,
            timer,
            delay,
        }
    }
}
