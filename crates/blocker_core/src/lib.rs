//! Blocker core: keyword matching and the pure moderation state machine.
mod effect;
mod executor;
mod mode;
mod msg;
mod queue;
mod record;
mod rules;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use executor::{ActionId, ActiveAction, LocatorMiss, Resolution, Step, StepReport, Timer};
pub use mode::{Mode, ModeController};
pub use msg::Msg;
pub use queue::{ActionQueue, QueueEntry};
pub use record::{Candidate, Identity, NodeHandle, Record};
pub use rules::{find_match, MatchReason, MatchResult, RuleSet};
pub use state::{Session, Settings, Timings};
pub use update::update;
pub use view_model::{SessionStats, SessionView};
