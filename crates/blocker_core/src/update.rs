use blocker_logging::{blocker_debug, blocker_trace};

use crate::executor::{ActionEvent, Outcome};
use crate::{ActionId, Effect, Msg, Session};

/// Pure update function: applies a message to the session and returns any effects.
pub fn update(mut state: Session, msg: Msg) -> (Session, Vec<Effect>) {
    let effects = match msg {
        Msg::SettingsChanged(settings) => {
            state.apply_settings(settings);
            Vec::new()
        }
        Msg::ScanCompleted(candidates) => {
            if !state.is_enabled() {
                blocker_trace!("Blocking disabled; ignoring {} candidates", candidates.len());
                return (state, Vec::new());
            }
            if state.admit(candidates) == 0 {
                Vec::new()
            } else {
                try_dequeue_and_run(&mut state)
            }
        }
        Msg::AdvanceQueue => try_dequeue_and_run(&mut state),
        Msg::StepReported { action_id, report } => {
            drive_action(&mut state, action_id, ActionEvent::Report(report))
        }
        Msg::TimerElapsed { action_id, timer } => {
            drive_action(&mut state, action_id, ActionEvent::TimerElapsed(timer))
        }
        Msg::ConfirmationClosed { sheets } => match state.active().map(|action| action.id) {
            Some(action_id) => {
                drive_action(&mut state, action_id, ActionEvent::ConfirmationClosed(sheets))
            }
            None => Vec::new(),
        },
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Starts the head entry unless an action already holds the processing gate.
fn try_dequeue_and_run(state: &mut Session) -> Vec<Effect> {
    if state.is_processing() {
        return Vec::new();
    }
    match state.pop_next() {
        Some(entry) => state.begin_action(entry).start(),
        None => Vec::new(),
    }
}

fn drive_action(state: &mut Session, action_id: ActionId, event: ActionEvent) -> Vec<Effect> {
    let mode = state.mode();
    let timings = state.timings().clone();
    let Some(action) = state.active_mut(action_id) else {
        blocker_debug!("Dropping {:?} for finished action {}", event, action_id);
        return Vec::new();
    };

    match action.handle(event, mode, &timings) {
        Outcome::Pending(effects) => effects,
        Outcome::Release(mut effects) => {
            state.finish_action();
            effects.extend(try_dequeue_and_run(state));
            effects
        }
        Outcome::Ignored => Vec::new(),
    }
}
