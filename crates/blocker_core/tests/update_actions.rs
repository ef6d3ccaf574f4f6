use std::time::Duration;

use blocker_core::{
    update, Candidate, Effect, Identity, LocatorMiss, MatchReason, Mode, Msg, NodeHandle, Record,
    RuleSet, Session, Settings, Step, StepReport, Timer, Timings,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    blocker_logging::initialize_for_tests();
}

fn session(mode: Mode) -> Session {
    Session::new(
        Settings {
            rules: RuleSet::from_tokens(["bot"]),
            mode,
            ..Settings::default()
        },
        Timings::default(),
    )
}

fn bots(count: u64) -> Vec<Candidate> {
    (1..=count)
        .map(|n| Candidate {
            node: NodeHandle(n),
            record: Record {
                identity: Identity::new(&format!("bot{n}")),
                display_name: format!("Bot {n}"),
                body_text: String::new(),
            },
        })
        .collect()
}

fn report(state: Session, action_id: u64, report: StepReport) -> (Session, Vec<Effect>) {
    update(state, Msg::StepReported { action_id, report })
}

fn elapse(state: Session, action_id: u64, timer: Timer) -> (Session, Vec<Effect>) {
    update(state, Msg::TimerElapsed { action_id, timer })
}

fn timer(action_id: u64, timer: Timer, millis: u64) -> Effect {
    Effect::StartTimer {
        action_id,
        timer,
        delay: Duration::from_millis(millis),
    }
}

/// Walks action `id` from `Idle` up to the confirmation decision.
fn reach_confirmation(state: Session, id: u64) -> (Session, Vec<Effect>) {
    let (state, _) = report(state, id, StepReport::MenuOpened);
    let (state, _) = elapse(state, id, Timer::MenuSettle);
    let (state, _) = report(state, id, StepReport::OptionSelected);
    elapse(state, id, Timer::ConfirmSettle)
}

#[test]
fn automatic_mode_walks_every_step_and_advances() {
    init_logging();
    let (state, effects) = update(session(Mode::Automatic), Msg::ScanCompleted(bots(2)));
    assert_eq!(
        effects,
        vec![Effect::OpenMenu {
            action_id: 1,
            node: NodeHandle(1)
        }]
    );

    let (state, effects) = report(state, 1, StepReport::MenuOpened);
    assert_eq!(effects, vec![timer(1, Timer::MenuSettle, 500)]);
    assert_eq!(state.active().unwrap().step, Step::MenuOpened);

    let (state, effects) = elapse(state, 1, Timer::MenuSettle);
    assert_eq!(effects, vec![Effect::SelectBlockOption { action_id: 1 }]);

    let (state, effects) = report(state, 1, StepReport::OptionSelected);
    assert_eq!(effects, vec![timer(1, Timer::ConfirmSettle, 500)]);

    let (state, effects) = elapse(state, 1, Timer::ConfirmSettle);
    assert_eq!(effects, vec![Effect::ConfirmBlock { action_id: 1 }]);

    let (state, effects) = report(state, 1, StepReport::Confirmed);
    assert_eq!(
        effects,
        vec![
            Effect::IncrementBlockedCount,
            Effect::ReportBlocked {
                identity: Identity::new("bot1").unwrap(),
                reason: MatchReason::Name,
                rule: "bot".to_string(),
            },
            timer(1, Timer::SuccessGrace, 1500),
        ]
    );
    assert_eq!(state.active().unwrap().step, Step::Confirmed);
    assert!(state.view().processing);

    let (state, effects) = elapse(state, 1, Timer::SuccessGrace);
    assert_eq!(
        effects,
        vec![Effect::OpenMenu {
            action_id: 2,
            node: NodeHandle(2)
        }]
    );
    assert_eq!(state.view().stats.blocked, 1);
}

#[test]
fn missing_confirm_control_fails_without_counting_and_backs_off() {
    init_logging();
    let (state, _) = update(session(Mode::Automatic), Msg::ScanCompleted(bots(2)));
    let (state, effects) = reach_confirmation(state, 1);
    assert_eq!(effects, vec![Effect::ConfirmBlock { action_id: 1 }]);

    let (state, effects) = report(state, 1, StepReport::Missed(LocatorMiss::ConfirmControl));
    assert_eq!(effects, vec![timer(1, Timer::FailureBackoff, 1000)]);
    assert_eq!(state.active().unwrap().step, Step::Failed);
    assert!(!effects.contains(&Effect::IncrementBlockedCount));

    let (state, effects) = elapse(state, 1, Timer::FailureBackoff);
    assert_eq!(
        effects,
        vec![Effect::OpenMenu {
            action_id: 2,
            node: NodeHandle(2)
        }]
    );
    let stats = state.view().stats;
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.blocked, 0);
}

#[test]
fn missing_affordance_and_option_are_terminal_for_the_entry_only() {
    init_logging();
    let (state, _) = update(session(Mode::Automatic), Msg::ScanCompleted(bots(3)));

    let (state, _) = report(state, 1, StepReport::Missed(LocatorMiss::Affordance));
    let (state, effects) = elapse(state, 1, Timer::FailureBackoff);
    assert_eq!(effects.len(), 1);

    let (state, _) = report(state, 2, StepReport::MenuOpened);
    let (state, _) = elapse(state, 2, Timer::MenuSettle);
    let (state, _) = report(state, 2, StepReport::Missed(LocatorMiss::BlockOption));
    let (state, effects) = elapse(state, 2, Timer::FailureBackoff);
    assert_eq!(
        effects,
        vec![Effect::OpenMenu {
            action_id: 3,
            node: NodeHandle(3)
        }]
    );
    assert_eq!(state.view().stats.failed, 2);
}

#[test]
fn stale_entry_is_discarded_and_next_entry_starts() {
    init_logging();
    let (state, _) = update(session(Mode::Automatic), Msg::ScanCompleted(bots(2)));

    let (state, effects) = report(state, 1, StepReport::Stale);
    assert_eq!(
        effects,
        vec![Effect::OpenMenu {
            action_id: 2,
            node: NodeHandle(2)
        }]
    );
    assert_eq!(state.view().stats.discarded, 1);

    let (state, effects) = report(state, 2, StepReport::Stale);
    assert!(effects.is_empty());
    assert!(state.is_idle());
    assert!(!state.view().processing);
}

#[test]
fn second_advance_while_processing_does_nothing() {
    init_logging();
    let (state, _) = update(session(Mode::Automatic), Msg::ScanCompleted(bots(2)));
    assert!(state.is_processing());

    let (state, effects) = update(state, Msg::AdvanceQueue);
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::ScanCompleted(bots(2)));
    assert!(effects.is_empty());
    assert_eq!(state.active().unwrap().id, 1);
    assert_eq!(state.view().queued.len(), 1);
}

#[test]
fn manual_mode_gates_queue_until_confirmation_closes() {
    init_logging();
    let (state, _) = update(session(Mode::Manual), Msg::ScanCompleted(bots(2)));
    let (state, effects) = reach_confirmation(state, 1);
    assert_eq!(
        effects,
        vec![
            timer(1, Timer::ManualConfirmDeadline, 120_000),
            Effect::WatchConfirmation { action_id: 1 },
        ]
    );
    assert_eq!(state.active().unwrap().step, Step::AwaitingManualConfirm);
    let (state, _) = report(state, 1, StepReport::ConfirmationShown(Some(NodeHandle(40))));

    let (state, effects) = update(state, Msg::AdvanceQueue);
    assert!(effects.is_empty());
    assert!(state.view().processing);

    let (state, effects) = update(
        state,
        Msg::ConfirmationClosed {
            sheets: vec![NodeHandle(40)],
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::CancelTimers { action_id: 1 },
            Effect::OpenMenu {
                action_id: 2,
                node: NodeHandle(2)
            },
        ]
    );
    let stats = state.view().stats;
    assert_eq!(stats.manually_closed, 1);
    assert_eq!(stats.blocked, 0);
}

#[test]
fn manual_deadline_forces_the_gate_open() {
    init_logging();
    let (state, _) = update(session(Mode::Manual), Msg::ScanCompleted(bots(1)));
    let (state, _) = reach_confirmation(state, 1);

    let (state, effects) = elapse(state, 1, Timer::ManualConfirmDeadline);
    assert!(effects.is_empty());
    assert!(state.is_idle());
    assert_eq!(state.view().stats.manual_expired, 1);

    // The close notification arriving afterwards must not release anything twice.
    let (state, effects) = update(state, Msg::ConfirmationClosed { sheets: Vec::new() });
    assert!(effects.is_empty());
    assert_eq!(state.view().stats.settled(), 1);
}

#[test]
fn closing_an_earlier_actions_sheet_keeps_the_gate() {
    init_logging();
    let (state, _) = update(session(Mode::Manual), Msg::ScanCompleted(bots(2)));
    let (state, _) = reach_confirmation(state, 1);
    let (state, _) = report(state, 1, StepReport::ConfirmationShown(Some(NodeHandle(40))));
    let (state, _) = elapse(state, 1, Timer::ManualConfirmDeadline);
    assert_eq!(state.active().unwrap().id, 2);

    let (state, _) = reach_confirmation(state, 2);
    let (state, _) = report(state, 2, StepReport::ConfirmationShown(Some(NodeHandle(50))));

    let (state, effects) = update(
        state,
        Msg::ConfirmationClosed {
            sheets: vec![NodeHandle(40)],
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.active().unwrap().step, Step::AwaitingManualConfirm);
    assert_eq!(state.view().stats.manually_closed, 0);

    let (state, effects) = update(
        state,
        Msg::ConfirmationClosed {
            sheets: vec![NodeHandle(50)],
        },
    );
    assert_eq!(effects, vec![Effect::CancelTimers { action_id: 2 }]);
    assert!(state.is_idle());
    assert_eq!(state.view().stats.manually_closed, 1);
}

#[test]
fn unknown_sheet_is_released_by_any_close() {
    init_logging();
    let (state, _) = update(session(Mode::Manual), Msg::ScanCompleted(bots(1)));
    let (state, _) = reach_confirmation(state, 1);
    let (state, _) = report(state, 1, StepReport::ConfirmationShown(None));

    let (state, _) = update(
        state,
        Msg::ConfirmationClosed {
            sheets: vec![NodeHandle(7)],
        },
    );
    assert!(state.is_idle());
}

#[test]
fn manual_wait_without_deadline_starts_no_timer() {
    init_logging();
    let state = Session::new(
        Settings {
            rules: RuleSet::from_tokens(["bot"]),
            mode: Mode::Manual,
            ..Settings::default()
        },
        Timings {
            manual_confirm_deadline: None,
            ..Timings::default()
        },
    );
    let (state, _) = update(state, Msg::ScanCompleted(bots(1)));
    let (state, effects) = reach_confirmation(state, 1);
    assert_eq!(effects, vec![Effect::WatchConfirmation { action_id: 1 }]);
    assert_eq!(state.active().unwrap().step, Step::AwaitingManualConfirm);
}

#[test]
fn mode_is_read_at_the_confirmation_decision() {
    init_logging();
    let (state, _) = update(session(Mode::Manual), Msg::ScanCompleted(bots(1)));
    let (state, _) = report(state, 1, StepReport::MenuOpened);
    let (state, _) = update(
        state,
        Msg::SettingsChanged(Settings {
            rules: RuleSet::from_tokens(["bot"]),
            mode: Mode::Automatic,
            ..Settings::default()
        }),
    );
    let (state, _) = elapse(state, 1, Timer::MenuSettle);
    let (state, _) = report(state, 1, StepReport::OptionSelected);
    let (_state, effects) = elapse(state, 1, Timer::ConfirmSettle);
    assert_eq!(effects, vec![Effect::ConfirmBlock { action_id: 1 }]);
}

#[test]
fn late_reports_for_finished_actions_are_ignored() {
    init_logging();
    let (state, _) = update(session(Mode::Automatic), Msg::ScanCompleted(bots(2)));
    let (state, _) = report(state, 1, StepReport::Stale);
    assert_eq!(state.active().unwrap().id, 2);

    let (state, effects) = elapse(state, 1, Timer::FailureBackoff);
    assert!(effects.is_empty());
    let (state, effects) = report(state, 1, StepReport::Confirmed);
    assert!(effects.is_empty());
    assert_eq!(state.active().unwrap().id, 2);
    assert_eq!(state.active().unwrap().step, Step::Idle);
}

#[test]
fn out_of_order_events_do_not_move_the_step() {
    init_logging();
    let (state, _) = update(session(Mode::Automatic), Msg::ScanCompleted(bots(1)));

    let (state, effects) = elapse(state, 1, Timer::ConfirmSettle);
    assert!(effects.is_empty());
    let (state, effects) = report(state, 1, StepReport::Confirmed);
    assert!(effects.is_empty());
    assert_eq!(state.active().unwrap().step, Step::Idle);
}

#[test]
fn every_entry_drains_and_gate_reopens() {
    init_logging();
    let count = 5;
    let (mut state, mut effects) =
        update(session(Mode::Automatic), Msg::ScanCompleted(bots(count)));

    let mut started = Vec::new();
    for _ in 0..100 {
        let Some(Effect::OpenMenu { action_id, .. }) = effects
            .iter()
            .find(|effect| matches!(effect, Effect::OpenMenu { .. }))
            .cloned()
        else {
            break;
        };
        started.push(action_id);
        // Alternate outcomes: odd actions succeed, even ones miss the affordance.
        let (next, timer) = if action_id % 2 == 1 {
            let (next, _) = reach_confirmation(state, action_id);
            let (next, _) = report(next, action_id, StepReport::Confirmed);
            (next, Timer::SuccessGrace)
        } else {
            let (next, _) = report(state, action_id, StepReport::Missed(LocatorMiss::Affordance));
            (next, Timer::FailureBackoff)
        };
        let (next, next_effects) = elapse(next, action_id, timer);
        state = next;
        effects = next_effects;
    }

    assert_eq!(started, vec![1, 2, 3, 4, 5]);
    assert!(state.is_idle());
    let stats = state.view().stats;
    assert_eq!(stats.blocked, 3);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.settled(), count as usize);
}
