use blocker_core::{update, Msg, Session, Settings, Timings};

#[test]
fn update_is_noop() {
    let state = Session::new(Settings::default(), Timings::default());
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn advance_on_empty_queue_is_noop() {
    let state = Session::new(Settings::default(), Timings::default());
    let (next, effects) = update(state.clone(), Msg::AdvanceQueue);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn close_notification_without_action_is_noop() {
    let state = Session::new(Settings::default(), Timings::default());
    let (next, effects) = update(state.clone(), Msg::ConfirmationClosed { sheets: Vec::new() });

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
