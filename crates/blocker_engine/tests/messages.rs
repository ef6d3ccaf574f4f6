use blocker_core::MatchReason;
use blocker_engine::{Background, MemoryStore, Request, SettingsStore, StoredSettings};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn background(settings: StoredSettings) -> Background<MemoryStore> {
    Background::new(MemoryStore::new(settings))
}

fn ask(background: &mut Background<MemoryStore>, request: Value) -> Value {
    let reply = background.handle_json(&request.to_string()).unwrap();
    serde_json::from_str(&reply).unwrap()
}

#[test]
fn pulls_answer_with_stored_values() {
    let mut background = background(StoredSettings {
        block_words: vec!["spam".into()],
        auto_mode: true,
        ..StoredSettings::default()
    });

    assert_eq!(
        ask(&mut background, json!({"action": "getBlockWords"})),
        json!({"blockWords": ["spam"]})
    );
    assert_eq!(
        ask(&mut background, json!({"action": "getAutoMode"})),
        json!({"autoMode": true})
    );
    assert_eq!(
        ask(&mut background, json!({"action": "getStatus"})),
        json!({"enabled": true, "blockedCount": 0, "blockedUsers": []})
    );
}

#[test]
fn increment_bumps_the_counter() {
    let mut background = background(StoredSettings::default());

    ask(&mut background, json!({"action": "incrementBlockCount"}));
    ask(&mut background, json!({"action": "incrementBlockCount"}));

    assert_eq!(background.store().load().unwrap().blocked_count, 2);
}

#[test]
fn block_user_is_recorded_once() {
    let mut background = background(StoredSettings::default());
    let request = json!({
        "action": "blockUser",
        "username": "SpamBot",
        "reason": "name",
        "matchedKeyword": "spam",
    });

    assert_eq!(ask(&mut background, request.clone()), json!({"success": true}));
    assert_eq!(
        ask(&mut background, request),
        json!({"success": false, "reason": "alreadyBlocked"})
    );
    assert!(background
        .store()
        .load()
        .unwrap()
        .blocked_users
        .contains("spambot"));
}

#[test]
fn settings_push_replaces_the_record() {
    let mut background = background(StoredSettings::default());

    let reply = ask(
        &mut background,
        json!({
            "action": "settingsUpdated",
            "settings": {"blockWords": ["promo"], "autoMode": true},
        }),
    );

    assert_eq!(reply, json!({}));
    let stored = background.store().load().unwrap();
    assert_eq!(stored.block_words, vec!["promo".to_string()]);
    assert!(stored.auto_mode);
    assert!(stored.enabled);
}

#[test]
fn requests_use_camel_case_wire_names() {
    let request = Request::BlockUser {
        username: "spambot".into(),
        reason: MatchReason::Body,
        matched_keyword: "free money".into(),
    };

    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({
            "action": "blockUser",
            "username": "spambot",
            "reason": "body",
            "matchedKeyword": "free money",
        })
    );
}

#[test]
fn unknown_action_is_malformed() {
    let mut background = background(StoredSettings::default());
    assert!(background
        .handle_json(r#"{"action": "selfDestruct"}"#)
        .is_err());
}
