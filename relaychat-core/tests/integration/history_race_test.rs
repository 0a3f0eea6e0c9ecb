// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! History Loading Integration Tests
//!
//! Conversation switches racing history fetches.

use std::sync::Arc;
use std::time::Instant;

use relaychat_core::api::{BackendError, ChatError, ChatEvent};
use relaychat_core::{MessageRecord, MockRelay};

use crate::common::{message_frame, record_events, session_with, MockBackend};

fn bob_history() -> Vec<MessageRecord> {
    vec![
        MessageRecord::text("u2".into(), "u1".into(), "hey alice").with_id("h1"),
        MessageRecord::text("u1".into(), "u2".into(), "hey bob").with_id("h2"),
    ]
}

fn carol_history() -> Vec<MessageRecord> {
    vec![MessageRecord::text("u3".into(), "u1".into(), "hi from carol").with_id("h3")]
}

fn backend() -> Arc<MockBackend> {
    Arc::new(
        MockBackend::new()
            .with_history("u2", bob_history())
            .with_history("u3", carol_history()),
    )
}

#[test]
fn test_switch_clears_log_before_history_arrives() {
    let relay = MockRelay::new();
    let mut session = session_with(&relay, backend());
    session.connect().unwrap();

    let request = session.select_conversation("u2".into());
    session.load_history(request).unwrap();
    assert_eq!(session.messages().count(), 2);

    session.select_conversation("u3".into());

    assert!(session.log().is_empty());
    assert_eq!(session.messages().count(), 0);
}

#[test]
fn test_load_history_installs_records_in_order() {
    let relay = MockRelay::new();
    let backend = backend();
    let mut session = session_with(&relay, backend.clone());
    let events = record_events(&mut session);

    let request = session.select_conversation("u2".into());
    assert!(session.load_history(request).unwrap());

    let texts: Vec<_> = session.messages().filter_map(|r| r.text.clone()).collect();
    assert_eq!(texts, vec!["hey alice", "hey bob"]);
    assert_eq!(backend.history_calls(), 1);
    assert!(events.lock().unwrap().contains(&ChatEvent::HistoryLoaded {
        contact_id: "u2".into(),
        messages: 2,
    }));
}

#[test]
fn test_stale_history_is_discarded() {
    let relay = MockRelay::new();
    let mut session = session_with(&relay, backend());

    let for_bob = session.select_conversation("u2".into());
    let for_carol = session.select_conversation("u3".into());

    // Bob's fetch completes after the switch to carol
    assert!(!session.complete_history(for_bob, Ok(bob_history())).unwrap());
    assert!(session.log().is_empty());

    assert!(session.complete_history(for_carol, Ok(carol_history())).unwrap());
    let texts: Vec<_> = session.messages().filter_map(|r| r.text.clone()).collect();
    assert_eq!(texts, vec!["hi from carol"]);
}

#[test]
fn test_reselecting_same_contact_invalidates_earlier_fetch() {
    let relay = MockRelay::new();
    let mut session = session_with(&relay, backend());

    let first = session.select_conversation("u2".into());
    let second = session.select_conversation("u2".into());

    assert!(!session.complete_history(first, Ok(bob_history())).unwrap());
    assert!(session.complete_history(second, Ok(bob_history())).unwrap());
    assert_eq!(session.log().len(), 2);
}

#[test]
fn test_spawned_fetch_is_installed_by_pump() {
    let relay = MockRelay::new();
    let mut session = session_with(&relay, backend());

    let request = session.select_conversation("u2".into());
    session.spawn_history_fetch(request).join().unwrap();
    assert!(session.log().is_empty());

    assert_eq!(session.pump(Instant::now()), 1);
    assert_eq!(session.messages().count(), 2);
}

#[test]
fn test_spawned_fetch_finishing_after_switch_is_dropped() {
    let relay = MockRelay::new();
    let mut session = session_with(&relay, backend());

    let for_bob = session.select_conversation("u2".into());
    let handle = session.spawn_history_fetch(for_bob);
    session.select_conversation("u3".into());
    handle.join().unwrap();

    session.pump(Instant::now());

    assert!(session.log().is_empty());
    assert_eq!(session.selected().map(|c| c.as_str()), Some("u3"));
}

#[test]
fn test_history_error_leaves_log_empty() {
    let relay = MockRelay::new();
    let backend = backend();
    backend.fail_history(true);
    let mut session = session_with(&relay, backend);
    let events = record_events(&mut session);

    let request = session.select_conversation("u2".into());
    let result = session.load_history(request);

    assert!(matches!(
        result,
        Err(ChatError::Backend(BackendError::HttpError(500)))
    ));
    assert!(session.log().is_empty());
    assert!(events
        .lock()
        .unwrap()
        .iter()
        .any(|e| matches!(e, ChatEvent::HistoryFailed { contact_id, .. } if contact_id.as_str() == "u2")));
}

#[test]
fn test_history_error_from_worker_is_reported_as_event() {
    let relay = MockRelay::new();
    let backend = backend();
    backend.fail_history(true);
    let mut session = session_with(&relay, backend);
    let events = record_events(&mut session);

    let request = session.select_conversation("u2".into());
    session.spawn_history_fetch(request).join().unwrap();

    assert_eq!(session.pump(Instant::now()), 1);
    assert!(session.log().is_empty());

    let failures: Vec<_> = events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            ChatEvent::HistoryFailed { contact_id, error } => {
                Some((contact_id.as_str().to_string(), error.clone()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "u2");
    assert!(failures[0].1.contains("500"));
    assert!(!events
        .lock()
        .unwrap()
        .iter()
        .any(|e| matches!(e, ChatEvent::HistoryLoaded { .. })));
}

#[test]
fn test_stale_history_error_is_not_reported() {
    let relay = MockRelay::new();
    let mut session = session_with(&relay, backend());
    let events = record_events(&mut session);

    let for_bob = session.select_conversation("u2".into());
    session.select_conversation("u3".into());

    let stale = session.complete_history(for_bob, Err(BackendError::HttpError(502)));

    assert!(matches!(stale, Ok(false)));
    assert!(!events
        .lock()
        .unwrap()
        .iter()
        .any(|e| matches!(e, ChatEvent::HistoryFailed { .. })));
}

#[test]
fn test_history_replaces_messages_received_during_fetch() {
    let relay = MockRelay::new();
    let mut session = session_with(&relay, backend());
    session.connect().unwrap();

    let request = session.select_conversation("u2".into());
    relay.push_inbound(message_frame("h1", "u2", "u1", "hey alice"));
    session.pump(Instant::now());
    assert_eq!(session.log().len(), 1);

    session.load_history(request).unwrap();

    assert_eq!(session.log().len(), 2);
    assert_eq!(session.messages().count(), 2);
}
