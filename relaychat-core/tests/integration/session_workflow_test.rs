// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Session Workflow Integration Tests
//!
//! Connect, presence, sending, receiving and logout through the session
//! facade.

use std::sync::Arc;
use std::time::{Duration, Instant};

use relaychat_core::api::{ChatError, ChatEvent};
use relaychat_core::{ConnectionState, ContactId, MockRelay};

use crate::common::{
    message_frame, record_events, roster_frame, session_with, standard_directory, MockBackend,
};

fn texts<'a>(records: impl Iterator<Item = &'a relaychat_core::MessageRecord>) -> Vec<String> {
    records.filter_map(|r| r.text.clone()).collect()
}

#[test]
fn test_roster_and_directory_classify_contacts() {
    let relay = MockRelay::new();
    let backend = Arc::new(MockBackend::new().with_people(standard_directory()));
    let mut session = session_with(&relay, backend);
    session.connect().unwrap();

    assert_eq!(session.refresh_directory().unwrap(), 3);
    relay.push_inbound(roster_frame(&[("u1", "alice"), ("u2", "bob")]));
    session.pump(Instant::now());

    let online = session.online_contacts();
    assert_eq!(online.keys().map(ContactId::as_str).collect::<Vec<_>>(), vec!["u2"]);
    let offline = session.offline_contacts();
    assert_eq!(offline.keys().map(ContactId::as_str).collect::<Vec<_>>(), vec!["u3"]);

    // A later roster replaces the earlier one wholesale
    relay.push_inbound(roster_frame(&[("u3", "carol")]));
    session.pump(Instant::now());
    assert!(session.online_contacts().contains_key("u3"));
    assert!(session.offline_contacts().contains_key("u2"));
}

#[test]
fn test_send_text_appends_immediately() {
    let relay = MockRelay::new();
    let mut session = session_with(&relay, Arc::new(MockBackend::new()));
    session.connect().unwrap();
    session.select_conversation("u2".into());

    let id = session.send_text("hi").unwrap();

    let messages: Vec<_> = session.messages().collect();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id.as_ref(), Some(&id));
    assert_eq!(messages[0].sender.as_str(), "u1");
    assert_eq!(messages[0].recipient.as_str(), "u2");
    assert_eq!(relay.sent_frames().len(), 1);
}

#[test]
fn test_send_without_selection_fails() {
    let relay = MockRelay::new();
    let mut session = session_with(&relay, Arc::new(MockBackend::new()));
    session.connect().unwrap();

    assert!(matches!(
        session.send_text("hi"),
        Err(ChatError::NoConversationSelected)
    ));
    assert!(relay.sent_frames().is_empty());
}

#[test]
fn test_send_while_disconnected_is_not_appended() {
    let relay = MockRelay::new();
    let mut session = session_with(&relay, Arc::new(MockBackend::new()));
    let events = record_events(&mut session);
    session.select_conversation("u2".into());

    assert!(matches!(
        session.send_text("hi"),
        Err(ChatError::Network(_))
    ));
    assert!(session.log().is_empty());
    assert!(events
        .lock()
        .unwrap()
        .iter()
        .any(|e| matches!(e, ChatEvent::MessageFailed { .. })));
}

#[test]
fn test_echo_of_own_message_is_collapsed() {
    let relay = MockRelay::new();
    let mut session = session_with(&relay, Arc::new(MockBackend::new()));
    session.connect().unwrap();
    // Notes to self come back from the relay with the id the client assigned
    session.select_conversation("u1".into());

    let id = session.send_text("note").unwrap();
    relay.push_inbound(message_frame(id.as_str(), "u1", "u1", "note"));
    session.pump(Instant::now());

    assert_eq!(session.log().len(), 2);
    assert_eq!(texts(session.messages()), vec!["note"]);
}

#[test]
fn test_copy_of_outgoing_message_to_partner_is_not_ingested() {
    let relay = MockRelay::new();
    let mut session = session_with(&relay, Arc::new(MockBackend::new()));
    session.connect().unwrap();
    session.select_conversation("u2".into());

    let id = session.send_text("hi").unwrap();
    relay.push_inbound(message_frame(id.as_str(), "u1", "u2", "hi"));
    session.pump(Instant::now());

    assert_eq!(session.log().len(), 1);
    assert_eq!(session.messages().count(), 1);
}

#[test]
fn test_duplicate_inbound_messages_render_once() {
    let relay = MockRelay::new();
    let mut session = session_with(&relay, Arc::new(MockBackend::new()));
    session.connect().unwrap();
    session.select_conversation("u2".into());

    relay.push_inbound(message_frame("m1", "u2", "u1", "hello"));
    relay.push_inbound(message_frame("m1", "u2", "u1", "hello"));
    relay.push_inbound(message_frame("m2", "u2", "u1", "again"));
    let now = Instant::now();
    for _ in 0..3 {
        session.pump(now);
    }

    assert_eq!(session.log().len(), 3);
    assert_eq!(texts(session.messages()), vec!["hello", "again"]);
}

#[test]
fn test_messages_for_other_conversations_are_not_rendered() {
    let relay = MockRelay::new();
    let mut session = session_with(&relay, Arc::new(MockBackend::new()));
    session.connect().unwrap();
    session.select_conversation("u2".into());

    relay.push_inbound(message_frame("m1", "u3", "u1", "from carol"));
    relay.push_inbound(message_frame("m2", "u3", "u4", "not for me"));
    relay.push_inbound(message_frame("m3", "u2", "u1", "from bob"));
    let now = Instant::now();
    for _ in 0..3 {
        session.pump(now);
    }

    // Carol's message to self is kept in the log but not in bob's view
    assert_eq!(session.log().len(), 2);
    assert_eq!(texts(session.messages()), vec!["from bob"]);
}

#[test]
fn test_send_file_previews_locally() {
    let relay = MockRelay::new();
    let mut session = session_with(&relay, Arc::new(MockBackend::new()));
    session.connect().unwrap();
    session.select_conversation("u2".into());

    let bytes = [0u8, 159, 146, 150, 255];
    session.send_file(&bytes, "blob.bin").unwrap();

    let messages: Vec<_> = session.messages().collect();
    assert_eq!(messages.len(), 1);
    let attachment = messages[0].attachment.as_ref().unwrap();
    assert_eq!(attachment.name, "blob.bin");
    assert_eq!(attachment.preview_bytes().unwrap(), bytes);

    let sent: serde_json::Value = serde_json::from_str(&relay.sent_frames()[0]).unwrap();
    assert_eq!(sent["file"]["name"], "blob.bin");
    assert!(sent["text"].is_null());
}

#[test]
fn test_send_file_without_name_is_aborted() {
    let relay = MockRelay::new();
    let mut session = session_with(&relay, Arc::new(MockBackend::new()));
    session.connect().unwrap();
    session.select_conversation("u2".into());

    assert!(matches!(
        session.send_file(b"x", ""),
        Err(ChatError::Attachment(_))
    ));
    assert!(session.log().is_empty());
    assert!(relay.sent_frames().is_empty());
}

#[test]
fn test_session_reconnects_after_relay_close() {
    let relay = MockRelay::new();
    let mut session = session_with(&relay, Arc::new(MockBackend::new()));
    let events = record_events(&mut session);
    session.connect().unwrap();

    let start = Instant::now();
    relay.close_live();
    session.pump(start);
    assert_eq!(session.connection_state(), ConnectionState::Disconnected);

    session.pump(start + Duration::from_millis(500));
    assert_eq!(session.connection_state(), ConnectionState::Disconnected);

    session.pump(start + Duration::from_secs(1));
    assert_eq!(session.connection_state(), ConnectionState::Connected);
    assert_eq!(relay.connect_count(), 2);

    let states: Vec<_> = events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            ChatEvent::ConnectionStateChanged { state } => Some(*state),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![
            ConnectionState::Connected,
            ConnectionState::Disconnected,
            ConnectionState::Connected,
        ]
    );
}

#[test]
fn test_logout_tears_down_session() {
    let relay = MockRelay::new();
    let backend = Arc::new(MockBackend::new());
    let mut session = session_with(&relay, backend.clone());
    let events = record_events(&mut session);
    session.connect().unwrap();
    session.select_conversation("u2".into());
    session.send_text("bye").unwrap();

    session.logout();

    assert_eq!(backend.logout_calls(), 1);
    assert!(session.context().is_none());
    assert!(session.selected().is_none());
    assert!(session.log().is_empty());
    assert!(!relay.has_live_channel());
    assert_eq!(events.lock().unwrap().last(), Some(&ChatEvent::LoggedOut));

    // No reconnect is scheduled after logout
    session.pump(Instant::now() + Duration::from_secs(10));
    assert_eq!(relay.connect_count(), 1);
    assert!(matches!(session.send_text("x"), Err(ChatError::NotLoggedIn)));
}
