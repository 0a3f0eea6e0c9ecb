// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Common Test Utilities
//!
//! Shared fixtures used across test modules: a scriptable REST backend and
//! session constructors wired to the in-memory relay.

#![allow(dead_code)]


use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use relaychat_core::api::{Backend, BackendError, ChatConfig, ChatEvent, Session};
use relaychat_core::{
    ContactId, DirectoryEntry, MessageRecord, MockRelay, MockTransport, SessionContext,
};

/// Scriptable in-memory REST backend.
#[derive(Default)]
pub struct MockBackend {
    people: Mutex<Vec<DirectoryEntry>>,
    histories: Mutex<HashMap<ContactId, Vec<MessageRecord>>>,
    failing_history: Mutex<bool>,
    history_calls: AtomicUsize,
    logout_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_people(self, people: Vec<DirectoryEntry>) -> Self {
        *self.people.lock().unwrap() = people;
        self
    }

    pub fn with_history(self, contact: &str, records: Vec<MessageRecord>) -> Self {
        self.histories
            .lock()
            .unwrap()
            .insert(ContactId::from(contact), records);
        self
    }

    pub fn fail_history(&self, fail: bool) {
        *self.failing_history.lock().unwrap() = fail;
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

impl Backend for MockBackend {
    fn fetch_profile(&self) -> Result<SessionContext, BackendError> {
        Ok(alice())
    }

    fn fetch_people(&self) -> Result<Vec<DirectoryEntry>, BackendError> {
        Ok(self.people.lock().unwrap().clone())
    }

    fn fetch_history(&self, contact: &ContactId) -> Result<Vec<MessageRecord>, BackendError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if *self.failing_history.lock().unwrap() {
            return Err(BackendError::HttpError(500));
        }
        Ok(self
            .histories
            .lock()
            .unwrap()
            .get(contact)
            .cloned()
            .unwrap_or_default())
    }

    fn logout(&self) -> Result<(), BackendError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// The local user in every fixture.
pub fn alice() -> SessionContext {
    SessionContext::new("u1", "alice")
}

/// Directory of the standard fixture: alice (self), bob and carol.
pub fn standard_directory() -> Vec<DirectoryEntry> {
    vec![
        DirectoryEntry::new("u1", "alice"),
        DirectoryEntry::new("u2", "bob"),
        DirectoryEntry::new("u3", "carol"),
    ]
}

/// Creates a session for alice against the given relay and backend.
pub fn session_with(relay: &MockRelay, backend: Arc<MockBackend>) -> Session<MockTransport> {
    Session::new(alice(), &ChatConfig::default(), backend, relay.factory())
}

/// Records every event a session dispatches.
pub fn record_events(session: &mut Session<MockTransport>) -> Arc<Mutex<Vec<ChatEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    session.on_event(move |event| sink.lock().unwrap().push(event));
    events
}

/// Builds a relay message frame.
pub fn message_frame(id: &str, sender: &str, recipient: &str, text: &str) -> String {
    serde_json::json!({
        "_id": id,
        "sender": sender,
        "recipient": recipient,
        "text": text,
    })
    .to_string()
}

/// Builds a roster broadcast frame.
pub fn roster_frame(entries: &[(&str, &str)]) -> String {
    let online: Vec<_> = entries
        .iter()
        .map(|(id, name)| serde_json::json!({ "userId": id, "username": name }))
        .collect();
    serde_json::json!({ "online": online }).to_string()
}
