// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Session Events
//!
//! Change notifications for whatever renders the session.

use std::sync::Arc;

use crate::identity::ContactId;
use crate::message::MessageId;
use crate::network::ConnectionState;

/// Events emitted by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Relay connection state changed.
    ConnectionStateChanged {
        /// The new connection state.
        state: ConnectionState,
    },

    /// A roster broadcast replaced the presence set.
    PresenceChanged {
        /// Number of reachable contacts, self included.
        online: usize,
    },

    /// The contact directory was refreshed.
    DirectoryChanged {
        /// Number of known contacts.
        contacts: usize,
    },

    /// A message frame was accepted into the log.
    MessageReceived {
        /// Author.
        sender: ContactId,
        /// Message ID, if the relay assigned one.
        message_id: Option<MessageId>,
    },

    /// A message was handed to the relay and appended optimistically.
    MessageSent {
        /// Addressee.
        recipient: ContactId,
        /// Local message ID.
        message_id: MessageId,
    },

    /// Sending failed; the message was not appended.
    MessageFailed {
        /// Addressee.
        recipient: ContactId,
        /// Error description.
        error: String,
    },

    /// The selected conversation partner changed and the log was cleared.
    ConversationSelected {
        /// New partner.
        contact_id: ContactId,
    },

    /// History for the selected conversation was installed.
    HistoryLoaded {
        /// Conversation partner.
        contact_id: ContactId,
        /// Number of records installed.
        messages: usize,
    },

    /// Fetching history for the selected conversation failed; the log stays
    /// empty.
    HistoryFailed {
        /// Conversation partner.
        contact_id: ContactId,
        /// Error description.
        error: String,
    },

    /// The session was logged out.
    LoggedOut,
}

/// Receives session events.
///
/// Handlers run synchronously on the session's thread, in registration
/// order, and must not block.
pub trait EventHandler: Send + Sync {
    /// Handles one event.
    fn on_event(&self, event: ChatEvent);
}

/// Adapts a closure into an [`EventHandler`].
pub struct CallbackHandler<F>
where
    F: Fn(ChatEvent) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: Fn(ChatEvent) + Send + Sync,
{
    /// Wraps `callback`.
    pub fn new(callback: F) -> Self {
        CallbackHandler { callback }
    }
}

impl<F> EventHandler for CallbackHandler<F>
where
    F: Fn(ChatEvent) + Send + Sync,
{
    fn on_event(&self, event: ChatEvent) {
        (self.callback)(event)
    }
}

/// Fans events out to the registered handlers.
#[derive(Default)]
pub struct EventDispatcher {
    subscribers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    /// Creates a dispatcher with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler; it sees every later event.
    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.subscribers.push(handler);
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Returns true if nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Delivers `event` to every handler.
    pub fn dispatch(&self, event: ChatEvent) {
        if let Some((last, rest)) = self.subscribers.split_last() {
            for subscriber in rest {
                subscriber.on_event(event.clone());
            }
            last.on_event(event);
        }
    }
}
