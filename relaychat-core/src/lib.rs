// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Relaychat Core Library
//!
//! Session and connection core of a realtime relay chat client: keeps the
//! relay channel alive, tracks which contacts are reachable, exchanges text
//! and file messages, and reconciles the optimistic message log with the
//! server's history.

pub mod api;
pub mod attachment;
pub mod identity;
pub mod message;
pub mod network;
pub mod presence;

pub use api::{
    Backend, BackendError, ChatConfig, ChatError, ChatEvent, ChatResult, EventHandler,
    HistoryRequest, Session,
};
#[cfg(feature = "http")]
pub use api::HttpBackend;
pub use attachment::{Attachment, AttachmentError};
pub use identity::{ContactId, SessionContext};
pub use message::{MessageId, MessageLog, MessageRecord};
pub use network::{
    ConnectionManager, ConnectionState, MockRelay, MockTransport, NetworkError, Transport,
    TransportConfig,
};
#[cfg(any(feature = "network-native-tls", feature = "network-rustls"))]
pub use network::WebSocketTransport;
pub use presence::{ContactSet, DirectoryEntry, PresenceTracker, RosterEntry};
