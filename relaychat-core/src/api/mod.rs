// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Session API Layer
//!
//! High-level API for a realtime relay chat client.
//!
//! # Overview
//!
//! The API layer coordinates:
//! - The relay connection and its reconnect schedule
//! - Presence (who is reachable) against the contact directory
//! - The selected conversation's message log and its history
//! - Sending text and file messages
//! - Event handling
//!
//! # Module Structure
//!
//! - [`error`] - Error types for the API layer
//! - [`config`] - Configuration types
//! - [`events`] - Event system for callbacks
//! - [`backend`] - REST collaborators (profile, people, history, logout)
//! - [`session`] - Main session facade

pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod session;

// Error types
pub use error::{ChatError, ChatResult};

// Configuration
pub use config::ChatConfig;

// Events
pub use events::{CallbackHandler, ChatEvent, EventDispatcher, EventHandler};

// Collaborators
pub use backend::{Backend, BackendError};
#[cfg(feature = "http")]
pub use backend::HttpBackend;

// Session
pub use session::{EventSender, HistoryRequest, Session, SessionEvent};
