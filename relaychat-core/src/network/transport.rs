// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Relay Channel
//!
//! Platform-agnostic abstraction for the realtime channel to the relay.

use super::error::NetworkError;

/// Result of a channel operation.
pub type TransportResult<T> = Result<T, NetworkError>;

/// Lifecycle of the relay channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected to the relay.
    Disconnected,
    /// Handshake under way.
    Connecting,
    /// Open; frames can flow.
    Connected,
}

/// Where and how to open the relay channel.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Relay URL (`ws://` or `wss://`).
    pub server_url: String,
    /// Upper bound on each step of opening the channel (TCP connect, TLS and
    /// WebSocket handshakes), in milliseconds.
    pub connect_timeout_ms: u64,
    /// Read timeout on the open channel, in milliseconds.
    ///
    /// Reads that time out report "no frame", so this also bounds how long a
    /// single poll blocks. It does not apply to the handshake.
    pub io_timeout_ms: u64,
    /// Write timeout on the open channel, in milliseconds.
    pub write_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            server_url: String::new(),
            connect_timeout_ms: 10_000,
            io_timeout_ms: 250,
            write_timeout_ms: 30_000,
        }
    }
}

impl TransportConfig {
    /// Creates a config for the given relay URL with default timeouts.
    pub fn new(server_url: &str) -> Self {
        TransportConfig {
            server_url: server_url.to_string(),
            ..Default::default()
        }
    }
}

/// Transport trait for the relay channel.
///
/// Frames are UTF-8 text. Implementations are synchronous; a transport whose
/// platform is async can block internally and expose this interface.
///
/// A transport value represents a single channel: once it has been
/// disconnected or closed by the relay, the connection manager drops it and
/// builds a fresh one for the next attempt.
pub trait Transport: Send {
    /// Opens the channel.
    fn connect(&mut self, config: &TransportConfig) -> TransportResult<()>;

    /// Closes the channel. A no-op on a closed channel.
    fn disconnect(&mut self) -> TransportResult<()>;

    /// Current lifecycle state.
    fn state(&self) -> ConnectionState;

    /// Writes one text frame. Fails with `NotConnected` on a closed channel.
    fn send_text(&mut self, frame: &str) -> TransportResult<()>;

    /// Receives the next text frame.
    ///
    /// Returns `Ok(None)` if no frame arrived before the read timeout.
    /// Returns `NetworkError::ConnectionClosed` once the relay has closed
    /// the channel.
    fn receive_text(&mut self) -> TransportResult<Option<String>>;
}
