// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Connection Manager
//!
//! Owns the relay channel: connects, reads and decodes frames, detects
//! closure and schedules reconnection.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::error::NetworkError;
use super::protocol::{decode_frame, encode_frame, InboundFrame, OutboundFrame};
use super::transport::{ConnectionState, Transport, TransportConfig, TransportResult};

/// Delay between a channel closing and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Something observed while polling the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The connection state changed.
    StateChanged(ConnectionState),
    /// A frame arrived and was decoded.
    Frame(InboundFrame),
}

/// Connection manager with automatic reconnection.
///
/// Wraps a transport factory and adds:
/// - A fresh transport per connection attempt (the old one is torn down)
/// - Reconnection after a constant delay, with no attempt limit
/// - A single-in-flight-connect guard: `connect` while connected is a no-op
///   and cancels any armed reconnect, so two channels never coexist
///
/// No other component writes to the transport.
///
/// # Example
///
/// ```ignore
/// use relaychat_core::network::{ConnectionManager, MockRelay, TransportConfig};
///
/// let relay = MockRelay::new();
/// let mut conn = ConnectionManager::new(relay.factory(), TransportConfig::new("ws://localhost:4040"));
/// conn.connect()?;
/// for event in conn.poll(std::time::Instant::now()) {
///     println!("{:?}", event);
/// }
/// ```
pub struct ConnectionManager<T: Transport> {
    factory: Box<dyn FnMut() -> T + Send>,
    transport: Option<T>,
    config: TransportConfig,
    state: ConnectionState,
    reconnect_delay: Duration,
    reconnect_at: Option<Instant>,
    failed_attempts: u32,
}

impl<T: Transport> ConnectionManager<T> {
    /// Creates a new connection manager.
    pub fn new<F>(factory: F, config: TransportConfig) -> Self
    where
        F: FnMut() -> T + Send + 'static,
    {
        ConnectionManager {
            factory: Box::new(factory),
            transport: None,
            config,
            state: ConnectionState::Disconnected,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            reconnect_at: None,
            failed_attempts: 0,
        }
    }

    /// Overrides the reconnect delay.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Returns the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns true if connected and ready.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Returns when the armed reconnect attempt is due, if any.
    pub fn reconnect_deadline(&self) -> Option<Instant> {
        self.reconnect_at
    }

    /// Number of consecutive failed connection attempts.
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// Returns the transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Establishes the channel now.
    pub fn connect(&mut self) -> TransportResult<()> {
        self.connect_at(Instant::now())
    }

    /// Establishes the channel, using `now` to schedule a retry on failure.
    ///
    /// Cancels any armed reconnect. No-op if already connected.
    pub fn connect_at(&mut self, now: Instant) -> TransportResult<()> {
        self.reconnect_at = None;
        if self.state != ConnectionState::Disconnected {
            return Ok(());
        }
        self.open_channel(now)
    }

    /// Closes the channel and disarms any pending reconnect.
    pub fn disconnect(&mut self) -> TransportResult<()> {
        self.reconnect_at = None;
        self.failed_attempts = 0;
        self.state = ConnectionState::Disconnected;
        match self.transport.take() {
            Some(mut transport) => {
                info!("Disconnecting from relay {}", self.config.server_url);
                transport.disconnect()
            }
            None => Ok(()),
        }
    }

    /// Serializes and transmits a frame.
    ///
    /// Fails with [`NetworkError::NotConnected`] unless connected; nothing is
    /// buffered for later delivery.
    pub fn send(&mut self, frame: &OutboundFrame) -> TransportResult<()> {
        if self.state != ConnectionState::Connected {
            return Err(NetworkError::NotConnected);
        }
        let text = encode_frame(frame)?;
        let transport = self.transport.as_mut().ok_or(NetworkError::NotConnected)?;

        match transport.send_text(&text) {
            Ok(()) => Ok(()),
            Err(e) => {
                if e.is_connection_loss() {
                    self.on_closed(Instant::now(), &e);
                }
                Err(e)
            }
        }
    }

    /// Drives the connection one step.
    ///
    /// Fires a due reconnect, then reads at most one frame. Undecodable frames
    /// are logged and dropped. A closed channel arms a reconnect at
    /// `now + reconnect_delay`.
    pub fn poll(&mut self, now: Instant) -> Vec<ConnectionEvent> {
        let mut events = Vec::new();

        if self.state == ConnectionState::Disconnected
            && self.reconnect_at.is_some_and(|at| now >= at)
        {
            self.reconnect_at = None;
            info!(
                "Reconnecting to relay {} (attempt {})",
                self.config.server_url,
                self.failed_attempts + 1
            );
            match self.open_channel(now) {
                Ok(()) => events.push(ConnectionEvent::StateChanged(self.state)),
                Err(e) => warn!("Reconnect failed: {}", e),
            }
        }

        if self.state != ConnectionState::Connected {
            return events;
        }

        let Some(transport) = self.transport.as_mut() else {
            return events;
        };

        match transport.receive_text() {
            Ok(Some(text)) => match decode_frame(&text) {
                Ok(InboundFrame::Unknown) => debug!("Ignoring unrecognized frame"),
                Ok(frame) => events.push(ConnectionEvent::Frame(frame)),
                Err(e) => warn!("Dropping undecodable frame: {}", e),
            },
            Ok(None) => {}
            Err(NetworkError::InvalidFrame(reason)) => {
                warn!("Dropping undecodable frame: {}", reason);
            }
            Err(e) => {
                self.on_closed(now, &e);
                events.push(ConnectionEvent::StateChanged(self.state));
            }
        }

        events
    }

    /// Builds a fresh transport and connects it.
    fn open_channel(&mut self, now: Instant) -> TransportResult<()> {
        if let Some(mut old) = self.transport.take() {
            let _ = old.disconnect(); // Ignore errors tearing down a dead channel
        }

        self.state = ConnectionState::Connecting;
        let mut transport = (self.factory)();

        match transport.connect(&self.config) {
            Ok(()) => {
                info!("Connected to relay {}", self.config.server_url);
                self.transport = Some(transport);
                self.state = ConnectionState::Connected;
                self.failed_attempts = 0;
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                self.failed_attempts = self.failed_attempts.saturating_add(1);
                self.reconnect_at = Some(now + self.reconnect_delay);
                Err(e)
            }
        }
    }

    fn on_closed(&mut self, now: Instant, cause: &NetworkError) {
        warn!(
            "Relay channel closed ({}), reconnecting in {:?}",
            cause, self.reconnect_delay
        );
        if let Some(mut old) = self.transport.take() {
            let _ = old.disconnect();
        }
        self.state = ConnectionState::Disconnected;
        self.reconnect_at = Some(now + self.reconnect_delay);
    }
}
