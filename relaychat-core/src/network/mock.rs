// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mock Transport
//!
//! In-memory relay for tests. A [`MockRelay`] hands out [`MockTransport`]
//! channels that share its state, so a test can script inbound frames,
//! close the live channel, inject connect failures, and inspect what was sent
//! across reconnects.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::error::NetworkError;
use super::transport::{ConnectionState, Transport, TransportConfig, TransportResult};

#[derive(Debug, Default)]
struct RelayState {
    /// Number of successful connects so far; doubles as the live channel's
    /// generation.
    connects: u32,
    /// Generation of the channel the relay considers live.
    live: Option<u32>,
    inbound: VecDeque<String>,
    sent: Vec<String>,
    connect_errors: VecDeque<NetworkError>,
    close_live: bool,
}

/// Scriptable in-memory relay.
#[derive(Debug, Clone, Default)]
pub struct MockRelay {
    state: Arc<Mutex<RelayState>>,
}

impl MockRelay {
    /// Creates a relay with no scripted behaviour.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RelayState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Creates a fresh, unconnected channel to this relay.
    pub fn transport(&self) -> MockTransport {
        MockTransport {
            relay: self.clone(),
            generation: None,
            state: ConnectionState::Disconnected,
        }
    }

    /// Returns a factory producing channels to this relay.
    pub fn factory(&self) -> impl FnMut() -> MockTransport + Send + 'static {
        let relay = self.clone();
        move || relay.transport()
    }

    /// Queues a frame for the live channel.
    pub fn push_inbound(&self, frame: impl Into<String>) {
        self.lock().inbound.push_back(frame.into());
    }

    /// Makes the live channel observe a relay-side close on its next read.
    pub fn close_live(&self) {
        self.lock().close_live = true;
    }

    /// Makes the next connect attempt fail with the given error.
    pub fn fail_next_connect(&self, error: NetworkError) {
        self.lock().connect_errors.push_back(error);
    }

    /// Number of successful connects.
    pub fn connect_count(&self) -> u32 {
        self.lock().connects
    }

    /// Returns true if a channel is currently open.
    pub fn has_live_channel(&self) -> bool {
        self.lock().live.is_some()
    }

    /// Frames sent by the client, across all channels.
    pub fn sent_frames(&self) -> Vec<String> {
        self.lock().sent.clone()
    }

    /// Forgets recorded sent frames.
    pub fn clear_sent(&self) {
        self.lock().sent.clear();
    }
}

/// One channel to a [`MockRelay`].
#[derive(Debug)]
pub struct MockTransport {
    relay: MockRelay,
    generation: Option<u32>,
    state: ConnectionState,
}

impl MockTransport {
    fn is_live(&self, relay: &RelayState) -> bool {
        self.generation.is_some() && relay.live == self.generation
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, _config: &TransportConfig) -> TransportResult<()> {
        let mut relay = self.relay.lock();
        if let Some(error) = relay.connect_errors.pop_front() {
            self.state = ConnectionState::Disconnected;
            return Err(error);
        }

        relay.connects += 1;
        relay.live = Some(relay.connects);
        relay.close_live = false;
        self.generation = Some(relay.connects);
        self.state = ConnectionState::Connected;
        Ok(())
    }

    fn disconnect(&mut self) -> TransportResult<()> {
        let mut relay = self.relay.lock();
        if self.is_live(&relay) {
            relay.live = None;
        }
        self.generation = None;
        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn send_text(&mut self, frame: &str) -> TransportResult<()> {
        let mut relay = self.relay.lock();
        if !self.is_live(&relay) {
            return Err(NetworkError::NotConnected);
        }
        relay.sent.push(frame.to_string());
        Ok(())
    }

    fn receive_text(&mut self) -> TransportResult<Option<String>> {
        let mut relay = self.relay.lock();
        if !self.is_live(&relay) {
            return Err(NetworkError::NotConnected);
        }
        if relay.close_live {
            relay.close_live = false;
            relay.live = None;
            drop(relay);
            self.generation = None;
            self.state = ConnectionState::Disconnected;
            return Err(NetworkError::ConnectionClosed);
        }
        Ok(relay.inbound.pop_front())
    }
}
