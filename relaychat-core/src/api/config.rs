// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Session Configuration

use std::env;
use std::time::Duration;

use crate::network::{TransportConfig, DEFAULT_RECONNECT_DELAY};

/// Configuration for a chat session.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Relay WebSocket URL.
    pub relay_url: String,
    /// Base URL of the REST API (profile, people, messages, logout).
    pub api_base_url: String,
    /// Bearer token for the REST API, issued by the login flow.
    pub access_token: Option<String>,
    /// Delay before reconnecting after the channel closes.
    pub reconnect_delay: Duration,
    /// Connection timeout for the relay and the REST API.
    pub connect_timeout: Duration,
    /// Relay read timeout; bounds how long one poll blocks.
    pub io_timeout: Duration,
    /// Relay write timeout; a send that cannot complete within it fails.
    pub write_timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig {
            relay_url: "ws://localhost:4040".to_string(),
            api_base_url: "http://localhost:4040".to_string(),
            access_token: None,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: Duration::from_secs(10),
            io_timeout: Duration::from_millis(250),
            write_timeout: Duration::from_secs(30),
        }
    }
}

impl ChatConfig {
    /// Loads configuration from environment variables.
    ///
    /// - `RELAYCHAT_RELAY_URL`: relay WebSocket URL
    /// - `RELAYCHAT_API_URL`: REST API base URL
    /// - `RELAYCHAT_TOKEN`: bearer token
    /// - `RELAYCHAT_RECONNECT_MS`: reconnect delay in milliseconds
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        let defaults = ChatConfig::default();

        ChatConfig {
            relay_url: env::var("RELAYCHAT_RELAY_URL").unwrap_or(defaults.relay_url),
            api_base_url: env::var("RELAYCHAT_API_URL").unwrap_or(defaults.api_base_url),
            access_token: env::var("RELAYCHAT_TOKEN").ok().filter(|t| !t.is_empty()),
            reconnect_delay: env::var("RELAYCHAT_RECONNECT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.reconnect_delay),
            ..defaults
        }
    }

    /// Sets the relay URL.
    pub fn with_relay_url(mut self, url: &str) -> Self {
        self.relay_url = url.to_string();
        self
    }

    /// Sets the REST API base URL.
    pub fn with_api_base_url(mut self, url: &str) -> Self {
        self.api_base_url = url.to_string();
        self
    }

    /// Sets the bearer token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Sets the reconnect delay.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Derives the relay transport configuration.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            server_url: self.relay_url.clone(),
            connect_timeout_ms: millis(self.connect_timeout),
            io_timeout_ms: millis(self.io_timeout),
            write_timeout_ms: millis(self.write_timeout),
        }
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
