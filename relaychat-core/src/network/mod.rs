// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network + Transport Layer
//!
//! Maintains the realtime channel to the relay.
//!
//! # Architecture
//!
//! The network layer consists of:
//! - **Transport trait**: Platform-agnostic interface for the text channel
//! - **Protocol layer**: JSON frame decoding and encoding
//! - **Connection manager**: Channel lifecycle and fixed-delay reconnection
//! - **Mock relay**: Scriptable in-memory relay for tests
//!
//! # Example
//!
//! ```ignore
//! use relaychat_core::network::{ConnectionManager, TransportConfig, WebSocketTransport};
//!
//! let config = TransportConfig::new("ws://localhost:4040");
//! let mut conn = ConnectionManager::new(WebSocketTransport::new, config);
//! conn.connect()?;
//!
//! loop {
//!     for event in conn.poll(std::time::Instant::now()) {
//!         // route roster and message frames
//!     }
//! }
//! ```

pub mod connection;
pub mod error;
pub mod mock;
pub mod protocol;
pub mod transport;

#[cfg(any(feature = "network-native-tls", feature = "network-rustls"))]
pub mod websocket;

// Error types
pub use error::NetworkError;

// Frame protocol
pub use protocol::{decode_frame, encode_frame, InboundFrame, OutboundFrame};

// Transport abstraction
pub use transport::{ConnectionState, Transport, TransportConfig, TransportResult};

// Mock relay for testing
pub use mock::{MockRelay, MockTransport};

// WebSocket transport for production
#[cfg(any(feature = "network-native-tls", feature = "network-rustls"))]
pub use websocket::WebSocketTransport;

// Connection management
pub use connection::{ConnectionEvent, ConnectionManager, DEFAULT_RECONNECT_DELAY};
