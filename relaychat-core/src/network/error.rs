// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network Error Types

use thiserror::Error;

/// Transport and relay errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Connection attempt failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Operation requires an open channel.
    #[error("not connected")]
    NotConnected,

    /// The relay closed the channel.
    #[error("connection closed")]
    ConnectionClosed,

    /// Writing a frame failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Reading a frame failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// A frame could not be decoded; the channel itself is still usable.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// Encoding an outbound frame failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl NetworkError {
    /// Returns true if the error means the channel is gone.
    pub fn is_connection_loss(&self) -> bool {
        !matches!(
            self,
            NetworkError::InvalidFrame(_) | NetworkError::Serialization(_)
        )
    }
}
