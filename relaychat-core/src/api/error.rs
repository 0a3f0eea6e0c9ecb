// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! API Error Types
//!
//! Unified error type for the session facade.

use thiserror::Error;

use super::backend::BackendError;
use crate::attachment::AttachmentError;
use crate::network::NetworkError;

/// Unified error type for session operations.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Transport operation failed.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Attachment could not be encoded; the send was aborted.
    #[error("attachment error: {0}")]
    Attachment(#[from] AttachmentError),

    /// A REST collaborator failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Sending requires a selected conversation partner.
    #[error("no conversation selected")]
    NoConversationSelected,

    /// The session has been logged out.
    #[error("not logged in")]
    NotLoggedIn,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type for session operations.
pub type ChatResult<T> = Result<T, ChatError>;
