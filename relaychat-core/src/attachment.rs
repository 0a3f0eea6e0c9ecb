// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Attachment Codec
//!
//! Converts binary file content into a self-describing data URI
//! (`data:<mime>;base64,<payload>`) for transport, and back into raw bytes
//! for local preview. The payload is standard base64, so byte order and
//! length survive the round trip untouched.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// MIME type used when the file extension is unknown.
pub const DEFAULT_MIME: &str = "application/octet-stream";

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Attachment codec errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttachmentError {
    /// The attachment has no file name.
    #[error("attachment name is empty")]
    MissingName,

    /// The text is not a data URI.
    #[error("not a data URI (missing 'data:' prefix)")]
    NotDataUri,

    /// The data URI does not carry a base64 payload.
    #[error("data URI is not base64 encoded")]
    NotBase64,

    /// The base64 payload is malformed.
    #[error("invalid base64 payload: {0}")]
    InvalidPayload(String),
}

/// Encodes raw bytes as a data URI with the given MIME type.
pub fn encode(bytes: &[u8], mime: &str) -> String {
    let mime = if mime.is_empty() { DEFAULT_MIME } else { mime };
    format!("{DATA_PREFIX}{mime}{BASE64_MARKER}{}", STANDARD.encode(bytes))
}

/// Decodes a data URI produced by [`encode`] back into raw bytes.
pub fn decode(text: &str) -> Result<Vec<u8>, AttachmentError> {
    let (_, payload) = split_data_uri(text)?;
    STANDARD
        .decode(payload)
        .map_err(|e| AttachmentError::InvalidPayload(e.to_string()))
}

/// Returns the MIME type embedded in a data URI.
pub fn mime_type(text: &str) -> Result<&str, AttachmentError> {
    split_data_uri(text).map(|(mime, _)| mime)
}

fn split_data_uri(text: &str) -> Result<(&str, &str), AttachmentError> {
    let rest = text
        .strip_prefix(DATA_PREFIX)
        .ok_or(AttachmentError::NotDataUri)?;
    let marker = rest.find(BASE64_MARKER).ok_or(AttachmentError::NotBase64)?;
    Ok((&rest[..marker], &rest[marker + BASE64_MARKER.len()..]))
}

/// Infers a MIME type from a file name's extension.
pub fn mime_for_name(name: &str) -> &'static str {
    let ext = match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return DEFAULT_MIME,
    };

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => DEFAULT_MIME,
    }
}

/// A file attached to a message.
///
/// `data` is either an inline data URI (locally composed attachments) or a
/// server-side reference such as a stored file name (attachments loaded from
/// history).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Original file name.
    pub name: String,
    /// Data URI or server reference.
    pub data: String,
}

impl Attachment {
    /// Encodes file content into an inline attachment.
    ///
    /// The MIME type is inferred from the file name.
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self, AttachmentError> {
        if name.trim().is_empty() {
            return Err(AttachmentError::MissingName);
        }
        Ok(Attachment {
            name: name.to_string(),
            data: encode(bytes, mime_for_name(name)),
        })
    }

    /// Wraps a server-side reference (e.g. an uploaded file name).
    pub fn from_reference(reference: &str) -> Self {
        let name = reference.rsplit('/').next().unwrap_or(reference);
        Attachment {
            name: name.to_string(),
            data: reference.to_string(),
        }
    }

    /// Returns true if the content is carried inline.
    pub fn is_inline(&self) -> bool {
        self.data.starts_with(DATA_PREFIX)
    }

    /// Decodes inline content for local preview.
    pub fn preview_bytes(&self) -> Result<Vec<u8>, AttachmentError> {
        decode(&self.data)
    }
}
