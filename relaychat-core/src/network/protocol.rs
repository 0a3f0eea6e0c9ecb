// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Relay Frame Protocol
//!
//! JSON text frames exchanged with the relay.
//!
//! Inbound:
//! - `{ "online": [ { "userId", "username" }, ... ] }` roster broadcast
//! - `{ "sender", "recipient", "text"?, "file"?, "_id"? }` message
//!
//! Outbound:
//! - `{ "recipient", "text", "file": { "name", "data" } | null }`

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::NetworkError;
use crate::attachment::Attachment;
use crate::identity::ContactId;
use crate::message::MessageRecord;
use crate::presence::RosterEntry;

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Complete set of currently reachable contacts.
    Roster(Vec<RosterEntry>),
    /// A chat message.
    Message(MessageRecord),
    /// Valid JSON the client does not act on.
    Unknown,
}

#[derive(Deserialize)]
struct RosterFrame {
    online: Vec<RosterEntry>,
}

/// Decodes one inbound text frame.
///
/// A frame carrying `online` is a roster; otherwise a frame carrying `text`
/// or `file` is a message. Anything else is [`InboundFrame::Unknown`].
pub fn decode_frame(text: &str) -> Result<InboundFrame, NetworkError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| NetworkError::InvalidFrame(e.to_string()))?;

    let Some(object) = value.as_object() else {
        return Ok(InboundFrame::Unknown);
    };

    if object.contains_key("online") {
        let roster: RosterFrame = serde_json::from_value(value)
            .map_err(|e| NetworkError::InvalidFrame(format!("roster: {e}")))?;
        return Ok(InboundFrame::Roster(roster.online));
    }

    if object.contains_key("text") || object.contains_key("file") {
        let record: MessageRecord = serde_json::from_value(value)
            .map_err(|e| NetworkError::InvalidFrame(format!("message: {e}")))?;
        return Ok(InboundFrame::Message(record));
    }

    Ok(InboundFrame::Unknown)
}

/// An outbound message frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    /// Addressee.
    pub recipient: ContactId,
    /// Text body (`null` for file-only messages).
    pub text: Option<String>,
    /// Attached file (`null` for text-only messages).
    pub file: Option<Attachment>,
}

impl OutboundFrame {
    /// Builds the outbound frame for a record.
    pub fn from_record(record: &MessageRecord) -> Self {
        OutboundFrame {
            recipient: record.recipient.clone(),
            text: record.text.clone(),
            file: record.attachment.clone(),
        }
    }
}

/// Encodes an outbound frame as JSON text.
pub fn encode_frame(frame: &OutboundFrame) -> Result<String, NetworkError> {
    serde_json::to_string(frame).map_err(|e| NetworkError::Serialization(e.to_string()))
}
