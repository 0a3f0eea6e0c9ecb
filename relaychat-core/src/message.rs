// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Message Log
//!
//! Ordered, append-only record of the current conversation.
//!
//! Insertion order is arrival/creation order and is never re-sorted. The log
//! may transiently hold several records with the same ID (an optimistic send
//! and its echo from the relay); [`MessageLog::deduplicated_view`] collapses
//! them, keeping the first occurrence.

use std::collections::HashSet;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::attachment::Attachment;
use crate::identity::ContactId;

/// Message identifier, either server-assigned or locally generated.
///
/// The wire carries IDs as strings (server) or numbers (locally generated
/// clock values); both normalize to the same string form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(String);

impl MessageId {
    /// Creates a message ID.
    pub fn new(id: impl Into<String>) -> Self {
        MessageId(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        MessageId(id.to_string())
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        MessageId(id)
    }
}

impl Serialize for MessageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum WireId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match WireId::deserialize(deserializer)? {
            WireId::Text(s) => MessageId(s),
            WireId::Unsigned(n) => MessageId(n.to_string()),
            WireId::Signed(n) => MessageId(n.to_string()),
        })
    }
}

/// The `file` field accepts an inline `{ name, data }` object or a bare
/// server reference string.
fn deserialize_file<'de, D>(deserializer: D) -> Result<Option<Attachment>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WireFile {
        Inline(Attachment),
        Reference(String),
    }

    Ok(match Option::<WireFile>::deserialize(deserializer)? {
        Some(WireFile::Inline(att)) => Some(att),
        Some(WireFile::Reference(r)) if !r.is_empty() => Some(Attachment::from_reference(&r)),
        _ => None,
    })
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Unique within the log once deduplicated.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    /// Author.
    pub sender: ContactId,
    /// Addressee.
    pub recipient: ContactId,
    /// Text body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Attached file.
    #[serde(
        rename = "file",
        default,
        deserialize_with = "deserialize_file",
        skip_serializing_if = "Option::is_none"
    )]
    pub attachment: Option<Attachment>,
    /// Ordering token (milliseconds since the epoch for local records).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl MessageRecord {
    /// Creates a text message without an ID.
    pub fn text(sender: ContactId, recipient: ContactId, text: impl Into<String>) -> Self {
        MessageRecord {
            id: None,
            sender,
            recipient,
            text: Some(text.into()),
            attachment: None,
            timestamp: None,
        }
    }

    /// Creates a file message without an ID.
    pub fn file(sender: ContactId, recipient: ContactId, attachment: Attachment) -> Self {
        MessageRecord {
            id: None,
            sender,
            recipient,
            text: None,
            attachment: Some(attachment),
            timestamp: None,
        }
    }

    /// Sets the ID.
    pub fn with_id(mut self, id: impl Into<MessageId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Returns true if the message was exchanged between `a` and `b`, in
    /// either direction.
    pub fn is_between(&self, a: &ContactId, b: &ContactId) -> bool {
        (&self.sender == a && &self.recipient == b) || (&self.sender == b && &self.recipient == a)
    }
}

/// Generates monotonic, clock-based local message IDs.
///
/// IDs follow wall-clock milliseconds but never repeat or go backwards, even
/// for several sends within the same millisecond or after a clock step back.
#[derive(Debug, Default, Clone)]
struct LocalIdGenerator {
    last: u64,
}

impl LocalIdGenerator {
    fn next(&mut self, now_ms: u64) -> u64 {
        let id = now_ms.max(self.last.saturating_add(1));
        self.last = id;
        id
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Ordered message log for the selected conversation.
#[derive(Debug, Default, Clone)]
pub struct MessageLog {
    records: Vec<MessageRecord>,
    ids: LocalIdGenerator,
}

impl MessageLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a locally composed record before server confirmation.
    ///
    /// Assigns a local ID and timestamp if absent. No duplicate check is
    /// made. Returns the record's ID.
    pub fn append_optimistic(&mut self, mut record: MessageRecord) -> MessageId {
        let now = now_millis();
        let id = match record.id.take() {
            Some(id) => id,
            None => MessageId(self.ids.next(now).to_string()),
        };
        record.id = Some(id.clone());
        record.timestamp.get_or_insert(now);
        self.records.push(record);
        id
    }

    /// Appends a record received from the relay, as-is.
    pub fn append_inbound(&mut self, record: MessageRecord) {
        self.records.push(record);
    }

    /// Discards the log and installs an authoritative history verbatim.
    pub fn replace_from_history(&mut self, records: Vec<MessageRecord>) {
        self.records = records;
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Raw records, duplicates included.
    pub fn records(&self) -> &[MessageRecord] {
        &self.records
    }

    /// Number of raw records, duplicates included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the log holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Lazily yields one record per distinct ID, first occurrence wins.
    ///
    /// Records without an ID cannot be matched against each other and are
    /// always yielded.
    pub fn deduplicated_view(&self) -> DeduplicatedView<'_> {
        DeduplicatedView {
            inner: self.records.iter(),
            seen: HashSet::new(),
        }
    }

    /// The deduplicated view restricted to messages between `me` and `partner`.
    pub fn conversation_view<'a>(
        &'a self,
        me: &'a ContactId,
        partner: &'a ContactId,
    ) -> impl Iterator<Item = &'a MessageRecord> + 'a {
        self.deduplicated_view()
            .filter(move |record| record.is_between(me, partner))
    }
}

/// Iterator returned by [`MessageLog::deduplicated_view`].
pub struct DeduplicatedView<'a> {
    inner: std::slice::Iter<'a, MessageRecord>,
    seen: HashSet<&'a MessageId>,
}

impl<'a> Iterator for DeduplicatedView<'a> {
    type Item = &'a MessageRecord;

    fn next(&mut self) -> Option<Self::Item> {
        for record in self.inner.by_ref() {
            match &record.id {
                Some(id) if !self.seen.insert(id) => continue,
                _ => return Some(record),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}
