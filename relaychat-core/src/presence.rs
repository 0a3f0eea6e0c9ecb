// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Presence Tracker
//!
//! Classifies known contacts into reachable and unreachable sets.
//!
//! The reachable set is replaced wholesale by every roster broadcast and is
//! never merged with a previous one. The offline set is derived on demand
//! from the contact directory, so it always reflects the latest roster.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identity::ContactId;

/// One entry of a roster broadcast (`{ userId, username }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Reachable contact.
    #[serde(rename = "userId")]
    pub user_id: ContactId,
    /// Display name announced with the roster.
    pub username: String,
}

impl RosterEntry {
    /// Creates a roster entry.
    pub fn new(user_id: impl Into<ContactId>, username: impl Into<String>) -> Self {
        RosterEntry {
            user_id: user_id.into(),
            username: username.into(),
        }
    }
}

/// One entry of the contact directory (`{ _id, username }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Known contact.
    #[serde(rename = "_id")]
    pub id: ContactId,
    /// Display name on record.
    pub username: String,
}

impl DirectoryEntry {
    /// Creates a directory entry.
    pub fn new(id: impl Into<ContactId>, username: impl Into<String>) -> Self {
        DirectoryEntry {
            id: id.into(),
            username: username.into(),
        }
    }
}

/// Mapping from contact to display name.
pub type ContactSet = BTreeMap<ContactId, String>;

/// Tracks reachable contacts against the known contact directory.
#[derive(Debug, Default, Clone)]
pub struct PresenceTracker {
    online: ContactSet,
    directory: ContactSet,
}

impl PresenceTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the presence set with the given roster.
    ///
    /// If an ID repeats, the last entry wins.
    pub fn apply_roster<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = RosterEntry>,
    {
        self.online = entries
            .into_iter()
            .map(|entry| (entry.user_id, entry.username))
            .collect();
    }

    /// Installs the contact directory.
    pub fn set_directory<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = DirectoryEntry>,
    {
        self.directory = entries
            .into_iter()
            .map(|entry| (entry.id, entry.username))
            .collect();
    }

    /// Returns the raw presence set, exactly as last broadcast.
    pub fn presence(&self) -> &ContactSet {
        &self.online
    }

    /// Returns the contact directory.
    pub fn directory(&self) -> &ContactSet {
        &self.directory
    }

    /// Returns true if the contact appeared in the latest roster.
    pub fn is_online(&self, contact: &ContactId) -> bool {
        self.online.contains_key(contact)
    }

    /// Reachable contacts, excluding the local user.
    pub fn online_contacts(&self, self_id: &ContactId) -> ContactSet {
        self.online
            .iter()
            .filter(|(id, _)| *id != self_id)
            .map(|(id, name)| (id.clone(), name.clone()))
            .collect()
    }

    /// Known contacts that are not reachable, excluding the local user.
    pub fn offline_contacts(&self, self_id: &ContactId) -> ContactSet {
        self.directory
            .iter()
            .filter(|(id, _)| *id != self_id && !self.online.contains_key(*id))
            .map(|(id, name)| (id.clone(), name.clone()))
            .collect()
    }

    /// Resolves a display name, preferring the roster's.
    pub fn username(&self, contact: &ContactId) -> Option<&str> {
        self.online
            .get(contact)
            .or_else(|| self.directory.get(contact))
            .map(String::as_str)
    }

    /// Forgets both the presence set and the directory.
    pub fn clear(&mut self) {
        self.online.clear();
        self.directory.clear();
    }
}
