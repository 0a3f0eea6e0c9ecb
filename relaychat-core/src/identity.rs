// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Session Identity
//!
//! Contact identifiers and the local user's session context.
//!
//! The identity provider (login form, token exchange) lives outside the core;
//! the session only consumes the resulting id and display name.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque unique identifier for a user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(String);

impl ContactId {
    /// Creates a contact ID from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        ContactId(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContactId {
    fn from(id: &str) -> Self {
        ContactId(id.to_string())
    }
}

impl From<String> for ContactId {
    fn from(id: String) -> Self {
        ContactId(id)
    }
}

impl AsRef<str> for ContactId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContactId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The local user of a session.
///
/// Passed explicitly to the session at construction instead of living in
/// ambient global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// The local user's contact ID.
    #[serde(rename = "userId")]
    pub id: ContactId,
    /// The local user's display name.
    pub username: String,
}

impl SessionContext {
    /// Creates a new session context.
    pub fn new(id: impl Into<ContactId>, username: impl Into<String>) -> Self {
        SessionContext {
            id: id.into(),
            username: username.into(),
        }
    }

    /// Returns true if the given contact is the local user.
    pub fn is_self(&self, contact: &ContactId) -> bool {
        &self.id == contact
    }
}
