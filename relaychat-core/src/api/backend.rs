// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! External Collaborators
//!
//! The REST side of the chat service: profile, contact directory,
//! conversation history and logout.

use thiserror::Error;

use crate::identity::{ContactId, SessionContext};
use crate::message::MessageRecord;
use crate::presence::DirectoryEntry;

#[cfg(feature = "http")]
use reqwest::blocking::{Client, RequestBuilder, Response};
#[cfg(feature = "http")]
use reqwest::Url;
#[cfg(feature = "http")]
use std::time::Duration;

/// Errors from the REST collaborators.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The server answered with a non-success status.
    #[error("HTTP error: {0}")]
    HttpError(u16),

    /// Network/request error.
    #[cfg(feature = "http")]
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configured API base URL is unusable.
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    /// The collaborator cannot serve the request.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// REST collaborators consumed by the session.
///
/// Implementations must be shareable across threads so history fetches can
/// run off the session's thread.
pub trait Backend: Send + Sync {
    /// Resolves the local user (`GET /profile`).
    fn fetch_profile(&self) -> Result<SessionContext, BackendError>;

    /// Lists every known contact (`GET /people`).
    fn fetch_people(&self) -> Result<Vec<DirectoryEntry>, BackendError>;

    /// Returns the ordered history with a contact (`GET /messages/{id}`).
    fn fetch_history(&self, contact: &ContactId) -> Result<Vec<MessageRecord>, BackendError>;

    /// Ends the server-side session (`POST /logout`).
    fn logout(&self) -> Result<(), BackendError>;
}

/// Backend speaking to the chat service's HTTP API.
#[cfg(feature = "http")]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    access_token: Option<String>,
}

#[cfg(feature = "http")]
impl HttpBackend {
    /// Creates a backend for the given API base URL.
    pub fn new(
        base_url: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let base_url =
            Url::parse(base_url).map_err(|e| BackendError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!(
                "relaychat/{}",
                option_env!("CARGO_PKG_VERSION").unwrap_or("0.1.0")
            ))
            .build()?;

        Ok(HttpBackend {
            client,
            base_url,
            access_token,
        })
    }

    /// Returns the API base URL.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn execute(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let request = match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send()?;

        if !response.status().is_success() {
            return Err(BackendError::HttpError(response.status().as_u16()));
        }
        Ok(response)
    }

    fn get(&self, segments: &[&str]) -> Result<Response, BackendError> {
        self.execute(self.client.get(self.endpoint(segments)?))
    }
}

#[cfg(feature = "http")]
impl Backend for HttpBackend {
    fn fetch_profile(&self) -> Result<SessionContext, BackendError> {
        Ok(self.get(&["profile"])?.json()?)
    }

    fn fetch_people(&self) -> Result<Vec<DirectoryEntry>, BackendError> {
        Ok(self.get(&["people"])?.json()?)
    }

    fn fetch_history(&self, contact: &ContactId) -> Result<Vec<MessageRecord>, BackendError> {
        Ok(self.get(&["messages", contact.as_str()])?.json()?)
    }

    fn logout(&self) -> Result<(), BackendError> {
        self.execute(self.client.post(self.endpoint(&["logout"])?))?;
        Ok(())
    }
}
