// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Session Facade
//!
//! Main entry point: combines the connection manager, presence tracker and
//! message log behind the operations a chat view needs.
//!
//! All state changes happen inside `&mut self` methods, so a session is
//! serialized by construction. The three event sources (relay frames, user
//! actions, the reconnect timer) meet in [`Session::pump`] and the user-facing
//! methods; history fetched on other threads comes back through a
//! single-consumer queue drained by `pump`.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, info, warn};

use super::backend::{Backend, BackendError};
use super::config::ChatConfig;
use super::error::{ChatError, ChatResult};
use super::events::{CallbackHandler, ChatEvent, EventDispatcher, EventHandler};
use crate::attachment::Attachment;
use crate::identity::{ContactId, SessionContext};
use crate::message::{MessageId, MessageLog, MessageRecord};
use crate::network::{
    ConnectionEvent, ConnectionManager, ConnectionState, InboundFrame, OutboundFrame, Transport,
};
use crate::presence::{ContactSet, PresenceTracker};

/// Identifies one history fetch.
///
/// Every conversation switch bumps the session's generation; a result
/// carrying an older generation is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    /// Selection generation the fetch belongs to.
    pub generation: u64,
    /// Conversation partner whose history is fetched.
    pub contact_id: ContactId,
}

/// Work posted to a session from outside its thread.
#[derive(Debug)]
pub enum SessionEvent {
    /// A history fetch finished.
    HistoryLoaded {
        /// The request this result answers.
        request: HistoryRequest,
        /// Fetched records or the fetch error.
        result: Result<Vec<MessageRecord>, BackendError>,
    },
}

/// Cloneable handle for posting [`SessionEvent`]s to a session.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<SessionEvent>,
}

impl EventSender {
    /// Posts an event. Returns false if the session is gone.
    pub fn post(&self, event: SessionEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Posts a finished history fetch.
    pub fn history_loaded(
        &self,
        request: HistoryRequest,
        result: Result<Vec<MessageRecord>, BackendError>,
    ) -> bool {
        self.post(SessionEvent::HistoryLoaded { request, result })
    }
}

/// A chat session for one local user.
///
/// # Example
///
/// ```ignore
/// use relaychat_core::api::{ChatConfig, HttpBackend, Session};
/// use relaychat_core::SessionContext;
///
/// let config = ChatConfig::from_env();
/// let backend = Arc::new(HttpBackend::new(&config.api_base_url, config.access_token.clone(), config.connect_timeout)?);
/// let mut session = Session::websocket(SessionContext::new("u1", "alice"), &config, backend);
///
/// session.connect()?;
/// let request = session.select_conversation("u2".into());
/// session.spawn_history_fetch(request);
///
/// loop {
///     session.pump(Instant::now());
///     for message in session.messages() {
///         // render
///     }
/// }
/// ```
pub struct Session<T: Transport> {
    context: Option<SessionContext>,
    connection: ConnectionManager<T>,
    presence: PresenceTracker,
    log: MessageLog,
    selected: Option<ContactId>,
    generation: u64,
    backend: Arc<dyn Backend>,
    events: EventDispatcher,
    queue_tx: Sender<SessionEvent>,
    queue_rx: Receiver<SessionEvent>,
}

#[cfg(any(feature = "network-native-tls", feature = "network-rustls"))]
impl Session<crate::network::WebSocketTransport> {
    /// Creates a session speaking WebSocket to the configured relay.
    pub fn websocket(
        context: SessionContext,
        config: &ChatConfig,
        backend: Arc<dyn Backend>,
    ) -> Self {
        Self::new(
            context,
            config,
            backend,
            crate::network::WebSocketTransport::new,
        )
    }

    /// Creates a fully wired session from configuration.
    ///
    /// Resolves the local user through the profile endpoint using the
    /// configured access token.
    #[cfg(feature = "http")]
    pub fn from_config(config: &ChatConfig) -> ChatResult<Self> {
        if config.access_token.is_none() {
            return Err(ChatError::Configuration("access token not set".into()));
        }
        let backend = Arc::new(super::backend::HttpBackend::new(
            &config.api_base_url,
            config.access_token.clone(),
            config.connect_timeout,
        )?);
        let context = backend.fetch_profile()?;
        info!("Resolved profile for {} ({})", context.username, context.id);
        Ok(Self::websocket(context, config, backend))
    }
}

impl<T: Transport> Session<T> {
    /// Creates a session with a custom transport factory.
    pub fn new<F>(
        context: SessionContext,
        config: &ChatConfig,
        backend: Arc<dyn Backend>,
        transport_factory: F,
    ) -> Self
    where
        F: FnMut() -> T + Send + 'static,
    {
        let connection = ConnectionManager::new(transport_factory, config.transport())
            .with_reconnect_delay(config.reconnect_delay);
        let (queue_tx, queue_rx) = mpsc::channel();

        Session {
            context: Some(context),
            connection,
            presence: PresenceTracker::new(),
            log: MessageLog::new(),
            selected: None,
            generation: 0,
            backend,
            events: EventDispatcher::new(),
            queue_tx,
            queue_rx,
        }
    }

    // === Events ===

    /// Adds an event handler.
    pub fn add_event_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.events.add_handler(handler);
    }

    /// Adds a closure as event handler.
    pub fn on_event<F>(&mut self, callback: F)
    where
        F: Fn(ChatEvent) + Send + Sync + 'static,
    {
        self.events.add_handler(Arc::new(CallbackHandler::new(callback)));
    }

    /// Returns a handle for posting work to this session from other threads.
    pub fn event_sender(&self) -> EventSender {
        EventSender {
            tx: self.queue_tx.clone(),
        }
    }

    // === State ===

    /// The local user, until logout.
    pub fn context(&self) -> Option<&SessionContext> {
        self.context.as_ref()
    }

    /// The selected conversation partner.
    pub fn selected(&self) -> Option<&ContactId> {
        self.selected.as_ref()
    }

    /// Relay connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// When the next automatic reconnect is due, if one is armed.
    pub fn reconnect_deadline(&self) -> Option<Instant> {
        self.connection.reconnect_deadline()
    }

    /// Presence and directory state.
    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// The raw message log.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Reachable contacts, excluding the local user.
    pub fn online_contacts(&self) -> ContactSet {
        match &self.context {
            Some(ctx) => self.presence.online_contacts(&ctx.id),
            None => ContactSet::new(),
        }
    }

    /// Known but unreachable contacts, excluding the local user.
    pub fn offline_contacts(&self) -> ContactSet {
        match &self.context {
            Some(ctx) => self.presence.offline_contacts(&ctx.id),
            None => ContactSet::new(),
        }
    }

    /// Deduplicated messages of the selected conversation, in log order.
    pub fn messages(&self) -> impl Iterator<Item = &MessageRecord> + '_ {
        let pair = match (&self.context, &self.selected) {
            (Some(ctx), Some(partner)) => Some((&ctx.id, partner)),
            _ => None,
        };
        self.log
            .deduplicated_view()
            .filter(move |record| pair.is_some_and(|(me, partner)| record.is_between(me, partner)))
    }

    // === Connection ===

    /// Connects to the relay.
    pub fn connect(&mut self) -> ChatResult<()> {
        self.connect_at(Instant::now())
    }

    /// Connects to the relay, scheduling a retry relative to `now` on failure.
    pub fn connect_at(&mut self, now: Instant) -> ChatResult<()> {
        if self.context.is_none() {
            return Err(ChatError::NotLoggedIn);
        }
        let before = self.connection.state();
        let result = self.connection.connect_at(now);
        self.notify_state(before);
        result.map_err(ChatError::from)
    }

    /// Processes everything that happened since the last call.
    ///
    /// Polls the relay (firing a due reconnect and reading a frame), then
    /// drains posted session events, applying each in arrival order. Returns
    /// the number of events applied.
    pub fn pump(&mut self, now: Instant) -> usize {
        let mut applied = 0;

        for event in self.connection.poll(now) {
            self.apply_connection_event(event);
            applied += 1;
        }

        while let Ok(event) = self.queue_rx.try_recv() {
            self.apply_session_event(event);
            applied += 1;
        }

        applied
    }

    // === Directory ===

    /// Fetches the contact directory and recomputes the offline set.
    pub fn refresh_directory(&mut self) -> ChatResult<usize> {
        let people = self.backend.fetch_people()?;
        self.presence.set_directory(people);
        let contacts = self.presence.directory().len();
        self.events.dispatch(ChatEvent::DirectoryChanged { contacts });
        Ok(contacts)
    }

    // === Conversation ===

    /// Selects a conversation partner.
    ///
    /// Clears the log immediately and returns the history request to run.
    /// Any fetch still in flight for an earlier selection becomes stale.
    pub fn select_conversation(&mut self, contact_id: ContactId) -> HistoryRequest {
        self.generation += 1;
        self.selected = Some(contact_id.clone());
        self.log.clear();
        debug!("Selected conversation {} (generation {})", contact_id, self.generation);
        self.events.dispatch(ChatEvent::ConversationSelected {
            contact_id: contact_id.clone(),
        });

        HistoryRequest {
            generation: self.generation,
            contact_id,
        }
    }

    /// Fetches history for `request` on this thread and installs it.
    pub fn load_history(&mut self, request: HistoryRequest) -> ChatResult<bool> {
        let result = self.backend.fetch_history(&request.contact_id);
        self.complete_history(request, result)
    }

    /// Fetches history for `request` on a worker thread.
    ///
    /// The result is posted back and installed by the next [`Session::pump`].
    pub fn spawn_history_fetch(&self, request: HistoryRequest) -> JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        let sender = self.event_sender();

        thread::spawn(move || {
            let result = backend.fetch_history(&request.contact_id);
            if !sender.history_loaded(request, result) {
                debug!("Session dropped before history arrived");
            }
        })
    }

    /// Installs a fetched history if it still belongs to the current
    /// selection.
    ///
    /// Returns `Ok(false)` for a stale result, which is discarded. A fetch
    /// error for the current selection is returned, dispatched as
    /// [`ChatEvent::HistoryFailed`], and leaves the log as it was (empty after
    /// the switch).
    pub fn complete_history(
        &mut self,
        request: HistoryRequest,
        result: Result<Vec<MessageRecord>, BackendError>,
    ) -> ChatResult<bool> {
        if request.generation != self.generation
            || self.selected.as_ref() != Some(&request.contact_id)
        {
            debug!(
                "Discarding stale history for {} (generation {}, current {})",
                request.contact_id, request.generation, self.generation
            );
            return Ok(false);
        }

        let records = match result {
            Ok(records) => records,
            Err(e) => {
                self.events.dispatch(ChatEvent::HistoryFailed {
                    contact_id: request.contact_id,
                    error: e.to_string(),
                });
                return Err(e.into());
            }
        };
        let messages = records.len();
        self.log.replace_from_history(records);
        self.events.dispatch(ChatEvent::HistoryLoaded {
            contact_id: request.contact_id,
            messages,
        });
        Ok(true)
    }

    // === Sending ===

    /// Sends a text message to the selected partner.
    ///
    /// On success the message is appended to the log right away.
    pub fn send_text(&mut self, text: &str) -> ChatResult<MessageId> {
        let (sender, recipient) = self.route()?;
        self.transmit(MessageRecord::text(sender, recipient, text))
    }

    /// Sends a file to the selected partner.
    ///
    /// The optimistic record carries the inline data URI, so the sender can
    /// preview the attachment without a round trip.
    pub fn send_file(&mut self, bytes: &[u8], name: &str) -> ChatResult<MessageId> {
        let (sender, recipient) = self.route()?;
        let attachment = Attachment::from_bytes(name, bytes)?;
        self.transmit(MessageRecord::file(sender, recipient, attachment))
    }

    // === Logout ===

    /// Ends the session.
    ///
    /// Tears down the relay connection, notifies the server and forgets the
    /// local identity. A failing logout request is logged, not returned.
    pub fn logout(&mut self) {
        let before = self.connection.state();
        if let Err(e) = self.connection.disconnect() {
            warn!("Error closing relay channel on logout: {}", e);
        }
        if let Err(e) = self.backend.logout() {
            warn!("Logout request failed: {}", e);
        }

        if let Some(ctx) = self.context.take() {
            info!("Logged out {}", ctx.username);
        }
        self.selected = None;
        self.generation += 1;
        self.log.clear();
        self.presence.clear();

        self.notify_state(before);
        self.events.dispatch(ChatEvent::LoggedOut);
    }

    // === Internals ===

    fn route(&self) -> ChatResult<(ContactId, ContactId)> {
        let ctx = self.context.as_ref().ok_or(ChatError::NotLoggedIn)?;
        let recipient = self
            .selected
            .clone()
            .ok_or(ChatError::NoConversationSelected)?;
        Ok((ctx.id.clone(), recipient))
    }

    fn transmit(&mut self, record: MessageRecord) -> ChatResult<MessageId> {
        let before = self.connection.state();

        if let Err(e) = self.connection.send(&OutboundFrame::from_record(&record)) {
            warn!("Failed to send message to {}: {}", record.recipient, e);
            self.notify_state(before);
            self.events.dispatch(ChatEvent::MessageFailed {
                recipient: record.recipient,
                error: e.to_string(),
            });
            return Err(e.into());
        }

        let recipient = record.recipient.clone();
        let message_id = self.log.append_optimistic(record);
        self.events.dispatch(ChatEvent::MessageSent {
            recipient,
            message_id: message_id.clone(),
        });
        Ok(message_id)
    }

    fn should_ingest(&self, record: &MessageRecord) -> bool {
        let to_self = self
            .context
            .as_ref()
            .is_some_and(|ctx| ctx.is_self(&record.recipient));
        let from_selected = self.selected.as_ref() == Some(&record.sender);
        to_self || from_selected
    }

    fn apply_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::StateChanged(state) => {
                self.events
                    .dispatch(ChatEvent::ConnectionStateChanged { state });
            }
            ConnectionEvent::Frame(InboundFrame::Roster(entries)) => {
                self.presence.apply_roster(entries);
                self.events.dispatch(ChatEvent::PresenceChanged {
                    online: self.presence.presence().len(),
                });
            }
            ConnectionEvent::Frame(InboundFrame::Message(record)) => {
                if !self.should_ingest(&record) {
                    debug!(
                        "Dropping message from {} to {}: not for this session",
                        record.sender, record.recipient
                    );
                    return;
                }
                let event = ChatEvent::MessageReceived {
                    sender: record.sender.clone(),
                    message_id: record.id.clone(),
                };
                self.log.append_inbound(record);
                self.events.dispatch(event);
            }
            ConnectionEvent::Frame(InboundFrame::Unknown) => {}
        }
    }

    fn apply_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::HistoryLoaded { request, result } => {
                let contact_id = request.contact_id.clone();
                if let Err(e) = self.complete_history(request, result) {
                    warn!("History fetch for {} failed: {}", contact_id, e);
                }
            }
        }
    }

    fn notify_state(&self, before: ConnectionState) {
        let state = self.connection.state();
        if state != before {
            self.events
                .dispatch(ChatEvent::ConnectionStateChanged { state });
        }
    }
}
