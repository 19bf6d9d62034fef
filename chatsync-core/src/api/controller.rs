// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Reconciliation Controller
//!
//! Orchestrates optimistic local sends, inbound channel frames and history
//! backfills against one conversation's store and transport.
//!
//! All work happens on the caller's thread. The embedder drives the
//! controller by calling [`ReconciliationController::pump`] from its event
//! loop; transport events are processed strictly in arrival order.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::message::{fallback_messages, DeliveryStatus, LocalIdGenerator, Message, MessageId};
use crate::network::{
    decode_frame, encode_frame, ConnectionState, HistorySource, NetworkError, OutboundFrame,
    Transport, TransportEvent, TransportSession,
};
use crate::store::{MergeOutcome, MessageStore, StoreCursor, StoreObserver};

use super::config::ChatConfig;
use super::conversation::ConversationSession;
use super::error::{ChatError, ChatResult};
use super::events::{ChatEvent, EventDispatcher, EventHandler};

/// Lifecycle state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// User or conversation not known yet.
    Uninitialized,
    /// Session bound, waiting for the channel to open.
    Connecting,
    /// Channel opened at least once; sends are accepted.
    Ready,
    /// Session torn down.
    Closed,
}

/// A backfill request tagged with the epoch it was issued in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillTicket {
    pub epoch: u64,
    pub conversation_id: String,
    pub local_user_id: String,
    /// Store position when the request was issued.
    pub cursor: StoreCursor,
}

/// Result of completing a backfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackfillOutcome {
    /// The store was seeded.
    Applied {
        /// Entries in the store afterwards.
        count: usize,
        /// True if the fallback fixture was used.
        fallback: bool,
    },
    /// A newer backfill started or the session changed; nothing applied.
    Stale,
}

/// Why an inbound frame was not merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The frame type is not `message`.
    NotAMessage(String),
    /// The frame targets another (or no) conversation.
    OtherConversation(Option<String>),
    /// No conversation is bound.
    NoSession,
}

/// Result of handling one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The message went through the store's merge.
    Merged(MergeOutcome),
    /// The frame was valid but not for us.
    Ignored(IgnoreReason),
    /// The frame was malformed and dropped.
    Dropped(NetworkError),
}

/// Builds a fresh transport for each new session.
pub type TransportFactory<T> = Box<dyn Fn() -> T + Send>;

/// Drives one conversation at a time.
pub struct ReconciliationController<T: Transport> {
    config: ChatConfig,
    history: Box<dyn HistorySource>,
    clock: Arc<dyn Clock>,
    make_transport: TransportFactory<T>,
    events: EventDispatcher,
    store_observer: Option<Arc<dyn StoreObserver>>,
    local_user_id: Option<String>,
    conversation_id: Option<String>,
    session: Option<ConversationSession<T>>,
    state: ControllerState,
    ids: LocalIdGenerator,
    epoch: u64,
    backfill_requests: VecDeque<BackfillTicket>,
    last_connection_state: ConnectionState,
}

impl<T: Transport> ReconciliationController<T> {
    /// Creates an unbound controller.
    pub fn new(
        config: ChatConfig,
        history: Box<dyn HistorySource>,
        clock: Arc<dyn Clock>,
        make_transport: TransportFactory<T>,
    ) -> Self {
        ReconciliationController {
            config,
            history,
            clock,
            make_transport,
            events: EventDispatcher::new(),
            store_observer: None,
            local_user_id: None,
            conversation_id: None,
            session: None,
            state: ControllerState::Uninitialized,
            ids: LocalIdGenerator::new(),
            epoch: 0,
            backfill_requests: VecDeque::new(),
            last_connection_state: ConnectionState::Disconnected,
        }
    }

    /// Registers a lifecycle event handler.
    pub fn add_event_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.events.add_handler(handler);
    }

    /// Sets the single store subscriber.
    ///
    /// The subscriber follows the controller across sessions: every new
    /// store is created with it attached.
    pub fn subscribe_store(&mut self, observer: Arc<dyn StoreObserver>) {
        if let Some(session) = self.session.as_mut() {
            session.store_mut().subscribe(Arc::clone(&observer));
        }
        self.store_observer = Some(observer);
    }

    /// Removes the store subscriber.
    pub fn unsubscribe_store(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.store_mut().unsubscribe();
        }
        self.store_observer = None;
    }

    /// Sets or clears the local user.
    ///
    /// A change tears down the current session; once both identifiers are
    /// known a new session is opened.
    pub fn set_local_user(&mut self, local_user_id: Option<&str>) -> ChatResult<()> {
        let conversation_id = self.conversation_id.clone();
        self.bind_ids(normalize(local_user_id), conversation_id)
    }

    /// Sets or clears the active conversation. See [`Self::set_local_user`].
    pub fn set_conversation(&mut self, conversation_id: Option<&str>) -> ChatResult<()> {
        let local_user_id = self.local_user_id.clone();
        self.bind_ids(local_user_id, normalize(conversation_id))
    }

    /// Sets both identifiers at once.
    pub fn bind(&mut self, local_user_id: &str, conversation_id: &str) -> ChatResult<()> {
        self.bind_ids(normalize(Some(local_user_id)), normalize(Some(conversation_id)))
    }

    /// Returns the controller state.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Returns the channel state, or `Disconnected` without a session.
    pub fn connection_state(&self) -> ConnectionState {
        self.session
            .as_ref()
            .map(|s| s.transport().state())
            .unwrap_or(ConnectionState::Disconnected)
    }

    /// Returns the local user id, if known.
    pub fn local_user_id(&self) -> Option<&str> {
        self.local_user_id.as_deref()
    }

    /// Returns the active conversation id, if known.
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Returns the latest backfill epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Returns the active session.
    pub fn session(&self) -> Option<&ConversationSession<T>> {
        self.session.as_ref()
    }

    /// Returns the active session mutably.
    pub fn session_mut(&mut self) -> Option<&mut ConversationSession<T>> {
        self.session.as_mut()
    }

    /// Returns the active store.
    pub fn store(&self) -> Option<&MessageStore> {
        self.session.as_ref().map(|s| s.store())
    }

    /// Returns the messages in backing order, empty without a session.
    pub fn snapshot(&self) -> Vec<Message> {
        self.store().map(|s| s.snapshot()).unwrap_or_default()
    }

    /// Returns the messages sorted for display.
    pub fn sorted_view(&self) -> Vec<Message> {
        self.store().map(|s| s.sorted_view()).unwrap_or_default()
    }

    /// Processes all pending transport events. Returns how many ran.
    pub fn pump(&mut self) -> usize {
        let events = match self.session.as_mut() {
            Some(session) => session.transport_mut().poll(),
            None => return 0,
        };

        let count = events.len();
        for event in events {
            self.handle_transport_event(event);
        }
        self.sync_connection_state();
        count
    }

    /// Parses and merges one inbound frame.
    pub fn handle_frame(&mut self, raw: &str) -> FrameOutcome {
        let Some(session) = self.session.as_mut() else {
            return FrameOutcome::Ignored(IgnoreReason::NoSession);
        };

        let frame = match decode_frame(raw) {
            Ok(frame) => frame,
            Err(e) => return self.drop_frame(e),
        };
        if !frame.is_message() {
            debug!(kind = %frame.kind, "ignoring non-message frame");
            return FrameOutcome::Ignored(IgnoreReason::NotAMessage(frame.kind));
        }
        if frame.conversation_id.as_deref() != Some(session.conversation_id()) {
            debug!(
                conversation = ?frame.conversation_id,
                "ignoring frame for another conversation"
            );
            return FrameOutcome::Ignored(IgnoreReason::OtherConversation(
                frame.conversation_id,
            ));
        }
        let inbound = match frame.into_message() {
            Ok(inbound) => inbound,
            Err(e) => return self.drop_frame(e),
        };

        let now = self.clock.now_ms();
        let id = match inbound.id {
            Some(id) => MessageId::Server(id),
            None => MessageId::Local(self.ids.next(now)),
        };
        let message = Message::confirmed(
            id,
            inbound.text,
            inbound.sender,
            inbound.timestamp.unwrap_or(now),
            session.local_user_id(),
        );

        let outcome = session
            .store_mut()
            .reconcile(message, inbound.client_message_id.as_deref());
        debug!(?outcome, "inbound message merged");
        FrameOutcome::Merged(outcome)
    }

    /// Sends text as an optimistic message.
    ///
    /// Does nothing (returns `None`) for blank text or when not `Ready`.
    /// The entry is appended before transmission; a failed transmission
    /// marks it `Failed` instead of removing it.
    pub fn submit_local_text(&mut self, text: &str) -> Option<MessageId> {
        if text.trim().is_empty() {
            return None;
        }
        if self.state != ControllerState::Ready {
            debug!(state = ?self.state, "send ignored, controller not ready");
            return None;
        }
        let session = self.session.as_mut()?;

        let now = self.clock.now_ms();
        let client_message_id = self.ids.next(now);
        let pending = Message::pending(
            client_message_id.clone(),
            text,
            session.local_user_id(),
            now,
        );
        let id = pending.id().clone();
        session.store_mut().append_local(pending);

        let frame = OutboundFrame::message(
            text,
            session.local_user_id(),
            session.conversation_id(),
            now,
            &client_message_id,
        );
        if let Err(e) = transmit(session, &frame) {
            self.mark_failed(&id, e);
        }
        Some(id)
    }

    /// Re-transmits a failed message with its original correlation id.
    pub fn retry_send(&mut self, id: &MessageId) -> ChatResult<()> {
        let session = self.session.as_mut().ok_or(ChatError::NoSession)?;
        let message = session
            .store()
            .get(id)
            .ok_or_else(|| ChatError::UnknownMessage(id.to_string()))?;
        if message.status() != DeliveryStatus::Failed {
            return Err(ChatError::InvalidState(format!(
                "message {} is not failed",
                id
            )));
        }
        let client_message_id = message
            .client_message_id()
            .ok_or_else(|| ChatError::InvalidState(format!("message {} was not sent locally", id)))?;

        let frame = OutboundFrame::message(
            message.text(),
            session.local_user_id(),
            session.conversation_id(),
            message.timestamp(),
            client_message_id,
        );
        transmit(session, &frame)?;
        session.store_mut().set_status(id, DeliveryStatus::Pending);
        info!(%id, "message re-sent");
        Ok(())
    }

    /// Re-runs the backfill regardless of channel state.
    pub fn refresh(&mut self) -> ChatResult<()> {
        self.request_backfill()
    }

    /// Retries the channel immediately with a fresh attempt budget.
    pub fn reconnect_now(&mut self) -> ChatResult<()> {
        let session = self.session.as_mut().ok_or(ChatError::NoSession)?;
        session.transport_mut().reconnect_now()?;
        Ok(())
    }

    /// Starts a backfill and returns its ticket.
    ///
    /// Any earlier ticket becomes stale.
    pub fn begin_backfill(&mut self) -> ChatResult<BackfillTicket> {
        let session = self.session.as_ref().ok_or(ChatError::NoSession)?;
        self.epoch += 1;
        Ok(BackfillTicket {
            epoch: self.epoch,
            conversation_id: session.conversation_id().to_string(),
            local_user_id: session.local_user_id().to_string(),
            cursor: session.store().cursor(),
        })
    }

    /// Applies a backfill result if its ticket is still current.
    ///
    /// A failed fetch seeds the fallback fixture. Entries appended after the
    /// ticket was issued and unresolved local sends are merged back in
    /// after the seed, unless the history already holds their server copy.
    pub fn complete_backfill(
        &mut self,
        ticket: &BackfillTicket,
        result: Result<Vec<Message>, NetworkError>,
    ) -> BackfillOutcome {
        let current = ticket.epoch == self.epoch
            && self
                .session
                .as_ref()
                .is_some_and(|s| s.is_bound_to(&ticket.conversation_id, &ticket.local_user_id));
        let Some(session) = self.session.as_mut().filter(|_| current) else {
            debug!(epoch = ticket.epoch, latest = self.epoch, "stale backfill discarded");
            return BackfillOutcome::Stale;
        };

        let (messages, fallback) = match result {
            Ok(messages) => (messages, false),
            Err(e) => {
                warn!(error = %e, "history unavailable, using fallback messages");
                (
                    fallback_messages(self.clock.now_ms(), session.local_user_id()),
                    true,
                )
            }
        };

        let store = session.store_mut();
        let carried = store.carried_since(ticket.cursor);
        store.seed(messages);
        let restored = store.restore(carried);

        let count = store.len();
        info!(count, restored, fallback, epoch = ticket.epoch, "history applied");
        self.events
            .dispatch(ChatEvent::HistoryLoaded { count, fallback });
        BackfillOutcome::Applied { count, fallback }
    }

    /// Takes the backfill tickets queued in deferred mode.
    ///
    /// The embedder fetches each one and passes the result to
    /// [`Self::complete_backfill`].
    pub fn take_backfill_requests(&mut self) -> Vec<BackfillTicket> {
        self.backfill_requests.drain(..).collect()
    }

    /// Closes the session and forgets both identifiers.
    pub fn close(&mut self) {
        self.teardown();
        self.local_user_id = None;
        self.conversation_id = None;
        self.set_state(ControllerState::Closed);
    }

    fn bind_ids(
        &mut self,
        local_user_id: Option<String>,
        conversation_id: Option<String>,
    ) -> ChatResult<()> {
        if local_user_id == self.local_user_id
            && conversation_id == self.conversation_id
            && (self.session.is_some() || local_user_id.is_none() || conversation_id.is_none())
        {
            return Ok(());
        }

        if self.session.is_some() {
            self.teardown();
            self.set_state(ControllerState::Closed);
        }
        self.local_user_id = local_user_id;
        self.conversation_id = conversation_id;

        match (self.local_user_id.clone(), self.conversation_id.clone()) {
            (Some(user), Some(conversation)) => self.open_session(&user, &conversation),
            _ => Ok(()),
        }
    }

    fn open_session(&mut self, local_user_id: &str, conversation_id: &str) -> ChatResult<()> {
        let transport = TransportSession::new(
            (self.make_transport)(),
            self.config.socket_base_url.clone(),
            self.config.transport.clone(),
            Arc::clone(&self.clock),
        );
        let mut store = MessageStore::with_fuzzy_window(self.config.fuzzy_window_ms);
        if let Some(observer) = &self.store_observer {
            store.subscribe(Arc::clone(observer));
        }

        let session = ConversationSession::open(local_user_id, conversation_id, transport, store)?;
        info!(user = local_user_id, conversation = conversation_id, "conversation bound");
        self.session = Some(session);
        self.set_state(ControllerState::Connecting);
        self.sync_connection_state();
        Ok(())
    }

    fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
            info!(conversation = session.conversation_id(), "conversation closed");
        }
        // Invalidates in-flight backfills for the old session.
        self.epoch += 1;
        self.backfill_requests.clear();
        self.sync_connection_state();
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => {
                if self.state == ControllerState::Connecting {
                    self.set_state(ControllerState::Ready);
                }
                if let Err(e) = self.request_backfill() {
                    warn!(error = %e, "backfill not started");
                }
            }
            TransportEvent::Frame(raw) => {
                self.handle_frame(&raw);
            }
            TransportEvent::Error(e) => {
                warn!(error = %e, "transport error");
                self.events.dispatch(ChatEvent::Error {
                    message: e.to_string(),
                });
            }
            TransportEvent::Closed => {
                info!("channel closed, waiting for reconnect");
            }
        }
    }

    fn request_backfill(&mut self) -> ChatResult<()> {
        let ticket = self.begin_backfill()?;
        if self.config.deferred_backfill {
            debug!(epoch = ticket.epoch, "backfill queued");
            self.backfill_requests.push_back(ticket);
            return Ok(());
        }

        let result = self
            .history
            .fetch_history(&ticket.conversation_id, &ticket.local_user_id);
        self.complete_backfill(&ticket, result);
        Ok(())
    }

    fn drop_frame(&mut self, error: NetworkError) -> FrameOutcome {
        warn!(error = %error, "malformed frame dropped");
        self.events.dispatch(ChatEvent::FrameDropped {
            reason: error.to_string(),
        });
        FrameOutcome::Dropped(error)
    }

    fn mark_failed(&mut self, id: &MessageId, error: NetworkError) {
        warn!(%id, error = %error, "send failed, message marked failed");
        if let Some(session) = self.session.as_mut() {
            session.store_mut().set_status(id, DeliveryStatus::Failed);
        }
        self.events.dispatch(ChatEvent::MessageFailed {
            message_id: id.clone(),
            error: error.to_string(),
        });
    }

    fn set_state(&mut self, state: ControllerState) {
        if self.state == state {
            return;
        }
        info!(from = ?self.state, to = ?state, "controller state changed");
        self.state = state;
        self.events.dispatch(ChatEvent::StateChanged { state });
    }

    fn sync_connection_state(&mut self) {
        let state = self.connection_state();
        if state != self.last_connection_state {
            self.last_connection_state = state;
            self.events
                .dispatch(ChatEvent::ConnectionStateChanged { state });
        }
    }
}

fn transmit<T: Transport>(
    session: &mut ConversationSession<T>,
    frame: &OutboundFrame,
) -> Result<(), NetworkError> {
    let raw = encode_frame(frame)?;
    session.transport_mut().send(&raw)
}

fn normalize(id: Option<&str>) -> Option<String> {
    id.map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

// INLINE_TEST_REQUIRED: Tests private identifier normalization
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_treats_blank_as_absent() {
        assert_eq!(normalize(None), None);
        assert_eq!(normalize(Some("   ")), None);
        assert_eq!(normalize(Some(" alice ")), Some("alice".to_string()));
    }
}
