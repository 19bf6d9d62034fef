// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Conversation Session
//!
//! Binds one local user and one conversation to an owned transport
//! session and message store.

use crate::network::{Transport, TransportResult, TransportSession};
use crate::store::MessageStore;

/// One open conversation.
///
/// The transport is opened on construction and closed on [`close`] or
/// drop, so at most one connection exists per session value.
///
/// [`close`]: ConversationSession::close
pub struct ConversationSession<T: Transport> {
    local_user_id: String,
    conversation_id: String,
    transport: TransportSession<T>,
    store: MessageStore,
}

impl<T: Transport> ConversationSession<T> {
    /// Opens the transport for the user and wraps it with a fresh store.
    pub fn open(
        local_user_id: impl Into<String>,
        conversation_id: impl Into<String>,
        mut transport: TransportSession<T>,
        store: MessageStore,
    ) -> TransportResult<Self> {
        let local_user_id = local_user_id.into();
        transport.open(&local_user_id)?;
        Ok(ConversationSession {
            local_user_id,
            conversation_id: conversation_id.into(),
            transport,
            store,
        })
    }

    /// Returns the local user id.
    pub fn local_user_id(&self) -> &str {
        &self.local_user_id
    }

    /// Returns the conversation id.
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Returns true if this session is bound to the given identifiers.
    pub fn is_bound_to(&self, conversation_id: &str, local_user_id: &str) -> bool {
        self.conversation_id == conversation_id && self.local_user_id == local_user_id
    }

    /// Returns the message store.
    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Returns the message store mutably.
    pub fn store_mut(&mut self) -> &mut MessageStore {
        &mut self.store
    }

    /// Returns the transport session.
    pub fn transport(&self) -> &TransportSession<T> {
        &self.transport
    }

    /// Returns the transport session mutably.
    pub fn transport_mut(&mut self) -> &mut TransportSession<T> {
        &mut self.transport
    }

    /// Closes the transport. The store is kept until the value is dropped.
    pub fn close(&mut self) {
        self.transport.close();
    }
}

impl<T: Transport> Drop for ConversationSession<T> {
    fn drop(&mut self) {
        self.transport.close();
    }
}
