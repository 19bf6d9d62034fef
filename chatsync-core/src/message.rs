// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Message Model
//!
//! Messages of one conversation, their identity and delivery status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Wall-clock milliseconds since the UNIX epoch.
pub type Timestamp = u64;

/// Identity of a message.
///
/// Server-assigned ids are authoritative. Local ids are client-temporary:
/// either the `clientMessageId` of an optimistic send or a fallback id
/// generated for an inbound frame that carried none.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "origin", content = "value", rename_all = "snake_case")]
pub enum MessageId {
    /// Assigned by the server.
    Server(String),
    /// Generated on this client.
    Local(String),
}

impl MessageId {
    /// Returns the raw id string.
    pub fn as_str(&self) -> &str {
        match self {
            MessageId::Server(id) | MessageId::Local(id) => id,
        }
    }

    /// Returns true if the id was assigned by the server.
    pub fn is_server(&self) -> bool {
        matches!(self, MessageId::Server(_))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery status of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    /// Sent optimistically, waiting for the server echo.
    Pending,
    /// Known to the server.
    Confirmed,
    /// Transmission failed; the entry stays visible until retried.
    Failed,
}

/// A chat message.
///
/// `is_mine` is derived from the sender at construction and cannot be
/// set independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    text: String,
    sender: String,
    timestamp: Timestamp,
    is_mine: bool,
    status: DeliveryStatus,
    client_message_id: Option<String>,
}

impl Message {
    /// Creates a message known to the server (history or socket push).
    pub fn confirmed(
        id: MessageId,
        text: impl Into<String>,
        sender: impl Into<String>,
        timestamp: Timestamp,
        local_user_id: &str,
    ) -> Self {
        let sender = sender.into();
        Message {
            is_mine: sender == local_user_id,
            id,
            text: text.into(),
            sender,
            timestamp,
            status: DeliveryStatus::Confirmed,
            client_message_id: None,
        }
    }

    /// Creates an optimistic message authored by the local user.
    ///
    /// The `client_message_id` doubles as the temporary local id.
    pub fn pending(
        client_message_id: impl Into<String>,
        text: impl Into<String>,
        local_user_id: &str,
        timestamp: Timestamp,
    ) -> Self {
        let client_message_id = client_message_id.into();
        Message {
            id: MessageId::Local(client_message_id.clone()),
            text: text.into(),
            sender: local_user_id.to_string(),
            timestamp,
            is_mine: true,
            status: DeliveryStatus::Pending,
            client_message_id: Some(client_message_id),
        }
    }

    /// Returns the message id.
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    /// Returns the message text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the sender's participant id.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Returns the message timestamp in milliseconds.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Returns true if the local user authored this message.
    pub fn is_mine(&self) -> bool {
        self.is_mine
    }

    /// Returns the delivery status.
    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    /// Returns the correlation id of an optimistic send, if any.
    pub fn client_message_id(&self) -> Option<&str> {
        self.client_message_id.as_deref()
    }

    /// Returns true for a local send the server has not acknowledged yet.
    pub fn is_unresolved(&self) -> bool {
        !self.id.is_server()
            && matches!(self.status, DeliveryStatus::Pending | DeliveryStatus::Failed)
    }

    pub(crate) fn set_status(&mut self, status: DeliveryStatus) {
        self.status = status;
    }

    /// Promotes an optimistic entry using the server's copy of it.
    ///
    /// The server's id is adopted only if it is server-assigned. With
    /// `overwrite`, text and timestamp are taken from the server as well.
    pub(crate) fn promote(&mut self, server: &Message, overwrite: bool) {
        if server.id.is_server() {
            self.id = server.id.clone();
        }
        if overwrite {
            self.text = server.text.clone();
            self.timestamp = server.timestamp;
        }
        self.status = DeliveryStatus::Confirmed;
    }
}

/// Generates time-based local ids that stay unique within one millisecond.
#[derive(Debug, Default)]
pub struct LocalIdGenerator {
    last: Option<(Timestamp, u32)>,
}

impl LocalIdGenerator {
    /// Creates a new generator.
    pub fn new() -> Self {
        LocalIdGenerator { last: None }
    }

    /// Returns the next id for the given time.
    ///
    /// The first id in a millisecond is the bare decimal timestamp; later
    /// ids in the same millisecond get a `-n` suffix.
    pub fn next(&mut self, now: Timestamp) -> String {
        match self.last {
            Some((ts, seq)) if ts == now => {
                let seq = seq + 1;
                self.last = Some((now, seq));
                format!("{}-{}", now, seq)
            }
            _ => {
                self.last = Some((now, 0));
                now.to_string()
            }
        }
    }
}

/// Participant id used by the fallback fixture for the remote side.
pub const FIXTURE_PEER_ID: &str = "user2";

/// Messages shown when the history service cannot be reached.
///
/// Three messages an hour old: a greeting from a peer, a reply from the
/// local user and a follow-up from the peer.
pub fn fallback_messages(now: Timestamp, local_user_id: &str) -> Vec<Message> {
    vec![
        Message::confirmed(
            MessageId::Server("1".into()),
            "Hey there! How are you?",
            FIXTURE_PEER_ID,
            now.saturating_sub(3_600_000),
            local_user_id,
        ),
        Message::confirmed(
            MessageId::Server("2".into()),
            "I'm good, thanks! How about you?",
            local_user_id,
            now.saturating_sub(3_500_000),
            local_user_id,
        ),
        Message::confirmed(
            MessageId::Server("3".into()),
            "I'm doing great! Want to meet up later?",
            FIXTURE_PEER_ID,
            now.saturating_sub(3_400_000),
            local_user_id,
        ),
    ]
}
