// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Wire Frames
//!
//! JSON frames exchanged over the real-time channel.

use serde::{Deserialize, Serialize};

use super::error::NetworkError;
use crate::message::Timestamp;

/// Frame type carrying a chat message.
pub const MESSAGE_FRAME_TYPE: &str = "message";

/// Outbound chat message frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundFrame {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub sender: String,
    pub conversation_id: String,
    pub timestamp: Timestamp,
    pub client_message_id: String,
}

impl OutboundFrame {
    /// Creates a `message` frame.
    pub fn message(
        text: &str,
        sender: &str,
        conversation_id: &str,
        timestamp: Timestamp,
        client_message_id: &str,
    ) -> Self {
        OutboundFrame {
            kind: MESSAGE_FRAME_TYPE.to_string(),
            text: text.to_string(),
            sender: sender.to_string(),
            conversation_id: conversation_id.to_string(),
            timestamp,
            client_message_id: client_message_id.to_string(),
        }
    }
}

/// Server ids arrive as strings or as numbers depending on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(u64),
}

impl WireId {
    /// Returns the id as a string, or `None` if it is an empty string.
    pub fn into_non_empty(self) -> Option<String> {
        match self {
            WireId::Text(s) if s.is_empty() => None,
            WireId::Text(s) => Some(s),
            WireId::Number(n) => Some(n.to_string()),
        }
    }
}

/// Inbound frame as received. Only `type` is required at this level.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
    #[serde(default)]
    pub id: Option<WireId>,
    #[serde(default)]
    pub client_message_id: Option<String>,
}

/// A validated inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub conversation_id: Option<String>,
    pub text: String,
    pub sender: String,
    pub timestamp: Option<Timestamp>,
    pub id: Option<String>,
    pub client_message_id: Option<String>,
}

impl InboundFrame {
    /// Returns true for a chat message frame.
    pub fn is_message(&self) -> bool {
        self.kind == MESSAGE_FRAME_TYPE
    }

    /// Validates the shape of a `message` frame.
    pub fn into_message(self) -> Result<InboundMessage, NetworkError> {
        let text = self
            .text
            .filter(|t| !t.is_empty())
            .ok_or_else(|| NetworkError::MalformedFrame("missing or empty text".into()))?;
        let sender = self
            .sender
            .filter(|s| !s.is_empty())
            .ok_or_else(|| NetworkError::MalformedFrame("missing sender".into()))?;

        Ok(InboundMessage {
            conversation_id: self.conversation_id,
            text,
            sender,
            timestamp: self.timestamp,
            id: self.id.and_then(WireId::into_non_empty),
            client_message_id: self.client_message_id.filter(|c| !c.is_empty()),
        })
    }
}

/// Encodes an outbound frame as JSON text.
pub fn encode_frame(frame: &OutboundFrame) -> Result<String, NetworkError> {
    serde_json::to_string(frame).map_err(|e| NetworkError::Serialization(e.to_string()))
}

/// Decodes an inbound JSON text frame.
pub fn decode_frame(raw: &str) -> Result<InboundFrame, NetworkError> {
    serde_json::from_str(raw).map_err(|e| NetworkError::MalformedFrame(e.to_string()))
}
