// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! History Service
//!
//! One-shot fetch of prior messages used to backfill a conversation:
//! `GET {api}/conversations/{conversationId}/messages/{localUserId}`
//! answering `{ "ok": bool, "data": [Message] }`.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use url::Url;

use super::error::NetworkError;
use super::frame::WireId;
use crate::message::{Message, MessageId, Timestamp};

/// Source of conversation history.
///
/// Implementations may use an async runtime internally but expose a
/// blocking interface here.
pub trait HistorySource: Send {
    /// Fetches the ordered message history of a conversation.
    fn fetch_history(
        &self,
        conversation_id: &str,
        local_user_id: &str,
    ) -> Result<Vec<Message>, NetworkError>;
}

/// A message as returned by the history service.
///
/// Any `isMine` flag in the payload is ignored and recomputed locally.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMessage {
    pub id: WireId,
    pub text: String,
    pub sender: String,
    pub timestamp: Timestamp,
}

/// Response body of the history endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub data: Option<Vec<HistoryMessage>>,
}

impl HistoryResponse {
    /// Converts the body into messages for the given local user.
    ///
    /// An explicit `ok: false` or a missing `data` field means the service
    /// is unavailable.
    pub fn into_messages(self, local_user_id: &str) -> Result<Vec<Message>, NetworkError> {
        if self.ok == Some(false) {
            return Err(NetworkError::Unavailable("history service returned ok=false".into()));
        }
        let data = self
            .data
            .ok_or_else(|| NetworkError::Unavailable("history response has no data".into()))?;

        data.into_iter()
            .map(|m| {
                let id = m.id.into_non_empty().ok_or_else(|| {
                    NetworkError::Serialization("history message without id".into())
                })?;
                Ok(Message::confirmed(
                    MessageId::Server(id),
                    m.text,
                    m.sender,
                    m.timestamp,
                    local_user_id,
                ))
            })
            .collect()
    }
}

/// Parses a history response body.
pub fn parse_history(body: &str, local_user_id: &str) -> Result<Vec<Message>, NetworkError> {
    let response: HistoryResponse =
        serde_json::from_str(body).map_err(|e| NetworkError::Serialization(e.to_string()))?;
    response.into_messages(local_user_id)
}

/// Builds the history URL with percent-encoded path segments.
pub fn history_url(
    api_base_url: &str,
    conversation_id: &str,
    local_user_id: &str,
) -> Result<String, NetworkError> {
    let mut url = Url::parse(api_base_url).map_err(|e| NetworkError::InvalidUrl(e.to_string()))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| NetworkError::InvalidUrl(format!("{} cannot be a base", api_base_url)))?;
        segments
            .pop_if_empty()
            .push("conversations")
            .push(conversation_id)
            .push("messages")
            .push(local_user_id);
    }
    Ok(url.into())
}

/// `User-Agent` sent with history requests.
pub const HISTORY_USER_AGENT: &str = concat!("chatsync/", env!("CARGO_PKG_VERSION"));

#[cfg(feature = "http-history")]
pub use http::HttpHistorySource;

#[cfg(feature = "http-history")]
mod http {
    use std::time::Duration;

    use reqwest::Client;
    use tokio::runtime::{Builder, Runtime};
    use tracing::debug;

    use super::{history_url, HistoryResponse, HistorySource, HISTORY_USER_AGENT};
    use crate::message::Message;
    use crate::network::error::NetworkError;

    /// History source backed by the REST endpoint.
    pub struct HttpHistorySource {
        client: Client,
        runtime: Runtime,
        api_base_url: String,
    }

    impl HttpHistorySource {
        /// Creates a source for the given API base URL.
        pub fn new(api_base_url: impl Into<String>, timeout: Duration) -> Result<Self, NetworkError> {
            let client = Client::builder()
                .timeout(timeout)
                .user_agent(HISTORY_USER_AGENT)
                .build()
                .map_err(|e| NetworkError::Unavailable(e.to_string()))?;

            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| NetworkError::Unavailable(e.to_string()))?;

            Ok(HttpHistorySource {
                client,
                runtime,
                api_base_url: api_base_url.into(),
            })
        }

        /// Returns the API base URL.
        pub fn api_base_url(&self) -> &str {
            &self.api_base_url
        }
    }

    impl HistorySource for HttpHistorySource {
        fn fetch_history(
            &self,
            conversation_id: &str,
            local_user_id: &str,
        ) -> Result<Vec<Message>, NetworkError> {
            let url = history_url(&self.api_base_url, conversation_id, local_user_id)?;
            debug!(%url, "fetching history");

            self.runtime.block_on(async {
                let response = self.client.get(&url).send().await.map_err(|e| {
                    if e.is_timeout() {
                        NetworkError::Timeout
                    } else {
                        NetworkError::Unavailable(e.to_string())
                    }
                })?;

                if !response.status().is_success() {
                    return Err(NetworkError::HttpStatus(response.status().as_u16()));
                }

                let body: HistoryResponse = response
                    .json()
                    .await
                    .map_err(|e| NetworkError::Serialization(e.to_string()))?;
                body.into_messages(local_user_id)
            })
        }
    }
}

#[derive(Debug, Default)]
struct MockHistoryState {
    response: Option<Result<Vec<Message>, NetworkError>>,
    requests: Vec<(String, String)>,
}

/// Scriptable history source for testing.
///
/// Clones share state. Without a scripted response every fetch fails
/// with [`NetworkError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct MockHistorySource {
    inner: Arc<Mutex<MockHistoryState>>,
}

impl MockHistorySource {
    /// Creates a source with no scripted response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later fetch return these messages.
    pub fn respond_with(&self, messages: Vec<Message>) {
        self.inner.lock().response = Some(Ok(messages));
    }

    /// Makes every later fetch fail.
    pub fn fail_with(&self, error: NetworkError) {
        self.inner.lock().response = Some(Err(error));
    }

    /// Returns `(conversation_id, local_user_id)` of every fetch, in order.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.inner.lock().requests.clone()
    }

    /// Returns the number of fetches.
    pub fn request_count(&self) -> usize {
        self.inner.lock().requests.len()
    }
}

impl HistorySource for MockHistorySource {
    fn fetch_history(
        &self,
        conversation_id: &str,
        local_user_id: &str,
    ) -> Result<Vec<Message>, NetworkError> {
        let mut inner = self.inner.lock();
        inner
            .requests
            .push((conversation_id.to_string(), local_user_id.to_string()));
        inner
            .response
            .clone()
            .unwrap_or_else(|| Err(NetworkError::Unavailable("no scripted response".into())))
    }
}
