// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Transport Trait
//!
//! Platform-agnostic abstraction over the real-time message channel.

use url::Url;

use super::error::NetworkError;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, NetworkError>;

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected to any server.
    Disconnected,
    /// Connection in progress.
    Connecting,
    /// Connected and ready.
    Connected,
    /// Connection lost, waiting to retry.
    Reconnecting { attempt: u32 },
}

/// Configuration for transport connections.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Server URL, including path and query.
    pub server_url: String,
    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Read/write timeout in milliseconds.
    ///
    /// A read that times out yields no frame, so this bounds how long one
    /// `receive()` blocks the event loop.
    pub io_timeout_ms: u64,
    /// Maximum reconnection attempts before manual intervention is needed.
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential backoff (milliseconds).
    pub reconnect_base_delay_ms: u64,
    /// Upper bound for the backoff delay (milliseconds).
    pub reconnect_max_delay_ms: u64,
    /// Relative jitter applied to each backoff delay (0.0 disables it).
    pub reconnect_jitter: f64,
    /// Dial on a worker thread so a slow handshake never stalls `poll()`.
    pub background_connect: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            server_url: String::new(),
            connect_timeout_ms: 10_000,
            io_timeout_ms: 30_000,
            max_reconnect_attempts: 5,
            reconnect_base_delay_ms: 1_000,
            reconnect_max_delay_ms: 30_000,
            reconnect_jitter: 0.2,
            background_connect: false,
        }
    }
}

/// Builds the socket URL for a user: `{base}/chat?userId={user}`.
pub fn chat_socket_url(base: &str, local_user_id: &str) -> Result<String, NetworkError> {
    let joined = format!("{}/chat", base.trim_end_matches('/'));
    let mut url = Url::parse(&joined).map_err(|e| NetworkError::InvalidUrl(e.to_string()))?;

    match url.scheme() {
        "ws" | "wss" => {}
        other => {
            return Err(NetworkError::InvalidUrl(format!(
                "expected ws:// or wss://, got {}://",
                other
            )))
        }
    }

    url.query_pairs_mut().append_pair("userId", local_user_id);
    Ok(url.into())
}

/// Transport trait for the real-time channel.
///
/// Frames are JSON text. Implementations may use an async runtime
/// internally but expose a blocking interface; `receive` must return
/// `Ok(None)` within the configured I/O timeout when nothing arrives.
pub trait Transport: Send + 'static {
    /// Connects to the server.
    fn connect(&mut self, config: &TransportConfig) -> TransportResult<()>;

    /// Disconnects from the server.
    ///
    /// Safe to call even if not connected.
    fn disconnect(&mut self) -> TransportResult<()>;

    /// Returns the current connection state.
    fn state(&self) -> ConnectionState;

    /// Sends one text frame. Returns an error if not connected.
    fn send(&mut self, frame: &str) -> TransportResult<()>;

    /// Receives the next text frame, or `Ok(None)` if none is available.
    fn receive(&mut self) -> TransportResult<Option<String>>;

    /// Checks if there are frames waiting to be received (non-blocking).
    fn has_pending(&self) -> bool;
}
