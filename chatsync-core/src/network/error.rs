// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network Error Types
//!
//! Error types for the real-time channel and the history service.

use thiserror::Error;

/// Network and transport error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Connection timeout")]
    Timeout,

    #[error("Message send failed: {0}")]
    SendFailed(String),

    #[error("Message receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Transport not connected")]
    NotConnected,

    #[error("Max retries exceeded")]
    MaxRetriesExceeded,

    /// The history service could not be reached.
    #[error("Network unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// An inbound frame could not be parsed or had the wrong shape.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
