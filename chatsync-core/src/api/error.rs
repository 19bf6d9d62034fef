// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! API Error Types
//!
//! Unified error type for the chatsync API layer.

use thiserror::Error;

use crate::identity::IdentityError;
use crate::network::NetworkError;

/// Unified error type for chatsync operations.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Network operation failed.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Identity could not be loaded or stored.
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// No conversation session is bound.
    #[error("no active conversation")]
    NoSession,

    /// Invalid operation in current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// No message with the given id.
    #[error("unknown message: {0}")]
    UnknownMessage(String),
}

/// Result type for chatsync operations.
pub type ChatResult<T> = Result<T, ChatError>;
