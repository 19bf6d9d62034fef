// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Chatsync API Layer
//!
//! High-level API that keeps one conversation's message list in sync.
//!
//! # Overview
//!
//! The API layer coordinates:
//! - Binding a local user and a conversation to a session
//! - Optimistic sends and their server echoes
//! - History backfill with stale-result protection
//! - Event handling
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use chatsync_core::api::{ChatConfig, ReconciliationController};
//! use chatsync_core::clock::SystemClock;
//! use chatsync_core::network::{MockHistorySource, MockTransport};
//!
//! let mut controller = ReconciliationController::new(
//!     ChatConfig::default(),
//!     Box::new(MockHistorySource::new()),
//!     Arc::new(SystemClock),
//!     Box::new(MockTransport::new),
//! );
//! controller.bind("alice", "general")?;
//! controller.pump();
//! controller.submit_local_text("hello");
//! ```
//!
//! # Module Structure
//!
//! - [`error`] - Error types for the API layer
//! - [`config`] - Configuration types
//! - [`events`] - Event system for callbacks
//! - [`conversation`] - One bound user/conversation pair
//! - [`controller`] - Reconciliation state machine

pub mod config;
pub mod controller;
pub mod conversation;
pub mod error;
pub mod events;

pub use config::{ChatConfig, API_URL_ENV, SOCKET_URL_ENV};
pub use controller::{
    BackfillOutcome, BackfillTicket, ControllerState, FrameOutcome, IgnoreReason,
    ReconciliationController, TransportFactory,
};
pub use conversation::ConversationSession;
pub use error::{ChatError, ChatResult};
pub use events::{CallbackHandler, ChatEvent, EventDispatcher, EventHandler};
