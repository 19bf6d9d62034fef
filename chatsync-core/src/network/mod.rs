// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network + Transport Layer
//!
//! Connects the reconciliation core to its two remote collaborators: the
//! real-time message channel and the history service.
//!
//! # Architecture
//!
//! The network layer consists of:
//! - **Transport trait**: Platform-agnostic interface for the socket channel
//! - **Frame codec**: JSON wire frames for outbound sends and inbound pushes
//! - **Transport session**: One owned connection with reconnect and backoff
//! - **History source**: Backfill fetch over HTTP
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use chatsync_core::clock::SystemClock;
//! use chatsync_core::network::{MockTransport, TransportConfig, TransportSession};
//!
//! let mut session = TransportSession::new(
//!     MockTransport::new(),
//!     "ws://localhost:3000",
//!     TransportConfig::default(),
//!     Arc::new(SystemClock),
//! );
//! session.open("alice")?;
//! for event in session.poll() {
//!     println!("{:?}", event);
//! }
//! ```

pub mod backoff;
pub mod error;
pub mod frame;
pub mod history;
pub mod mock;
pub mod session;
pub mod transport;

#[cfg(any(feature = "network-native-tls", feature = "network-rustls"))]
pub mod websocket;

// Error types
pub use error::NetworkError;

// Wire frames
pub use frame::{
    decode_frame, encode_frame, InboundFrame, InboundMessage, OutboundFrame, WireId,
    MESSAGE_FRAME_TYPE,
};

// Transport abstraction
pub use transport::{chat_socket_url, ConnectionState, Transport, TransportConfig, TransportResult};

// Mock transport for testing
pub use mock::MockTransport;

// WebSocket transport for production
#[cfg(any(feature = "network-native-tls", feature = "network-rustls"))]
pub use websocket::WebSocketTransport;

// Connection lifecycle
pub use backoff::ReconnectPolicy;
pub use session::{TransportEvent, TransportSession};

// History backfill
#[cfg(feature = "http-history")]
pub use history::HttpHistorySource;
pub use history::{
    history_url, parse_history, HistoryMessage, HistoryResponse, HistorySource, MockHistorySource,
    HISTORY_USER_AGENT,
};
