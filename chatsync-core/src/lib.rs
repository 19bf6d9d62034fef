// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Chatsync Core Library
//!
//! Client-side reconciliation of a live chat message list: optimistic
//! local sends, socket echoes and history backfill merged into one
//! deduplicated store.

pub mod api;
pub mod clock;
pub mod identity;
pub mod message;
pub mod network;
pub mod store;

pub use api::{
    BackfillOutcome, BackfillTicket, ChatConfig, ChatError, ChatEvent, ChatResult,
    ControllerState, FrameOutcome, ReconciliationController,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use identity::{FileIdentityStore, IdentityError, IdentityProvider, StaticIdentity};
pub use message::{DeliveryStatus, LocalIdGenerator, Message, MessageId, Timestamp};
#[cfg(any(feature = "network-native-tls", feature = "network-rustls"))]
pub use network::WebSocketTransport;
pub use network::{
    ConnectionState, HistorySource, MockHistorySource, MockTransport, NetworkError, Transport,
    TransportConfig, TransportSession,
};
pub use store::{MergeOutcome, MessageStore, StoreChange, StoreObserver};
