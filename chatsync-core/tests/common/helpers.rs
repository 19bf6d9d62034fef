// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Test Helpers
//!
//! Message builders, wire frames and a controller wired to mocks.

use std::sync::{Arc, Mutex};

use chatsync_core::api::{CallbackHandler, ChatConfig, ChatEvent, ReconciliationController};
use chatsync_core::clock::ManualClock;
use chatsync_core::message::{Message, MessageId, Timestamp};
use chatsync_core::network::{MockHistorySource, MockTransport};
use chatsync_core::store::StoreChange;

pub const LOCAL_USER: &str = "alice";
pub const PEER: &str = "bob";
pub const CONVERSATION: &str = "general";
pub const START_MS: Timestamp = 1_000;

/// A message from the server, as seen by the local user.
pub fn server_msg(id: &str, text: &str, sender: &str, timestamp: Timestamp) -> Message {
    Message::confirmed(
        MessageId::Server(id.to_string()),
        text,
        sender,
        timestamp,
        LOCAL_USER,
    )
}

/// A message without a server id.
pub fn local_msg(id: &str, text: &str, sender: &str, timestamp: Timestamp) -> Message {
    Message::confirmed(
        MessageId::Local(id.to_string()),
        text,
        sender,
        timestamp,
        LOCAL_USER,
    )
}

/// A `message` frame as the channel would push it.
pub fn message_frame(
    conversation: &str,
    text: &str,
    sender: &str,
    timestamp: Option<Timestamp>,
    id: Option<&str>,
) -> String {
    let mut frame = serde_json::json!({
        "type": "message",
        "conversationId": conversation,
        "text": text,
        "sender": sender,
    });
    if let Some(ts) = timestamp {
        frame["timestamp"] = ts.into();
    }
    if let Some(id) = id {
        frame["id"] = id.into();
    }
    frame.to_string()
}

/// Records every store change.
pub fn record_changes() -> (Arc<Mutex<Vec<StoreChange>>>, impl Fn(&StoreChange) + Send + Sync) {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    (changes, move |change: &StoreChange| {
        sink.lock().unwrap().push(change.clone())
    })
}

/// Config with deterministic reconnect delays.
pub fn test_config() -> ChatConfig {
    let mut config = ChatConfig::new("http://localhost:3000", "ws://localhost:3000");
    config.transport.reconnect_jitter = 0.0;
    config.transport.reconnect_base_delay_ms = 1_000;
    config.transport.max_reconnect_attempts = 3;
    config
}

/// A controller wired to mocks, with handles to each mock.
pub struct Harness {
    pub controller: ReconciliationController<MockTransport>,
    pub transport: MockTransport,
    pub history: MockHistorySource,
    pub clock: Arc<ManualClock>,
    pub events: Arc<Mutex<Vec<ChatEvent>>>,
}

impl Harness {
    pub fn new(config: ChatConfig) -> Self {
        let transport = MockTransport::new();
        let history = MockHistorySource::new();
        let clock = Arc::new(ManualClock::new(START_MS));
        let events = Arc::new(Mutex::new(Vec::new()));

        let factory_transport = transport.clone();
        let mut controller: ReconciliationController<MockTransport> = ReconciliationController::new(
            config,
            Box::new(history.clone()),
            clock.clone(),
            Box::new(move || factory_transport.clone()),
        );
        let sink = Arc::clone(&events);
        controller.add_event_handler(Arc::new(CallbackHandler::new(move |event| {
            sink.lock().unwrap().push(event.clone());
        })));

        Harness {
            controller,
            transport,
            history,
            clock,
            events,
        }
    }

    /// Bound to alice/general with an empty history, pumped to `Ready`.
    pub fn ready() -> Self {
        let mut harness = Harness::new(test_config());
        harness.history.respond_with(Vec::new());
        harness.controller.bind(LOCAL_USER, CONVERSATION).unwrap();
        harness.controller.pump();
        harness
    }

    pub fn events(&self) -> Vec<ChatEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn texts(&self) -> Vec<String> {
        self.controller
            .snapshot()
            .iter()
            .map(|m| m.text().to_string())
            .collect()
    }
}
