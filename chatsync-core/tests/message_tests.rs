// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for message and clock
//! Extracted from message.rs and clock.rs

use chatsync_core::clock::*;
use chatsync_core::message::*;

#[test]
fn test_confirmed_message_derives_is_mine() {
    let mine = Message::confirmed(MessageId::Server("1".into()), "hi", "alice", 10, "alice");
    let theirs = Message::confirmed(MessageId::Server("2".into()), "hi", "bob", 10, "alice");

    assert!(mine.is_mine());
    assert!(!theirs.is_mine());
    assert_eq!(mine.status(), DeliveryStatus::Confirmed);
    assert_eq!(mine.client_message_id(), None);
}

#[test]
fn test_pending_message() {
    let message = Message::pending("1000", "hi", "alice", 1_000);

    assert_eq!(message.id(), &MessageId::Local("1000".into()));
    assert_eq!(message.client_message_id(), Some("1000"));
    assert_eq!(message.sender(), "alice");
    assert!(message.is_mine());
    assert_eq!(message.status(), DeliveryStatus::Pending);
    assert!(message.is_unresolved());
}

#[test]
fn test_server_messages_are_never_unresolved() {
    let message = Message::confirmed(MessageId::Server("1".into()), "hi", "alice", 10, "alice");

    assert!(!message.is_unresolved());
}

#[test]
fn test_message_id_kinds() {
    let server = MessageId::Server("s1".into());
    let local = MessageId::Local("1000".into());

    assert!(server.is_server());
    assert!(!local.is_server());
    assert_eq!(server.to_string(), "s1");
    assert_eq!(local.as_str(), "1000");
}

#[test]
fn test_local_id_generator() {
    let mut ids = LocalIdGenerator::new();

    assert_eq!(ids.next(1_000), "1000");
    assert_eq!(ids.next(1_000), "1000-1");
    assert_eq!(ids.next(1_000), "1000-2");
    assert_eq!(ids.next(1_001), "1001");
    assert_eq!(ids.next(1_000), "1000");
}

#[test]
fn test_fallback_fixture() {
    let now = 10_000_000;
    let messages = fallback_messages(now, "alice");

    let ids: Vec<_> = messages.iter().map(|m| m.id().to_string()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(messages[0].sender(), FIXTURE_PEER_ID);
    assert_eq!(messages[1].sender(), "alice");
    assert!(messages[1].is_mine());
    assert_eq!(messages[2].sender(), FIXTURE_PEER_ID);
    assert_eq!(
        messages.iter().map(|m| m.timestamp()).collect::<Vec<_>>(),
        vec![now - 3_600_000, now - 3_500_000, now - 3_400_000]
    );
}

#[test]
fn test_manual_clock() {
    let clock = ManualClock::new(5);

    assert_eq!(clock.now_ms(), 5);
    clock.advance(10);
    assert_eq!(clock.now_ms(), 15);
    clock.set(1);
    assert_eq!(clock.now_ms(), 1);
}

#[test]
fn test_system_clock_is_after_2020() {
    assert!(SystemClock.now_ms() > 1_577_836_800_000);
}
