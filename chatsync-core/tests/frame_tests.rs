// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for network::frame
//! Extracted from frame.rs

use chatsync_core::network::*;

#[test]
fn test_outbound_frame_wire_shape() {
    let frame = OutboundFrame::message("hi", "alice", "general", 1_000, "1000");

    let raw = encode_frame(&frame).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(
        value,
        serde_json::json!({
            "type": "message",
            "text": "hi",
            "sender": "alice",
            "conversationId": "general",
            "timestamp": 1000,
            "clientMessageId": "1000",
        })
    );
}

#[test]
fn test_decode_full_message_frame() {
    let raw = r#"{"type":"message","conversationId":"general","text":"hi","sender":"bob","timestamp":1450,"id":"s1","clientMessageId":"1000"}"#;

    let message = decode_frame(raw).unwrap().into_message().unwrap();

    assert_eq!(
        message,
        InboundMessage {
            conversation_id: Some("general".into()),
            text: "hi".into(),
            sender: "bob".into(),
            timestamp: Some(1_450),
            id: Some("s1".into()),
            client_message_id: Some("1000".into()),
        }
    );
}

#[test]
fn test_decode_minimal_message_frame() {
    let raw = r#"{"type":"message","conversationId":"general","text":"hi","sender":"bob"}"#;

    let message = decode_frame(raw).unwrap().into_message().unwrap();

    assert_eq!(message.timestamp, None);
    assert_eq!(message.id, None);
    assert_eq!(message.client_message_id, None);
}

#[test]
fn test_numeric_id_is_accepted() {
    let raw = r#"{"type":"message","conversationId":"c","text":"hi","sender":"bob","id":42}"#;

    let message = decode_frame(raw).unwrap().into_message().unwrap();

    assert_eq!(message.id.as_deref(), Some("42"));
}

#[test]
fn test_empty_id_counts_as_absent() {
    let raw = r#"{"type":"message","conversationId":"c","text":"hi","sender":"bob","id":""}"#;

    let message = decode_frame(raw).unwrap().into_message().unwrap();

    assert_eq!(message.id, None);
}

#[test]
fn test_non_message_frame_is_recognized() {
    let frame = decode_frame(r#"{"type":"typing","sender":"bob"}"#).unwrap();

    assert!(!frame.is_message());
    assert_eq!(frame.kind, "typing");
}

#[test]
fn test_invalid_json_is_malformed() {
    assert!(matches!(
        decode_frame("not json"),
        Err(NetworkError::MalformedFrame(_))
    ));
}

#[test]
fn test_missing_type_is_malformed() {
    assert!(matches!(
        decode_frame(r#"{"text":"hi"}"#),
        Err(NetworkError::MalformedFrame(_))
    ));
}

#[test]
fn test_message_without_text_is_malformed() {
    let frame = decode_frame(r#"{"type":"message","sender":"bob"}"#).unwrap();

    assert!(matches!(
        frame.into_message(),
        Err(NetworkError::MalformedFrame(_))
    ));
}

#[test]
fn test_message_with_empty_text_is_malformed() {
    let frame = decode_frame(r#"{"type":"message","text":"","sender":"bob"}"#).unwrap();

    assert!(frame.into_message().is_err());
}

#[test]
fn test_message_without_sender_is_malformed() {
    let frame = decode_frame(r#"{"type":"message","text":"hi"}"#).unwrap();

    assert!(matches!(
        frame.into_message(),
        Err(NetworkError::MalformedFrame(_))
    ));
}

#[test]
fn test_unknown_fields_are_ignored() {
    let raw = r#"{"type":"message","text":"hi","sender":"bob","isMine":true,"extra":{"a":1}}"#;

    assert!(decode_frame(raw).unwrap().into_message().is_ok());
}
