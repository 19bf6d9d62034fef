// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for network::mock
//! Extracted from mock.rs

use chatsync_core::network::*;

#[test]
fn test_mock_transport_connect_disconnect() {
    let mut transport = MockTransport::new();

    assert_eq!(transport.state(), ConnectionState::Disconnected);

    transport.connect(&TransportConfig::default()).unwrap();
    assert_eq!(transport.state(), ConnectionState::Connected);

    transport.disconnect().unwrap();
    assert_eq!(transport.state(), ConnectionState::Disconnected);
    assert_eq!(transport.disconnect_count(), 1);
}

#[test]
fn test_mock_transport_send_receive() {
    let mut transport = MockTransport::new();
    transport.connect(&TransportConfig::default()).unwrap();

    transport.queue_receive("frame-1");
    assert!(transport.has_pending());

    assert_eq!(transport.receive().unwrap().as_deref(), Some("frame-1"));
    assert!(transport.receive().unwrap().is_none());
    assert!(!transport.has_pending());
}

#[test]
fn test_mock_transport_send_tracks_frames() {
    let mut transport = MockTransport::new();
    let handle = transport.clone();
    transport.connect(&TransportConfig::default()).unwrap();

    transport.send("one").unwrap();
    transport.send("two").unwrap();

    assert_eq!(handle.sent_frames(), vec!["one", "two"]);

    handle.clear_sent();
    assert!(handle.sent_frames().is_empty());
}

#[test]
fn test_mock_transport_requires_connection() {
    let mut transport = MockTransport::new();

    assert_eq!(transport.send("x"), Err(NetworkError::NotConnected));
    assert_eq!(transport.receive(), Err(NetworkError::NotConnected));
}

#[test]
fn test_mock_transport_inject_error_once() {
    let mut transport = MockTransport::new();
    transport.connect(&TransportConfig::default()).unwrap();

    transport.inject_error(NetworkError::Timeout);

    assert_eq!(transport.send("x"), Err(NetworkError::Timeout));
    assert!(transport.send("x").is_ok());
}

#[test]
fn test_mock_transport_failing_connects() {
    let mut transport = MockTransport::new();
    transport.fail_next_connects(2);

    assert!(transport.connect(&TransportConfig::default()).is_err());
    assert!(transport.connect(&TransportConfig::default()).is_err());
    assert!(transport.connect(&TransportConfig::default()).is_ok());
    assert_eq!(transport.connect_count(), 3);
}

#[test]
fn test_mock_transport_peer_close_after_queued_frames() {
    let mut transport = MockTransport::new();
    transport.connect(&TransportConfig::default()).unwrap();
    transport.queue_receive("last words");
    transport.close_from_peer();

    assert_eq!(transport.receive().unwrap().as_deref(), Some("last words"));
    assert_eq!(transport.receive(), Err(NetworkError::ConnectionClosed));
    assert_eq!(transport.state(), ConnectionState::Disconnected);
}

#[test]
fn test_mock_transport_records_urls() {
    let mut transport = MockTransport::new();
    let config = TransportConfig {
        server_url: "ws://localhost:3000/chat?userId=alice".into(),
        ..TransportConfig::default()
    };

    transport.connect(&config).unwrap();

    assert_eq!(
        transport.connected_urls(),
        vec!["ws://localhost:3000/chat?userId=alice"]
    );
}

#[test]
fn test_chat_socket_url() {
    assert_eq!(
        chat_socket_url("ws://localhost:3000", "alice").unwrap(),
        "ws://localhost:3000/chat?userId=alice"
    );
    assert_eq!(
        chat_socket_url("wss://chat.example.com/", "a b&c").unwrap(),
        "wss://chat.example.com/chat?userId=a+b%26c"
    );
}

#[test]
fn test_chat_socket_url_rejects_http() {
    assert!(matches!(
        chat_socket_url("http://localhost:3000", "alice"),
        Err(NetworkError::InvalidUrl(_))
    ));
}

#[test]
fn test_transport_config_defaults() {
    let config = TransportConfig::default();

    assert_eq!(config.connect_timeout_ms, 10_000);
    assert_eq!(config.io_timeout_ms, 30_000);
    assert_eq!(config.max_reconnect_attempts, 5);
    assert_eq!(config.reconnect_base_delay_ms, 1_000);
    assert_eq!(config.reconnect_max_delay_ms, 30_000);
}
