// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for network::websocket
//! Extracted from websocket.rs

#![cfg(any(feature = "network-native-tls", feature = "network-rustls"))]

use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chatsync_core::network::*;

/// Accepts one client after `delay`, echoes its first frame, then waits
/// for the client to leave.
fn delayed_echo_server(delay: Duration) -> (u16, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        thread::sleep(delay);
        let Ok(mut ws) = tungstenite::accept(stream) else {
            return;
        };
        if let Ok(message) = ws.read() {
            let _ = ws.send(message);
        }
        let _ = ws.read();
    });
    (port, handle)
}

fn local_config(port: u16, connect_timeout_ms: u64, io_timeout_ms: u64) -> TransportConfig {
    TransportConfig {
        server_url: format!("ws://127.0.0.1:{}/chat?userId=alice", port),
        connect_timeout_ms,
        io_timeout_ms,
        ..TransportConfig::default()
    }
}

#[test]
fn test_slow_handshake_within_connect_timeout_succeeds() {
    let (port, server) = delayed_echo_server(Duration::from_millis(400));
    let mut transport = WebSocketTransport::new();

    transport.connect(&local_config(port, 5_000, 250)).unwrap();
    assert_eq!(transport.state(), ConnectionState::Connected);

    transport.send(r#"{"type":"ping"}"#).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    let echoed = loop {
        if let Some(frame) = transport.receive().unwrap() {
            break frame;
        }
        assert!(Instant::now() < deadline, "echo never arrived");
    };
    assert_eq!(echoed, r#"{"type":"ping"}"#);

    transport.disconnect().unwrap();
    server.join().unwrap();
}

#[test]
fn test_idle_receive_returns_after_io_timeout() {
    let (port, server) = delayed_echo_server(Duration::ZERO);
    let mut transport = WebSocketTransport::new();
    transport.connect(&local_config(port, 5_000, 250)).unwrap();

    let started = Instant::now();
    assert_eq!(transport.receive(), Ok(None));
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(transport.state(), ConnectionState::Connected);

    transport.disconnect().unwrap();
    server.join().unwrap();
}

#[test]
fn test_handshake_past_connect_timeout_fails() {
    let (port, server) = delayed_echo_server(Duration::from_millis(1_000));
    let mut transport = WebSocketTransport::new();

    let result = transport.connect(&local_config(port, 200, 250));

    assert_eq!(result, Err(NetworkError::Timeout));
    assert_eq!(transport.state(), ConnectionState::Disconnected);
    server.join().unwrap();
}
