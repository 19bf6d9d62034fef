// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mock Transport
//!
//! Mock implementation of the Transport trait for testing.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::error::NetworkError;
use super::transport::{ConnectionState, Transport, TransportConfig, TransportResult};

#[derive(Debug)]
struct MockState {
    state: ConnectionState,
    /// Frames that have been sent.
    sent: Vec<String>,
    /// Frames to return on receive().
    receive_queue: VecDeque<String>,
    /// Error to inject on next operation.
    inject_error: Option<NetworkError>,
    /// Number of upcoming connect() calls that fail.
    failing_connects: u32,
    /// Whether the peer closed the connection.
    peer_closed: bool,
    /// URLs passed to connect(), in order.
    connected_urls: Vec<String>,
    disconnects: usize,
}

/// Mock transport for testing.
///
/// Clones share state, so a test can keep a handle while the transport
/// itself is owned by a session.
///
/// # Example
///
/// ```ignore
/// use chatsync_core::network::{MockTransport, Transport, TransportConfig};
///
/// let mut transport = MockTransport::new();
/// let handle = transport.clone();
/// transport.connect(&TransportConfig::default())?;
///
/// // Queue a frame to be returned by receive()
/// handle.queue_receive(r#"{"type":"message","text":"hi","sender":"bob"}"#);
///
/// transport.send("{}")?;
/// assert_eq!(handle.sent_frames().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockState>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        MockTransport {
            inner: Arc::new(Mutex::new(MockState {
                state: ConnectionState::Disconnected,
                sent: Vec::new(),
                receive_queue: VecDeque::new(),
                inject_error: None,
                failing_connects: 0,
                peer_closed: false,
                connected_urls: Vec::new(),
                disconnects: 0,
            })),
        }
    }

    /// Queues a frame to be returned by a later receive() call.
    pub fn queue_receive(&self, frame: impl Into<String>) {
        self.inner.lock().receive_queue.push_back(frame.into());
    }

    /// Returns all frames that have been sent.
    pub fn sent_frames(&self) -> Vec<String> {
        self.inner.lock().sent.clone()
    }

    /// Clears the sent frames buffer.
    pub fn clear_sent(&self) {
        self.inner.lock().sent.clear();
    }

    /// Injects an error to be returned on the next operation.
    pub fn inject_error(&self, error: NetworkError) {
        self.inner.lock().inject_error = Some(error);
    }

    /// Makes the next `count` connect() calls fail.
    pub fn fail_next_connects(&self, count: u32) {
        self.inner.lock().failing_connects = count;
    }

    /// Simulates the peer closing the connection.
    ///
    /// Queued frames are still delivered first; the close surfaces on the
    /// receive() after them.
    pub fn close_from_peer(&self) {
        self.inner.lock().peer_closed = true;
    }

    /// Manually sets the connection state (for testing state transitions).
    pub fn set_state(&self, state: ConnectionState) {
        self.inner.lock().state = state;
    }

    /// Returns the URLs passed to connect(), in order.
    pub fn connected_urls(&self) -> Vec<String> {
        self.inner.lock().connected_urls.clone()
    }

    /// Returns the number of connect() calls, successful or not.
    pub fn connect_count(&self) -> usize {
        self.inner.lock().connected_urls.len()
    }

    /// Returns the number of disconnect() calls.
    pub fn disconnect_count(&self) -> usize {
        self.inner.lock().disconnects
    }

    /// Returns the number of frames in the receive queue.
    pub fn receive_queue_len(&self) -> usize {
        self.inner.lock().receive_queue.len()
    }
}

impl MockState {
    fn check_error(&mut self) -> TransportResult<()> {
        if let Some(err) = self.inject_error.take() {
            return Err(err);
        }
        Ok(())
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, config: &TransportConfig) -> TransportResult<()> {
        let mut inner = self.inner.lock();
        inner.connected_urls.push(config.server_url.clone());
        inner.check_error()?;

        if inner.failing_connects > 0 {
            inner.failing_connects -= 1;
            inner.state = ConnectionState::Disconnected;
            return Err(NetworkError::ConnectionFailed("connection refused".into()));
        }

        inner.peer_closed = false;
        inner.state = ConnectionState::Connected;
        Ok(())
    }

    fn disconnect(&mut self) -> TransportResult<()> {
        let mut inner = self.inner.lock();
        inner.disconnects += 1;
        inner.check_error()?;
        inner.state = ConnectionState::Disconnected;
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.inner.lock().state.clone()
    }

    fn send(&mut self, frame: &str) -> TransportResult<()> {
        let mut inner = self.inner.lock();
        inner.check_error()?;

        if inner.state != ConnectionState::Connected {
            return Err(NetworkError::NotConnected);
        }

        inner.sent.push(frame.to_string());
        Ok(())
    }

    fn receive(&mut self) -> TransportResult<Option<String>> {
        let mut inner = self.inner.lock();
        inner.check_error()?;

        if inner.state != ConnectionState::Connected {
            return Err(NetworkError::NotConnected);
        }

        if let Some(frame) = inner.receive_queue.pop_front() {
            return Ok(Some(frame));
        }

        if inner.peer_closed {
            inner.peer_closed = false;
            inner.state = ConnectionState::Disconnected;
            return Err(NetworkError::ConnectionClosed);
        }

        Ok(None)
    }

    fn has_pending(&self) -> bool {
        !self.inner.lock().receive_queue.is_empty()
    }
}
