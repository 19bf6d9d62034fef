// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Transport Session
//!
//! Owns exactly one connection to the real-time channel for one local
//! user. Connection lifecycle and inbound frames are turned into typed
//! [`TransportEvent`]s, queued in arrival order for the controller.
//!
//! Dropped connections and failed connects are retried with bounded
//! exponential backoff. Once the attempt budget is spent the session
//! stays disconnected until [`TransportSession::reconnect_now`] is called.
//!
//! With [`TransportConfig::background_connect`] set, connects run on a
//! worker thread that owns the transport until the dial settles; `poll()`
//! collects the result without blocking.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};

use super::backoff::ReconnectPolicy;
use super::error::NetworkError;
use super::transport::{
    chat_socket_url, ConnectionState, Transport, TransportConfig, TransportResult,
};
use crate::clock::Clock;
use crate::message::Timestamp;

/// Event produced by a transport session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The channel is ready (first open or successful reconnect).
    Opened,
    /// A raw inbound text frame.
    Frame(String),
    /// A non-fatal transport error.
    Error(NetworkError),
    /// The connection was lost.
    Closed,
}

/// Result of a background dial: the transport, the outcome and the URL
/// that was dialed.
type Dialed<T> = (T, TransportResult<()>, String);

/// One logical connection to the message channel.
pub struct TransportSession<T: Transport> {
    /// `None` while a worker thread is dialing.
    transport: Option<T>,
    dialing: Option<Receiver<Dialed<T>>>,
    config: TransportConfig,
    policy: ReconnectPolicy,
    clock: Arc<dyn Clock>,
    socket_base_url: String,
    local_user_id: Option<String>,
    events: VecDeque<TransportEvent>,
    reconnect_attempt: u32,
    next_reconnect_at: Option<Timestamp>,
}

impl<T: Transport> TransportSession<T> {
    /// Creates a closed session.
    ///
    /// `socket_base_url` is the channel base (`ws://` or `wss://`); the
    /// per-user path is appended on open.
    pub fn new(
        transport: T,
        socket_base_url: impl Into<String>,
        config: TransportConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        TransportSession {
            transport: Some(transport),
            dialing: None,
            policy: ReconnectPolicy::from_config(&config),
            config,
            clock,
            socket_base_url: socket_base_url.into(),
            local_user_id: None,
            events: VecDeque::new(),
            reconnect_attempt: 0,
            next_reconnect_at: None,
        }
    }

    /// Replaces the reconnect policy.
    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Opens the channel for a user, closing any open connection first.
    ///
    /// A failed connect is reported as a queued [`TransportEvent::Error`]
    /// and scheduled for retry; only an unusable URL fails the call. In
    /// background mode the outcome arrives through a later `poll()`.
    pub fn open(&mut self, local_user_id: &str) -> TransportResult<()> {
        self.close();

        let url = chat_socket_url(&self.socket_base_url, local_user_id)?;
        self.config.server_url = url;
        self.local_user_id = Some(local_user_id.to_string());
        self.reconnect_attempt = 0;

        info!(user = local_user_id, "opening chat channel");
        self.try_connect();
        Ok(())
    }

    /// Transmits one frame without waiting for acknowledgment.
    pub fn send(&mut self, frame: &str) -> TransportResult<()> {
        if !self.is_open() {
            return Err(NetworkError::NotConnected);
        }

        let transport = self.transport.as_mut().ok_or(NetworkError::NotConnected)?;
        match transport.send(frame) {
            Ok(()) => Ok(()),
            Err(NetworkError::ConnectionClosed) => {
                self.connection_lost();
                Err(NetworkError::ConnectionClosed)
            }
            Err(e) => Err(e),
        }
    }

    /// Closes the connection. Safe to call when already closed.
    ///
    /// Events queued before the close are discarded. A dial still in
    /// flight is torn down once it settles.
    pub fn close(&mut self) {
        if self.local_user_id.take().is_none() {
            return;
        }
        if let Some(transport) = self.transport.as_mut() {
            if let Err(e) = transport.disconnect() {
                debug!(error = %e, "disconnect failed");
            }
        }
        self.events.clear();
        self.next_reconnect_at = None;
        self.reconnect_attempt = 0;
        info!("chat channel closed");
    }

    /// Reads available frames, runs a due reconnect and returns all queued
    /// events in arrival order.
    pub fn poll(&mut self) -> Vec<TransportEvent> {
        self.collect_dial();
        if self.local_user_id.is_some() && self.dialing.is_none() {
            if self.transport_state() == ConnectionState::Connected {
                self.drain_inbound();
            } else {
                self.reconnect_if_due();
            }
        }
        self.events.drain(..).collect()
    }

    /// Retries immediately with a fresh attempt budget.
    pub fn reconnect_now(&mut self) -> TransportResult<()> {
        if self.local_user_id.is_none() {
            return Err(NetworkError::NotConnected);
        }
        if self.dialing.is_some() || self.transport_state() == ConnectionState::Connected {
            return Ok(());
        }
        self.reconnect_attempt = 0;
        self.try_connect();
        Ok(())
    }

    /// Returns true if a user is bound and the channel is connected.
    pub fn is_open(&self) -> bool {
        self.local_user_id.is_some() && self.transport_state() == ConnectionState::Connected
    }

    /// Returns the connection state, including pending reconnects.
    pub fn state(&self) -> ConnectionState {
        if self.dialing.is_some() && self.local_user_id.is_some() {
            return ConnectionState::Connecting;
        }
        match self.transport_state() {
            ConnectionState::Disconnected if self.next_reconnect_at.is_some() => {
                ConnectionState::Reconnecting {
                    attempt: self.reconnect_attempt,
                }
            }
            state => state,
        }
    }

    /// Returns the number of reconnect attempts made since the last open.
    pub fn reconnect_attempt(&self) -> u32 {
        self.reconnect_attempt
    }

    /// Returns when the next reconnect is due, if one is scheduled.
    pub fn next_reconnect_at(&self) -> Option<Timestamp> {
        self.next_reconnect_at
    }

    /// Returns the user the session is bound to.
    pub fn local_user_id(&self) -> Option<&str> {
        self.local_user_id.as_deref()
    }

    /// Returns true while a background dial is in flight.
    pub fn is_dialing(&self) -> bool {
        self.dialing.is_some()
    }

    fn transport_state(&self) -> ConnectionState {
        self.transport
            .as_ref()
            .map_or(ConnectionState::Disconnected, Transport::state)
    }

    fn drain_inbound(&mut self) {
        loop {
            let received = match self.transport.as_mut() {
                Some(transport) => transport.receive(),
                None => break,
            };
            match received {
                Ok(Some(frame)) => self.events.push_back(TransportEvent::Frame(frame)),
                Ok(None) => break,
                Err(NetworkError::MalformedFrame(reason)) => {
                    self.events
                        .push_back(TransportEvent::Error(NetworkError::MalformedFrame(reason)));
                }
                Err(NetworkError::ConnectionClosed) | Err(NetworkError::NotConnected) => {
                    self.connection_lost();
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "receive failed");
                    self.events.push_back(TransportEvent::Error(e));
                    if self.transport_state() != ConnectionState::Connected {
                        self.connection_lost();
                    }
                    break;
                }
            }
        }
    }

    fn reconnect_if_due(&mut self) {
        let Some(due) = self.next_reconnect_at else {
            return;
        };
        if self.clock.now_ms() < due {
            return;
        }
        self.reconnect_attempt += 1;
        self.try_connect();
    }

    fn try_connect(&mut self) {
        self.next_reconnect_at = None;
        if self.dialing.is_some() {
            return;
        }
        let Some(mut transport) = self.transport.take() else {
            self.connect_finished(Err(NetworkError::NotConnected));
            return;
        };

        if !self.config.background_connect {
            let result = transport.connect(&self.config);
            self.transport = Some(transport);
            self.connect_finished(result);
            return;
        }

        let (handoff, dialed) = mpsc::channel();
        let config = self.config.clone();
        debug!(url = %config.server_url, "dialing in background");
        thread::spawn(move || {
            let result = transport.connect(&config);
            // The session may be gone; the transport is dropped with it.
            let _ = handoff.send((transport, result, config.server_url));
        });
        self.dialing = Some(dialed);
    }

    /// Takes back the transport from a settled background dial.
    ///
    /// A dial that no longer matches the bound user is torn down, and
    /// redialed if the session was reopened meanwhile.
    fn collect_dial(&mut self) {
        let Some(dialed) = self.dialing.as_ref() else {
            return;
        };
        let (mut transport, result, url) = match dialed.try_recv() {
            Ok(settled) => settled,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                self.dialing = None;
                warn!("connect worker stopped without a result");
                self.events.push_back(TransportEvent::Error(NetworkError::ConnectionFailed(
                    "connect worker stopped".into(),
                )));
                return;
            }
        };
        self.dialing = None;

        if self.local_user_id.is_none() || url != self.config.server_url {
            debug!(%url, "discarding connect for a closed or rebound session");
            if result.is_ok() {
                let _ = transport.disconnect();
            }
            self.transport = Some(transport);
            if self.local_user_id.is_some() {
                self.try_connect();
            }
            return;
        }

        self.transport = Some(transport);
        self.connect_finished(result);
    }

    fn connect_finished(&mut self, result: TransportResult<()>) {
        match result {
            Ok(()) => {
                info!(attempt = self.reconnect_attempt, "chat channel open");
                self.reconnect_attempt = 0;
                self.events.push_back(TransportEvent::Opened);
            }
            Err(e) => {
                warn!(error = %e, attempt = self.reconnect_attempt, "connect failed");
                self.events.push_back(TransportEvent::Error(e));
                self.schedule_reconnect();
            }
        }
    }

    fn connection_lost(&mut self) {
        warn!("chat channel lost");
        if let Some(transport) = self.transport.as_mut() {
            let _ = transport.disconnect();
        }
        self.events.push_back(TransportEvent::Closed);
        self.reconnect_attempt = 0;
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        if !self.policy.allows(self.reconnect_attempt) {
            warn!(
                attempts = self.reconnect_attempt,
                "reconnect budget exhausted, waiting for manual reconnect"
            );
            self.events
                .push_back(TransportEvent::Error(NetworkError::MaxRetriesExceeded));
            return;
        }

        let delay = self.policy.delay_for_attempt(self.reconnect_attempt);
        let due = self.clock.now_ms().saturating_add(delay.as_millis() as u64);
        debug!(attempt = self.reconnect_attempt, due, "reconnect scheduled");
        self.next_reconnect_at = Some(due);
    }
}
