// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! WebSocket Transport
//!
//! Blocking tungstenite client for the chat channel. `wss://` endpoints go
//! through native-tls or rustls depending on the enabled feature.

use std::io::ErrorKind;
use std::net::{TcpStream, ToSocketAddrs};
#[cfg(feature = "network-rustls")]
use std::sync::Arc;
use std::time::Duration;

#[cfg(all(feature = "network-native-tls", not(feature = "network-rustls")))]
use native_tls::TlsConnector;
#[cfg(feature = "network-rustls")]
use rustls::pki_types::ServerName;
use tracing::debug;
use tungstenite::client::IntoClientRequest;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};
use url::Url;

use super::error::NetworkError;
use super::transport::{ConnectionState, Transport, TransportConfig, TransportResult};

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Where a socket URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Endpoint {
    host: String,
    port: u16,
    tls: bool,
}

impl Endpoint {
    fn parse(raw: &str) -> Result<Self, NetworkError> {
        let url = Url::parse(raw).map_err(|e| NetworkError::InvalidUrl(e.to_string()))?;
        let tls = match url.scheme() {
            "wss" => true,
            "ws" => false,
            other => {
                return Err(NetworkError::InvalidUrl(format!(
                    "expected ws:// or wss://, got {}://",
                    other
                )))
            }
        };
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| NetworkError::InvalidUrl(format!("{} has no host", raw)))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = url.port_or_known_default().unwrap_or(if tls { 443 } else { 80 });

        Ok(Endpoint { host, port, tls })
    }
}

/// WebSocket transport for the chat channel.
///
/// Frames are sent as text. Binary frames are accepted when they hold
/// UTF-8.
///
/// ```ignore
/// use chatsync_core::network::{chat_socket_url, Transport, TransportConfig, WebSocketTransport};
///
/// let mut transport = WebSocketTransport::new();
/// transport.connect(&TransportConfig {
///     server_url: chat_socket_url("wss://chat.example.com", "alice")?,
///     ..Default::default()
/// })?;
/// ```
pub struct WebSocketTransport {
    socket: Option<Socket>,
    state: ConnectionState,
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSocketTransport {
    pub fn new() -> Self {
        WebSocketTransport {
            socket: None,
            state: ConnectionState::Disconnected,
        }
    }

    fn dial(config: &TransportConfig) -> TransportResult<Socket> {
        let endpoint = Endpoint::parse(&config.server_url)?;
        let connect_timeout = Duration::from_millis(config.connect_timeout_ms.max(1));
        let tcp = dial_tcp(&endpoint, connect_timeout)?;

        // TLS and upgrade handshakes get the whole connect budget.
        set_timeouts(&tcp, connect_timeout)?;

        let stream = if endpoint.tls {
            wrap_tls(&endpoint.host, tcp)?
        } else {
            MaybeTlsStream::Plain(tcp)
        };

        let request = config
            .server_url
            .as_str()
            .into_client_request()
            .map_err(|e| NetworkError::InvalidUrl(e.to_string()))?;
        let (socket, response) = tungstenite::client(request, stream).map_err(|e| match e {
            // A read timeout surfaces as an interrupted handshake.
            tungstenite::HandshakeError::Interrupted(_) => NetworkError::Timeout,
            tungstenite::HandshakeError::Failure(tungstenite::Error::Io(io))
                if matches!(io.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                NetworkError::Timeout
            }
            e => NetworkError::ConnectionFailed(format!("handshake failed: {}", e)),
        })?;
        debug!(status = %response.status(), "websocket handshake done");

        // From here on this bounds how long one receive() holds the event loop.
        if let Some(tcp) = tcp_of(socket.get_ref()) {
            set_timeouts(tcp, Duration::from_millis(config.io_timeout_ms.max(1)))?;
        }
        Ok(socket)
    }

    fn lost(&mut self) -> NetworkError {
        self.socket = None;
        self.state = ConnectionState::Disconnected;
        NetworkError::ConnectionClosed
    }
}

fn dial_tcp(endpoint: &Endpoint, timeout: Duration) -> TransportResult<TcpStream> {
    let addrs = (endpoint.host.as_str(), endpoint.port)
        .to_socket_addrs()
        .map_err(|e| NetworkError::ConnectionFailed(format!("cannot resolve {}: {}", endpoint.host, e)))?;

    let mut last_error = NetworkError::ConnectionFailed(format!("no address for {}", endpoint.host));
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) if e.kind() == ErrorKind::TimedOut => last_error = NetworkError::Timeout,
            Err(e) => last_error = NetworkError::ConnectionFailed(e.to_string()),
        }
    }
    Err(last_error)
}

fn set_timeouts(tcp: &TcpStream, timeout: Duration) -> TransportResult<()> {
    tcp.set_read_timeout(Some(timeout))
        .and_then(|_| tcp.set_write_timeout(Some(timeout)))
        .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))
}

/// The TCP stream under a plain or TLS socket.
fn tcp_of(stream: &MaybeTlsStream<TcpStream>) -> Option<&TcpStream> {
    match stream {
        MaybeTlsStream::Plain(tcp) => Some(tcp),
        #[cfg(feature = "network-native-tls")]
        MaybeTlsStream::NativeTls(tls) => Some(tls.get_ref()),
        #[cfg(feature = "network-rustls")]
        MaybeTlsStream::Rustls(tls) => Some(&tls.sock),
        _ => None,
    }
}

#[cfg(all(feature = "network-native-tls", not(feature = "network-rustls")))]
fn wrap_tls(host: &str, tcp: TcpStream) -> TransportResult<MaybeTlsStream<TcpStream>> {
    let connector =
        TlsConnector::new().map_err(|e| NetworkError::ConnectionFailed(format!("TLS: {}", e)))?;
    connector
        .connect(host, tcp)
        .map(MaybeTlsStream::NativeTls)
        .map_err(|e| NetworkError::ConnectionFailed(format!("TLS handshake: {}", e)))
}

#[cfg(feature = "network-rustls")]
fn wrap_tls(host: &str, tcp: TcpStream) -> TransportResult<MaybeTlsStream<TcpStream>> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let name = ServerName::try_from(host.to_string())
        .map_err(|_| NetworkError::InvalidUrl(format!("bad TLS server name {}", host)))?;
    let connection = rustls::ClientConnection::new(Arc::new(config), name)
        .map_err(|e| NetworkError::ConnectionFailed(format!("TLS: {}", e)))?;
    Ok(MaybeTlsStream::Rustls(rustls::StreamOwned::new(connection, tcp)))
}

impl Transport for WebSocketTransport {
    fn connect(&mut self, config: &TransportConfig) -> TransportResult<()> {
        if self.socket.is_some() && self.state == ConnectionState::Connected {
            return Ok(());
        }

        self.state = ConnectionState::Connecting;
        match Self::dial(config) {
            Ok(socket) => {
                self.socket = Some(socket);
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Err(e) => {
                self.socket = None;
                self.state = ConnectionState::Disconnected;
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) -> TransportResult<()> {
        if let Some(mut socket) = self.socket.take() {
            // Best effort; the peer may already be gone.
            let _ = socket.close(None);
            let _ = socket.flush();
        }
        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn send(&mut self, frame: &str) -> TransportResult<()> {
        let socket = self.socket.as_mut().ok_or(NetworkError::NotConnected)?;
        match socket.send(Message::Text(frame.to_string())) {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Err(self.lost())
            }
            Err(e) => Err(NetworkError::SendFailed(e.to_string())),
        }
    }

    fn receive(&mut self) -> TransportResult<Option<String>> {
        let socket = self.socket.as_mut().ok_or(NetworkError::NotConnected)?;
        match socket.read() {
            Ok(Message::Text(text)) => Ok(Some(text)),
            Ok(Message::Binary(bytes)) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| NetworkError::MalformedFrame("binary frame is not UTF-8".into())),
            // Pongs are queued by tungstenite itself.
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => Ok(None),
            Ok(Message::Close(close)) => {
                debug!(?close, "server closed the channel");
                Err(self.lost())
            }
            Err(tungstenite::Error::Io(e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                Ok(None)
            }
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Err(self.lost())
            }
            Err(e) => {
                self.lost();
                Err(NetworkError::ReceiveFailed(e.to_string()))
            }
        }
    }

    fn has_pending(&self) -> bool {
        // Not observable without a read; receive() times out instead.
        false
    }
}
