// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! WebSocket Transport
//!
//! Relay channel over tungstenite, plaintext (`ws://`) or TLS (`wss://`).
//! TLS comes from native-tls or rustls depending on the enabled feature.
//!
//! The socket is blocking with a short read timeout, so `receive_text`
//! returns `Ok(None)` when nothing arrived in time instead of stalling the
//! session loop.

use std::io::ErrorKind;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

#[cfg(all(feature = "network-native-tls", not(feature = "network-rustls")))]
use native_tls::TlsConnector;

#[cfg(feature = "network-rustls")]
use rustls::pki_types::ServerName;
#[cfg(feature = "network-rustls")]
use std::sync::Arc;

use tracing::debug;
use tungstenite::client::IntoClientRequest;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use super::error::NetworkError;
use super::transport::{ConnectionState, Transport, TransportConfig, TransportResult};

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Host, port and scheme of a relay URL.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RelayEndpoint {
    host: String,
    port: u16,
    secure: bool,
}

impl RelayEndpoint {
    fn parse(url: &str) -> TransportResult<Self> {
        let (secure, rest) = if let Some(rest) = url.strip_prefix("wss://") {
            (true, rest)
        } else if let Some(rest) = url.strip_prefix("ws://") {
            (false, rest)
        } else {
            return Err(NetworkError::ConnectionFailed(format!(
                "unsupported relay URL '{url}' (expected ws:// or wss://)"
            )));
        };

        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();

        // Bracketed IPv6 literal: [::1]:4040
        let (host, port) = match authority.strip_prefix('[') {
            Some(v6) => {
                let (host, tail) = v6.split_once(']').ok_or_else(|| {
                    NetworkError::ConnectionFailed(format!("unterminated IPv6 host in '{url}'"))
                })?;
                (host, tail.strip_prefix(':'))
            }
            None => match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            },
        };

        if host.is_empty() {
            return Err(NetworkError::ConnectionFailed(format!(
                "relay URL '{url}' has no host"
            )));
        }

        let port = match port {
            Some(p) => p
                .parse()
                .map_err(|_| NetworkError::ConnectionFailed(format!("bad port '{p}'")))?,
            None if secure => 443,
            None => 80,
        };

        Ok(RelayEndpoint {
            host: host.to_string(),
            port,
            secure,
        })
    }
}

/// WebSocket channel to the relay.
///
/// One value is one channel; the connection manager builds a new one for
/// every attempt.
///
/// # Example
///
/// ```ignore
/// use relaychat_core::network::{Transport, TransportConfig, WebSocketTransport};
///
/// let mut transport = WebSocketTransport::new();
/// transport.connect(&TransportConfig::new("ws://localhost:4040"))?;
/// transport.send_text(r#"{"recipient":"u2","text":"hi","file":null}"#)?;
/// ```
pub struct WebSocketTransport {
    socket: Option<Socket>,
    state: ConnectionState,
}

impl WebSocketTransport {
    /// Creates an unconnected transport.
    pub fn new() -> Self {
        WebSocketTransport {
            socket: None,
            state: ConnectionState::Disconnected,
        }
    }

    fn dial(endpoint: &RelayEndpoint, timeout: Duration) -> TransportResult<TcpStream> {
        let addrs = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()
            .map_err(|e| {
                NetworkError::ConnectionFailed(format!("cannot resolve {}: {e}", endpoint.host))
            })?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!("Connect to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        Err(NetworkError::ConnectionFailed(match last_error {
            Some(e) => e.to_string(),
            None => format!("{} resolved to no addresses", endpoint.host),
        }))
    }

    #[cfg(all(feature = "network-native-tls", not(feature = "network-rustls")))]
    fn secure(host: &str, tcp: TcpStream) -> TransportResult<MaybeTlsStream<TcpStream>> {
        let connector = TlsConnector::new()
            .map_err(|e| NetworkError::ConnectionFailed(format!("TLS setup failed: {e}")))?;
        connector
            .connect(host, tcp)
            .map(MaybeTlsStream::NativeTls)
            .map_err(|e| NetworkError::ConnectionFailed(format!("TLS handshake failed: {e}")))
    }

    #[cfg(feature = "network-rustls")]
    fn secure(host: &str, tcp: TcpStream) -> TransportResult<MaybeTlsStream<TcpStream>> {
        let roots = rustls::RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        let name = ServerName::try_from(host.to_string())
            .map_err(|_| NetworkError::ConnectionFailed(format!("invalid TLS name '{host}'")))?;
        let session = rustls::ClientConnection::new(Arc::new(tls_config), name)
            .map_err(|e| NetworkError::ConnectionFailed(format!("TLS setup failed: {e}")))?;

        Ok(MaybeTlsStream::Rustls(rustls::StreamOwned::new(session, tcp)))
    }

    fn open(config: &TransportConfig) -> TransportResult<Socket> {
        let endpoint = RelayEndpoint::parse(&config.server_url)?;
        let handshake_timeout = Duration::from_millis(config.connect_timeout_ms.max(1));
        let tcp = Self::dial(&endpoint, handshake_timeout)?;

        // TLS and the upgrade run under the connect budget; the short poll
        // timeout only applies once the channel is open.
        set_timeouts(&tcp, handshake_timeout, handshake_timeout)?;

        let stream = if endpoint.secure {
            Self::secure(&endpoint.host, tcp)?
        } else {
            MaybeTlsStream::Plain(tcp)
        };

        let request = config
            .server_url
            .as_str()
            .into_client_request()
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;

        let (socket, _) = tungstenite::client(request, stream)
            .map_err(|e| NetworkError::ConnectionFailed(format!("upgrade rejected: {e}")))?;

        let tcp = tcp_of(socket.get_ref()).ok_or_else(|| {
            NetworkError::ConnectionFailed("unsupported TLS stream".into())
        })?;
        set_timeouts(
            tcp,
            Duration::from_millis(config.io_timeout_ms.max(1)),
            Duration::from_millis(config.write_timeout_ms.max(1)),
        )?;

        Ok(socket)
    }

    /// Drops the socket after the relay went away.
    fn lost(&mut self, error: NetworkError) -> NetworkError {
        self.socket = None;
        self.state = ConnectionState::Disconnected;
        error
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// The TCP socket underneath a possibly encrypted stream.
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

fn set_timeouts(tcp: &TcpStream, read: Duration, write: Duration) -> TransportResult<()> {
    tcp.set_read_timeout(Some(read))
        .and_then(|()| tcp.set_write_timeout(Some(write)))
        .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))
}

fn is_timeout(error: &tungstenite::Error) -> bool {
    matches!(
        error,
        tungstenite::Error::Io(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
    )
}

impl Transport for WebSocketTransport {
    fn connect(&mut self, config: &TransportConfig) -> TransportResult<()> {
        if self.state == ConnectionState::Connected {
            return Ok(());
        }

        self.state = ConnectionState::Connecting;
        let socket = Self::open(config).map_err(|e| self.lost(e))?;
        self.socket = Some(socket);
        self.state = ConnectionState::Connected;
        Ok(())
    }

    fn disconnect(&mut self) -> TransportResult<()> {
        if let Some(mut socket) = self.socket.take() {
            if let Err(e) = socket.close(None) {
                debug!("Close handshake failed: {}", e);
            }
        }
        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn send_text(&mut self, frame: &str) -> TransportResult<()> {
        let socket = self.socket.as_mut().ok_or(NetworkError::NotConnected)?;

        match socket.send(Message::Text(frame.to_owned())) {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Err(self.lost(NetworkError::ConnectionClosed))
            }
            Err(e) => Err(NetworkError::SendFailed(e.to_string())),
        }
    }

    fn receive_text(&mut self) -> TransportResult<Option<String>> {
        let socket = self.socket.as_mut().ok_or(NetworkError::NotConnected)?;

        match socket.read() {
            Ok(Message::Text(text)) => Ok(Some(text)),
            Ok(Message::Binary(bytes)) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| NetworkError::InvalidFrame("binary frame is not UTF-8".into())),
            // Pongs are queued by tungstenite and flushed on the next write
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => Ok(None),
            Ok(Message::Close(reason)) => {
                debug!("Relay closed the channel: {:?}", reason);
                Err(self.lost(NetworkError::ConnectionClosed))
            }
            Err(ref e) if is_timeout(e) => Ok(None),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Err(self.lost(NetworkError::ConnectionClosed))
            }
            Err(e) => Err(self.lost(NetworkError::ReceiveFailed(e.to_string()))),
        }
    }
}
