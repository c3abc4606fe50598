//! [`MessageChannel`] over a blocking WebSocket client.

use crate::connection::channel::MessageChannel;
use crate::connection::retry::CONNECTION_TIMEOUT_MS;
use crate::error::connection::ConnectionError;

use common::ErrorLocation;

use std::io::ErrorKind;
use std::net::{TcpStream, ToSocketAddrs};
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use rustls::{ClientConfig, RootCertStore};
use tokio_tungstenite::tungstenite::stream::MaybeTlsStream;
use tokio_tungstenite::tungstenite::{self, Connector, Error as WsError, Message, WebSocket};
use url::Url;

/// Upper bound on a single [`MessageChannel::receive`] wait.
pub const RECEIVE_POLL_INTERVAL: Duration = Duration::from_millis(100);

const CLOSE_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// WebSocket client for `wss://` (rustls, webpki roots) and loopback `ws://`.
///
/// One socket at a time; `connect` replaces a dead one.
pub struct WsMessageChannel {
    url: String,
    connect_timeout: Duration,
    tls_config: Option<Arc<ClientConfig>>,
    socket: Option<Socket>,
    // Clone of the TCP socket for timeouts; shares the fd with the one inside `socket`.
    tcp: Option<TcpStream>,
}

impl WsMessageChannel {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: Duration::from_millis(CONNECTION_TIMEOUT_MS),
            tls_config: None,
            socket: None,
            tcp: None,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Use `config` instead of the default webpki-roots client config for `wss://`.
    pub fn with_tls_config(mut self, config: Arc<ClientConfig>) -> Self {
        self.tls_config = Some(config);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn parse_url(&self) -> Result<Url, ConnectionError> {
        let parsed = Url::parse(&self.url).map_err(|e| ConnectionError::Transport {
            message: format!("Invalid URL {}: {e}", self.url),
            location: ErrorLocation::from(Location::caller()),
        })?;

        match parsed.scheme() {
            "ws" | "wss" => Ok(parsed),
            other => Err(ConnectionError::Transport {
                message: format!("Unsupported scheme: {other}"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    fn connector(&self, parsed: &Url) -> Result<Connector, ConnectionError> {
        if parsed.scheme() != "wss" {
            return Ok(Connector::Plain);
        }
        let config = match &self.tls_config {
            Some(config) => Arc::clone(config),
            None => default_tls_config()?,
        };
        Ok(Connector::Rustls(config))
    }

    fn open_tcp(&self, parsed: &Url) -> Result<TcpStream, ConnectionError> {
        let host = parsed.host_str().ok_or_else(|| ConnectionError::Transport {
            message: format!("URL has no host: {}", self.url),
            location: ErrorLocation::from(Location::caller()),
        })?;
        let port = parsed.port_or_known_default().unwrap_or(443);

        let addrs = (host, port).to_socket_addrs().map_err(|e| ConnectionError::Transport {
            message: format!("Failed to resolve {host}:{port}: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
        }

        Err(ConnectionError::Transport {
            message: match last_error {
                Some(e) => format!("Failed to connect to {host}:{port}: {e}"),
                None => format!("No addresses for {host}:{port}"),
            },
            location: ErrorLocation::from(Location::caller()),
        })
    }

    fn socket_mut(&mut self) -> Result<&mut Socket, ConnectionError> {
        self.socket
            .as_mut()
            .ok_or_else(|| ConnectionError::NotConnected {
                message: "Channel is not open".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    fn drop_socket(&mut self) {
        self.socket = None;
        self.tcp = None;
    }
}

/// rustls client config trusting the webpki root set, on the ring provider.
pub fn default_tls_config() -> Result<Arc<ClientConfig>, ConnectionError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| ConnectionError::Transport {
        message: format!("TLS configuration failed: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?
    .with_root_certificates(roots)
    .with_no_client_auth();

    Ok(Arc::new(config))
}

fn set_read_timeout(tcp: &TcpStream, timeout: Duration) -> Result<(), ConnectionError> {
    tcp.set_read_timeout(Some(timeout))
        .map_err(|e| ConnectionError::Transport {
            message: format!("Failed to set read timeout: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
}

impl MessageChannel for WsMessageChannel {
    fn connect(&mut self) -> Result<(), ConnectionError> {
        let parsed = self.parse_url()?;
        let connector = self.connector(&parsed)?;
        let stream = self.open_tcp(&parsed)?;
        let tcp = stream.try_clone().map_err(|e| ConnectionError::Transport {
            message: format!("Failed to clone socket: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        // The TLS and upgrade handshakes get the whole connect budget.
        set_read_timeout(&tcp, self.connect_timeout)?;
        let (socket, _response) = tungstenite::client_tls_with_config(
            self.url.as_str(),
            stream,
            None,
            Some(connector),
        )
        .map_err(|e| ConnectionError::Transport {
            message: format!("WebSocket handshake with {} failed: {e}", self.url),
            location: ErrorLocation::from(Location::caller()),
        })?;
        set_read_timeout(&tcp, RECEIVE_POLL_INTERVAL)?;

        info!("WebSocket channel open to {}", self.url);
        self.socket = Some(socket);
        self.tcp = Some(tcp);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.socket.as_ref().is_some_and(WebSocket::can_write)
    }

    fn send(&mut self, message: &str) -> Result<(), ConnectionError> {
        let result = self.socket_mut()?.send(Message::Text(message.into()));
        if let Err(e) = result {
            self.drop_socket();
            return Err(e.into());
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<String>, ConnectionError> {
        loop {
            let result = self.socket_mut()?.read();
            let frame = match result {
                Ok(frame) => frame,
                Err(WsError::Io(e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    return Ok(None);
                }
                Err(e) => {
                    self.drop_socket();
                    return Err(e.into());
                }
            };

            match frame {
                Message::Text(text) => return Ok(Some(text.as_str().to_string())),
                Message::Binary(data) => {
                    return String::from_utf8(data.to_vec()).map(Some).map_err(|e| {
                        ConnectionError::Transport {
                            message: format!("Binary frame is not UTF-8: {e}"),
                            location: ErrorLocation::from(Location::caller()),
                        }
                    });
                }
                Message::Close(_) => {
                    debug!("Peer closed {}", self.url);
                    self.drop_socket();
                    return Err(ConnectionError::NotConnected {
                        message: "Connection closed by peer".to_string(),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        let tcp = self.tcp.take();
        if let Some(mut socket) = self.socket.take() {
            socket.close(None)?;
            // Drain until the close handshake completes or the peer goes quiet.
            if let Some(tcp) = &tcp {
                let _ = tcp.set_read_timeout(Some(CLOSE_DRAIN_TIMEOUT));
            }
            while socket.read().is_ok() {}
        }
        Ok(())
    }
}
