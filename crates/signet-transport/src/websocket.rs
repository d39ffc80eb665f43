//! The exchange carried over WebSocket binary frames (`tokio-tungstenite`).
//!
//! Both ends of the exchange use the same [`WebSocketConnection`] type:
//! the exchange server gets one from [`WebSocketTransport::accept`], the
//! remote auth-service client opens one with
//! [`WebSocketConnection::connect`].
//!
//! Exchange frames carry one provider token or one reply, a few KiB at
//! most. Both ends tell tungstenite to refuse anything past
//! [`MAX_FRAME_LEN`] while reading the frame header, so an oversized
//! payload is never buffered.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::error::CapacityError;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Largest frame a connection accepts, in bytes.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

static CONNECTION_IDS: AtomicU64 = AtomicU64::new(1);

fn next_id() -> ConnectionId {
    ConnectionId::new(CONNECTION_IDS.fetch_add(1, Ordering::Relaxed))
}

/// Wraps a tungstenite error as an `io::Error` of `kind`.
fn ws_io(kind: io::ErrorKind) -> impl FnOnce(WsError) -> io::Error {
    move |e| io::Error::new(kind, e)
}

/// Read limits shared by both ends.
fn ws_config() -> WebSocketConfig {
    let mut config = WebSocketConfig::default();
    config.max_message_size = Some(MAX_FRAME_LEN);
    config.max_frame_size = Some(MAX_FRAME_LEN);
    config
}

/// Listens for exchange clients.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds to `addr`.
    ///
    /// Bind to port 0 to let the OS pick a free port, then read it back
    /// with [`local_addr`](Transport::local_addr).
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::BindFailed)?;
        tracing::info!(addr, "listening for WebSocket clients");
        Ok(Self { listener })
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<WebSocketConnection, TransportError> {
        let (tcp, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        // Server side streams are always plain: TLS is terminated in front
        // of the exchange server, if anywhere.
        let ws = tokio_tungstenite::accept_async_with_config(
            MaybeTlsStream::Plain(tcp),
            Some(ws_config()),
        )
        .await
        .map_err(ws_io(io::ErrorKind::InvalidData))
        .map_err(TransportError::AcceptFailed)?;

        Ok(WebSocketConnection::wrap(ws, peer))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// One WebSocket connection, server- or client-side.
///
/// The stream sits behind a mutex so `send` and `recv` can be called
/// through `&self`; the exchange is strictly request/reply, so the lock
/// is never contended in practice.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: SocketAddr,
    ws: Arc<Mutex<WsStream>>,
}

impl WebSocketConnection {
    fn wrap(ws: WsStream, peer: SocketAddr) -> Self {
        let id = next_id();
        tracing::debug!(%id, %peer, "WebSocket connection open");
        Self {
            id,
            peer,
            ws: Arc::new(Mutex::new(ws)),
        }
    }

    /// Opens a client connection to `url` (`ws://host:port`).
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (ws, _response) =
            tokio_tungstenite::connect_async_with_config(url, Some(ws_config()), false)
                .await
                .map_err(ws_io(io::ErrorKind::ConnectionRefused))
                .map_err(TransportError::ConnectFailed)?;

        let peer = match ws.get_ref() {
            MaybeTlsStream::Plain(tcp) => tcp.peer_addr(),
            _ => Err(io::Error::other("not a plain TCP stream")),
        }
        .map_err(TransportError::ConnectFailed)?;

        Ok(Self::wrap(ws, peer))
    }

    /// The remote end's address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let frame = Message::Binary(data.to_vec().into());
        self.ws
            .lock()
            .await
            .send(frame)
            .await
            .map_err(ws_io(io::ErrorKind::BrokenPipe))
            .map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut ws = self.ws.lock().await;
        loop {
            match ws.next().await {
                Some(Ok(Message::Binary(bytes))) => return Ok(Some(bytes.into())),
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // ping / pong are answered by tungstenite itself
                Some(Ok(_)) => continue,
                Some(Err(WsError::Capacity(CapacityError::MessageTooLong {
                    size,
                    max_size,
                }))) => {
                    tracing::warn!(id = %self.id, len = size, "oversized frame refused");
                    return Err(TransportError::FrameTooLarge {
                        len: size,
                        max: max_size,
                    });
                }
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(ws_io(
                        io::ErrorKind::ConnectionReset,
                    )(e)));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        // The stream's inherent `close` sends a Close frame; SinkExt's
        // would only flush.
        WebSocketStream::close(&mut *self.ws.lock().await, None)
            .await
            .map_err(ws_io(io::ErrorKind::BrokenPipe))
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
