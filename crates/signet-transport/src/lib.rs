//! Byte transport for Signet's credential exchange.
//!
//! The exchange is a tiny request/reply conversation: the client sends one
//! framed request, the service answers with one framed reply. This crate
//! moves those frames and nothing else. It knows nothing about tokens or
//! sessions.
//!
//! - [`Transport`]: the listening side (the exchange server)
//! - [`Connection`]: one open conversation, either side
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport, MAX_FRAME_LEN};

use std::fmt;
use std::net::SocketAddr;

/// Per-process connection number, for log correlation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// The listening side: hands out one [`Connection`] per client.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next client and completes its handshake.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// The address clients should connect to.
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// An open connection carrying whole frames in both directions.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame.
    async fn send(&self, frame: &[u8]) -> Result<(), Self::Error>;

    /// Waits for the next frame. `Ok(None)` means the peer closed cleanly.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Sends `frame` and waits for the frame that follows it.
    async fn round_trip(
        &self,
        frame: &[u8],
    ) -> Result<Option<Vec<u8>>, Self::Error> {
        self.send(frame).await?;
        self.recv().await
    }

    /// Closes the connection, telling the peer.
    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}
