//! `ExchangeServer` builder and accept loop.
//!
//! The server side of the credential exchange: it takes provider tokens
//! over WebSocket, checks them with a [`CredentialVerifier`], and answers
//! with the user's identity plus a fresh session credential. It ties
//! together transport → protocol → verifier.

use std::sync::Arc;
use std::time::Duration;

use signet_protocol::{Codec, JsonCodec};
use signet_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{CredentialVerifier, SignetError};

/// What every connection task needs, shared behind one `Arc`.
pub(crate) struct ServerState<V: CredentialVerifier, C: Codec> {
    pub(crate) verifier: V,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting an exchange server.
///
/// # Example
///
/// ```rust,no_run
/// use signet::{ExchangeServerBuilder, StaticVerifier};
///
/// # async fn start() -> Result<(), signet::SignetError> {
/// let verifier = StaticVerifier::new()
///     .with_token("abc123", "uid-42", "user@example.com");
///
/// let server = ExchangeServerBuilder::new()
///     .bind("127.0.0.1:9099")
///     .build(verifier)
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ExchangeServerBuilder {
    bind_addr: String,
    idle_timeout: Duration,
}

impl ExchangeServerBuilder {
    /// Defaults: `127.0.0.1:9099`, 15 second idle timeout.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:9099".to_string(),
            idle_timeout: Duration::from_secs(15),
        }
    }

    /// Address to listen on; `127.0.0.1:0` picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// How long a connection may sit without sending a request before the
    /// server closes it. Default: 15 seconds.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Binds the listener and builds the server around `verifier`.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<V: CredentialVerifier>(
        self,
        verifier: V,
    ) -> Result<ExchangeServer<V, JsonCodec>, SignetError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            verifier,
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
        });

        Ok(ExchangeServer { transport, state })
    }
}

impl Default for ExchangeServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound exchange server.
///
/// Nothing is accepted until [`run()`](Self::run) is awaited.
pub struct ExchangeServer<V: CredentialVerifier, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<V, C>>,
}

impl<V, C> ExchangeServer<V, C>
where
    V: CredentialVerifier,
    C: Codec,
{
    /// Shorthand for [`ExchangeServerBuilder::new`].
    pub fn builder() -> ExchangeServerBuilder {
        ExchangeServerBuilder::new()
    }

    /// The address clients should dial, with the real port when bound to `:0`.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop.
    ///
    /// Spawns a handler task per connection. Runs until the process is
    /// terminated or the task running it is aborted.
    pub async fn run(mut self) -> Result<(), SignetError> {
        tracing::info!(addr = ?self.local_addr().ok(), "exchange server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
