//! An [`AuthService`] that talks to an exchange server over WebSocket.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use signet_protocol::{Codec, Envelope, ExchangeMessage, JsonCodec};
use signet_session::{AuthService, Claims, ExchangeRequest, ServiceError};
use signet_transport::{Connection, WebSocketConnection};

/// Exchanges provider tokens with a remote [`ExchangeServer`](crate::ExchangeServer).
///
/// Opens one connection per exchange. Sign-ins are rare; a pooled
/// connection would only add reconnect logic.
///
/// Every way the round trip can fail without an answer (connect, send,
/// receive, undecodable reply, timeout) is reported as
/// [`ServiceError::Unavailable`], so the session layer classifies it as
/// retryable. Only an explicit `Rejected` reply is a rejection.
#[derive(Debug)]
pub struct RemoteAuthService {
    url: String,
    timeout: Duration,
    codec: JsonCodec,
    next_seq: AtomicU64,
}

impl RemoteAuthService {
    /// Creates a client for the exchange server at `url` (`ws://host:port`).
    ///
    /// Default round-trip timeout: 10 seconds.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(10),
            codec: JsonCodec,
            next_seq: AtomicU64::new(1),
        }
    }

    /// Sets the round-trip timeout, connect included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The exchange server's URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn round_trip(
        &self,
        request: ExchangeRequest,
    ) -> Result<Claims, ServiceError> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        let conn = WebSocketConnection::connect(&self.url)
            .await
            .map_err(unavailable)?;

        let envelope = Envelope::exchange(seq, request.provider, request.id_token);
        let bytes = self.codec.encode(&envelope).map_err(unavailable)?;
        let mut frame = conn.round_trip(&bytes).await.map_err(unavailable)?;

        let reply = loop {
            let Some(data) = frame else {
                return Err(ServiceError::Unavailable(
                    "exchange server closed the connection".into(),
                ));
            };
            let reply: Envelope = self.codec.decode(&data).map_err(unavailable)?;
            if reply.seq == seq {
                break reply;
            }
            tracing::debug!(expected = seq, got = reply.seq, "discarding stale reply");
            frame = conn.recv().await.map_err(unavailable)?;
        };

        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "close after exchange failed");
        }

        match reply.payload {
            ExchangeMessage::Accepted {
                user_id,
                email,
                session_token,
            } => Ok(Claims {
                user_id,
                email,
                session_token,
            }),
            ExchangeMessage::Rejected { code, message } => {
                Err(ServiceError::Rejected { code, message })
            }
            ExchangeMessage::Exchange { .. } => Err(ServiceError::Unavailable(
                "exchange server answered with a request".into(),
            )),
        }
    }
}

impl AuthService for RemoteAuthService {
    async fn exchange(
        &self,
        request: ExchangeRequest,
    ) -> Result<Claims, ServiceError> {
        match tokio::time::timeout(self.timeout, self.round_trip(request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(url = %self.url, "exchange round trip timed out");
                Err(ServiceError::Unavailable(format!(
                    "no answer from {} within {:?}",
                    self.url, self.timeout
                )))
            }
        }
    }
}

fn unavailable(e: impl std::fmt::Display) -> ServiceError {
    ServiceError::Unavailable(e.to_string())
}
