//! Per-connection handler: request loop and exchange answers.
//!
//! One Tokio task per accepted connection runs `handle_connection`.
//! The flow, repeated until the client leaves or goes idle:
//!   1. Receive an envelope → decode
//!   2. Exchange → check version, verify the token
//!   3. Reply with Accepted (fresh session token) or Rejected, same seq

use std::sync::Arc;

use rand::Rng;
use signet_protocol::{
    Codec, Envelope, ExchangeMessage, ProtocolError, ProviderKind,
    PROTOCOL_VERSION,
};
use signet_transport::{Connection, WebSocketConnection};

use crate::server::ServerState;
use crate::{CredentialVerifier, SignetError, VerifyError};

/// Answers exchange requests on `conn` until the client leaves or idles out.
pub(crate) async fn handle_connection<V, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<V, C>>,
) -> Result<(), SignetError>
where
    V: CredentialVerifier,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    loop {
        let data = match tokio::time::timeout(state.idle_timeout, conn.recv())
            .await
        {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::debug!(%conn_id, "connection idle, closing");
                let _ = conn.close().await;
                break;
            }
        };

        let envelope: Envelope = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode envelope");
                send(&conn, &state.codec, Envelope::rejected(0, 400, "malformed envelope"))
                    .await?;
                continue;
            }
        };

        let seq = envelope.seq;
        let reply = match envelope.payload {
            ExchangeMessage::Exchange {
                version,
                provider,
                id_token,
            } => {
                answer_exchange(&state.verifier, seq, version, provider, &id_token)
                    .await
            }
            other => {
                tracing::debug!(%conn_id, message = ?other, "unexpected message");
                invalid(seq, "expected Exchange")
            }
        };

        send(&conn, &state.codec, reply).await?;
    }

    Ok(())
}

/// Builds the reply to one `Exchange` request.
async fn answer_exchange<V: CredentialVerifier>(
    verifier: &V,
    seq: u64,
    version: u32,
    provider: ProviderKind,
    id_token: &str,
) -> Envelope {
    if version != PROTOCOL_VERSION {
        return invalid(
            seq,
            format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
        );
    }

    match verifier.verify(provider, id_token).await {
        Ok(identity) => {
            tracing::info!(user_id = %identity.user_id, %provider, "exchange accepted");
            Envelope {
                seq,
                payload: ExchangeMessage::Accepted {
                    user_id: identity.user_id,
                    email: identity.email,
                    session_token: generate_token(),
                },
            }
        }
        Err(VerifyError::Rejected(reason)) => {
            tracing::info!(%provider, %reason, "exchange rejected");
            Envelope::rejected(seq, 401, reason)
        }
        Err(VerifyError::Unavailable(reason)) => {
            tracing::warn!(%provider, %reason, "verifier unavailable");
            Envelope::rejected(seq, 503, reason)
        }
    }
}

/// A 400 reply for a message that parsed but breaks a protocol rule.
fn invalid(seq: u64, reason: impl Into<String>) -> Envelope {
    let err = ProtocolError::InvalidMessage(reason.into());
    Envelope::rejected(seq, 400, err.to_string())
}

async fn send(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    envelope: Envelope,
) -> Result<(), SignetError> {
    let bytes = codec.encode(&envelope)?;
    conn.send(&bytes).await.map_err(SignetError::Transport)?;
    Ok(())
}

/// A fresh session credential: 16 random bytes, hex encoded.
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
