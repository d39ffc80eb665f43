//! Integration tests for the exchange server and the full sign-in flow
//! over a real socket.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use signet::prelude::*;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Mock provider
// =========================================================================

/// Forwards every consent request to the test, like a UI would open the
/// account picker.
struct TestProvider {
    consent: mpsc::UnboundedSender<SignInHandle>,
}

impl IdentityProvider for TestProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    async fn request_consent(
        &self,
        handle: SignInHandle,
    ) -> Result<(), ProviderError> {
        let _ = self.consent.send(handle);
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn revoke_access(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let verifier = StaticVerifier::new()
        .with_token("abc123", "uid-42", "user@example.com");

    let server = ExchangeServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(verifier)
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

fn encode_envelope(envelope: &Envelope) -> Message {
    let bytes = serde_json::to_vec(envelope).expect("encode");
    Message::Binary(bytes.into())
}

async fn next_envelope(ws: &mut ClientWs) -> Envelope {
    let msg = ws.next().await.unwrap().expect("recv");
    serde_json::from_slice(&msg.into_data()).expect("decode")
}

fn manager_for(
    addr: &str,
) -> (
    SessionManager<TestProvider, RemoteAuthService>,
    mpsc::UnboundedReceiver<SignInHandle>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let manager = SessionManager::new(
        TestProvider { consent: tx },
        RemoteAuthService::new(format!("ws://{addr}")),
        SessionConfig::default(),
    );
    (manager, rx)
}

// =========================================================================
// Wire-level tests
// =========================================================================

#[tokio::test]
async fn test_exchange_known_token_accepted() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(encode_envelope(&Envelope::exchange(
        5,
        ProviderKind::Google,
        "abc123",
    )))
    .await
    .expect("send");

    let reply = next_envelope(&mut ws).await;
    assert_eq!(reply.seq, 5);
    match reply.payload {
        ExchangeMessage::Accepted {
            user_id,
            email,
            session_token,
        } => {
            assert_eq!(user_id, UserId::from("uid-42"));
            assert_eq!(email, "user@example.com");
            assert_eq!(session_token.len(), 32);
        }
        other => panic!("expected Accepted, got {other:?}"),
    }
}

#[tokio::test]
async fn test_exchange_unknown_token_rejected_401() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(encode_envelope(&Envelope::exchange(
        1,
        ProviderKind::Google,
        "forged",
    )))
    .await
    .expect("send");

    let reply = next_envelope(&mut ws).await;
    assert!(matches!(
        reply.payload,
        ExchangeMessage::Rejected { code: 401, .. }
    ));
}

#[tokio::test]
async fn test_exchange_version_mismatch_rejected_400() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    let request = Envelope {
        seq: 1,
        payload: ExchangeMessage::Exchange {
            version: 999,
            provider: ProviderKind::Google,
            id_token: "abc123".into(),
        },
    };
    ws.send(encode_envelope(&request)).await.expect("send");

    let reply = next_envelope(&mut ws).await;
    assert!(matches!(
        reply.payload,
        ExchangeMessage::Rejected { code: 400, .. }
    ));
}

#[tokio::test]
async fn test_malformed_envelope_answered_and_connection_kept() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::Binary(b"not json".to_vec().into()))
        .await
        .expect("send");
    let reply = next_envelope(&mut ws).await;
    assert!(matches!(
        reply.payload,
        ExchangeMessage::Rejected { code: 400, .. }
    ));

    // The same connection still serves requests.
    ws.send(encode_envelope(&Envelope::exchange(
        2,
        ProviderKind::Google,
        "abc123",
    )))
    .await
    .expect("send");
    let reply = next_envelope(&mut ws).await;
    assert_eq!(reply.seq, 2);
    assert!(matches!(reply.payload, ExchangeMessage::Accepted { .. }));
}

#[tokio::test]
async fn test_non_exchange_message_rejected_400() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(encode_envelope(&Envelope::rejected(3, 500, "hello?")))
        .await
        .expect("send");

    let reply = next_envelope(&mut ws).await;
    assert_eq!(reply.seq, 3);
    assert!(matches!(
        reply.payload,
        ExchangeMessage::Rejected { code: 400, .. }
    ));
}

#[tokio::test]
async fn test_session_tokens_differ_per_exchange() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    let mut tokens = Vec::new();
    for seq in 1..=2 {
        ws.send(encode_envelope(&Envelope::exchange(
            seq,
            ProviderKind::Google,
            "abc123",
        )))
        .await
        .expect("send");
        match next_envelope(&mut ws).await.payload {
            ExchangeMessage::Accepted { session_token, .. } => {
                tokens.push(session_token)
            }
            other => panic!("expected Accepted, got {other:?}"),
        }
    }

    assert_ne!(tokens[0], tokens[1]);
}

// =========================================================================
// RemoteAuthService
// =========================================================================

#[tokio::test]
async fn test_remote_service_maps_rejection() {
    let addr = start_server().await;
    let service = RemoteAuthService::new(format!("ws://{addr}"));

    let err = service
        .exchange(ExchangeRequest {
            provider: ProviderKind::Google,
            id_token: "forged".into(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Rejected { code: 401, .. }));
}

#[tokio::test]
async fn test_remote_service_unreachable_is_unavailable() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let service = RemoteAuthService::new(format!("ws://{addr}"))
        .with_timeout(Duration::from_secs(2));

    let err = service
        .exchange(ExchangeRequest {
            provider: ProviderKind::Google,
            id_token: "abc123".into(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Unavailable(_)));
}

// =========================================================================
// Full sign-in flow
// =========================================================================

#[tokio::test]
async fn test_sign_in_and_sign_out_over_network() {
    let addr = start_server().await;
    let (manager, mut consent) = manager_for(&addr);

    let ticket = manager.begin_sign_in().await.expect("should start");
    let handle = consent.recv().await.expect("consent requested");
    assert_eq!(handle, ticket.handle());

    let result = manager
        .complete_sign_in(handle, Ok(ProviderToken::from("abc123")))
        .await
        .expect("handle is active");
    let session = result.session().expect("should succeed");
    assert_eq!(session.email(), "user@example.com");
    assert_eq!(session.user_id().as_str(), "uid-42");
    assert_eq!(session.id_token().len(), 32);

    assert_eq!(ticket.await, result);
    assert!(manager.is_signed_in());

    let out = manager.sign_out().await;
    assert!(out.is_success());
    assert_eq!(manager.current().state(), SessionState::SignedOut);
}

#[tokio::test]
async fn test_sign_in_with_forged_token_is_rejected_over_network() {
    let addr = start_server().await;
    let (manager, _consent) = manager_for(&addr);

    let ticket = manager.begin_sign_in().await.unwrap();
    manager
        .complete_sign_in(ticket.handle(), Ok(ProviderToken::from("forged")))
        .await;

    let result = ticket.await;
    assert_eq!(result.error_kind(), Some(ErrorKind::ExchangeRejected));
    assert!(!manager.is_signed_in());
}

#[tokio::test]
async fn test_sign_in_with_server_down_is_network_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    let (manager, _consent) = manager_for(&addr);

    let ticket = manager.begin_sign_in().await.unwrap();
    manager
        .complete_sign_in(ticket.handle(), Ok(ProviderToken::from("abc123")))
        .await;

    let result = ticket.await;
    assert_eq!(result.error_kind(), Some(ErrorKind::NetworkUnavailable));
    assert!(result.error_kind().unwrap().is_retryable());
}
