//! The session manager: the single owner of the process's session.
//!
//! It's responsible for:
//! - Starting sign-ins and issuing their correlation handles
//! - Feeding provider answers through the credential exchanger
//! - Routing each outcome to the caller that started the sign-in
//! - Clearing the session on sign-out / revoke, locally first
//!
//! # Concurrency note
//!
//! `SessionManager` is cheap to clone and safe to share: every clone points
//! at the same state behind one `tokio::sync::Mutex`. The lock is only held
//! for bookkeeping. It is never held across a call into the provider or the
//! auth service, so a slow exchange never blocks `current()`, `sign_out()`,
//! or `cancel_sign_in()`.
//!
//! Consent requests and exchanges run in their own spawned tasks. A caller
//! that stops waiting (dropped future, aborted task) never strands a
//! sign-in: the task still settles its handle.

use std::sync::{Arc, Weak};

use tokio::sync::{watch, Mutex};

use crate::{
    AuthResult, AuthService, CredentialExchanger, ErrorKind, IdentityProvider,
    ProviderError, ProviderToken, ResultDispatcher, Session, SessionConfig,
    SessionError, SignInHandle, SignInTicket,
};

/// Owns the session and drives every transition of it.
///
/// ## Lifecycle
///
/// ```text
/// begin_sign_in() ──→ [AwaitingProvider] ──complete_sign_in(Ok)──→ [SignedIn]
///                           │                                          │
///          complete_sign_in(Err) / cancel_sign_in()        sign_out() / revoke_access()
///                           ▼                                          ▼
///                      [SignedOut] ←───────────────────────────────────┘
/// ```
pub struct SessionManager<P: IdentityProvider, S: AuthService> {
    shared: Arc<Shared<P, S>>,
}

impl<P: IdentityProvider, S: AuthService> Clone for SessionManager<P, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<P: IdentityProvider, S: AuthService> {
    inner: Mutex<Inner>,

    /// Holds the current session. Only written while `inner` is locked.
    session: watch::Sender<Session>,

    provider: P,
    exchanger: CredentialExchanger<S>,
    config: SessionConfig,
}

struct Inner {
    /// The sign-in in flight, if any. At most one at a time.
    pending: Option<Pending>,
    dispatcher: ResultDispatcher,
    next_handle: u64,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    handle: SignInHandle,
    stage: Stage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Waiting for the provider to answer.
    Consent,
    /// The provider answered; the exchange is running.
    Exchanging,
}

/// Which provider-side call ends the session.
#[derive(Debug, Clone, Copy)]
enum Ending {
    SignOut,
    Revoke,
}

impl<P: IdentityProvider, S: AuthService> SessionManager<P, S> {
    /// Creates a signed-out manager.
    pub fn new(provider: P, service: S, config: SessionConfig) -> Self {
        let exchanger = CredentialExchanger::new(provider.kind(), service, &config);
        let (session, _) = watch::channel(Session::signed_out());
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    pending: None,
                    dispatcher: ResultDispatcher::new(),
                    next_handle: 0,
                }),
                session,
                provider,
                exchanger,
                config,
            }),
        }
    }

    /// Starts a sign-in.
    ///
    /// Returns a ticket that resolves once the attempt finishes, however it
    /// finishes, and asks the provider to present its consent flow in the
    /// background. The ticket is returned without waiting for the provider,
    /// so a consent flow that never starts can still be cancelled or time
    /// out. The provider's answer must be fed back through
    /// [`complete_sign_in`](Self::complete_sign_in) with
    /// [`ticket.handle()`](SignInTicket::handle).
    ///
    /// If the provider can't even start the flow, the ticket resolves to
    /// `ProviderDenied` and the session goes back to `SignedOut`.
    ///
    /// # Errors
    /// - [`SessionError::SignInPending`]: another sign-in is in flight
    /// - [`SessionError::AlreadySignedIn`]: sign out first
    pub async fn begin_sign_in(&self) -> Result<SignInTicket, SessionError> {
        let shared = &self.shared;
        let (handle, ticket) = {
            let mut inner = shared.inner.lock().await;
            if let Some(pending) = inner.pending {
                return Err(SessionError::SignInPending(pending.handle));
            }
            {
                let current = shared.session.borrow();
                if current.is_signed_in() {
                    return Err(SessionError::AlreadySignedIn(
                        current.email().to_owned(),
                    ));
                }
            }

            inner.next_handle += 1;
            let handle = SignInHandle(inner.next_handle);
            let ticket = inner.dispatcher.register(handle);
            inner.pending = Some(Pending {
                handle,
                stage: Stage::Consent,
            });
            shared.session.send_replace(Session::awaiting_provider());
            (handle, ticket)
        };

        tracing::info!(%handle, provider = %shared.exchanger.provider(), "sign-in started");

        if let Some(timeout) = shared.config.consent_timeout {
            spawn_consent_watchdog(Arc::downgrade(shared), handle, timeout);
        }

        let consent = Arc::clone(shared);
        tokio::spawn(async move {
            if let Err(e) = consent.provider.request_consent(handle).await {
                tracing::warn!(%handle, error = %e, "consent flow could not start");
                consent
                    .settle(handle, denied(&e), Some(Stage::Consent))
                    .await;
            }
        });

        Ok(ticket)
    }

    /// Feeds the provider's answer for `handle` back in.
    ///
    /// A token goes through the credential exchanger; a provider error
    /// becomes `ProviderDenied` without contacting the auth service. The
    /// result is applied to the session, delivered to the ticket, and
    /// returned here as well.
    ///
    /// Returns `None` (and changes nothing) if `handle` was never issued,
    /// was already completed, or was cancelled, including a cancel that
    /// lands while the exchange is still running.
    ///
    /// The exchange runs in its own task. Dropping this future does not
    /// abandon the sign-in; the ticket still gets the exchange's outcome.
    pub async fn complete_sign_in(
        &self,
        handle: SignInHandle,
        answer: Result<ProviderToken, ProviderError>,
    ) -> Option<AuthResult> {
        let shared = &self.shared;
        {
            let mut inner = shared.inner.lock().await;
            match inner.pending.as_mut() {
                Some(pending)
                    if pending.handle == handle
                        && pending.stage == Stage::Consent =>
                {
                    pending.stage = Stage::Exchanging;
                }
                _ => {
                    tracing::debug!(%handle, "ignoring completion for inactive handle");
                    return None;
                }
            }
        }

        let worker = Arc::clone(shared);
        let exchange = tokio::spawn(async move {
            let result = match answer {
                Ok(token) => worker.exchanger.exchange(token).await,
                Err(e) => {
                    tracing::info!(%handle, error = %e, "provider declined sign-in");
                    denied(&e)
                }
            };
            worker.settle(handle, result, None).await
        });

        match exchange.await {
            Ok(applied) => applied,
            Err(e) => {
                tracing::error!(%handle, error = %e, "exchange task failed");
                shared
                    .settle(
                        handle,
                        AuthResult::cancelled(format!("exchange task failed: {e}")),
                        None,
                    )
                    .await
            }
        }
    }

    /// Aborts the sign-in for `handle`. Its ticket resolves to `Cancelled`
    /// and the session goes back to `SignedOut`.
    ///
    /// Returns `false` if `handle` is not the sign-in in flight. A provider
    /// answer that arrives later for a cancelled handle is ignored.
    pub async fn cancel_sign_in(&self, handle: SignInHandle) -> bool {
        self.shared
            .settle(
                handle,
                AuthResult::cancelled("sign-in cancelled by caller"),
                None,
            )
            .await
            .is_some()
    }

    /// Signs out.
    ///
    /// The local session is cleared right away and the result is always
    /// `Success(SignedOut)`. The provider-side sign-out runs in the
    /// background; if it fails, the failure is logged and nothing else.
    /// A sign-in in flight is cancelled first.
    pub async fn sign_out(&self) -> AuthResult {
        self.end_session(Ending::SignOut).await
    }

    /// Signs out and revokes the scopes the provider granted.
    ///
    /// Same local guarantees as [`sign_out`](Self::sign_out); the
    /// background call is the provider's revoke instead.
    pub async fn revoke_access(&self) -> AuthResult {
        self.end_session(Ending::Revoke).await
    }

    /// A snapshot of the current session.
    pub fn current(&self) -> Session {
        self.shared.session.borrow().clone()
    }

    /// Returns `true` if someone is signed in.
    pub fn is_signed_in(&self) -> bool {
        self.shared.session.borrow().is_signed_in()
    }

    /// Subscribes to session changes. The receiver sees every transition
    /// applied after this call; the current value is marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.shared.session.subscribe()
    }

    async fn end_session(&self, ending: Ending) -> AuthResult {
        {
            let mut inner = self.shared.inner.lock().await;
            if let Some(pending) = inner.pending.take() {
                tracing::info!(handle = %pending.handle, ?ending, "sign-in interrupted");
                inner
                    .dispatcher
                    .cancel(pending.handle, "session ended before sign-in completed");
            }
            let previous = self.shared.session.send_replace(Session::signed_out());
            tracing::info!(user_id = %previous.user_id(), ?ending, "session cleared");
        }

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let outcome = match ending {
                Ending::SignOut => shared.provider.sign_out().await,
                Ending::Revoke => shared.provider.revoke_access().await,
            };
            if let Err(e) = outcome {
                tracing::warn!(error = %e, ?ending, "provider-side call failed");
            }
        });

        AuthResult::Success(Session::signed_out())
    }
}

impl<P: IdentityProvider, S: AuthService> Shared<P, S> {
    /// Finishes the sign-in for `handle` with `result`.
    ///
    /// Applies the result to the session and delivers it to the ticket,
    /// all under one lock. With `only_in` set, nothing happens unless the
    /// sign-in is still in that stage.
    async fn settle(
        &self,
        handle: SignInHandle,
        result: AuthResult,
        only_in: Option<Stage>,
    ) -> Option<AuthResult> {
        let mut inner = self.inner.lock().await;
        match inner.pending {
            Some(pending)
                if pending.handle == handle
                    && only_in.is_none_or(|stage| stage == pending.stage) => {}
            _ => {
                tracing::debug!(%handle, "sign-in no longer active, result discarded");
                return None;
            }
        }
        inner.pending = None;

        let next = match &result {
            AuthResult::Success(session) => session.clone(),
            AuthResult::Failure { .. } => Session::signed_out(),
        };
        self.session.send_replace(next);
        inner.dispatcher.deliver(handle, result.clone());

        match &result {
            AuthResult::Success(session) => {
                tracing::info!(%handle, user_id = %session.user_id(), "sign-in succeeded");
            }
            AuthResult::Failure { kind, message } => {
                tracing::info!(%handle, %kind, %message, "sign-in failed");
            }
        }
        Some(result)
    }
}

/// Cancels `handle` if the provider hasn't answered within `timeout`.
///
/// Holds only a weak reference, so a dropped manager isn't kept alive.
fn spawn_consent_watchdog<P: IdentityProvider, S: AuthService>(
    shared: Weak<Shared<P, S>>,
    handle: SignInHandle,
    timeout: std::time::Duration,
) {
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        let Some(shared) = shared.upgrade() else {
            return;
        };
        let result = AuthResult::cancelled(format!(
            "provider did not answer within {timeout:?}"
        ));
        if shared
            .settle(handle, result, Some(Stage::Consent))
            .await
            .is_some()
        {
            tracing::warn!(%handle, "consent timed out");
        }
    });
}

fn denied(e: &ProviderError) -> AuthResult {
    AuthResult::failure(ErrorKind::ProviderDenied, e.to_string())
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionManager`.
    //!
    //! Naming: `test_{operation}_{scenario}_{expected}`.
    //!
    //! The provider mock reports every call on a channel, which is also how
    //! the tests wait for the background sign-out / revoke to happen.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use signet_protocol::{ProviderKind, UserId};
    use tokio::sync::mpsc;

    use super::*;
    use crate::{Claims, ExchangeRequest, ServiceError, SessionState};

    // -- Helpers ----------------------------------------------------------

    #[derive(Debug, PartialEq, Eq)]
    enum Call {
        Consent(SignInHandle),
        SignOut,
        Revoke,
    }

    struct MockProvider {
        calls: mpsc::UnboundedSender<Call>,
        fail_consent: bool,
        fail_remote: bool,
    }

    impl IdentityProvider for MockProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Google
        }

        async fn request_consent(
            &self,
            handle: SignInHandle,
        ) -> Result<(), ProviderError> {
            let _ = self.calls.send(Call::Consent(handle));
            if self.fail_consent {
                return Err(ProviderError::Unavailable("no play services".into()));
            }
            Ok(())
        }

        async fn sign_out(&self) -> Result<(), ProviderError> {
            let _ = self.calls.send(Call::SignOut);
            if self.fail_remote {
                return Err(ProviderError::Unavailable("offline".into()));
            }
            Ok(())
        }

        async fn revoke_access(&self) -> Result<(), ProviderError> {
            let _ = self.calls.send(Call::Revoke);
            if self.fail_remote {
                return Err(ProviderError::Unavailable("offline".into()));
            }
            Ok(())
        }
    }

    /// Accepts "abc123", reports "offline" as unreachable, rejects the rest.
    struct MockService {
        exchanges: Arc<AtomicUsize>,
    }

    impl AuthService for MockService {
        async fn exchange(
            &self,
            request: ExchangeRequest,
        ) -> Result<Claims, ServiceError> {
            self.exchanges.fetch_add(1, Ordering::SeqCst);
            match request.id_token.as_str() {
                "abc123" => Ok(Claims {
                    user_id: UserId::from("uid-42"),
                    email: "user@example.com".into(),
                    session_token: "sess-abc".into(),
                }),
                "offline" => Err(ServiceError::Unavailable("connection refused".into())),
                _ => Err(ServiceError::Rejected {
                    code: 401,
                    message: "invalid id token".into(),
                }),
            }
        }
    }

    struct Harness {
        mgr: SessionManager<MockProvider, MockService>,
        calls: mpsc::UnboundedReceiver<Call>,
        exchanges: Arc<AtomicUsize>,
    }

    fn harness_with(
        config: SessionConfig,
        fail_consent: bool,
        fail_remote: bool,
    ) -> Harness {
        let (tx, calls) = mpsc::unbounded_channel();
        let exchanges = Arc::new(AtomicUsize::new(0));
        let mgr = SessionManager::new(
            MockProvider {
                calls: tx,
                fail_consent,
                fail_remote,
            },
            MockService {
                exchanges: Arc::clone(&exchanges),
            },
            config,
        );
        Harness {
            mgr,
            calls,
            exchanges,
        }
    }

    fn harness() -> Harness {
        harness_with(SessionConfig::default(), false, false)
    }

    fn token(s: &str) -> Result<ProviderToken, ProviderError> {
        Ok(ProviderToken::from(s))
    }

    // =====================================================================
    // begin_sign_in()
    // =====================================================================

    #[tokio::test]
    async fn test_begin_sign_in_awaits_provider_with_issued_handle() {
        let mut h = harness();

        let ticket = h.mgr.begin_sign_in().await.expect("should start");

        assert_eq!(h.mgr.current().state(), SessionState::AwaitingProvider);
        assert_eq!(h.calls.recv().await, Some(Call::Consent(ticket.handle())));
    }

    #[tokio::test]
    async fn test_begin_sign_in_while_pending_returns_error() {
        let h = harness();
        let ticket = h.mgr.begin_sign_in().await.unwrap();

        let second = h.mgr.begin_sign_in().await;

        assert!(matches!(
            second,
            Err(SessionError::SignInPending(handle)) if handle == ticket.handle()
        ));
    }

    #[tokio::test]
    async fn test_begin_sign_in_while_signed_in_returns_error() {
        let h = harness();
        let ticket = h.mgr.begin_sign_in().await.unwrap();
        h.mgr.complete_sign_in(ticket.handle(), token("abc123")).await;

        let again = h.mgr.begin_sign_in().await;

        assert!(matches!(again, Err(SessionError::AlreadySignedIn(email)) if email == "user@example.com"));
    }

    #[tokio::test]
    async fn test_begin_sign_in_consent_failure_resolves_provider_denied() {
        let h = harness_with(SessionConfig::default(), true, false);

        let ticket = h.mgr.begin_sign_in().await.expect("ticket still issued");

        assert_eq!(ticket.await.error_kind(), Some(ErrorKind::ProviderDenied));
        assert_eq!(h.mgr.current().state(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn test_begin_sign_in_handles_are_never_reused() {
        let h = harness();

        let first = h.mgr.begin_sign_in().await.unwrap();
        let first_handle = first.handle();
        h.mgr.cancel_sign_in(first_handle).await;
        let second = h.mgr.begin_sign_in().await.unwrap();

        assert_ne!(first_handle, second.handle());
    }

    // =====================================================================
    // complete_sign_in()
    // =====================================================================

    #[tokio::test]
    async fn test_complete_sign_in_valid_token_signs_in_once() {
        let h = harness();
        let ticket = h.mgr.begin_sign_in().await.unwrap();
        let handle = ticket.handle();

        let returned = h
            .mgr
            .complete_sign_in(handle, token("abc123"))
            .await
            .expect("handle is active");
        let delivered = ticket.await;

        assert_eq!(returned, delivered);
        let session = delivered.session().expect("should succeed");
        assert_eq!(session.state(), SessionState::SignedIn);
        assert_eq!(session.email(), "user@example.com");
        assert_eq!(h.mgr.current(), *session);
        assert!(h.mgr.is_signed_in());
    }

    #[tokio::test]
    async fn test_complete_sign_in_twice_second_is_noop() {
        let h = harness();
        let ticket = h.mgr.begin_sign_in().await.unwrap();
        let handle = ticket.handle();
        h.mgr.complete_sign_in(handle, token("abc123")).await;

        let second = h.mgr.complete_sign_in(handle, token("other")).await;

        assert!(second.is_none());
        assert!(h.mgr.is_signed_in());
        assert_eq!(h.exchanges.load(Ordering::SeqCst), 1);
        assert!(ticket.await.is_success());
    }

    #[tokio::test]
    async fn test_complete_sign_in_unknown_handle_is_noop() {
        let h = harness();

        let result = h.mgr.complete_sign_in(SignInHandle(99), token("abc123")).await;

        assert!(result.is_none());
        assert_eq!(h.mgr.current().state(), SessionState::SignedOut);
        assert_eq!(h.exchanges.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_complete_sign_in_empty_token_is_invalid() {
        let h = harness();
        let ticket = h.mgr.begin_sign_in().await.unwrap();

        let result = h
            .mgr
            .complete_sign_in(ticket.handle(), token(""))
            .await
            .unwrap();

        assert_eq!(result.error_kind(), Some(ErrorKind::InvalidToken));
        assert_eq!(ticket.await.error_kind(), Some(ErrorKind::InvalidToken));
        assert_eq!(h.mgr.current().state(), SessionState::SignedOut);
        assert_eq!(h.exchanges.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_complete_sign_in_provider_error_is_denied_without_exchange() {
        let h = harness();
        let ticket = h.mgr.begin_sign_in().await.unwrap();

        let result = h
            .mgr
            .complete_sign_in(ticket.handle(), Err(ProviderError::UserCancelled))
            .await
            .unwrap();

        assert_eq!(result.error_kind(), Some(ErrorKind::ProviderDenied));
        assert_eq!(h.exchanges.load(Ordering::SeqCst), 0);
        assert_eq!(h.mgr.current().state(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn test_complete_sign_in_rejected_token_stays_signed_out() {
        let h = harness();
        let ticket = h.mgr.begin_sign_in().await.unwrap();

        let result = h
            .mgr
            .complete_sign_in(ticket.handle(), token("forged"))
            .await
            .unwrap();

        assert_eq!(result.error_kind(), Some(ErrorKind::ExchangeRejected));
        assert!(!h.mgr.is_signed_in());
    }

    #[tokio::test]
    async fn test_complete_sign_in_network_failure_allows_retry() {
        let h = harness();
        let first = h.mgr.begin_sign_in().await.unwrap();
        let result = h
            .mgr
            .complete_sign_in(first.handle(), token("offline"))
            .await
            .unwrap();
        assert_eq!(result.error_kind(), Some(ErrorKind::NetworkUnavailable));

        let retry = h.mgr.begin_sign_in().await.expect("retry allowed");
        let result = h
            .mgr
            .complete_sign_in(retry.handle(), token("abc123"))
            .await
            .unwrap();

        assert!(result.is_success());
    }

    // =====================================================================
    // cancel_sign_in()
    // =====================================================================

    #[tokio::test]
    async fn test_cancel_then_late_success_leaves_session_unchanged() {
        let h = harness();
        let ticket = h.mgr.begin_sign_in().await.unwrap();
        let handle = ticket.handle();

        assert!(h.mgr.cancel_sign_in(handle).await);
        let late = h.mgr.complete_sign_in(handle, token("abc123")).await;

        assert!(late.is_none());
        assert_eq!(h.mgr.current().state(), SessionState::SignedOut);
        assert_eq!(ticket.await.error_kind(), Some(ErrorKind::Cancelled));
        assert_eq!(h.exchanges.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_unknown_handle_returns_false() {
        let h = harness();
        assert!(!h.mgr.cancel_sign_in(SignInHandle(5)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consent_timeout_cancels_pending_sign_in() {
        let h = harness_with(
            SessionConfig::default().with_consent_timeout(Duration::from_secs(30)),
            false,
            false,
        );
        let ticket = h.mgr.begin_sign_in().await.unwrap();
        let handle = ticket.handle();

        assert_eq!(ticket.await.error_kind(), Some(ErrorKind::Cancelled));
        assert_eq!(h.mgr.current().state(), SessionState::SignedOut);
        assert!(h.mgr.complete_sign_in(handle, token("abc123")).await.is_none());
    }

    // =====================================================================
    // sign_out() / revoke_access()
    // =====================================================================

    #[tokio::test]
    async fn test_sign_in_then_sign_out_reaches_signed_out() {
        let mut h = harness();
        let ticket = h.mgr.begin_sign_in().await.unwrap();
        let handle = ticket.handle();
        assert_eq!(h.calls.recv().await, Some(Call::Consent(handle)));

        let result = h
            .mgr
            .complete_sign_in(handle, token("abc123"))
            .await
            .unwrap();
        assert_eq!(result.session().unwrap().email(), "user@example.com");

        let out = h.mgr.sign_out().await;

        assert!(out.is_success());
        assert_eq!(out.session().unwrap().state(), SessionState::SignedOut);
        assert_eq!(h.mgr.current(), Session::signed_out());
        assert_eq!(h.calls.recv().await, Some(Call::SignOut));
    }

    #[tokio::test]
    async fn test_sign_out_remote_failure_still_signs_out() {
        let mut h = harness_with(SessionConfig::default(), false, true);
        let ticket = h.mgr.begin_sign_in().await.unwrap();
        h.mgr.complete_sign_in(ticket.handle(), token("abc123")).await;

        let out = h.mgr.sign_out().await;

        assert!(out.is_success());
        assert!(!h.mgr.is_signed_in());
        // Consent, then the background sign-out that fails.
        h.calls.recv().await;
        assert_eq!(h.calls.recv().await, Some(Call::SignOut));
        assert!(!h.mgr.is_signed_in());
    }

    #[tokio::test]
    async fn test_sign_out_while_signed_out_succeeds() {
        let h = harness();

        let out = h.mgr.sign_out().await;

        assert_eq!(out, AuthResult::Success(Session::signed_out()));
    }

    #[tokio::test]
    async fn test_sign_out_while_awaiting_cancels_pending_ticket() {
        let h = harness();
        let ticket = h.mgr.begin_sign_in().await.unwrap();
        let handle = ticket.handle();

        h.mgr.sign_out().await;

        assert_eq!(ticket.await.error_kind(), Some(ErrorKind::Cancelled));
        assert!(h.mgr.complete_sign_in(handle, token("abc123")).await.is_none());
        assert_eq!(h.mgr.current().state(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn test_revoke_access_clears_session_and_revokes() {
        let mut h = harness();
        let ticket = h.mgr.begin_sign_in().await.unwrap();
        h.mgr.complete_sign_in(ticket.handle(), token("abc123")).await;
        h.calls.recv().await;

        let out = h.mgr.revoke_access().await;

        assert!(out.is_success());
        assert!(!h.mgr.is_signed_in());
        assert_eq!(h.calls.recv().await, Some(Call::Revoke));
    }

    // =====================================================================
    // subscribe()
    // =====================================================================

    #[tokio::test]
    async fn test_subscribe_observes_each_transition() {
        let h = harness();
        let mut rx = h.mgr.subscribe();

        let ticket = h.mgr.begin_sign_in().await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state(), SessionState::AwaitingProvider);

        h.mgr.complete_sign_in(ticket.handle(), token("abc123")).await;
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state(), SessionState::SignedIn);

        h.mgr.sign_out().await;
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn test_clones_share_one_session() {
        let h = harness();
        let other = h.mgr.clone();
        let ticket = h.mgr.begin_sign_in().await.unwrap();

        other.complete_sign_in(ticket.handle(), token("abc123")).await;

        assert!(h.mgr.is_signed_in());
        assert!(ticket.await.is_success());
    }
}
