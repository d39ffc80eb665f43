//! Session types: the data that says who is signed in.
//!
//! A [`Session`] is the process's single record of the current user. It
//! tracks:
//! - WHO the user is (`user_id`, `email`, as the auth service reported them)
//! - WHAT state the sign-in is in (signed out, waiting, signed in)
//! - the backend-issued session credential (`id_token`)

use std::fmt;
use std::time::Duration;

use signet_protocol::UserId;

// ---------------------------------------------------------------------------
// SignInHandle
// ---------------------------------------------------------------------------

/// Correlation id for one sign-in attempt.
///
/// Issued by [`begin_sign_in`](crate::SessionManager::begin_sign_in) and
/// handed to the identity provider; the provider's answer must come back
/// with the same handle. Handles are never reused within a manager, so a
/// late answer for an old attempt can't be mistaken for the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignInHandle(pub(crate) u64);

impl SignInHandle {
    /// The raw handle number.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SignInHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Timeouts applied by the [`SessionManager`](crate::SessionManager).
///
/// ```rust
/// use std::time::Duration;
/// use signet_session::SessionConfig;
///
/// let config = SessionConfig::default()
///     .with_consent_timeout(Duration::from_secs(120))
///     .with_exchange_timeout(Duration::from_secs(5));
/// assert_eq!(config.max_token_len, 8192);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a sign-in may wait for the provider before it is cancelled
    /// automatically. `None` waits until the caller cancels.
    ///
    /// Default: `None`.
    pub consent_timeout: Option<Duration>,

    /// Upper bound on one round trip to the auth service. An exchange that
    /// takes longer fails with `NetworkUnavailable`.
    ///
    /// Default: 10 seconds.
    pub exchange_timeout: Duration,

    /// Longest provider token the exchanger will forward. Google ID tokens
    /// are ~1 KiB; anything past this is treated as malformed.
    ///
    /// Default: 8192 bytes.
    pub max_token_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            consent_timeout: None,
            exchange_timeout: Duration::from_secs(10),
            max_token_len: 8192,
        }
    }
}

impl SessionConfig {
    /// Cancels pending sign-ins after `timeout`.
    pub fn with_consent_timeout(mut self, timeout: Duration) -> Self {
        self.consent_timeout = Some(timeout);
        self
    }

    /// Sets the auth-service round-trip limit.
    pub fn with_exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = timeout;
        self
    }

    /// Sets the longest accepted provider token, in bytes.
    pub fn with_max_token_len(mut self, len: usize) -> Self {
        self.max_token_len = len;
        self
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where the session is in its lifecycle.
///
/// ```text
///   SignedOut ──(begin_sign_in)──→ AwaitingProvider ──(success)──→ SignedIn
///       ↑                               │                            │
///       └────(failure / cancel)─────────┘                            │
///       └──────────────────(sign_out / revoke_access)────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nobody is signed in.
    SignedOut,

    /// A sign-in was started and the provider has not answered yet.
    AwaitingProvider,

    /// A provider token was exchanged successfully.
    SignedIn,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignedOut => write!(f, "SignedOut"),
            Self::AwaitingProvider => write!(f, "AwaitingProvider"),
            Self::SignedIn => write!(f, "SignedIn"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The process's authenticated-session record.
///
/// Fields are private: a signed-in `Session` can only be built inside this
/// crate, from claims the auth service returned. Outside code only ever
/// sees snapshots.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
    email: String,
    id_token: String,
    state: SessionState,
}

impl Session {
    /// An empty, signed-out session.
    pub fn signed_out() -> Self {
        Self {
            user_id: UserId::default(),
            email: String::new(),
            id_token: String::new(),
            state: SessionState::SignedOut,
        }
    }

    pub(crate) fn awaiting_provider() -> Self {
        Self {
            state: SessionState::AwaitingProvider,
            ..Self::signed_out()
        }
    }

    /// Only the credential exchanger calls this, with service claims.
    pub(crate) fn signed_in(
        user_id: UserId,
        email: String,
        id_token: String,
    ) -> Self {
        debug_assert!(!id_token.is_empty());
        Self {
            user_id,
            email,
            id_token,
            state: SessionState::SignedIn,
        }
    }

    /// The auth service's id for the user. Empty unless signed in.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// The user's email as reported by the auth service.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// The backend-issued session credential. Empty unless signed in.
    pub fn id_token(&self) -> &str {
        &self.id_token
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Shorthand for `state() == SessionState::SignedIn`.
    pub fn is_signed_in(&self) -> bool {
        self.state == SessionState::SignedIn
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::signed_out()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.id_token.is_empty() {
            ""
        } else {
            "<redacted>"
        };
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("id_token", &token)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_out_session_has_empty_fields() {
        let s = Session::signed_out();
        assert_eq!(s.state(), SessionState::SignedOut);
        assert!(s.user_id().is_empty());
        assert!(s.email().is_empty());
        assert!(s.id_token().is_empty());
        assert!(!s.is_signed_in());
    }

    #[test]
    fn test_signed_in_session_exposes_claims() {
        let s = Session::signed_in(
            UserId::from("u-1"),
            "user@example.com".into(),
            "sess".into(),
        );
        assert!(s.is_signed_in());
        assert_eq!(s.user_id().as_str(), "u-1");
        assert_eq!(s.email(), "user@example.com");
        assert_eq!(s.id_token(), "sess");
    }

    #[test]
    fn test_session_debug_redacts_id_token() {
        let s = Session::signed_in(
            UserId::from("u-1"),
            "user@example.com".into(),
            "do-not-print".into(),
        );
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("do-not-print"));
        assert!(dbg.contains("user@example.com"));
    }

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.consent_timeout, None);
        assert_eq!(config.exchange_timeout, Duration::from_secs(10));
        assert_eq!(config.max_token_len, 8192);
    }

    #[test]
    fn test_sign_in_handle_display() {
        assert_eq!(SignInHandle(12).to_string(), "H-12");
        assert_eq!(SignInHandle(12).into_inner(), 12);
    }
}
