//! Core protocol types for Signet's credential-exchange wire format.
//!
//! Every type here travels "on the wire" between a client (the session
//! core) and an auth service: it is serialized, sent, and deserialized on
//! the other side. Nothing in this module knows about sessions or
//! connections, only about the shape of the messages.

use serde::{Deserialize, Serialize};

use std::fmt;

/// The current protocol version. An `Exchange` carrying any other version
/// is rejected with code 400.
pub const PROTOCOL_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The auth service's identifier for a user.
///
/// Opaque to Signet: the service picks the format (Firebase uses a
/// 28-character UID, other services use UUIDs). Newtype-wrapped so a
/// user id can't be confused with an email or a token in a signature.
///
/// `#[serde(transparent)]` serializes `UserId("u-1")` as plain `"u-1"`.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the service sent an empty id.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// ProviderKind: which identity provider issued a token
// ---------------------------------------------------------------------------

/// The external identity provider that issued a provider token.
///
/// The auth service needs to know this to pick the right verification
/// keys. On the wire it is a lowercase string: `"google"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ProviderKind {
    /// Google Sign-In ID tokens.
    Google,
}

impl ProviderKind {
    /// The wire identifier for this provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ExchangeMessage: the three messages of the exchange
// ---------------------------------------------------------------------------

/// Messages of the credential exchange.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
///   `{ "type": "Exchange", "version": 1, "provider": "google", "id_token": "..." }`
/// which is easy to produce and parse from any client language.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExchangeMessage {
    /// Client → Service: "Here's a provider token, give me a session."
    Exchange {
        version: u32,
        provider: ProviderKind,
        id_token: String,
    },

    /// Service → Client: the token was verified.
    ///
    /// `session_token` is the backend-issued session credential. It is
    /// what the client keeps as the session's `id_token`.
    Accepted {
        user_id: UserId,
        email: String,
        session_token: String,
    },

    /// Service → Client: the exchange was declined.
    /// `code` follows HTTP conventions (400 bad request, 401 rejected
    /// credential, 503 verifier unavailable).
    Rejected { code: u16, message: String },
}

/// Tokens never show up in logs, even at debug level.
impl fmt::Debug for ExchangeMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exchange {
                version, provider, ..
            } => f
                .debug_struct("Exchange")
                .field("version", version)
                .field("provider", provider)
                .field("id_token", &"<redacted>")
                .finish(),
            Self::Accepted { user_id, email, .. } => f
                .debug_struct("Accepted")
                .field("user_id", user_id)
                .field("email", email)
                .field("session_token", &"<redacted>")
                .finish(),
            Self::Rejected { code, message } => f
                .debug_struct("Rejected")
                .field("code", code)
                .field("message", message)
                .finish(),
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope: the top-level wire format
// ---------------------------------------------------------------------------

/// The top-level message wrapper. Every frame on the wire is an Envelope.
///
/// ```text
/// ┌──────────────────────────────────┐
/// │ seq: 7                           │  ← request/reply correlation
/// │ ┌──────────────────────────────┐ │
/// │ │ payload: Exchange { ... }    │ │  ← the actual message
/// │ └──────────────────────────────┘ │
/// └──────────────────────────────────┘
/// ```
///
/// A service always replies with the `seq` of the request it answers, so
/// a client can discard stale replies on a reused connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Sequence number chosen by the client, echoed by the service.
    pub seq: u64,

    /// The message itself.
    pub payload: ExchangeMessage,
}

impl Envelope {
    /// Builds an `Exchange` request at the current protocol version.
    pub fn exchange(
        seq: u64,
        provider: ProviderKind,
        id_token: impl Into<String>,
    ) -> Self {
        Self {
            seq,
            payload: ExchangeMessage::Exchange {
                version: PROTOCOL_VERSION,
                provider,
                id_token: id_token.into(),
            },
        }
    }

    /// Builds a `Rejected` reply.
    pub fn rejected(seq: u64, code: u16, message: impl Into<String>) -> Self {
        Self {
            seq,
            payload: ExchangeMessage::Rejected {
                code,
                message: message.into(),
            },
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
