//! The outcome of an authentication operation.

use std::fmt;

use crate::Session;

/// Why an operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The user cancelled the consent screen, or the provider refused.
    ProviderDenied,

    /// The provider token was empty or malformed. The auth service was
    /// never contacted.
    InvalidToken,

    /// The auth service declined the credential.
    ExchangeRejected,

    /// The caller (or a consent timeout) aborted the operation.
    Cancelled,

    /// The auth service could not be reached. Safe to retry.
    NetworkUnavailable,
}

impl ErrorKind {
    /// Returns `true` if trying again later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkUnavailable)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderDenied => write!(f, "ProviderDenied"),
            Self::InvalidToken => write!(f, "InvalidToken"),
            Self::ExchangeRejected => write!(f, "ExchangeRejected"),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::NetworkUnavailable => write!(f, "NetworkUnavailable"),
        }
    }
}

/// Success with a session snapshot, or a classified failure.
///
/// Every operation on the [`SessionManager`](crate::SessionManager)
/// yields one of these instead of returning `Err`, so the caller can
/// present any outcome the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    /// The operation succeeded. The session is a snapshot taken right
    /// after it was applied.
    Success(Session),

    /// The operation failed.
    Failure { kind: ErrorKind, message: String },
}

impl AuthResult {
    /// Builds a failure.
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a `Cancelled` failure.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::failure(ErrorKind::Cancelled, message)
    }

    /// Returns `true` for `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The session, if this is a success.
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Success(session) => Some(session),
            Self::Failure { .. } => None,
        }
    }

    /// The failure kind, if this is a failure.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}

impl fmt::Display for AuthResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(session) if session.is_signed_in() => {
                write!(f, "signed in as {}", session.email())
            }
            Self::Success(session) => write!(f, "{}", session.state()),
            Self::Failure { kind, message } => write!(f, "{kind}: {message}"),
        }
    }
}
