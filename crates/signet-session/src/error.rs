//! Error types for the session layer.
//!
//! Three enums, one per boundary:
//!
//! - [`SessionError`]: the caller asked the manager for something the
//!   current state doesn't allow. These are programming errors, not
//!   authentication outcomes.
//! - [`ProviderError`]: what an [`IdentityProvider`](crate::IdentityProvider)
//!   reports back.
//! - [`ServiceError`]: what an [`AuthService`](crate::AuthService)
//!   reports back.
//!
//! Authentication outcomes themselves (denied, rejected, cancelled, ...)
//! are never errors: they travel inside [`AuthResult`](crate::AuthResult).

use crate::SignInHandle;

/// Misuse of the [`SessionManager`](crate::SessionManager) API.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A sign-in is already waiting on the provider. Complete or cancel it
    /// before starting another.
    #[error("sign-in {0} is already in progress")]
    SignInPending(SignInHandle),

    /// The session is already signed in. Sign out first.
    #[error("already signed in as {0}")]
    AlreadySignedIn(String),
}

/// Errors reported by the external identity provider.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// The user backed out of the consent screen.
    #[error("user cancelled the consent flow")]
    UserCancelled,

    /// The provider refused (misconfigured client id, blocked account,
    /// developer error codes, ...).
    #[error("provider denied sign-in: {0}")]
    Denied(String),

    /// The provider could not be reached (no network, no Play services).
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Errors reported by the backend auth service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    /// The service looked at the credential and said no.
    #[error("service rejected credential ({code}): {message}")]
    Rejected { code: u16, message: String },

    /// The service could not be reached or did not answer in time.
    /// Retrying later may succeed.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}
