//! Credential verification on the service side of the exchange.
//!
//! The [`ExchangeServer`](crate::ExchangeServer) doesn't know how to check
//! a provider token. It asks a [`CredentialVerifier`], which a deployment
//! backs with real provider key checks and a test backs with a table.

use std::collections::HashMap;
use std::future::Future;

use signet_protocol::{ProviderKind, UserId};

/// Who a provider token belongs to, once verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub user_id: UserId,
    pub email: String,
}

/// Why a verifier refused a token.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VerifyError {
    /// The token is not valid (bad signature, expired, wrong audience).
    /// Answered with code 401.
    #[error("credential rejected: {0}")]
    Rejected(String),

    /// The verifier could not decide right now (key fetch failed, ...).
    /// Answered with code 503.
    #[error("verifier unavailable: {0}")]
    Unavailable(String),
}

/// Checks provider tokens for the exchange server.
///
/// # Example
///
/// ```rust
/// use signet::{CredentialVerifier, VerifiedIdentity, VerifyError};
/// use signet_protocol::{ProviderKind, UserId};
///
/// /// Trusts any token of the form `user:<email>`.
/// struct PrefixVerifier;
///
/// impl CredentialVerifier for PrefixVerifier {
///     async fn verify(
///         &self,
///         _provider: ProviderKind,
///         id_token: &str,
///     ) -> Result<VerifiedIdentity, VerifyError> {
///         let email = id_token
///             .strip_prefix("user:")
///             .ok_or_else(|| VerifyError::Rejected("unknown token".into()))?;
///         Ok(VerifiedIdentity {
///             user_id: UserId(format!("uid-{email}")),
///             email: email.to_owned(),
///         })
///     }
/// }
/// ```
pub trait CredentialVerifier: Send + Sync + 'static {
    /// Verifies `id_token`, issued by `provider`.
    fn verify(
        &self,
        provider: ProviderKind,
        id_token: &str,
    ) -> impl Future<Output = Result<VerifiedIdentity, VerifyError>> + Send;
}

/// A verifier backed by a fixed token table.
///
/// For local development and tests, like an auth emulator: every token in
/// the table verifies to its identity, everything else is rejected.
#[derive(Debug, Clone, Default)]
pub struct StaticVerifier {
    tokens: HashMap<String, VerifiedIdentity>,
}

impl StaticVerifier {
    /// Creates an empty table. Every token is rejected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id_token`, verifying to `user_id` / `email`.
    pub fn with_token(
        mut self,
        id_token: impl Into<String>,
        user_id: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        self.tokens.insert(
            id_token.into(),
            VerifiedIdentity {
                user_id: UserId(user_id.into()),
                email: email.into(),
            },
        );
        self
    }
}

impl CredentialVerifier for StaticVerifier {
    async fn verify(
        &self,
        _provider: ProviderKind,
        id_token: &str,
    ) -> Result<VerifiedIdentity, VerifyError> {
        self.tokens
            .get(id_token)
            .cloned()
            .ok_or_else(|| VerifyError::Rejected("invalid id token".into()))
    }
}
