//! Credential exchange: the one step with a trust boundary.
//!
//! The provider token comes from outside the process and is untrusted.
//! The exchanger checks its shape, forwards it to the [`AuthService`], and
//! builds a signed-in [`Session`] only from what the service answered.
//! A session is never built from the provider token alone.

use std::time::Duration;

use signet_protocol::ProviderKind;

use crate::{
    AuthResult, AuthService, ErrorKind, ExchangeRequest, ProviderToken,
    ServiceError, Session, SessionConfig,
};

/// Trades provider tokens for sessions through an [`AuthService`].
pub struct CredentialExchanger<S: AuthService> {
    provider: ProviderKind,
    service: S,
    exchange_timeout: Duration,
    max_token_len: usize,
}

impl<S: AuthService> CredentialExchanger<S> {
    /// Creates an exchanger for tokens issued by `provider`.
    pub fn new(
        provider: ProviderKind,
        service: S,
        config: &SessionConfig,
    ) -> Self {
        Self {
            provider,
            service,
            exchange_timeout: config.exchange_timeout,
            max_token_len: config.max_token_len,
        }
    }

    /// The provider whose tokens this exchanger forwards.
    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Exchanges `token` for a session.
    ///
    /// - `InvalidToken`: empty or malformed; the service is not contacted
    /// - `ExchangeRejected`: the service declined, or sent incomplete claims
    /// - `NetworkUnavailable`: transport failure or timeout
    /// - `Success`: a signed-in session built from the service's claims
    pub async fn exchange(&self, token: ProviderToken) -> AuthResult {
        if let Err(reason) = check_shape(token.as_str(), self.max_token_len) {
            tracing::debug!(provider = %self.provider, %reason, "provider token refused");
            return AuthResult::failure(ErrorKind::InvalidToken, reason);
        }

        let request = ExchangeRequest {
            provider: self.provider,
            id_token: token.into_inner(),
        };

        let reply = tokio::time::timeout(
            self.exchange_timeout,
            self.service.exchange(request),
        )
        .await;

        let claims = match reply {
            Ok(Ok(claims)) => claims,
            Ok(Err(ServiceError::Rejected { code, message })) => {
                tracing::warn!(provider = %self.provider, code, %message, "credential rejected");
                return AuthResult::failure(
                    ErrorKind::ExchangeRejected,
                    format!("{message} ({code})"),
                );
            }
            Ok(Err(ServiceError::Unavailable(message))) => {
                tracing::warn!(provider = %self.provider, %message, "auth service unavailable");
                return AuthResult::failure(
                    ErrorKind::NetworkUnavailable,
                    message,
                );
            }
            Err(_) => {
                tracing::warn!(
                    provider = %self.provider,
                    timeout = ?self.exchange_timeout,
                    "auth service timed out"
                );
                return AuthResult::failure(
                    ErrorKind::NetworkUnavailable,
                    format!(
                        "auth service did not answer within {:?}",
                        self.exchange_timeout
                    ),
                );
            }
        };

        if claims.user_id.is_empty() || claims.session_token.is_empty() {
            tracing::warn!(provider = %self.provider, "auth service returned incomplete claims");
            return AuthResult::failure(
                ErrorKind::ExchangeRejected,
                "auth service returned incomplete claims",
            );
        }

        tracing::info!(user_id = %claims.user_id, "credential exchanged");
        AuthResult::Success(Session::signed_in(
            claims.user_id,
            claims.email,
            claims.session_token,
        ))
    }
}

/// Shape check for an untrusted provider token.
///
/// Provider tokens are compact ASCII (Google's are JWTs): no whitespace,
/// no control characters, bounded length.
fn check_shape(token: &str, max_len: usize) -> Result<(), String> {
    if token.is_empty() {
        return Err("provider token is empty".into());
    }
    if token.len() > max_len {
        return Err(format!("provider token exceeds {max_len} bytes"));
    }
    if token.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(
            "provider token contains whitespace or control characters".into(),
        );
    }
    Ok(())
}
