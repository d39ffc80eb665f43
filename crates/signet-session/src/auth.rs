//! Capability traits for the two external collaborators.
//!
//! Signet doesn't talk to Google or Firebase itself. It defines what it
//! needs from them:
//!
//! - [`IdentityProvider`]: presents a consent flow and later answers with
//!   a [`ProviderToken`]; can sign out or revoke its own grant.
//! - [`AuthService`]: trades a provider token for [`Claims`] about the
//!   user plus a session credential.
//!
//! Production code plugs in SDK bindings or a network client (see
//! `signet::RemoteAuthService`); tests plug in mocks. Nothing else in the
//! session layer changes.

use std::fmt;

use signet_protocol::{ProviderKind, UserId};

use crate::{ProviderError, ServiceError, SignInHandle};

// ---------------------------------------------------------------------------
// ProviderToken
// ---------------------------------------------------------------------------

/// An identity assertion issued by the external provider after consent.
///
/// Untrusted until the auth service has exchanged it. `Debug` never prints
/// the token itself.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderToken(String);

impl ProviderToken {
    /// Wraps a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper, returning the raw token.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for ProviderToken {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ProviderToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Debug for ProviderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderToken(<{} bytes>)", self.0.len())
    }
}

// ---------------------------------------------------------------------------
// Exchange request / claims
// ---------------------------------------------------------------------------

/// What the exchanger sends to the auth service.
#[derive(Clone, PartialEq, Eq)]
pub struct ExchangeRequest {
    /// Which provider issued `id_token`.
    pub provider: ProviderKind,
    /// The provider token, already shape-checked.
    pub id_token: String,
}

impl fmt::Debug for ExchangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeRequest")
            .field("provider", &self.provider)
            .field("id_token", &"<redacted>")
            .finish()
    }
}

/// What the auth service says about the user after a successful exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct Claims {
    /// The service's id for the user.
    pub user_id: UserId,
    /// The user's email.
    pub email: String,
    /// The backend-issued session credential.
    pub session_token: String,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("session_token", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// The external identity provider, such as Google Sign-In.
///
/// The consent flow runs out-of-process: `request_consent` only starts it.
/// The provider's answer is fed back later through
/// [`SessionManager::complete_sign_in`](crate::SessionManager::complete_sign_in)
/// with the same handle.
///
/// # Example
///
/// ```rust
/// use signet_protocol::ProviderKind;
/// use signet_session::{IdentityProvider, ProviderError, SignInHandle};
///
/// /// Logs the request; a UI layer would open the account picker.
/// struct ConsoleProvider;
///
/// impl IdentityProvider for ConsoleProvider {
///     fn kind(&self) -> ProviderKind {
///         ProviderKind::Google
///     }
///
///     async fn request_consent(
///         &self,
///         handle: SignInHandle,
///     ) -> Result<(), ProviderError> {
///         println!("please sign in (request {handle})");
///         Ok(())
///     }
///
///     async fn sign_out(&self) -> Result<(), ProviderError> {
///         Ok(())
///     }
///
///     async fn revoke_access(&self) -> Result<(), ProviderError> {
///         Ok(())
///     }
/// }
/// ```
pub trait IdentityProvider: Send + Sync + 'static {
    /// Which provider this is. Sent to the auth service with every token.
    fn kind(&self) -> ProviderKind;

    /// Starts the consent flow for `handle`.
    ///
    /// An `Err` here means the flow could not even be started; the
    /// sign-in then fails with `ProviderDenied`.
    fn request_consent(
        &self,
        handle: SignInHandle,
    ) -> impl std::future::Future<Output = Result<(), ProviderError>> + Send;

    /// Ends the provider-side session.
    fn sign_out(
        &self,
    ) -> impl std::future::Future<Output = Result<(), ProviderError>> + Send;

    /// Ends the provider-side session and revokes the granted scopes.
    fn revoke_access(
        &self,
    ) -> impl std::future::Future<Output = Result<(), ProviderError>> + Send;
}

/// The backend auth service, such as Firebase Auth.
pub trait AuthService: Send + Sync + 'static {
    /// Exchanges a provider token for claims and a session credential.
    ///
    /// # Returns
    /// - `Ok(Claims)`: the service accepted the credential
    /// - `Err(ServiceError::Rejected)`: the service declined it
    /// - `Err(ServiceError::Unavailable)`: transport failure
    fn exchange(
        &self,
        request: ExchangeRequest,
    ) -> impl std::future::Future<Output = Result<Claims, ServiceError>> + Send;
}
