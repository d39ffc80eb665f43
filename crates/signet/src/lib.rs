//! # Signet
//!
//! An owned sign-in handshake for client applications.
//!
//! Signet sits between an external identity provider (Google Sign-In) and a
//! backend auth service. The application implements [`IdentityProvider`]
//! for its provider SDK, picks an [`AuthService`] (usually
//! [`RemoteAuthService`]), and the [`SessionManager`] handles the rest:
//! consent, credential exchange, result delivery, sign-out and revoke.
//!
//! The crate also ships the service side of the exchange,
//! [`ExchangeServer`], for local development and tests.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use signet::prelude::*;
//!
//! signet::logging::init();
//!
//! let service = RemoteAuthService::new("ws://127.0.0.1:9099");
//! let manager = SessionManager::new(my_provider, service, SessionConfig::default());
//!
//! let ticket = manager.begin_sign_in().await?;
//! // The provider glue calls, once the user has picked an account:
//! //     manager.complete_sign_in(handle, Ok(ProviderToken::from(id_token))).await;
//! match ticket.await {
//!     AuthResult::Success(session) => println!("signed in as {}", session.email()),
//!     AuthResult::Failure { kind, message } => eprintln!("{kind}: {message}"),
//! }
//! ```

mod error;
mod handler;
pub mod logging;
mod remote;
mod server;
mod verifier;

pub use error::SignetError;
pub use remote::RemoteAuthService;
pub use server::{ExchangeServer, ExchangeServerBuilder};
pub use verifier::{
    CredentialVerifier, StaticVerifier, VerifiedIdentity, VerifyError,
};

pub use signet_session::{
    AuthResult, AuthService, Claims, CredentialExchanger, ErrorKind,
    ExchangeRequest, IdentityProvider, ProviderError, ProviderToken,
    ResultDispatcher, ServiceError, Session, SessionConfig, SessionError,
    SessionManager, SessionState, SignInHandle, SignInTicket,
};

/// Everything an application needs for the common case.
pub mod prelude {
    pub use crate::{
        AuthResult, AuthService, Claims, CredentialVerifier, ErrorKind,
        ExchangeRequest, ExchangeServer, ExchangeServerBuilder,
        IdentityProvider, ProviderError, ProviderToken, RemoteAuthService,
        ServiceError, Session, SessionConfig, SessionError, SessionManager,
        SessionState, SignInHandle, SignInTicket, SignetError, StaticVerifier,
        VerifiedIdentity, VerifyError,
    };
    pub use signet_protocol::{
        Envelope, ExchangeMessage, ProviderKind, UserId, PROTOCOL_VERSION,
    };
}
