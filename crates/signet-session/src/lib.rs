//! Sign-in session management for Signet.
//!
//! This crate owns the authentication handshake of a client process:
//!
//! 1. **Sign-in**: ask an external [`IdentityProvider`] for consent, then
//!    trade its token for a session through an [`AuthService`]
//!    ([`CredentialExchanger`])
//! 2. **Session tracking**: one [`Session`] per process, owned by the
//!    [`SessionManager`] and observable as snapshots
//! 3. **Result delivery**: every sign-in resolves exactly once, on the
//!    [`SignInTicket`] of the caller that started it ([`ResultDispatcher`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Application (above)  ← begin_sign_in / complete_sign_in / sign_out
//!     ↕
//! Session Layer (this crate)  ← owns the session and the handshake
//!     ↕
//! Protocol Layer (below)  ← provides UserId, ProviderKind
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let manager = SessionManager::new(provider, service, SessionConfig::default());
//!
//! let ticket = manager.begin_sign_in().await?;
//! // ... later, wherever the provider's answer shows up:
//! manager.complete_sign_in(ticket.handle(), Ok(token)).await;
//!
//! match ticket.await {
//!     AuthResult::Success(session) => println!("hello {}", session.email()),
//!     AuthResult::Failure { kind, message } => eprintln!("{kind}: {message}"),
//! }
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod dispatcher;
mod error;
mod exchanger;
mod manager;
mod result;
mod session;

pub use auth::{
    AuthService, Claims, ExchangeRequest, IdentityProvider, ProviderToken,
};
pub use dispatcher::{ResultDispatcher, SignInTicket};
pub use error::{ProviderError, ServiceError, SessionError};
pub use exchanger::CredentialExchanger;
pub use manager::SessionManager;
pub use result::{AuthResult, ErrorKind};
pub use session::{Session, SessionConfig, SessionState, SignInHandle};
