//! Unified error type for Signet.

use signet_protocol::ProtocolError;
use signet_session::SessionError;
use signet_transport::TransportError;

/// Everything that can go wrong while running or talking to an exchange server.
///
/// When using the `signet` meta-crate, you deal with this single error type
/// instead of importing errors from each sub-crate. Authentication outcomes
/// are not errors: those arrive as
/// [`AuthResult`](signet_session::AuthResult) values.
#[derive(Debug, thiserror::Error)]
pub enum SignetError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame failed to encode or decode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Misuse of the session manager (sign-in already pending, ...).
    #[error(transparent)]
    Session(#[from] SessionError),
}
