//! Wire protocol for Signet's credential exchange.
//!
//! This crate defines what a client and an auth service say to each other
//! when a provider token is traded for a session credential:
//!
//! - **Types** ([`Envelope`], [`ExchangeMessage`], [`ProviderKind`],
//!   [`UserId`]): the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Session (who is signed in)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Envelope, ExchangeMessage, ProviderKind, UserId, PROTOCOL_VERSION,
};
