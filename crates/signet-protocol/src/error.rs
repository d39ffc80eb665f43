//! Encoding and message-rule failures.
//!
//! Each Signet crate defines its own error enum. A `ProtocolError` always
//! means the problem is in serialization or message validity, never in
//! networking or session state.

/// A frame that could not be produced, parsed, or accepted as an exchange message.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// An envelope could not be rendered as JSON.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, an unknown
    /// message type, or an unknown provider.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but breaks a protocol rule, e.g. an `Exchange`
    /// with the wrong version or a reply where a request was expected.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
