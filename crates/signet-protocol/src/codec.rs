//! Turning exchange envelopes into frames and back.
//!
//! The rest of Signet only depends on the [`Codec`] trait, so the JSON
//! format used today can be swapped for a binary one without touching the
//! session or transport layers.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Wire format for [`Envelope`](crate::Envelope)s and anything else serde
/// can describe.
///
/// `Send + Sync + 'static` because a codec lives inside long-lived async
/// tasks (the exchange server's connection handlers, the remote service
/// client) that Tokio may run on any worker thread.
pub trait Codec: Send + Sync + 'static {
    /// Renders `value` as one frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Parses one received frame.
    ///
    /// # Errors
    /// `ProtocolError::Decode` for truncated input, bad syntax, or a shape
    /// that is not `T`.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// The JSON wire format, as spoken by every exchange server today.
///
/// Behind the `json` feature flag (enabled by default).
///
/// # Example
///
/// ```rust
/// use signet_protocol::{Codec, Envelope, JsonCodec, ProviderKind};
///
/// let codec = JsonCodec;
/// let request = Envelope::exchange(1, ProviderKind::Google, "id-token");
///
/// let bytes = codec.encode(&request).unwrap();
/// let decoded: Envelope = codec.decode(&bytes).unwrap();
/// assert_eq!(request, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
