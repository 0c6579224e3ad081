//! Codec trait and the JSON implementation.
//!
//! The relay only ever speaks JSON text frames, but the handler is written
//! against [`Codec`] so framing can be tested without a socket.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Turns wire values into text frames and frame payloads back into values.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a frame payload.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use tandem_protocol::{ClientMessage, Codec, JsonCodec, ServerMessage};
///
/// let codec = JsonCodec;
/// let frame = codec.encode(&ServerMessage::Ready).unwrap();
/// assert_eq!(frame, r#"{"t":"ready"}"#);
///
/// let msg: ClientMessage = codec.decode(br#"{"t":"start"}"#).unwrap();
/// assert_eq!(msg, ClientMessage::Start);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
