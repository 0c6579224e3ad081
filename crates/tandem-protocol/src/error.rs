//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
///
/// The relay treats every decode failure the same way (the frame is
/// dropped), but the variants are kept apart so logs say which side failed.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The frame is not a JSON object with a string `t` field.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
