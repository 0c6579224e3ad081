//! Error types for the room layer.

use tandem_protocol::RoomKey;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// Both seats hold live connections.
    #[error("room {0} is full")]
    Full(RoomKey),

    /// The relay actor has stopped or its command channel is closed.
    #[error("relay is unavailable")]
    Unavailable,
}
