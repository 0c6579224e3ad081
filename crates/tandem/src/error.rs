//! Unified error type for the Tandem relay.

use tandem_protocol::ProtocolError;
use tandem_room::RoomError;
use tandem_transport::TransportError;

/// Top-level error that wraps the error of each layer.
///
/// `#[from]` on each variant lets `?` convert layer errors directly.
#[derive(Debug, thiserror::Error)]
pub enum TandemError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, relay stopped).
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let tandem_err: TandemError = err.into();
        assert!(matches!(tandem_err, TandemError::Transport(_)));
        assert!(tandem_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let bad = serde_json_error();
        let tandem_err: TandemError = ProtocolError::Decode(bad).into();
        assert!(matches!(tandem_err, TandemError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let tandem_err: TandemError = RoomError::Unavailable.into();
        assert!(matches!(tandem_err, TandemError::Room(_)));
        assert_eq!(tandem_err.to_string(), "relay is unavailable");
    }

    fn serde_json_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("{").unwrap_err()
    }
}
