//! Wire types for the Tandem relay.
//!
//! Every frame is a JSON object with a `t` field naming its type. Inbound
//! frames decode into [`ClientMessage`]; anything the relay does not
//! recognise becomes [`ClientMessage::Unknown`], which is always legal and
//! always ignored. Outbound frames are [`ServerMessage`]s.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};

/// Identifiers longer than this many characters are cut down to it.
pub const MAX_ID_CHARS: usize = 64;

/// Keeps at most the first `max` characters of `raw`.
fn truncate_chars(raw: &str, max: usize) -> &str {
    match raw.char_indices().nth(max) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}

/// Reads an identifier field the way browser clients tend to send it.
///
/// Strings pass through. Non-zero numbers and `true` are rendered as text.
/// `null`, `false`, `0`, arrays and objects all count as "no value".
fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "true".to_string(),
        Value::Number(n) if n.as_f64() != Some(0.0) => n.to_string(),
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// The caller-chosen name of a room.
///
/// Always non-empty and at most [`MAX_ID_CHARS`] characters. Two joins
/// whose raw ids share the same first 64 characters land in the same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RoomKey(String);

impl RoomKey {
    /// Truncates `raw` and returns `None` if nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let truncated = truncate_chars(raw, MAX_ID_CHARS);
        if truncated.is_empty() {
            None
        } else {
            Some(Self(truncated.to_string()))
        }
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A level chosen by the host. May be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct LevelId(String);

impl LevelId {
    /// Truncates `raw` to [`MAX_ID_CHARS`] characters.
    pub fn new(raw: &str) -> Self {
        Self(truncate_chars(raw, MAX_ID_CHARS).to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty id.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for LevelId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::new(&coerce_text(&value)))
    }
}

fn room_key_from_value<'de, D>(deserializer: D) -> Result<Option<RoomKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(RoomKey::parse(&coerce_text(&value)))
}

/// Which slot of a room a connection holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// First connection admitted. Drives `start` and `setLevel`.
    Host,
    /// Second connection admitted.
    Guest,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.write_str("host"),
            Self::Guest => f.write_str("guest"),
        }
    }
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// A frame sent by a peer.
///
/// `#[serde(tag = "t")]` reads the variant from the `t` field. A `t` the
/// relay does not know maps to `Unknown` rather than a decode error, so
/// newer clients can send extra message types without being cut off.
/// A `t` that is not a string is a decode error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(remote = "Self", tag = "t", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Ask to be placed in a room. `room` is `None` when the supplied id
    /// is missing or empty after truncation.
    Join {
        #[serde(default, deserialize_with = "room_key_from_value")]
        room: Option<RoomKey>,
    },

    /// Game state for the other peer. Every field other than `t` is kept
    /// verbatim and never inspected.
    State {
        #[serde(flatten)]
        fields: Map<String, Value>,
    },

    /// Host only: begin the match countdown.
    Start,

    /// Host only: pick the level for this room.
    SetLevel {
        #[serde(default)]
        id: LevelId,
    },

    /// Any other `t` value.
    #[serde(other)]
    Unknown,
}

impl<'de> Deserialize<'de> for ClientMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        // The derived visitor would also accept a variant index here.
        if !value.get("t").is_some_and(Value::is_string) {
            return Err(de::Error::custom("expected an object with a string `t`"));
        }
        ClientMessage::deserialize(value).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// A frame sent by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "camelCase")]
pub enum ServerMessage {
    /// The join succeeded with this role.
    Joined { role: Role },

    /// The room's current level.
    Level { id: LevelId },

    /// Both slots now hold live connections.
    Ready,

    /// Both slots are taken. The connection is closed right after.
    Full,

    /// Both peers should start simulating at this unix time (ms).
    StartAt {
        #[serde(rename = "startAt")]
        start_at: u64,
    },

    /// The other occupant went away.
    PeerLeft,

    /// A relayed `state` frame with the relay's receive time attached.
    State {
        #[serde(flatten)]
        fields: Map<String, Value>,
        #[serde(rename = "serverTime")]
        server_time: u64,
    },
}

impl ServerMessage {
    /// Builds a state relay from the fields of an inbound `state` frame.
    ///
    /// A client-supplied `serverTime` is replaced by ours.
    pub fn relay_state(mut fields: Map<String, Value>, server_time: u64) -> Self {
        fields.remove("t");
        fields.remove("serverTime");
        Self::State {
            fields,
            server_time,
        }
    }
}
