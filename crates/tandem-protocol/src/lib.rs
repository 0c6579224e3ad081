//! Wire protocol for Tandem.
//!
//! This crate defines what the two peers and the relay say to each other:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`Role`], [`RoomKey`],
//!   [`LevelId`]): the JSON records that travel on the wire, tagged by a
//!   `t` field.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those records are
//!   turned into text frames and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//!
//! The protocol layer knows nothing about connections or rooms. Game
//! payloads inside `state` messages are carried as opaque JSON.
//!
//! ```text
//! Transport (frames) → Protocol (ClientMessage) → Room (dispatch)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{ClientMessage, LevelId, MAX_ID_CHARS, Role, RoomKey, ServerMessage};
