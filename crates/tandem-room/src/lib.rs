//! Room lifecycle management for Tandem.
//!
//! A room has exactly two seats, host and guest. Everything that touches
//! room state runs inside one relay actor task, so the registry and the
//! connection table are plain maps with no locking.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: room id → [`Room`]; creates rooms on first join
//! - [`ConnectionTable`]: connection id → role, bound room, outbound channel
//! - [`Dispatcher`]: applies one inbound event to the registry and table
//! - [`RelayHandle`]: send events to the running relay actor
//! - [`spawn_janitor`]: periodic sweep of idle rooms
//! - [`RelayConfig`]: retention window, sweep period, start delay

mod clock;
mod config;
mod connection;
mod dispatcher;
mod error;
mod janitor;
mod registry;
mod relay;
mod room;

pub use clock::{Clock, SystemClock};
pub use config::RelayConfig;
pub use connection::{ConnectionTable, Liveness, Outbound, PeerSender};
pub use dispatcher::Dispatcher;
pub use error::RoomError;
pub use janitor::spawn_janitor;
pub use registry::RoomRegistry;
pub use relay::{RelayHandle, spawn_relay, spawn_relay_with_clock};
pub use room::Room;
