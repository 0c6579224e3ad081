//! # Tandem
//!
//! A relay that pairs two browser clients in a named room and forwards
//! game state between them. The relay never simulates anything; it seats
//! a host and a guest, passes `state` frames across with a server
//! timestamp, broadcasts the host's level and start commands, and tells
//! the survivor when the other side leaves.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tandem::prelude::*;
//!
//! # async fn run() -> Result<(), TandemError> {
//! let server = TandemServer::builder()
//!     .bind("0.0.0.0:10000")
//!     .relay_config(RelayConfig::default())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

pub mod config;
mod error;
mod handler;
pub mod logging;
mod server;

pub use error::TandemError;
pub use server::{TandemServer, TandemServerBuilder};

/// Common imports for running a relay.
pub mod prelude {
    pub use crate::{TandemError, TandemServer, TandemServerBuilder};
    pub use tandem_protocol::{ClientMessage, Role, RoomKey, ServerMessage};
    pub use tandem_room::{RelayConfig, RelayHandle};
}
