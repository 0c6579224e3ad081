//! Per-connection state, keyed by connection id.
//!
//! Rooms never hold a connection, only its [`ConnectionId`]. Whether that
//! id still points at something we can write to is answered here.

use std::collections::HashMap;

use tandem_protocol::{Role, RoomKey, ServerMessage};
use tandem_transport::ConnectionId;
use tokio::sync::mpsc;

/// An instruction for a connection's writer task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Encode and send this message.
    Message(ServerMessage),
    /// Close the socket. Nothing queued after this is sent.
    Close,
}

/// Channel for delivering outbound frames to one connection's writer.
pub type PeerSender = mpsc::UnboundedSender<Outbound>;

/// Answers "is this connection still usable for sending?".
pub trait Liveness {
    /// `false` for unknown, closed, or closing connections.
    fn is_live(&self, conn: ConnectionId) -> bool;
}

#[derive(Debug)]
struct ConnectionState {
    role: Option<Role>,
    room: Option<RoomKey>,
    sender: PeerSender,
    open: bool,
}

/// Every connection the relay currently knows about.
#[derive(Debug, Default)]
pub struct ConnectionTable {
    entries: HashMap<ConnectionId, ConnectionState>,
}

impl ConnectionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a freshly opened connection.
    pub fn register(&mut self, conn: ConnectionId, sender: PeerSender) {
        self.entries.insert(
            conn,
            ConnectionState {
                role: None,
                room: None,
                sender,
                open: true,
            },
        );
    }

    /// Stops tracking `conn`, returning the room it was bound to.
    ///
    /// The outer `Option` is `None` when the connection was unknown.
    pub fn remove(&mut self, conn: ConnectionId) -> Option<Option<RoomKey>> {
        self.entries.remove(&conn).map(|state| state.room)
    }

    /// Records the room and role for `conn`.
    ///
    /// Both are set once per connection; returns `false` (and changes
    /// nothing) if the connection is unknown or already bound.
    pub fn bind(&mut self, conn: ConnectionId, room: RoomKey, role: Role) -> bool {
        match self.entries.get_mut(&conn) {
            Some(state) if state.room.is_none() => {
                state.room = Some(room);
                state.role = Some(role);
                true
            }
            _ => false,
        }
    }

    /// The room and role `conn` is bound to, if any.
    pub fn binding(&self, conn: ConnectionId) -> Option<(&RoomKey, Role)> {
        let state = self.entries.get(&conn)?;
        Some((state.room.as_ref()?, state.role?))
    }

    /// `true` if the connection is known and has not been closed by us.
    pub fn is_open(&self, conn: ConnectionId) -> bool {
        self.entries.get(&conn).is_some_and(|state| state.open)
    }

    /// Queues `msg` for `conn` if it is live. Returns whether it was queued.
    pub fn send(&self, conn: ConnectionId, msg: ServerMessage) -> bool {
        match self.entries.get(&conn) {
            Some(state) if state.open => state.sender.send(Outbound::Message(msg)).is_ok(),
            _ => false,
        }
    }

    /// Queues a close for `conn` and stops treating it as live.
    pub fn close(&mut self, conn: ConnectionId) {
        if let Some(state) = self.entries.get_mut(&conn) {
            if state.open {
                let _ = state.sender.send(Outbound::Close);
                state.open = false;
            }
        }
    }

    /// Closes and forgets every connection. Returns how many there were.
    pub fn drain(&mut self) -> usize {
        let count = self.entries.len();
        for (_, state) in self.entries.drain() {
            if state.open {
                let _ = state.sender.send(Outbound::Close);
            }
        }
        count
    }

    /// Number of tracked connections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no connections are tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Liveness for ConnectionTable {
    fn is_live(&self, conn: ConnectionId) -> bool {
        self.entries
            .get(&conn)
            .is_some_and(|state| state.open && !state.sender.is_closed())
    }
}
