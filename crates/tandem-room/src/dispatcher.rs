//! Applies inbound events to the registry and connection table.
//!
//! The dispatcher is synchronous and owns all room state. The relay actor
//! drives it one command at a time; tests drive it directly.

use tandem_protocol::{ClientMessage, LevelId, Role, RoomKey, ServerMessage};
use tandem_transport::ConnectionId;
use tokio::time::Instant;

use crate::{
    Clock, ConnectionTable, Liveness, PeerSender, RelayConfig, RoomError, RoomRegistry, SystemClock,
};

/// Room registry plus connection table, and the rules that connect them.
pub struct Dispatcher<K: Clock = SystemClock> {
    registry: RoomRegistry,
    connections: ConnectionTable,
    config: RelayConfig,
    clock: K,
}

impl<K: Clock> Dispatcher<K> {
    pub fn new(config: RelayConfig, clock: K) -> Self {
        Self {
            registry: RoomRegistry::new(),
            connections: ConnectionTable::new(),
            config,
            clock,
        }
    }

    /// Registers a new connection. It is unbound until it sends `join`.
    pub fn open(&mut self, conn: ConnectionId, sender: PeerSender) {
        tracing::debug!(conn_id = %conn, "connection opened");
        self.connections.register(conn, sender);
    }

    /// Handles one decoded frame from `conn`.
    pub fn handle(&mut self, conn: ConnectionId, msg: ClientMessage) {
        if !self.connections.is_open(conn) {
            tracing::trace!(conn_id = %conn, "message from closed connection dropped");
            return;
        }
        match msg {
            ClientMessage::Join { room: Some(key) } => self.join(conn, key),
            ClientMessage::Join { room: None } => {
                tracing::debug!(conn_id = %conn, "join without room id dropped");
            }
            ClientMessage::State { fields } => {
                let Some(peer) = self.peer_of(conn) else {
                    tracing::trace!(conn_id = %conn, "state without peer dropped");
                    return;
                };
                let msg = ServerMessage::relay_state(fields, self.clock.unix_millis());
                self.connections.send(peer, msg);
            }
            ClientMessage::Start => self.start(conn),
            ClientMessage::SetLevel { id } => self.set_level(conn, id),
            ClientMessage::Unknown => {
                tracing::trace!(conn_id = %conn, "unknown message type dropped");
            }
        }
    }

    /// Handles the end of `conn`'s socket.
    ///
    /// Frees its seat and tells the remaining occupant, if live.
    pub fn close(&mut self, conn: ConnectionId) {
        let Some(bound) = self.connections.remove(conn) else {
            return;
        };
        let Some(key) = bound else {
            tracing::debug!(conn_id = %conn, "unbound connection closed");
            return;
        };
        let Some(role) = self.registry.release(&key, conn) else {
            return;
        };
        tracing::info!(conn_id = %conn, room = %key, %role, "peer left");

        let remaining = self.registry.get(&key).and_then(|room| room.remaining());
        if let Some(other) = remaining {
            if self.connections.is_live(other) {
                self.connections.send(other, ServerMessage::PeerLeft);
            }
        }
    }

    /// Evicts idle, expired rooms. Returns how many went.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let evicted = self
            .registry
            .sweep(now, self.config.room_ttl, &self.connections);
        for key in &evicted {
            tracing::info!(room = %key, "room evicted");
        }
        evicted.len()
    }

    /// Closes every connection and drops every room.
    ///
    /// Returns the number of rooms that were held.
    pub fn drain(&mut self) -> usize {
        let connections = self.connections.drain();
        let rooms = self.registry.drain();
        tracing::info!(connections, rooms, "relay drained");
        rooms
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn connections(&self) -> &ConnectionTable {
        &self.connections
    }

    fn join(&mut self, conn: ConnectionId, key: RoomKey) {
        if self.connections.binding(conn).is_some() {
            tracing::debug!(conn_id = %conn, "join from bound connection dropped");
            return;
        }

        let now = Instant::now();
        match self
            .registry
            .assign_role(&key, conn, now, &self.connections)
        {
            Ok(role) => {
                self.connections.bind(conn, key.clone(), role);
                tracing::info!(conn_id = %conn, room = %key, %role, "joined room");

                self.connections.send(conn, ServerMessage::Joined { role });
                let Some(room) = self.registry.get(&key) else {
                    return;
                };
                if let Some(level) = room.level() {
                    self.connections
                        .send(conn, ServerMessage::Level { id: level.clone() });
                }
                if room.is_ready(&self.connections) {
                    if let (Some(host), Some(guest)) = (room.host(), room.guest()) {
                        self.connections.send(host, ServerMessage::Ready);
                        self.connections.send(guest, ServerMessage::Ready);
                    }
                }
            }
            Err(RoomError::Full(key)) => {
                tracing::info!(conn_id = %conn, room = %key, "room full, rejecting");
                self.connections.send(conn, ServerMessage::Full);
                self.connections.close(conn);
            }
            Err(err) => {
                tracing::debug!(conn_id = %conn, error = %err, "join failed");
            }
        }
    }

    fn start(&mut self, conn: ConnectionId) {
        let Some((host, guest)) = self.host_command(conn) else {
            return;
        };
        let Some(guest) = guest.filter(|g| self.connections.is_live(*g)) else {
            tracing::debug!(conn_id = %conn, "start without live guest dropped");
            return;
        };
        let start_at = self.clock.unix_millis() + self.config.start_delay.as_millis() as u64;
        tracing::debug!(conn_id = %conn, start_at, "match starting");
        self.connections
            .send(host, ServerMessage::StartAt { start_at });
        self.connections
            .send(guest, ServerMessage::StartAt { start_at });
    }

    fn set_level(&mut self, conn: ConnectionId, id: LevelId) {
        let Some((host, guest)) = self.host_command(conn) else {
            return;
        };
        if let Some((key, _)) = self.connections.binding(conn) {
            if let Some(room) = self.registry.get_mut(key) {
                room.set_level(id.clone());
            }
        }
        self.connections
            .send(host, ServerMessage::Level { id: id.clone() });
        if let Some(guest) = guest {
            self.connections.send(guest, ServerMessage::Level { id });
        }
    }

    /// For a host-only command: the host and guest slots of `conn`'s room,
    /// or `None` if `conn` is not the room's host.
    fn host_command(&self, conn: ConnectionId) -> Option<(ConnectionId, Option<ConnectionId>)> {
        let (key, _) = self.connections.binding(conn)?;
        let room = self.registry.get(key)?;
        if room.role_of(conn) != Some(Role::Host) {
            tracing::trace!(conn_id = %conn, "host command from non-host dropped");
            return None;
        }
        Some((conn, room.guest()))
    }

    fn peer_of(&self, conn: ConnectionId) -> Option<ConnectionId> {
        let (key, _) = self.connections.binding(conn)?;
        self.registry.get(key)?.peer_of(conn)
    }
}
