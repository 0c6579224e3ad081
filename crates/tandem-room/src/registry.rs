//! Room registry: room id → room.
//!
//! The registry is the only place occupancy changes. It is an ordinary
//! value owned by the dispatcher, so tests can build as many as they like.

use std::collections::HashMap;
use std::time::Duration;

use tandem_protocol::{Role, RoomKey};
use tandem_transport::ConnectionId;
use tokio::time::Instant;

use crate::{Liveness, Room, RoomError};

/// All rooms the relay is holding, live or waiting for eviction.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomKey, Room>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the room for `key`, creating it with `created_at = now`.
    pub fn get_or_create(&mut self, key: &RoomKey, now: Instant) -> &mut Room {
        self.rooms.entry(key.clone()).or_insert_with(|| {
            tracing::info!(room = %key, "room created");
            Room::new(now)
        })
    }

    /// Seats `conn` in `key`'s room, creating the room if needed.
    pub fn assign_role(
        &mut self,
        key: &RoomKey,
        conn: ConnectionId,
        now: Instant,
        live: &impl Liveness,
    ) -> Result<Role, RoomError> {
        self.get_or_create(key, now)
            .assign(conn, live)
            .ok_or_else(|| RoomError::Full(key.clone()))
    }

    /// Empties `conn`'s seat in `key`'s room. No-op if it holds none.
    pub fn release(&mut self, key: &RoomKey, conn: ConnectionId) -> Option<Role> {
        self.rooms.get_mut(key)?.release(conn)
    }

    pub fn get(&self, key: &RoomKey) -> Option<&Room> {
        self.rooms.get(key)
    }

    pub fn get_mut(&mut self, key: &RoomKey) -> Option<&mut Room> {
        self.rooms.get_mut(key)
    }

    /// Evicts rooms with no live occupant that are older than `ttl`.
    ///
    /// Returns the evicted keys.
    pub fn sweep(&mut self, now: Instant, ttl: Duration, live: &impl Liveness) -> Vec<RoomKey> {
        let mut evicted = Vec::new();
        self.rooms.retain(|key, room| {
            let idle = !room.has_live_occupant(live);
            let expired = now.saturating_duration_since(room.created_at()) > ttl;
            if idle && expired {
                evicted.push(key.clone());
                false
            } else {
                true
            }
        });
        evicted
    }

    /// Drops every room. Returns how many there were.
    pub fn drain(&mut self) -> usize {
        let count = self.rooms.len();
        self.rooms.clear();
        count
    }

    pub fn contains(&self, key: &RoomKey) -> bool {
        self.rooms.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
