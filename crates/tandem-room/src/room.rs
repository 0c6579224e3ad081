//! The two-seat room entity.

use tandem_protocol::{LevelId, Role};
use tandem_transport::ConnectionId;
use tokio::time::Instant;

use crate::Liveness;

/// One host seat, one guest seat, and the level the host picked.
///
/// Seats hold connection ids only. A seat whose occupant is no longer live
/// counts as empty and is overwritten by the next join.
#[derive(Debug, Clone)]
pub struct Room {
    host: Option<ConnectionId>,
    guest: Option<ConnectionId>,
    created_at: Instant,
    level: Option<LevelId>,
}

impl Room {
    /// Creates a room with both seats empty.
    pub fn new(created_at: Instant) -> Self {
        Self {
            host: None,
            guest: None,
            created_at,
            level: None,
        }
    }

    /// Seats `conn` in the first vacant seat, host first.
    ///
    /// Returns `None` when both seats hold live connections.
    pub fn assign(&mut self, conn: ConnectionId, live: &impl Liveness) -> Option<Role> {
        if !self.host.is_some_and(|c| live.is_live(c)) {
            self.host = Some(conn);
            Some(Role::Host)
        } else if !self.guest.is_some_and(|c| live.is_live(c)) {
            self.guest = Some(conn);
            Some(Role::Guest)
        } else {
            None
        }
    }

    /// Empties whichever seat holds `conn`.
    pub fn release(&mut self, conn: ConnectionId) -> Option<Role> {
        if self.host == Some(conn) {
            self.host = None;
            Some(Role::Host)
        } else if self.guest == Some(conn) {
            self.guest = None;
            Some(Role::Guest)
        } else {
            None
        }
    }

    /// The seat `conn` currently holds.
    pub fn role_of(&self, conn: ConnectionId) -> Option<Role> {
        if self.host == Some(conn) {
            Some(Role::Host)
        } else if self.guest == Some(conn) {
            Some(Role::Guest)
        } else {
            None
        }
    }

    /// The occupant of the other seat.
    pub fn peer_of(&self, conn: ConnectionId) -> Option<ConnectionId> {
        match self.role_of(conn)? {
            Role::Host => self.guest,
            Role::Guest => self.host,
        }
    }

    /// Whoever is still seated, host first.
    pub fn remaining(&self) -> Option<ConnectionId> {
        self.host.or(self.guest)
    }

    /// Both seats hold live connections.
    pub fn is_ready(&self, live: &impl Liveness) -> bool {
        self.host.is_some_and(|c| live.is_live(c)) && self.guest.is_some_and(|c| live.is_live(c))
    }

    /// At least one seat holds a live connection.
    pub fn has_live_occupant(&self, live: &impl Liveness) -> bool {
        self.host.is_some_and(|c| live.is_live(c)) || self.guest.is_some_and(|c| live.is_live(c))
    }

    /// Stores the host's level choice. An empty id clears it.
    pub fn set_level(&mut self, id: LevelId) {
        self.level = if id.is_empty() { None } else { Some(id) };
    }

    pub fn level(&self) -> Option<&LevelId> {
        self.level.as_ref()
    }

    pub fn host(&self) -> Option<ConnectionId> {
        self.host
    }

    pub fn guest(&self) -> Option<ConnectionId> {
        self.guest
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct LiveSet(HashSet<ConnectionId>);

    impl Liveness for LiveSet {
        fn is_live(&self, conn: ConnectionId) -> bool {
            self.0.contains(&conn)
        }
    }

    fn live(ids: &[u64]) -> LiveSet {
        LiveSet(ids.iter().copied().map(ConnectionId::new).collect())
    }

    fn cid(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    #[test]
    fn test_assign_host_then_guest_then_full() {
        let mut room = Room::new(Instant::now());
        let alive = live(&[1, 2, 3]);
        assert_eq!(room.assign(cid(1), &alive), Some(Role::Host));
        assert_eq!(room.assign(cid(2), &alive), Some(Role::Guest));
        assert_eq!(room.assign(cid(3), &alive), None);
        assert!(room.is_ready(&alive));
    }

    #[test]
    fn test_dead_host_seat_is_vacant() {
        let mut room = Room::new(Instant::now());
        room.assign(cid(1), &live(&[1]));
        room.assign(cid(2), &live(&[1, 2]));

        // conn-1 went away without a close event.
        let alive = live(&[2, 3]);
        assert_eq!(room.assign(cid(3), &alive), Some(Role::Host));
        assert_eq!(room.host(), Some(cid(3)));
        assert_eq!(room.guest(), Some(cid(2)));
    }

    #[test]
    fn test_release_and_remaining() {
        let mut room = Room::new(Instant::now());
        let alive = live(&[1, 2]);
        room.assign(cid(1), &alive);
        room.assign(cid(2), &alive);

        assert_eq!(room.release(cid(1)), Some(Role::Host));
        assert_eq!(room.remaining(), Some(cid(2)));
        assert_eq!(room.release(cid(1)), None);
        assert_eq!(room.release(cid(2)), Some(Role::Guest));
        assert_eq!(room.remaining(), None);
    }

    #[test]
    fn test_peer_of() {
        let mut room = Room::new(Instant::now());
        let alive = live(&[1, 2]);
        room.assign(cid(1), &alive);
        assert_eq!(room.peer_of(cid(1)), None);
        room.assign(cid(2), &alive);
        assert_eq!(room.peer_of(cid(1)), Some(cid(2)));
        assert_eq!(room.peer_of(cid(2)), Some(cid(1)));
        assert_eq!(room.peer_of(cid(9)), None);
    }

    #[test]
    fn test_level_survives_occupancy_changes() {
        let mut room = Room::new(Instant::now());
        let alive = live(&[1]);
        room.assign(cid(1), &alive);
        room.set_level(LevelId::new("L3"));
        room.release(cid(1));
        assert_eq!(room.level(), Some(&LevelId::new("L3")));

        room.set_level(LevelId::new(""));
        assert_eq!(room.level(), None);
    }
}
