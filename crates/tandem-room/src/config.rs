//! Relay configuration.

use std::time::Duration;

/// Tuning knobs for the relay actor and janitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// A room with no live occupant is evicted once it is older than this.
    /// Age is counted from room creation, not from the last departure.
    pub room_ttl: Duration,

    /// How often the janitor sweeps the registry.
    pub sweep_interval: Duration,

    /// Offset added to the receive time of a `start` to get `startAt`,
    /// so both peers can count down locally.
    pub start_delay: Duration,

    /// Capacity of the relay actor's command channel. Readers wait when
    /// it is full.
    pub channel_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            room_ttl: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(60),
            start_delay: Duration::from_millis(700),
            channel_size: 1024,
        }
    }
}

impl RelayConfig {
    /// Shortest sweep period accepted.
    pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

    /// Clamps values that would make the janitor or channel unusable.
    pub fn validated(mut self) -> Self {
        if self.sweep_interval < Self::MIN_SWEEP_INTERVAL {
            tracing::warn!(
                requested = ?self.sweep_interval,
                min = ?Self::MIN_SWEEP_INTERVAL,
                "sweep interval too short, clamping"
            );
            self.sweep_interval = Self::MIN_SWEEP_INTERVAL;
        }
        if self.channel_size == 0 {
            self.channel_size = 1;
        }
        self
    }
}
