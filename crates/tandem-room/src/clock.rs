//! Wall-clock source for `serverTime` and `startAt`.
//!
//! Room ages are measured with [`tokio::time::Instant`]; the values sent to
//! clients are unix milliseconds, which is what they compare against their
//! own `Date.now()`.

use std::time::{SystemTime, UNIX_EPOCH};

/// Provides the current unix time in milliseconds.
pub trait Clock: Send + 'static {
    /// Milliseconds since the unix epoch.
    fn unix_millis(&self) -> u64;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.unix_millis() > 1_577_836_800_000);
    }
}
