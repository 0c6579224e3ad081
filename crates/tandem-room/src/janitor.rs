//! Periodic eviction of idle rooms.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::RelayHandle;

/// Spawns a task that asks the relay to sweep once every `period`.
///
/// The first sweep happens one full period after spawning. The task ends
/// on its own once the relay has stopped.
pub fn spawn_janitor(relay: RelayHandle, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if relay.sweep().await.is_err() {
                tracing::debug!("relay gone, janitor stopping");
                break;
            }
        }
    })
}
