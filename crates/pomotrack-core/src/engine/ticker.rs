use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use super::Shared;

/// Spawn the periodic tick task for `generation`.
///
/// The task stops on its own once the engine is dropped or once a tick
/// reports that its generation is stale or the timer is no longer running.
pub(super) fn spawn(shared: Weak<Shared>, generation: u64, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let Some(shared) = shared.upgrade() else {
                break;
            };
            if !shared.tick_from_ticker(generation).await {
                break;
            }
        }
        debug!(generation, "ticker stopped");
    })
}
