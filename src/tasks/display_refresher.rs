//! Display refresher background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::state::AppState;

/// Default refresher cadence
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// Background task that ticks the timer while it is not idle.
///
/// While idle it only waits for the next published snapshot; no tick runs.
/// Once a non-idle snapshot arrives it ticks at `cadence` until a tick
/// reports the timer idle again. The task holds no timing state of its own.
pub async fn display_refresher_task(state: Arc<AppState>, cadence: Duration) {
    info!("Starting display refresher task ({}ms cadence)", cadence.as_millis());

    let mut snapshot_rx = state.subscribe();

    loop {
        let idle = snapshot_rx.borrow_and_update().is_idle;
        if idle {
            // Wait for a transition out of idle
            if snapshot_rx.changed().await.is_err() {
                info!("Timer state dropped, stopping display refresher");
                return;
            }
            continue;
        }

        debug!("Timer running, refresher ticking");
        let mut ticker = interval(cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // First tick completes immediately
            ticker.tick().await;
            match state.tick() {
                Ok(snapshot) if snapshot.is_idle => {
                    debug!("Timer idle, refresher pausing");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Failed to tick timer: {}", e);
                }
            }
        }
    }
}
