use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::AppState;

/// Drive the store: one generated operation per tick, broadcast to every
/// subscriber, plus retention cleanup of soft-deleted events.
///
/// Runs for the lifetime of the process. Nothing is generated while no
/// subscriber is connected; cleanup still runs so stale inactive events
/// do not pile up between sessions.
pub async fn run(state: AppState) {
    let interval = state.config.server.broadcast_interval();
    let retention = state.config.server.retention();

    info!(
        "Started event scheduler - will generate events every {:?}",
        interval
    );

    let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        state.store.purge_inactive(retention).await;

        let subscribers = state.changes.receiver_count();
        if subscribers == 0 {
            debug!("No subscribers connected, skipping broadcast");
            continue;
        }

        let change = state.store.next_change().await;
        info!(
            "Broadcasting {:?} for event {} (id: {}) to {} subscribers",
            change.operation, change.event.name, change.event.id, subscribers
        );
        if state.changes.send(change).is_err() {
            // All receivers dropped between the count check and the send.
            warn!("Broadcast channel had no receivers");
        }
    }
}
