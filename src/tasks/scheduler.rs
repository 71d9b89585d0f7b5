use anyhow::Result;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::core::state::AppState;
use crate::core::time::now_utc;

pub(crate) async fn run(state: AppState) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(purge_stale_sessions_loop(state, shutdown_rx));

    crate::core::shutdown::shutdown_signal().await;
    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Failed to broadcast shutdown signal to background tasks");
    }

    if let Err(err) = handle.await {
        tracing::error!(error = %err, "Background task join failed");
    }

    Ok(())
}

/// Deletes support sessions that closed longer ago than the retention window.
/// Active sessions are never touched.
async fn purge_stale_sessions_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let support = state.settings().support();
    let retention = support.stale_retention();
    let mut tick = interval(Duration::from_secs(support.purge_interval_seconds));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = state.support_sessions().purge_stale(now_utc(), retention).await {
                    tracing::error!(error = %err, "purge_stale_sessions failed");
                }
            }
        }
    }
}
