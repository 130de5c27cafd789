use crate::repository::SessionRepository;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

/// Background worker that deletes idle conversation sessions
///
/// A customer who comes back after the idle window starts over with a fresh
/// session and the first-contact welcome.
pub async fn session_cleanup_worker(
    sessions: Arc<dyn SessionRepository>,
    idle_after: chrono::Duration,
    every: Duration,
    mut shutdown_rx: tokio::sync::broadcast::Receiver<()>,
) {
    let mut cleanup_interval = interval(every);
    info!(
        idle_hours = idle_after.num_hours(),
        every_secs = every.as_secs(),
        "Session cleanup worker started"
    );

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("Session cleanup worker shutting down");
                break;
            }
            _ = cleanup_interval.tick() => {
                sweep_idle_sessions(sessions.as_ref(), idle_after).await;
            }
        }
    }

    info!("Session cleanup worker stopped");
}

/// One sweep. Returns how many sessions were deleted.
pub async fn sweep_idle_sessions(sessions: &dyn SessionRepository, idle_after: chrono::Duration) -> u64 {
    let idle_before = Utc::now() - idle_after;
    match sessions.delete_idle(idle_before).await {
        Ok(count) => {
            if count > 0 {
                info!(count, "Deleted idle sessions");
            }
            count
        }
        Err(e) => {
            warn!(error = %e, "Failed to delete idle sessions");
            0
        }
    }
}
