//! Vehicle pose polling loop.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use pnc_core::Vec2;
use tokio::sync::broadcast;
use tokio::time::interval;

use crate::backoff::Backoff;
use crate::config::Config;
use crate::sources;
use crate::state::AppState;

const POSE_BACKOFF_MAX_SECS: u64 = 5;

/// Reads the pose file once and publishes it.
pub async fn refresh_pose(state: &AppState, path: impl AsRef<Path>) -> Result<Vec2> {
    let pose = sources::load_pose(path).await?;
    state.set_pose(pose);
    Ok(pose)
}

/// Start the pose loop.
pub async fn run_pose_loop(
    state: Arc<AppState>,
    config: Config,
    mut shutdown: broadcast::Receiver<()>,
) {
    let poll_every = Duration::from_millis(config.pose_poll_ms.max(1));
    let mut ticker = interval(poll_every);
    let mut backoff = Backoff::new(poll_every, Duration::from_secs(POSE_BACKOFF_MAX_SECS));

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Pose loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                state.mark_loop_heartbeat("pose");
                if !backoff.ready() {
                    continue;
                }
                if let Err(err) = refresh_pose(&state, &config.pose_path).await {
                    let delay = backoff.fail();
                    // A missing pose is normal before localization starts.
                    if backoff.failures() == 1 {
                        tracing::warn!("Pose read failed: {:#} (backing off {:?})", err, delay);
                    } else {
                        tracing::debug!("Pose read failed: {:#} (backing off {:?})", err, delay);
                    }
                } else {
                    backoff.reset();
                }
            }
        }
    }
}
