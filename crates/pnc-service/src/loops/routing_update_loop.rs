//! Routing plan reload loop.
//!
//! The single writer of the plan store: watches the plan file and installs
//! each new version as a whole. Readers keep whatever snapshot they hold.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::Result;
use tokio::sync::broadcast;
use tokio::time::interval;

use crate::backoff::Backoff;
use crate::config::Config;
use crate::sources;
use crate::state::AppState;

const ROUTING_BACKOFF_MAX_SECS: u64 = 30;

/// Reloads the plan file when its modification time changes.
pub struct RoutingWatcher {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl RoutingWatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_modified: None,
        }
    }

    /// Installs the plan if the file changed since the last successful load.
    /// Returns the installed version, or `None` when nothing changed.
    pub async fn poll(&mut self, state: &AppState) -> Result<Option<u64>> {
        let modified = sources::modified_at(&self.path).await?;
        if self.last_modified == Some(modified) {
            return Ok(None);
        }

        let response = sources::load_routing(&self.path).await?;
        let snapshot = state.pnc().update_routing_response(response);
        self.last_modified = Some(modified);
        Ok(Some(snapshot.version()))
    }
}

/// Start the routing update loop.
pub async fn run_routing_update_loop(
    state: Arc<AppState>,
    config: Config,
    mut shutdown: broadcast::Receiver<()>,
) {
    let poll_every = Duration::from_millis(config.routing_poll_ms.max(1));
    let mut ticker = interval(poll_every);
    let mut backoff = Backoff::new(poll_every, Duration::from_secs(ROUTING_BACKOFF_MAX_SECS));
    let mut watcher = RoutingWatcher::new(&config.routing_path);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Routing update loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                state.mark_loop_heartbeat("routing-update");
                if !backoff.ready() {
                    continue;
                }
                match watcher.poll(&state).await {
                    Ok(installed) => {
                        let recovered = backoff.reset();
                        if recovered > 0 {
                            tracing::info!(
                                "Routing file readable again after {} failure(s)",
                                recovered
                            );
                        }
                        if let Some(version) = installed {
                            tracing::debug!(
                                "Routing v{} installed from {}",
                                version,
                                config.routing_path
                            );
                        }
                    }
                    Err(err) => {
                        let delay = backoff.fail();
                        tracing::warn!(
                            "Routing reload failed: {:#} (backing off {:?})",
                            err,
                            delay
                        );
                    }
                }
            }
        }
    }
}
