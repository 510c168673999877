//! PNC Service - keeps the routing plan current and resolves route segments
//! for every planning cycle.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pnc_service::config::Config;
use pnc_service::loops;
use pnc_service::sources;
use pnc_service::state::AppState;

const STALE_LOOP_SECS: i64 = 5;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("pnc_service=debug".parse()?))
        .init();

    tracing::info!("Starting PNC Service...");

    let config = Config::from_env();
    let map = sources::load_map(&config.map_path).await?;
    let state = Arc::new(AppState::new(Arc::new(map), config.pnc.clone()));

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Start background loops
    let handles = vec![
        tokio::spawn(loops::routing_update_loop::run_routing_update_loop(
            state.clone(),
            config.clone(),
            shutdown_tx.subscribe(),
        )),
        tokio::spawn(loops::pose_loop::run_pose_loop(
            state.clone(),
            config.clone(),
            shutdown_tx.subscribe(),
        )),
        tokio::spawn(loops::planning_loop::run_planning_loop(
            state.clone(),
            config,
            shutdown_tx.subscribe(),
        )),
    ];

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    let _ = shutdown_tx.send(());

    for handle in handles {
        if let Err(err) = handle.await {
            tracing::error!("Loop task ended abnormally: {}", err);
        }
    }

    let status = state.status();
    let now = chrono::Utc::now();
    tracing::info!(
        "Routing v{} was installed {}s before shutdown",
        status.routing_version,
        (now - status.routing_installed_at).num_seconds()
    );
    for (name, at) in &status.loop_heartbeats {
        tracing::debug!("Loop {} last ticked {}ms before shutdown", name, (now - *at).num_milliseconds());
    }
    let stale = status.stale_loops(now, chrono::Duration::seconds(STALE_LOOP_SECS));
    if !stale.is_empty() {
        tracing::warn!("Loops without a tick in the last {}s: {:?}", STALE_LOOP_SECS, stale);
    }

    Ok(())
}
