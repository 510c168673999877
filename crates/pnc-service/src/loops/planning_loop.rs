//! Planning cycle loop.
//!
//! Each cycle resolves route segments around the latest pose and builds one
//! path per candidate. A failed cycle keeps the previous output in place.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use pnc_core::{create_path_from_lane_segments, Path, PncResult};
use tokio::sync::broadcast;
use tokio::time::interval;

use crate::config::Config;
use crate::state::{AppState, PlanningOutput};

/// Outcome of one [`run_planning_cycle`] call.
#[derive(Debug)]
pub enum CycleOutcome {
    /// No pose has been received yet.
    NoPose,
    Planned(Arc<PlanningOutput>),
    /// The cycle failed; the previous output (if any) is still current.
    Failed(pnc_core::PncError),
}

/// Runs one planning cycle against the current routing snapshot.
pub fn run_planning_cycle(state: &AppState, config: &Config) -> CycleOutcome {
    let Some(position) = state.pose() else {
        return CycleOutcome::NoPose;
    };

    let started = Instant::now();
    let cycle = state.next_cycle();
    let query = state.pnc().query();
    let routing_version = query.snapshot().version();

    let planned = query
        .get_default_route_segments(position)
        .and_then(|candidates| {
            let paths = candidates
                .iter()
                .map(|route| create_path_from_lane_segments(route))
                .collect::<PncResult<Vec<Path>>>()?;
            Ok((candidates, paths))
        });
    let elapsed = started.elapsed();

    let budget = Duration::from_millis(config.cycle_budget_ms);
    if elapsed > budget {
        state.record_over_budget_cycle();
        tracing::warn!(
            "Planning cycle {} took {:?}, over the {:?} budget",
            cycle,
            elapsed,
            budget
        );
    }

    match planned {
        Ok((candidates, paths)) => {
            tracing::debug!(
                "Cycle {}: {} candidate(s) on routing v{} in {:?}",
                cycle,
                candidates.len(),
                routing_version,
                elapsed
            );
            CycleOutcome::Planned(state.store_output(PlanningOutput {
                cycle,
                routing_version,
                position,
                candidates,
                paths,
                elapsed,
                computed_at: Utc::now(),
            }))
        }
        Err(err) => {
            state.record_failed_cycle();
            let kept = state.last_output().map(|output| output.cycle);
            tracing::warn!(
                "Cycle {} failed at ({:.2}, {:.2}): {} (keeping output of cycle {:?})",
                cycle,
                position.x,
                position.y,
                err,
                kept
            );
            CycleOutcome::Failed(err)
        }
    }
}

/// Start the planning loop.
pub async fn run_planning_loop(
    state: Arc<AppState>,
    config: Config,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(Duration::from_millis(config.planning_cycle_ms.max(1)));

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                let stats = state.cycle_stats();
                tracing::info!(
                    "Planning loop shutting down after {} cycles ({} failed, {} over budget)",
                    stats.cycles,
                    stats.failed_cycles,
                    stats.over_budget_cycles
                );
                break;
            }
            _ = ticker.tick() => {
                state.mark_loop_heartbeat("planning");
                if let CycleOutcome::NoPose = run_planning_cycle(&state, &config) {
                    tracing::debug!("Planning cycle skipped: no pose yet");
                }
            }
        }
    }
}
