//! Shared state between the routing, pose and planning loops.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use pnc_core::{LaneGraph, Path, PncMap, PncMapConfig, RouteSegments, Vec2};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Result of one successful planning cycle.
#[derive(Debug, Clone)]
pub struct PlanningOutput {
    pub cycle: u64,
    /// Version of the routing snapshot the cycle ran against.
    pub routing_version: u64,
    pub position: Vec2,
    pub candidates: Vec<RouteSegments>,
    /// One path per candidate, same order.
    pub paths: Vec<Path>,
    pub elapsed: Duration,
    pub computed_at: DateTime<Utc>,
}

/// Counters reported by the planning loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: u64,
    pub failed_cycles: u64,
    pub over_budget_cycles: u64,
}

/// Point-in-time health summary of the service.
#[derive(Debug, Clone)]
pub struct ServiceStatus {
    pub routing_version: u64,
    pub routing_installed_at: DateTime<Utc>,
    /// Last tick of each loop, sorted by loop name.
    pub loop_heartbeats: Vec<(&'static str, DateTime<Utc>)>,
    pub cycles: CycleStats,
}

impl ServiceStatus {
    /// Loops that have not ticked within `max_age` of `now`.
    pub fn stale_loops(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> Vec<&'static str> {
        self.loop_heartbeats
            .iter()
            .filter(|(_, at)| now - *at > max_age)
            .map(|(name, _)| *name)
            .collect()
    }
}

/// Application state: the resolver plus the latest loop outputs.
pub struct AppState {
    pnc: PncMap,
    pose: Mutex<Option<Vec2>>,
    last_output: Mutex<Option<Arc<PlanningOutput>>>,
    loop_heartbeats: DashMap<&'static str, DateTime<Utc>>,
    cycle_counter: AtomicU64,
    failed_cycles: AtomicU64,
    over_budget_cycles: AtomicU64,
}

impl AppState {
    pub fn new(map: Arc<dyn LaneGraph>, config: PncMapConfig) -> Self {
        Self {
            pnc: PncMap::new(map, config),
            pose: Mutex::new(None),
            last_output: Mutex::new(None),
            loop_heartbeats: DashMap::new(),
            cycle_counter: AtomicU64::new(1),
            failed_cycles: AtomicU64::new(0),
            over_budget_cycles: AtomicU64::new(0),
        }
    }

    pub fn pnc(&self) -> &PncMap {
        &self.pnc
    }

    pub fn set_pose(&self, pose: Vec2) {
        if let Ok(mut current) = self.pose.lock() {
            *current = Some(pose);
        }
    }

    pub fn pose(&self) -> Option<Vec2> {
        self.pose.lock().ok().and_then(|pose| *pose)
    }

    /// Get next planning cycle number.
    pub fn next_cycle(&self) -> u64 {
        self.cycle_counter.fetch_add(1, Ordering::SeqCst)
    }

    pub fn store_output(&self, output: PlanningOutput) -> Arc<PlanningOutput> {
        let output = Arc::new(output);
        if let Ok(mut last) = self.last_output.lock() {
            *last = Some(output.clone());
        }
        output
    }

    /// Latest successful planning output, kept across failed cycles.
    pub fn last_output(&self) -> Option<Arc<PlanningOutput>> {
        self.last_output.lock().ok().and_then(|last| last.clone())
    }

    pub fn record_failed_cycle(&self) {
        self.failed_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_over_budget_cycle(&self) {
        self.over_budget_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cycle_stats(&self) -> CycleStats {
        CycleStats {
            cycles: self.cycle_counter.load(Ordering::SeqCst).saturating_sub(1),
            failed_cycles: self.failed_cycles.load(Ordering::Relaxed),
            over_budget_cycles: self.over_budget_cycles.load(Ordering::Relaxed),
        }
    }

    pub fn mark_loop_heartbeat(&self, name: &'static str) {
        self.loop_heartbeats.insert(name, Utc::now());
    }

    pub fn loop_heartbeat(&self, name: &str) -> Option<DateTime<Utc>> {
        self.loop_heartbeats.get(name).map(|entry| *entry.value())
    }

    pub fn status(&self) -> ServiceStatus {
        let snapshot = self.pnc.snapshot();
        let mut loop_heartbeats: Vec<(&'static str, DateTime<Utc>)> = self
            .loop_heartbeats
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        loop_heartbeats.sort_by_key(|(name, _)| *name);
        ServiceStatus {
            routing_version: snapshot.version(),
            routing_installed_at: snapshot.installed_at(),
            loop_heartbeats,
            cycles: self.cycle_stats(),
        }
    }
}
