//! Shared application state.

mod store;

pub use store::{AppState, CycleStats, PlanningOutput, ServiceStatus};
