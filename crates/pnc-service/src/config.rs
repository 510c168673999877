//! Service configuration from environment.

use pnc_core::PncMapConfig;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    /// Lane map JSON, loaded once at startup
    pub map_path: String,
    /// Routing plan JSON, reloaded whenever it changes
    pub routing_path: String,
    /// Latest vehicle position JSON (`{"x": .., "y": ..}`)
    pub pose_path: String,
    pub routing_poll_ms: u64,
    pub pose_poll_ms: u64,
    pub planning_cycle_ms: u64,
    /// Cycles slower than this are reported
    pub cycle_budget_ms: u64,
    pub pnc: PncMapConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = PncMapConfig::default();
        Self {
            map_path: env::var("PNC_MAP_PATH")
                .unwrap_or_else(|_| "data/sample_map.json".to_string()),
            routing_path: env::var("PNC_ROUTING_PATH")
                .unwrap_or_else(|_| "data/sample_routing.json".to_string()),
            pose_path: env::var("PNC_POSE_PATH")
                .unwrap_or_else(|_| "data/pose.json".to_string()),
            routing_poll_ms: parse_env("PNC_ROUTING_POLL_MS", 500),
            pose_poll_ms: parse_env("PNC_POSE_POLL_MS", 50),
            planning_cycle_ms: parse_env("PNC_PLANNING_CYCLE_MS", 100),
            cycle_budget_ms: parse_env("PNC_CYCLE_BUDGET_MS", 10),
            pnc: PncMapConfig {
                look_backward_distance_m: parse_env(
                    "PNC_LOOK_BACKWARD_M",
                    defaults.look_backward_distance_m,
                ),
                look_forward_distance_m: parse_env(
                    "PNC_LOOK_FORWARD_M",
                    defaults.look_forward_distance_m,
                ),
                max_lateral_distance_m: parse_env(
                    "PNC_MAX_LATERAL_M",
                    defaults.max_lateral_distance_m,
                ),
                ..defaults
            },
        }
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
