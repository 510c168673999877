//! Tunables for route segment resolution.

use crate::route_segments::SEGMENTATION_EPSILON;
use serde::{Deserialize, Serialize};

/// Configuration for route queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PncMapConfig {
    /// Default distance kept behind the vehicle, in meters
    pub look_backward_distance_m: f64,
    /// Default distance kept ahead of the vehicle, in meters
    pub look_forward_distance_m: f64,
    /// Points farther than this from every route lane are off-route
    pub max_lateral_distance_m: f64,
    /// Slack for station comparisons while walking and indexing lanes
    pub route_epsilon_m: f64,
    /// Slack for accepting a projection onto a lane segment
    pub segmentation_epsilon_m: f64,
}

impl Default for PncMapConfig {
    fn default() -> Self {
        Self {
            look_backward_distance_m: 10.0,
            look_forward_distance_m: 250.0,
            max_lateral_distance_m: 5.0,
            route_epsilon_m: 1e-3,
            segmentation_epsilon_m: SEGMENTATION_EPSILON,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: PncMapConfig =
            serde_json::from_str(r#"{ "look_forward_distance_m": 120.0 }"#).unwrap();
        assert_eq!(config.look_forward_distance_m, 120.0);
        assert_eq!(config.look_backward_distance_m, 10.0);
        assert_eq!(config.segmentation_epsilon_m, 0.2);
    }
}
