//! Error types for route segment resolution.
//!
//! Every query returns a [`PncResult`]; failures are values the planning loop
//! can log and survive, never panics.

/// Errors produced by routing-to-geometry queries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum PncError {
    /// No matching lane, waypoint or passage.
    #[error("not found: {0}")]
    NotFound(String),

    /// A station or lateral offset falls outside the covered extent.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// No plan is installed, or an empty segment list was supplied.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// The installed plan references a lane the map does not contain.
    ///
    /// This means the plan and the map come from different map versions and
    /// cannot be repaired here.
    #[error("map inconsistency: lane {lane_id} is referenced by the routing but missing from the map")]
    MapInconsistency {
        /// Lane id referenced by the plan.
        lane_id: String,
    },

    /// A lane record could not be turned into lane geometry.
    #[error("invalid lane {lane_id}: {reason}")]
    InvalidLane {
        /// Id of the rejected record.
        lane_id: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl PncError {
    /// Builds a [`PncError::MapInconsistency`] and logs it.
    pub(crate) fn map_inconsistency(lane_id: &str) -> Self {
        tracing::error!(
            "Routing references lane {} which is missing from the map (plan/map version mismatch)",
            lane_id
        );
        Self::MapInconsistency {
            lane_id: lane_id.to_string(),
        }
    }
}

/// Result alias used across the crate.
pub type PncResult<T> = Result<T, PncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_inconsistency_names_the_lane() {
        let err = PncError::map_inconsistency("9_1_-1");
        assert!(err.to_string().contains("9_1_-1"));
        assert_eq!(
            err,
            PncError::MapInconsistency {
                lane_id: "9_1_-1".to_string()
            }
        );
    }
}
