//! Reverse index from lane id to its occurrences in the installed plan.

use crate::models::{RoutingResponse, WaypointIndex};
use std::collections::HashMap;

/// Lane id -> every `(road, passage, segment)` position that references it.
///
/// A lane may recur across passages (lane changes, loops), so each id maps to
/// a list kept in plan order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingIndex {
    occurrences: HashMap<String, Vec<WaypointIndex>>,
    segment_count: usize,
}

impl RoutingIndex {
    /// Builds the index with one linear scan of the plan.
    pub fn build(response: &RoutingResponse) -> Self {
        let mut occurrences: HashMap<String, Vec<WaypointIndex>> = HashMap::new();
        let mut segment_count = 0;
        for (index, range) in response.lane_ranges() {
            occurrences.entry(range.id.clone()).or_default().push(index);
            segment_count += 1;
        }
        Self {
            occurrences,
            segment_count,
        }
    }

    /// All occurrences of `lane_id`, empty when the lane is not on the route.
    pub fn lookup(&self, lane_id: &str) -> &[WaypointIndex] {
        self.occurrences
            .get(lane_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, lane_id: &str) -> bool {
        self.occurrences.contains_key(lane_id)
    }

    /// Number of distinct lanes on the route.
    pub fn lane_count(&self) -> usize {
        self.occurrences.len()
    }

    /// Number of lane ranges in the plan.
    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    pub fn is_empty(&self) -> bool {
        self.segment_count == 0
    }
}
