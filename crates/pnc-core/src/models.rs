//! Core data models for routing plans and lane references.

use crate::map::{Lane, LaneGraph};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Lateral relation of a passage (or a candidate built from it) to the
/// passage the vehicle currently drives in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeLaneType {
    #[default]
    Forward,
    Left,
    Right,
}

/// One lane range of a passage, referencing the lane by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneRange {
    pub id: String,
    pub start_s: f64,
    pub end_s: f64,
}

impl LaneRange {
    pub fn new(id: impl Into<String>, start_s: f64, end_s: f64) -> Self {
        Self {
            id: id.into(),
            start_s,
            end_s,
        }
    }

    pub fn length(&self) -> f64 {
        self.end_s - self.start_s
    }
}

/// Ordered lane ranges usable for one leg of travel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub segments: Vec<LaneRange>,
    #[serde(default)]
    pub can_exit: bool,
    /// Relation to the previous passage of the same road.
    #[serde(default)]
    pub change_lane_type: ChangeLaneType,
}

/// One leg of the plan: passages between two decision points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Road {
    #[serde(default)]
    pub id: String,
    pub passages: Vec<Passage>,
}

/// A point of the original routing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestWaypoint {
    pub lane_id: String,
    pub s: f64,
}

/// Routing plan supplied by the route-search collaborator.
///
/// Installed wholesale and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingResponse {
    pub roads: Vec<Road>,
    /// Waypoints of the originating request; the last one is the destination.
    #[serde(default)]
    pub request_waypoints: Vec<RequestWaypoint>,
}

impl RoutingResponse {
    pub fn is_empty(&self) -> bool {
        self.roads
            .iter()
            .all(|road| road.passages.iter().all(|p| p.segments.is_empty()))
    }

    pub fn road(&self, index: usize) -> Option<&Road> {
        self.roads.get(index)
    }

    pub fn lane_range(&self, index: &WaypointIndex) -> Option<&LaneRange> {
        self.roads
            .get(index.road_index)?
            .passages
            .get(index.passage_index)?
            .segments
            .get(index.segment_index)
    }

    /// Every lane range in plan order together with its position.
    pub fn lane_ranges(&self) -> impl Iterator<Item = (WaypointIndex, &LaneRange)> {
        self.roads.iter().enumerate().flat_map(|(road_index, road)| {
            road.passages
                .iter()
                .enumerate()
                .flat_map(move |(passage_index, passage)| {
                    passage
                        .segments
                        .iter()
                        .enumerate()
                        .map(move |(segment_index, range)| {
                            (
                                WaypointIndex::new(road_index, passage_index, segment_index),
                                range,
                            )
                        })
                })
        })
    }
}

/// Position of a lane range inside the installed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaypointIndex {
    pub road_index: usize,
    pub passage_index: usize,
    pub segment_index: usize,
}

impl WaypointIndex {
    pub const fn new(road_index: usize, passage_index: usize, segment_index: usize) -> Self {
        Self {
            road_index,
            passage_index,
            segment_index,
        }
    }
}

/// A `(lane, s)` reference on the lane network.
#[derive(Clone, Default)]
pub struct LaneWaypoint {
    pub lane: Option<Arc<Lane>>,
    pub s: f64,
}

impl LaneWaypoint {
    pub fn new(lane: Arc<Lane>, s: f64) -> Self {
        Self {
            lane: Some(lane),
            s,
        }
    }

    /// Waypoint that references no lane.
    pub fn null() -> Self {
        Self::default()
    }

    pub fn is_null(&self) -> bool {
        self.lane.is_none()
    }

    pub fn lane_id(&self) -> Option<&str> {
        self.lane.as_deref().map(Lane::id)
    }

    /// Resolves a request waypoint against the map, clamping `s` to the lane.
    pub fn from_request(request: &RequestWaypoint, map: &dyn LaneGraph) -> Option<Self> {
        let lane = map.lane_by_id(&request.lane_id)?;
        let s = request.s.clamp(0.0, lane.length());
        Some(Self::new(lane, s))
    }
}

impl PartialEq for LaneWaypoint {
    fn eq(&self, other: &Self) -> bool {
        self.lane_id() == other.lane_id() && self.s == other.s
    }
}

impl fmt::Debug for LaneWaypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lane_id() {
            Some(id) => write!(f, "LaneWaypoint({}@{:.3})", id, self.s),
            None => write!(f, "LaneWaypoint(null)"),
        }
    }
}

/// Serializable view of a waypoint for logs and tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointRecord {
    pub lane_id: Option<String>,
    pub s: f64,
}

impl From<&LaneWaypoint> for WaypointRecord {
    fn from(waypoint: &LaneWaypoint) -> Self {
        Self {
            lane_id: waypoint.lane_id().map(str::to_string),
            s: waypoint.s,
        }
    }
}
