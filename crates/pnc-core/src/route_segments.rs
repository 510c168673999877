//! Contiguous lane-segment sequences and projection onto their stitched geometry.

use crate::error::{PncError, PncResult};
use crate::map::Lane;
use crate::models::{ChangeLaneType, LaneWaypoint};
use crate::spatial::Vec2;
use std::ops::Deref;
use std::sync::Arc;

/// Default slack for accepting a lane-local projection into a segment.
pub const SEGMENTATION_EPSILON: f64 = 0.2;

/// A station range on one lane, holding the lane geometry.
#[derive(Debug, Clone)]
pub struct LaneSegment {
    pub lane: Arc<Lane>,
    pub start_s: f64,
    pub end_s: f64,
}

impl LaneSegment {
    pub fn new(lane: Arc<Lane>, start_s: f64, end_s: f64) -> Self {
        Self {
            lane,
            start_s,
            end_s,
        }
    }

    pub fn lane_id(&self) -> &str {
        self.lane.id()
    }

    pub fn length(&self) -> f64 {
        self.end_s - self.start_s
    }
}

/// Result of projecting a point onto a [`RouteSegments`].
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentProjection {
    /// Arc length from the start of the first segment.
    pub s: f64,
    /// Lateral offset from the matching lane, positive to the left.
    pub l: f64,
    /// Matching lane with its local station clamped into the segment.
    pub waypoint: LaneWaypoint,
    /// Position of the matching segment in the sequence.
    pub segment_index: usize,
}

/// Road and passage of the installed plan a candidate was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentsProvenance {
    pub road_index: usize,
    pub passage_index: usize,
}

/// Lane segments chained end to end, plus routing metadata.
#[derive(Debug, Clone)]
pub struct RouteSegments {
    segments: Vec<LaneSegment>,
    /// Slack for projection and waypoint membership.
    epsilon: f64,
    change_lane_type: ChangeLaneType,
    can_exit: bool,
    route_end_waypoint: Option<LaneWaypoint>,
    provenance: Option<SegmentsProvenance>,
}

impl Default for RouteSegments {
    fn default() -> Self {
        Self::with_epsilon(SEGMENTATION_EPSILON)
    }
}

impl RouteSegments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty sequence using `epsilon` as its segmentation slack.
    pub fn with_epsilon(epsilon: f64) -> Self {
        Self {
            segments: Vec::new(),
            epsilon,
            change_lane_type: ChangeLaneType::default(),
            can_exit: false,
            route_end_waypoint: None,
            provenance: None,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn push(&mut self, segment: LaneSegment) {
        self.segments.push(segment);
    }

    pub fn insert(&mut self, index: usize, segment: LaneSegment) {
        self.segments.insert(index, segment);
    }

    pub fn last_mut(&mut self) -> Option<&mut LaneSegment> {
        self.segments.last_mut()
    }

    pub fn segments(&self) -> &[LaneSegment] {
        &self.segments
    }

    pub fn change_lane_type(&self) -> ChangeLaneType {
        self.change_lane_type
    }

    pub fn set_change_lane_type(&mut self, change_lane_type: ChangeLaneType) {
        self.change_lane_type = change_lane_type;
    }

    pub fn can_exit(&self) -> bool {
        self.can_exit
    }

    pub fn set_can_exit(&mut self, can_exit: bool) {
        self.can_exit = can_exit;
    }

    pub fn route_end_waypoint(&self) -> Option<&LaneWaypoint> {
        self.route_end_waypoint.as_ref()
    }

    pub fn set_route_end_waypoint(&mut self, waypoint: LaneWaypoint) {
        self.route_end_waypoint = Some(waypoint);
    }

    pub fn provenance(&self) -> Option<SegmentsProvenance> {
        self.provenance
    }

    pub fn set_provenance(&mut self, road_index: usize, passage_index: usize) {
        self.provenance = Some(SegmentsProvenance {
            road_index,
            passage_index,
        });
    }

    /// Total arc length covered.
    pub fn length(&self) -> f64 {
        self.segments.iter().map(LaneSegment::length).sum()
    }

    pub fn first_waypoint(&self) -> Option<LaneWaypoint> {
        let first = self.segments.first()?;
        Some(LaneWaypoint::new(first.lane.clone(), first.start_s))
    }

    pub fn last_waypoint(&self) -> Option<LaneWaypoint> {
        let last = self.segments.last()?;
        Some(LaneWaypoint::new(last.lane.clone(), last.end_s))
    }

    /// Whether some segment contains the waypoint's lane and station.
    pub fn is_waypoint_on_segment(&self, waypoint: &LaneWaypoint) -> bool {
        let Some(lane_id) = waypoint.lane_id() else {
            return false;
        };
        self.segments.iter().any(|segment| {
            segment.lane_id() == lane_id
                && waypoint.s >= segment.start_s - self.epsilon
                && waypoint.s <= segment.end_s + self.epsilon
        })
    }

    /// Projects `point` onto the stitched geometry with this sequence's slack.
    pub fn get_projection(&self, point: Vec2) -> PncResult<SegmentProjection> {
        self.get_projection_with_epsilon(point, self.epsilon)
    }

    /// Projects `point` onto the stitched geometry.
    ///
    /// The first segment (in sequence order) whose lane-local station lies
    /// within `[start_s - epsilon, end_s + epsilon]` wins, so a lane that
    /// recurs after a rejoin resolves to its earliest occurrence.
    pub fn get_projection_with_epsilon(
        &self,
        point: Vec2,
        epsilon: f64,
    ) -> PncResult<SegmentProjection> {
        if self.segments.is_empty() {
            return Err(PncError::EmptyInput("route segments are empty".to_string()));
        }

        let mut accumulated_s = 0.0;
        for (segment_index, segment) in self.segments.iter().enumerate() {
            let projection = segment.lane.project(point);
            if projection.s < segment.start_s - epsilon || projection.s > segment.end_s + epsilon {
                accumulated_s += segment.length();
                continue;
            }
            let clamped_s = projection.s.clamp(segment.start_s, segment.end_s);
            return Ok(SegmentProjection {
                s: accumulated_s + projection.s - segment.start_s,
                l: projection.l,
                waypoint: LaneWaypoint::new(segment.lane.clone(), clamped_s),
                segment_index,
            });
        }

        Err(PncError::OutOfRange(format!(
            "point ({:.3}, {:.3}) does not project onto any of {} segments",
            point.x,
            point.y,
            self.segments.len()
        )))
    }
}

impl Deref for RouteSegments {
    type Target = [LaneSegment];

    fn deref(&self) -> &[LaneSegment] {
        &self.segments
    }
}

impl FromIterator<LaneSegment> for RouteSegments {
    fn from_iter<I: IntoIterator<Item = LaneSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
            ..Self::default()
        }
    }
}
