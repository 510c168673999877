//! Builds the local drivable route segments around the vehicle.
//!
//! Starting from the vehicle's nearest on-route waypoint, one candidate is
//! built for the current passage and one for every passage reachable by a
//! lateral lane change. Each candidate is the passage geometry cut to
//! `[s - backward, s + forward]`, extended through predecessor and successor
//! lanes when the passage itself is too short.

use crate::config::PncMapConfig;
use crate::error::{PncError, PncResult};
use crate::locator::WaypointLocator;
use crate::map::{Lane, LaneGraph};
use crate::models::{LaneWaypoint, Passage};
use crate::neighbors::{NeighborPassage, NeighborPassageResolver};
use crate::route_segments::{LaneSegment, RouteSegments};
use crate::snapshot::RouteSnapshot;
use crate::spatial::Vec2;
use std::collections::HashSet;
use std::sync::Arc;

pub struct RouteSegmentsBuilder<'a> {
    snapshot: &'a RouteSnapshot,
    map: &'a dyn LaneGraph,
    config: &'a PncMapConfig,
}

impl<'a> RouteSegmentsBuilder<'a> {
    pub fn new(
        snapshot: &'a RouteSnapshot,
        map: &'a dyn LaneGraph,
        config: &'a PncMapConfig,
    ) -> Self {
        Self {
            snapshot,
            map,
            config,
        }
    }

    /// Candidates around `position`, own passage first.
    ///
    /// Fails when the own-passage candidate cannot be built; neighbor
    /// candidates that cannot be built are skipped.
    pub fn route_segments(
        &self,
        position: Vec2,
        backward_distance: f64,
        forward_distance: f64,
    ) -> PncResult<Vec<RouteSegments>> {
        validate_distances(backward_distance, forward_distance)?;

        let locator = WaypointLocator::new(self.snapshot, self.map, self.config);
        let waypoint = locator.nearest_point_from_routing(position)?;
        let start = locator
            .waypoint_index(&waypoint)
            .first()
            .copied()
            .ok_or_else(|| {
                PncError::NotFound(format!("{:?} is not covered by the routing", waypoint))
            })?;

        let neighbors = NeighborPassageResolver::new(self.snapshot, self.map)
            .neighbor_passages(start.road_index, start.passage_index)?;

        let mut candidates = Vec::with_capacity(neighbors.len());
        for neighbor in neighbors {
            let own = neighbor.passage_index == start.passage_index;
            let anchor = own.then_some(&waypoint);
            let built = self.build_candidate(
                position,
                start.road_index,
                neighbor,
                anchor,
                backward_distance,
                forward_distance,
            );
            match built {
                Ok(Some(candidate)) => candidates.push(candidate),
                Ok(None) => tracing::debug!(
                    "Skipping {:?} passage {}: vehicle does not project onto it",
                    neighbor.change_lane_type,
                    neighbor.passage_index
                ),
                Err(err) if own => return Err(err),
                Err(err) => tracing::warn!(
                    "Skipping {:?} passage {}: {}",
                    neighbor.change_lane_type,
                    neighbor.passage_index,
                    err
                ),
            }
        }

        tracing::debug!(
            "Built {} route segment candidate(s) from {:?} (plan v{})",
            candidates.len(),
            start,
            self.snapshot.version()
        );
        Ok(candidates)
    }

    /// One candidate for `neighbor`. `anchor` carries the vehicle's own
    /// waypoint when building the current passage; other passages project the
    /// raw position and yield `None` when it does not project.
    fn build_candidate(
        &self,
        position: Vec2,
        road_index: usize,
        neighbor: NeighborPassage,
        anchor: Option<&LaneWaypoint>,
        backward_distance: f64,
        forward_distance: f64,
    ) -> PncResult<Option<RouteSegments>> {
        let response = self.snapshot.response();
        let passage = response
            .road(road_index)
            .and_then(|road| road.passages.get(neighbor.passage_index))
            .ok_or_else(|| {
                PncError::NotFound(format!("passage {}/{}", road_index, neighbor.passage_index))
            })?;
        let segments = self.passage_to_segments(passage)?;

        let s = match anchor {
            Some(waypoint) => {
                let on_lane = waypoint
                    .lane
                    .as_ref()
                    .map_or(position, |lane| lane.sample_point(waypoint.s));
                segments.get_projection(on_lane)?.s
            }
            None => match segments.get_projection(position) {
                Ok(projection) => projection.s,
                Err(_) => return Ok(None),
            },
        };

        let mut candidate =
            self.extend_segments(&segments, s - backward_distance, s + forward_distance)?;
        candidate.set_change_lane_type(neighbor.change_lane_type);
        candidate.set_can_exit(passage.can_exit);
        candidate.set_provenance(road_index, neighbor.passage_index);

        if road_index + 1 == response.roads.len() {
            if let Some(last) = segments.last_waypoint() {
                if candidate.is_waypoint_on_segment(&last) {
                    candidate.set_route_end_waypoint(last);
                }
            }
        }
        Ok(Some(candidate))
    }

    /// Resolves the lane ranges of a passage against the map.
    pub fn passage_to_segments(&self, passage: &Passage) -> PncResult<RouteSegments> {
        let mut segments = RouteSegments::with_epsilon(self.config.segmentation_epsilon_m);
        for range in &passage.segments {
            let lane = self
                .map
                .lane_by_id(&range.id)
                .ok_or_else(|| PncError::map_inconsistency(&range.id))?;
            let start_s = range.start_s.max(0.0);
            let end_s = range.end_s.min(lane.length());
            if start_s > end_s {
                tracing::warn!(
                    "Ignoring lane range {} [{:.3}, {:.3}] outside lane length {:.3}",
                    range.id,
                    range.start_s,
                    range.end_s,
                    lane.length()
                );
                continue;
            }
            segments.push(LaneSegment::new(lane, start_s, end_s));
        }
        if segments.is_empty() {
            return Err(PncError::EmptyInput("passage has no usable lane ranges".to_string()));
        }
        Ok(segments)
    }

    /// Cuts `segments` to `[start_s, end_s]` (stations along the passage),
    /// walking onto predecessor lanes for negative `start_s` and successor
    /// lanes past the passage end. The walk stops at a lane already used.
    pub fn extend_segments(
        &self,
        segments: &RouteSegments,
        start_s: f64,
        end_s: f64,
    ) -> PncResult<RouteSegments> {
        let epsilon = self.config.route_epsilon_m;
        let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
            return Err(PncError::EmptyInput("no segments to extend".to_string()));
        };
        if start_s >= end_s {
            return Err(PncError::OutOfRange(format!(
                "empty extension range [{:.3}, {:.3}]",
                start_s, end_s
            )));
        }

        let mut unique_lanes: HashSet<String> = HashSet::new();
        let mut truncated = RouteSegments::with_epsilon(segments.epsilon());

        if start_s < 0.0 {
            let mut lane = first.lane.clone();
            let mut s = first.start_s;
            let mut remaining = -start_s;
            let mut extended: Vec<LaneSegment> = Vec::new();
            while remaining > epsilon {
                if s <= epsilon {
                    match self.route_predecessor(&lane) {
                        Some(prev)
                            if prev.id() != first.lane_id() && !unique_lanes.contains(prev.id()) =>
                        {
                            s = prev.length();
                            lane = prev;
                        }
                        _ => break,
                    }
                } else {
                    let length = s.min(remaining);
                    extended.push(LaneSegment::new(lane.clone(), s - length, s));
                    unique_lanes.insert(lane.id().to_string());
                    remaining -= length;
                    s -= length;
                }
            }
            for segment in extended.into_iter().rev() {
                truncated.push(segment);
            }
        }

        let mut router_s = 0.0;
        for segment in segments.iter() {
            let adjusted_start = (start_s - router_s + segment.start_s).max(segment.start_s);
            let adjusted_end = (end_s - router_s + segment.start_s).min(segment.end_s);
            if adjusted_start < adjusted_end {
                let continues_back = truncated
                    .last()
                    .is_some_and(|back| back.lane_id() == segment.lane_id());
                if continues_back {
                    if let Some(back) = truncated.last_mut() {
                        back.end_s = adjusted_end;
                    }
                } else if unique_lanes.insert(segment.lane_id().to_string()) {
                    truncated.push(LaneSegment::new(
                        segment.lane.clone(),
                        adjusted_start,
                        adjusted_end,
                    ));
                } else {
                    tracing::debug!("Lane {} recurs within the passage; stopping", segment.lane_id());
                    return finish(truncated, start_s, end_s);
                }
            }
            router_s += segment.length();
            if router_s > end_s {
                break;
            }
        }

        if router_s < end_s {
            if let Some(back) = truncated.last_mut() {
                let lane_length = back.lane.length();
                if back.lane_id() == last.lane_id() && lane_length > back.end_s {
                    let origin_end = back.end_s;
                    back.end_s = (back.end_s + end_s - router_s).min(lane_length);
                    router_s += back.end_s - origin_end;
                }
            }
        }

        let mut last_lane = last.lane.clone();
        while router_s < end_s - epsilon {
            let Some(next) = self.route_successor(&last_lane) else {
                break;
            };
            if unique_lanes.contains(next.id()) {
                break;
            }
            let length = (end_s - router_s).min(next.length());
            truncated.push(LaneSegment::new(next.clone(), 0.0, length));
            unique_lanes.insert(next.id().to_string());
            router_s += length;
            last_lane = next;
        }

        finish(truncated, start_s, end_s)
    }

    /// First predecessor, preferring one that is on the route.
    fn route_predecessor(&self, lane: &Lane) -> Option<Arc<Lane>> {
        self.preferred_lane(lane.predecessor_ids())
    }

    /// First successor, preferring one that is on the route.
    fn route_successor(&self, lane: &Lane) -> Option<Arc<Lane>> {
        self.preferred_lane(lane.successor_ids())
    }

    fn preferred_lane(&self, ids: &[String]) -> Option<Arc<Lane>> {
        let index = self.snapshot.index();
        let preferred = ids
            .iter()
            .find(|id| index.contains(id))
            .or_else(|| ids.first())?;
        let lane = self.map.lane_by_id(preferred);
        if lane.is_none() {
            tracing::warn!("Map topology references unknown lane {}", preferred);
        }
        lane
    }
}

fn validate_distances(backward: f64, forward: f64) -> PncResult<()> {
    if !backward.is_finite() || !forward.is_finite() || backward < 0.0 || forward < 0.0 {
        return Err(PncError::OutOfRange(format!(
            "look distances must be finite and non-negative (backward={}, forward={})",
            backward, forward
        )));
    }
    if backward + forward <= 0.0 {
        return Err(PncError::OutOfRange("look distances cover no length".to_string()));
    }
    Ok(())
}

fn finish(truncated: RouteSegments, start_s: f64, end_s: f64) -> PncResult<RouteSegments> {
    if truncated.is_empty() {
        return Err(PncError::OutOfRange(format!(
            "no lane covers [{:.3}, {:.3}]",
            start_s, end_s
        )));
    }
    Ok(truncated)
}
