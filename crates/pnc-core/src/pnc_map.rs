//! Query facade used by planning and prediction.
//!
//! [`PncMap`] owns the lane graph handle, the plan store and the config.
//! Each facade method grabs one snapshot and runs a [`RouteQuery`] against it;
//! callers that issue several related queries should take a [`RouteQuery`]
//! once via [`PncMap::query`] so that all of them see the same plan.

use crate::builder::RouteSegmentsBuilder;
use crate::config::PncMapConfig;
use crate::error::PncResult;
use crate::locator::{RouteMatch, WaypointLocator};
use crate::map::LaneGraph;
use crate::models::{LaneWaypoint, RoutingResponse, WaypointIndex};
use crate::neighbors::{NeighborPassage, NeighborPassageResolver};
use crate::path::{create_path_from_lane_segments, Path};
use crate::route_segments::{LaneSegment, RouteSegments};
use crate::snapshot::{RoutePlanStore, RouteSnapshot};
use crate::spatial::Vec2;
use std::sync::Arc;

/// All queries bound to a single plan snapshot.
pub struct RouteQuery<'a> {
    snapshot: Arc<RouteSnapshot>,
    map: &'a dyn LaneGraph,
    config: &'a PncMapConfig,
}

impl<'a> RouteQuery<'a> {
    pub fn new(
        snapshot: Arc<RouteSnapshot>,
        map: &'a dyn LaneGraph,
        config: &'a PncMapConfig,
    ) -> Self {
        Self {
            snapshot,
            map,
            config,
        }
    }

    pub fn snapshot(&self) -> &Arc<RouteSnapshot> {
        &self.snapshot
    }

    fn locator(&self) -> WaypointLocator<'_> {
        WaypointLocator::new(&self.snapshot, self.map, self.config)
    }

    pub fn get_route_segments(
        &self,
        position: Vec2,
        backward_distance: f64,
        forward_distance: f64,
    ) -> PncResult<Vec<RouteSegments>> {
        RouteSegmentsBuilder::new(&self.snapshot, self.map, self.config).route_segments(
            position,
            backward_distance,
            forward_distance,
        )
    }

    /// Route segments with the configured look distances.
    pub fn get_default_route_segments(&self, position: Vec2) -> PncResult<Vec<RouteSegments>> {
        self.get_route_segments(
            position,
            self.config.look_backward_distance_m,
            self.config.look_forward_distance_m,
        )
    }

    pub fn get_nearest_point_from_routing(&self, point: Vec2) -> PncResult<LaneWaypoint> {
        self.locator().nearest_point_from_routing(point)
    }

    /// Nearest on-route waypoint together with its plan position and offset.
    pub fn get_nearest_route_match(&self, point: Vec2) -> PncResult<RouteMatch> {
        self.locator().nearest_route_match(point)
    }

    pub fn get_neighbor_passages(
        &self,
        road_index: usize,
        passage_index: usize,
    ) -> PncResult<Vec<NeighborPassage>> {
        NeighborPassageResolver::new(&self.snapshot, self.map)
            .neighbor_passages(road_index, passage_index)
    }

    pub fn get_waypoint_index(&self, waypoint: &LaneWaypoint) -> Vec<WaypointIndex> {
        self.locator().waypoint_index(waypoint)
    }

    /// Last waypoint of the originating request, resolved against the map.
    pub fn destination_waypoint(&self) -> Option<LaneWaypoint> {
        let request = self.snapshot.response().request_waypoints.last()?;
        LaneWaypoint::from_request(request, self.map)
    }
}

/// Routing-to-geometry resolver shared between the plan writer and readers.
pub struct PncMap {
    map: Arc<dyn LaneGraph>,
    store: RoutePlanStore,
    config: PncMapConfig,
}

impl PncMap {
    pub fn new(map: Arc<dyn LaneGraph>, config: PncMapConfig) -> Self {
        Self {
            map,
            store: RoutePlanStore::new(),
            config,
        }
    }

    pub fn config(&self) -> &PncMapConfig {
        &self.config
    }

    pub fn map(&self) -> &Arc<dyn LaneGraph> {
        &self.map
    }

    /// Validates `response` against the map and publishes it.
    ///
    /// Unknown lanes and ranges outside their lane are reported but do not
    /// block the install; queries touching them fail with `MapInconsistency`
    /// or skip the range.
    pub fn update_routing_response(&self, response: RoutingResponse) -> Arc<RouteSnapshot> {
        let mut missing = 0usize;
        for (index, range) in response.lane_ranges() {
            let Some(lane) = self.map.lane_by_id(&range.id) else {
                tracing::warn!("Routing lane {} at {:?} is not in the map", range.id, index);
                missing += 1;
                continue;
            };
            let slack = self.config.route_epsilon_m;
            if range.start_s > range.end_s
                || range.start_s < -slack
                || range.end_s > lane.length() + slack
            {
                tracing::warn!(
                    "Routing lane range {} [{:.3}, {:.3}] at {:?} does not fit lane length {:.3}",
                    range.id,
                    range.start_s,
                    range.end_s,
                    index,
                    lane.length()
                );
            }
        }

        let snapshot = self.store.install(response);
        tracing::info!(
            "Installed routing v{}: {} roads, {} lane ranges over {} lanes ({} missing from map)",
            snapshot.version(),
            snapshot.response().roads.len(),
            snapshot.index().segment_count(),
            snapshot.index().lane_count(),
            missing
        );
        snapshot
    }

    /// Currently installed plan.
    pub fn snapshot(&self) -> Arc<RouteSnapshot> {
        self.store.snapshot()
    }

    /// Query handle pinned to the current snapshot.
    pub fn query(&self) -> RouteQuery<'_> {
        RouteQuery::new(self.store.snapshot(), self.map.as_ref(), &self.config)
    }

    pub fn get_route_segments(
        &self,
        position: Vec2,
        backward_distance: f64,
        forward_distance: f64,
    ) -> PncResult<Vec<RouteSegments>> {
        self.query()
            .get_route_segments(position, backward_distance, forward_distance)
    }

    pub fn get_nearest_point_from_routing(&self, point: Vec2) -> PncResult<LaneWaypoint> {
        self.query().get_nearest_point_from_routing(point)
    }

    pub fn get_neighbor_passages(
        &self,
        road_index: usize,
        passage_index: usize,
    ) -> PncResult<Vec<NeighborPassage>> {
        self.query().get_neighbor_passages(road_index, passage_index)
    }

    pub fn get_waypoint_index(&self, waypoint: &LaneWaypoint) -> Vec<WaypointIndex> {
        self.query().get_waypoint_index(waypoint)
    }

    pub fn destination_waypoint(&self) -> Option<LaneWaypoint> {
        self.query().destination_waypoint()
    }

    pub fn create_path_from_lane_segments(&self, segments: &[LaneSegment]) -> PncResult<Path> {
        create_path_from_lane_segments(segments)
    }
}
