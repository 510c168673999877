//! Resolves points and lane waypoints to positions inside the installed plan.

use crate::config::PncMapConfig;
use crate::error::{PncError, PncResult};
use crate::map::LaneGraph;
use crate::models::{LaneWaypoint, WaypointIndex};
use crate::snapshot::RouteSnapshot;
use crate::spatial::Vec2;

pub struct WaypointLocator<'a> {
    snapshot: &'a RouteSnapshot,
    map: &'a dyn LaneGraph,
    config: &'a PncMapConfig,
}

/// A route lane range a point was matched to.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub waypoint: LaneWaypoint,
    pub index: WaypointIndex,
    /// Signed lateral offset from the matched lane.
    pub l: f64,
}

impl<'a> WaypointLocator<'a> {
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

    /// Every plan position whose lane range covers the waypoint, in ascending
    /// `(road, passage, segment)` order. Empty when uncovered.
    pub fn waypoint_index(&self, waypoint: &LaneWaypoint) -> Vec<WaypointIndex> {
        let Some(lane_id) = waypoint.lane_id() else {
            return Vec::new();
        };
        let epsilon = self.config.route_epsilon_m;
        let response = self.snapshot.response();

        let mut result: Vec<WaypointIndex> = self
            .snapshot
            .index()
            .lookup(lane_id)
            .iter()
            .copied()
            .filter(|index| {
                response.lane_range(index).is_some_and(|range| {
                    waypoint.s >= range.start_s - epsilon && waypoint.s <= range.end_s + epsilon
                })
            })
            .collect();
        result.sort();
        result
    }

    /// Nearest on-route waypoint to `point`.
    pub fn nearest_point_from_routing(&self, point: Vec2) -> PncResult<LaneWaypoint> {
        self.nearest_route_match(point).map(|found| found.waypoint)
    }

    /// Projects `point` onto the lanes of the plan only and keeps the lane
    /// range with the smallest lateral offset. Ties keep the earliest range in
    /// plan order.
    ///
    /// Lanes missing from the map are skipped; if nothing else matches, the
    /// first missing lane is reported instead of `NotFound`.
    pub fn nearest_route_match(&self, point: Vec2) -> PncResult<RouteMatch> {
        if self.snapshot.is_empty() {
            return Err(PncError::EmptyInput("no routing plan is installed".to_string()));
        }
        if !point.is_finite() {
            return Err(PncError::OutOfRange(format!("query point {:?} is not finite", point)));
        }

        let epsilon = self.config.segmentation_epsilon_m;
        let mut best: Option<RouteMatch> = None;
        let mut missing_lane: Option<&str> = None;

        for (index, range) in self.snapshot.response().lane_ranges() {
            let Some(lane) = self.map.lane_by_id(&range.id) else {
                missing_lane.get_or_insert(range.id.as_str());
                continue;
            };
            let projection = lane.project(point);
            if projection.s < range.start_s - epsilon || projection.s > range.end_s + epsilon {
                continue;
            }
            if projection.l.abs() > self.config.max_lateral_distance_m {
                continue;
            }
            if best
                .as_ref()
                .is_some_and(|current| current.l.abs() <= projection.l.abs())
            {
                continue;
            }
            let s = projection.s.clamp(range.start_s, range.end_s);
            best = Some(RouteMatch {
                waypoint: LaneWaypoint::new(lane, s),
                index,
                l: projection.l,
            });
        }

        match best {
            Some(found) => {
                tracing::debug!(
                    "Matched ({:.2}, {:.2}) to {:?} at {:?}, l={:.3}",
                    point.x,
                    point.y,
                    found.waypoint,
                    found.index,
                    found.l
                );
                Ok(found)
            }
            None => Err(match missing_lane {
                Some(lane_id) => PncError::map_inconsistency(lane_id),
                None => PncError::NotFound(format!(
                    "no route lane within {:.1} m of ({:.3}, {:.3})",
                    self.config.max_lateral_distance_m, point.x, point.y
                )),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChangeLaneType, Road, RoutingResponse};
    use crate::testing::{capture_logs, lane_change_scenario, passage, straight_lane, TestMap};
    use approx::assert_abs_diff_eq;

    fn snapshot(response: RoutingResponse) -> RouteSnapshot {
        RouteSnapshot::new(1, response)
    }

    #[test]
    fn nearest_point_prefers_smallest_lateral_offset() {
        let (map, response) = lane_change_scenario();
        let snapshot = snapshot(response);
        let config = PncMapConfig::default();
        let locator = WaypointLocator::new(&snapshot, map.graph(), &config);

        let waypoint = locator.nearest_point_from_routing(Vec2::new(60.757099, 0.4)).unwrap();
        assert_eq!(waypoint.lane_id(), Some("C0"));
        assert_abs_diff_eq!(waypoint.s, 60.757099, epsilon = 1e-6);

        let waypoint = locator.nearest_point_from_routing(Vec2::new(30.0, 3.0)).unwrap();
        assert_eq!(waypoint.lane_id(), Some("L0"));
    }

    #[test]
    fn nearest_point_ignores_off_route_lanes() {
        let (map, response) = lane_change_scenario();
        let snapshot = snapshot(response);
        let config = PncMapConfig::default();
        let locator = WaypointLocator::new(&snapshot, map.graph(), &config);

        // R0 is in the map but not on the route; C0 is the closest route lane.
        let waypoint = locator.nearest_point_from_routing(Vec2::new(50.0, -3.0)).unwrap();
        assert_eq!(waypoint.lane_id(), Some("C0"));

        // LP is behind the route start and off-route.
        let err = locator.nearest_point_from_routing(Vec2::new(-20.0, 3.5)).unwrap_err();
        assert!(matches!(err, PncError::NotFound(_)));
    }

    #[test]
    fn nearest_point_clamps_into_range_and_rejects_far_points() {
        let map = TestMap::new()
            .lane(straight_lane("a", (0.0, 0.0), (100.0, 0.0)))
            .build();
        let response = RoutingResponse {
            roads: vec![Road {
                id: "r".into(),
                passages: vec![passage(&[("a", 20.0, 60.0)], ChangeLaneType::Forward, true)],
            }],
            request_waypoints: Vec::new(),
        };
        let snapshot = snapshot(response);
        let config = PncMapConfig::default();
        let locator = WaypointLocator::new(&snapshot, map.graph(), &config);

        let waypoint = locator.nearest_point_from_routing(Vec2::new(60.1, 1.0)).unwrap();
        assert_abs_diff_eq!(waypoint.s, 60.0, epsilon = 1e-12);

        assert!(locator.nearest_point_from_routing(Vec2::new(80.0, 0.0)).is_err());
        assert!(locator.nearest_point_from_routing(Vec2::new(40.0, 9.0)).is_err());
    }

    #[test]
    fn nearest_point_tie_keeps_route_order() {
        let map = TestMap::new()
            .lane(straight_lane("a", (0.0, 0.0), (100.0, 0.0)))
            .build();
        let response = RoutingResponse {
            roads: vec![
                Road {
                    id: "r0".into(),
                    passages: vec![passage(&[("a", 0.0, 100.0)], ChangeLaneType::Forward, false)],
                },
                Road {
                    id: "r1".into(),
                    passages: vec![passage(&[("a", 0.0, 100.0)], ChangeLaneType::Forward, true)],
                },
            ],
            request_waypoints: Vec::new(),
        };
        let snapshot = snapshot(response);
        let config = PncMapConfig::default();
        let locator = WaypointLocator::new(&snapshot, map.graph(), &config);

        let found = locator.nearest_route_match(Vec2::new(10.0, 0.5)).unwrap();
        assert_eq!(found.index, WaypointIndex::new(0, 0, 0));
    }

    #[test]
    fn nearest_point_fails_without_plan() {
        let (map, _) = lane_change_scenario();
        let snapshot = RouteSnapshot::empty();
        let config = PncMapConfig::default();
        let locator = WaypointLocator::new(&snapshot, map.graph(), &config);

        let err = locator.nearest_point_from_routing(Vec2::new(10.0, 0.0)).unwrap_err();
        assert!(matches!(err, PncError::EmptyInput(_)));
    }

    #[test]
    fn nearest_point_reports_missing_lanes() {
        let map = TestMap::new()
            .lane(straight_lane("a", (0.0, 0.0), (100.0, 0.0)))
            .build();
        let response = RoutingResponse {
            roads: vec![Road {
                id: "r".into(),
                passages: vec![passage(
                    &[("a", 0.0, 100.0), ("ghost", 0.0, 10.0)],
                    ChangeLaneType::Forward,
                    true,
                )],
            }],
            request_waypoints: Vec::new(),
        };
        let snapshot = snapshot(response);
        let config = PncMapConfig::default();
        let locator = WaypointLocator::new(&snapshot, map.graph(), &config);

        let (waypoint, logs) = capture_logs(|| locator.nearest_point_from_routing(Vec2::new(10.0, 0.0)));
        assert_eq!(waypoint.unwrap().lane_id(), Some("a"));
        assert!(!logs.contains("ghost"), "matched query logged: {}", logs);

        let (err, logs) = capture_logs(|| locator.nearest_point_from_routing(Vec2::new(10.0, 40.0)));
        assert!(logs.contains("ghost"));
        let err = err.unwrap_err();
        assert_eq!(
            err,
            PncError::MapInconsistency {
                lane_id: "ghost".to_string()
            }
        );
    }

    #[test]
    fn waypoint_index_single_and_recurring_coverage() {
        let map = TestMap::new()
            .lane(straight_lane("a", (0.0, 0.0), (100.0, 0.0)))
            .lane(straight_lane("b", (100.0, 0.0), (200.0, 0.0)))
            .build();
        let response = RoutingResponse {
            roads: vec![
                Road {
                    id: "r0".into(),
                    passages: vec![
                        passage(&[("a", 0.0, 50.0)], ChangeLaneType::Forward, false),
                        passage(&[("b", 0.0, 10.0), ("a", 40.0, 100.0)], ChangeLaneType::Left, false),
                    ],
                },
                Road {
                    id: "r1".into(),
                    passages: vec![passage(&[("b", 0.0, 100.0)], ChangeLaneType::Forward, true)],
                },
            ],
            request_waypoints: Vec::new(),
        };
        let snapshot = snapshot(response);
        let config = PncMapConfig::default();
        let locator = WaypointLocator::new(&snapshot, map.graph(), &config);

        let only_first = locator.waypoint_index(&LaneWaypoint::new(map.lane("a"), 20.0));
        assert_eq!(only_first, vec![WaypointIndex::new(0, 0, 0)]);

        let both = locator.waypoint_index(&LaneWaypoint::new(map.lane("a"), 45.0));
        assert_eq!(both, vec![WaypointIndex::new(0, 0, 0), WaypointIndex::new(0, 1, 1)]);

        let slack = locator.waypoint_index(&LaneWaypoint::new(map.lane("a"), 50.0005));
        assert_eq!(slack.len(), 2);

        let b = locator.waypoint_index(&LaneWaypoint::new(map.lane("b"), 5.0));
        assert_eq!(b, vec![WaypointIndex::new(0, 1, 0), WaypointIndex::new(1, 0, 0)]);

        assert!(locator.waypoint_index(&LaneWaypoint::null()).is_empty());
        assert!(locator
            .waypoint_index(&LaneWaypoint::new(map.lane("b"), 150.0))
            .is_empty());
    }
}
