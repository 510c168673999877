//! Lane-change topology between the passages of one road.

use crate::error::{PncError, PncResult};
use crate::map::LaneGraph;
use crate::models::ChangeLaneType;
use crate::snapshot::RouteSnapshot;
use serde::{Deserialize, Serialize};

/// A passage reachable from the queried one, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborPassage {
    pub passage_index: usize,
    pub change_lane_type: ChangeLaneType,
}

impl NeighborPassage {
    pub const fn new(passage_index: usize, change_lane_type: ChangeLaneType) -> Self {
        Self {
            passage_index,
            change_lane_type,
        }
    }
}

pub struct NeighborPassageResolver<'a> {
    snapshot: &'a RouteSnapshot,
    map: &'a dyn LaneGraph,
}

impl<'a> NeighborPassageResolver<'a> {
    pub fn new(snapshot: &'a RouteSnapshot, map: &'a dyn LaneGraph) -> Self {
        Self { snapshot, map }
    }

    /// Passages of `road_index` reachable by one lateral lane change from
    /// `passage_index`.
    ///
    /// Entry 0 is always the queried passage tagged `Forward`. A passage that
    /// can exit needs no lane change and gets nothing else. Otherwise lanes are
    /// scanned in passage order; for each lane the left forward neighbors are
    /// checked before the right ones, and a neighbor lane that appears in
    /// several passages contributes them in ascending passage order. The first
    /// side a passage is reached from decides its tag.
    pub fn neighbor_passages(
        &self,
        road_index: usize,
        passage_index: usize,
    ) -> PncResult<Vec<NeighborPassage>> {
        let road = self
            .snapshot
            .response()
            .road(road_index)
            .ok_or_else(|| {
                PncError::NotFound(format!("road {} is not in the routing", road_index))
            })?;
        let passage = road.passages.get(passage_index).ok_or_else(|| {
            PncError::NotFound(format!(
                "passage {} is not in road {} ({} passages)",
                passage_index,
                road_index,
                road.passages.len()
            ))
        })?;

        let mut result = vec![NeighborPassage::new(passage_index, ChangeLaneType::Forward)];
        if passage.can_exit {
            return Ok(result);
        }
        let index = self.snapshot.index();

        for range in &passage.segments {
            let lane = self
                .map
                .lane_by_id(&range.id)
                .ok_or_else(|| PncError::map_inconsistency(&range.id))?;

            let sides = [
                (lane.left_neighbor_forward_ids(), ChangeLaneType::Left),
                (lane.right_neighbor_forward_ids(), ChangeLaneType::Right),
            ];
            for (neighbor_ids, change_lane_type) in sides {
                for neighbor_id in neighbor_ids {
                    for occurrence in index.lookup(neighbor_id) {
                        if occurrence.road_index != road_index {
                            continue;
                        }
                        let other = occurrence.passage_index;
                        if result.iter().any(|n| n.passage_index == other) {
                            continue;
                        }
                        result.push(NeighborPassage::new(other, change_lane_type));
                    }
                }
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Road, RoutingResponse};
    use crate::testing::{lane_change_scenario, passage, straight_lane, LaneRecordExt, TestMap};

    use ChangeLaneType::{Forward, Left, Right};

    fn resolve(
        map: &crate::testing::FixtureMap,
        response: &RoutingResponse,
        road_index: usize,
        passage_index: usize,
    ) -> PncResult<Vec<(usize, ChangeLaneType)>> {
        let snapshot = RouteSnapshot::new(1, response.clone());
        NeighborPassageResolver::new(&snapshot, map.graph())
            .neighbor_passages(road_index, passage_index)
            .map(|list| {
                list.into_iter()
                    .map(|n| (n.passage_index, n.change_lane_type))
                    .collect()
            })
    }

    #[test]
    fn lane_change_scenario_neighbors() {
        let (map, response) = lane_change_scenario();

        assert_eq!(resolve(&map, &response, 0, 0).unwrap(), vec![(0, Forward), (1, Right)]);
        assert_eq!(resolve(&map, &response, 0, 1).unwrap(), vec![(1, Forward)]);
        assert_eq!(resolve(&map, &response, 0, 2).unwrap(), vec![(2, Forward), (1, Left)]);
        assert_eq!(resolve(&map, &response, 1, 0).unwrap(), vec![(0, Forward)]);
    }

    #[test]
    fn zigzag_road_alternates_sides_until_the_exit_passage() {
        // p0 = [A], p1 = [B1, B2], p2 = [C2, C3], p3 = [D] (can exit).
        // The route weaves between two lane rows, one section at a time.
        let w = crate::testing::LANE_WIDTH;
        let map = TestMap::new()
            .lane(straight_lane("A", (0.0, w), (100.0, w)).right(&["B1"]))
            .lane(straight_lane("B1", (0.0, 0.0), (100.0, 0.0)).left(&["A"]))
            .lane(straight_lane("B2", (100.0, 0.0), (200.0, 0.0)).left(&["C2"]))
            .lane(straight_lane("C2", (100.0, w), (200.0, w)).right(&["B2"]))
            .lane(straight_lane("C3", (200.0, w), (300.0, w)).right(&["D"]))
            .lane(straight_lane("D", (200.0, 0.0), (300.0, 0.0)).left(&["C3"]))
            .build();
        let response = RoutingResponse {
            roads: vec![Road {
                id: "zigzag".into(),
                passages: vec![
                    passage(&[("A", 0.0, 100.0)], Right, false),
                    passage(&[("B1", 0.0, 100.0), ("B2", 0.0, 100.0)], Left, false),
                    passage(&[("C2", 0.0, 100.0), ("C3", 0.0, 100.0)], Right, false),
                    passage(&[("D", 0.0, 100.0)], Forward, true),
                ],
            }],
            request_waypoints: Vec::new(),
        };

        assert_eq!(resolve(&map, &response, 0, 0).unwrap(), vec![(0, Forward), (1, Right)]);
        assert_eq!(
            resolve(&map, &response, 0, 1).unwrap(),
            vec![(1, Forward), (0, Left), (2, Left)]
        );
        assert_eq!(
            resolve(&map, &response, 0, 2).unwrap(),
            vec![(2, Forward), (1, Right), (3, Right)]
        );
        // D still has C3 on its left, but the exit passage stays put.
        assert_eq!(resolve(&map, &response, 0, 3).unwrap(), vec![(3, Forward)]);
    }

    #[test]
    fn passage_reached_from_both_sides_is_listed_once() {
        // Passage 1 holds lanes on both sides of the queried lane.
        let map = TestMap::new()
            .lane(straight_lane("mid", (0.0, 0.0), (10.0, 0.0)).left(&["up"]).right(&["down"]))
            .lane(straight_lane("up", (0.0, 3.5), (10.0, 3.5)))
            .lane(straight_lane("down", (0.0, -3.5), (10.0, -3.5)))
            .build();
        let response = RoutingResponse {
            roads: vec![Road {
                id: "r".into(),
                passages: vec![
                    passage(&[("mid", 0.0, 10.0)], Forward, false),
                    passage(&[("down", 0.0, 10.0), ("up", 0.0, 10.0)], Right, true),
                ],
            }],
            request_waypoints: Vec::new(),
        };

        let result = resolve(&map, &response, 0, 0).unwrap();
        assert_eq!(result, vec![(0, Forward), (1, Left)]);

        // Same answer on every call.
        assert_eq!(resolve(&map, &response, 0, 0).unwrap(), result);
    }

    #[test]
    fn neighbors_in_other_roads_are_ignored() {
        let map = TestMap::new()
            .lane(straight_lane("a", (0.0, 0.0), (10.0, 0.0)).left(&["b"]))
            .lane(straight_lane("b", (0.0, 3.5), (10.0, 3.5)))
            .build();
        let response = RoutingResponse {
            roads: vec![
                Road {
                    id: "r0".into(),
                    passages: vec![passage(&[("a", 0.0, 10.0)], Forward, false)],
                },
                Road {
                    id: "r1".into(),
                    passages: vec![passage(&[("b", 0.0, 10.0)], Forward, true)],
                },
            ],
            request_waypoints: Vec::new(),
        };

        assert_eq!(resolve(&map, &response, 0, 0).unwrap(), vec![(0, Forward)]);
    }

    #[test]
    fn unknown_indices_and_missing_lanes_fail() {
        let (map, response) = lane_change_scenario();
        assert!(matches!(resolve(&map, &response, 5, 0), Err(PncError::NotFound(_))));
        assert!(matches!(resolve(&map, &response, 0, 9), Err(PncError::NotFound(_))));

        let broken = RoutingResponse {
            roads: vec![Road {
                id: "r".into(),
                passages: vec![passage(&[("ghost", 0.0, 1.0)], Forward, false)],
            }],
            request_waypoints: Vec::new(),
        };
        assert!(matches!(
            resolve(&map, &broken, 0, 0),
            Err(PncError::MapInconsistency { .. })
        ));
    }
}
