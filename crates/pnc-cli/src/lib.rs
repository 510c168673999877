//! PNC CLI - JSON views of route queries for the `pnc-query` tool.

use pnc_core::{LaneWaypoint, NeighborPassage, Path, RouteSegments, WaypointIndex, WaypointRecord};
use serde_json::{json, Value};

pub fn waypoint_json(waypoint: &LaneWaypoint) -> Value {
    json!(WaypointRecord::from(waypoint))
}

pub fn route_segments_json(candidates: &[RouteSegments]) -> Value {
    let list: Vec<Value> = candidates
        .iter()
        .map(|route| {
            let segments: Vec<Value> = route
                .iter()
                .map(|segment| {
                    json!({
                        "lane_id": segment.lane_id(),
                        "start_s": segment.start_s,
                        "end_s": segment.end_s,
                    })
                })
                .collect();
            json!({
                "change_lane_type": route.change_lane_type(),
                "can_exit": route.can_exit(),
                "length": route.length(),
                "provenance": route.provenance().map(|p| json!({
                    "road_index": p.road_index,
                    "passage_index": p.passage_index,
                })),
                "route_end_waypoint": route.route_end_waypoint().map(waypoint_json),
                "segments": segments,
            })
        })
        .collect();
    Value::Array(list)
}

pub fn neighbors_json(neighbors: &[NeighborPassage]) -> Value {
    json!(neighbors)
}

pub fn waypoint_index_json(indices: &[WaypointIndex]) -> Value {
    json!(indices)
}

pub fn path_json(path: &Path) -> Value {
    let points: Vec<Value> = path
        .points()
        .iter()
        .map(|p| {
            json!({
                "x": p.point.x,
                "y": p.point.y,
                "s": p.s,
                "heading": p.heading,
                "segment_index": p.segment_index,
                "lane": waypoint_json(&p.lane_waypoint),
            })
        })
        .collect();
    json!({
        "length": path.length(),
        "points": points,
    })
}
