pub mod builder;
pub mod config;
pub mod error;
pub mod locator;
pub mod map;
pub mod models;
pub mod neighbors;
pub mod path;
pub mod pnc_map;
pub mod route_segments;
pub mod routing_index;
pub mod snapshot;
pub mod spatial;

#[cfg(test)]
mod testing;

pub use builder::RouteSegmentsBuilder;
pub use config::PncMapConfig;
pub use error::{PncError, PncResult};
pub use locator::{RouteMatch, WaypointLocator};
pub use map::{Lane, LaneGraph, LaneProjection, LaneRecord, RoadMap, RoadMapRecord};
pub use models::{
    ChangeLaneType, LaneRange, LaneWaypoint, Passage, RequestWaypoint, Road, RoutingResponse,
    WaypointIndex, WaypointRecord,
};
pub use neighbors::{NeighborPassage, NeighborPassageResolver};
pub use path::{create_path_from_lane_segments, Path, PathPoint};
pub use pnc_map::{PncMap, RouteQuery};
pub use route_segments::{
    LaneSegment, RouteSegments, SegmentProjection, SegmentsProvenance, SEGMENTATION_EPSILON,
};
pub use routing_index::RoutingIndex;
pub use snapshot::{RoutePlanStore, RouteSnapshot};
pub use spatial::Vec2;
