//! Continuous sampled path over a sequence of lane segments.

use crate::error::{PncError, PncResult};
use crate::models::LaneWaypoint;
use crate::route_segments::LaneSegment;
use crate::spatial::Vec2;

/// Samples closer than this are merged into one path point.
const MIN_SAMPLE_SPACING_M: f64 = 1e-3;

/// One sample of a [`Path`].
#[derive(Debug, Clone, PartialEq)]
pub struct PathPoint {
    pub point: Vec2,
    /// Arc length from the first path point.
    pub s: f64,
    pub heading: f64,
    /// Index of the owning segment in [`Path::lane_segments`].
    pub segment_index: usize,
    /// Position of the sample on its owning lane.
    pub lane_waypoint: LaneWaypoint,
}

/// Ordered curve stitched from lane segments, fed to the smoother.
#[derive(Debug, Clone)]
pub struct Path {
    points: Vec<PathPoint>,
    lane_segments: Vec<LaneSegment>,
    length: f64,
}

impl Path {
    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn lane_segments(&self) -> &[LaneSegment] {
        &self.lane_segments
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Point, heading and owning lane at path arc length `s`.
    ///
    /// The point is interpolated between neighboring samples; the lane
    /// waypoint and heading come from back-projecting it onto the lane of the
    /// segment that owns the interval.
    pub fn interpolate(&self, s: f64) -> PncResult<PathPoint> {
        if !s.is_finite()
            || s < -MIN_SAMPLE_SPACING_M
            || s > self.length + MIN_SAMPLE_SPACING_M
        {
            return Err(PncError::OutOfRange(format!(
                "s={:.3} is outside path [0, {:.3}]",
                s, self.length
            )));
        }
        let s = s.clamp(0.0, self.length);

        let upper = self
            .points
            .partition_point(|p| p.s < s)
            .clamp(1, self.points.len().max(2) - 1);
        let (before, after) = match (self.points.get(upper - 1), self.points.get(upper)) {
            (Some(before), Some(after)) => (before, after),
            // Single-sample path.
            _ => return self.points.first().cloned().ok_or_else(empty_path),
        };

        let span = after.s - before.s;
        let t = if span > 0.0 { (s - before.s) / span } else { 0.0 };
        let point = before.point.lerp(after.point, t);

        let owner = if t <= 0.0 { before } else { after };
        let segment = &self.lane_segments[owner.segment_index];
        let lane_s = segment
            .lane
            .project(point)
            .s
            .clamp(segment.start_s, segment.end_s);

        Ok(PathPoint {
            point,
            s,
            heading: segment.lane.heading(lane_s),
            segment_index: owner.segment_index,
            lane_waypoint: LaneWaypoint::new(segment.lane.clone(), lane_s),
        })
    }

    /// Lane position at path arc length `s`.
    pub fn lane_waypoint_at(&self, s: f64) -> PncResult<LaneWaypoint> {
        self.interpolate(s).map(|p| p.lane_waypoint)
    }
}

fn empty_path() -> PncError {
    PncError::EmptyInput("path has no points".to_string())
}

/// Stitches the centerline samples of `segments` into one [`Path`].
///
/// The shared boundary sample between consecutive segments appears once,
/// owned by the earlier segment. Gaps between non-contiguous segments are
/// kept and counted in the arc length.
pub fn create_path_from_lane_segments(segments: &[LaneSegment]) -> PncResult<Path> {
    if segments.is_empty() {
        return Err(PncError::EmptyInput("no lane segments to build a path from".to_string()));
    }

    let mut points: Vec<PathPoint> = Vec::new();
    for (segment_index, segment) in segments.iter().enumerate() {
        if segment.end_s < segment.start_s {
            return Err(PncError::OutOfRange(format!(
                "segment {} on lane {} is inverted ({:.3} > {:.3})",
                segment_index,
                segment.lane_id(),
                segment.start_s,
                segment.end_s
            )));
        }
        for (lane_s, point) in segment.lane.samples_between(segment.start_s, segment.end_s) {
            let s = match points.last() {
                Some(last) => {
                    let step = last.point.distance_to(point);
                    if step < MIN_SAMPLE_SPACING_M {
                        continue;
                    }
                    last.s + step
                }
                None => 0.0,
            };
            points.push(PathPoint {
                point,
                s,
                heading: segment.lane.heading(lane_s),
                segment_index,
                lane_waypoint: LaneWaypoint::new(segment.lane.clone(), lane_s),
            });
        }
    }

    let length = points.last().map(|p| p.s).unwrap_or(0.0);
    tracing::debug!(
        "Built path with {} points over {} segment(s), length {:.2} m",
        points.len(),
        segments.len(),
        length
    );
    Ok(Path {
        points,
        lane_segments: segments.to_vec(),
        length,
    })
}
