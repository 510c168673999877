//! Read-only lane graph consumed by the route resolver.
//!
//! The map itself is owned by an external loader; this module only models the
//! lane geometry and topology the resolver needs: arc-length sampling,
//! projection, and neighbor/predecessor/successor lookup.

use crate::error::{PncError, PncResult};
use crate::spatial::{distance_to_segment, projection_ratio, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Consecutive centerline points closer than this are merged.
const MIN_POINT_SPACING_M: f64 = 1e-6;

/// Serialized lane as delivered by the map loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneRecord {
    pub id: String,
    /// Centerline in driving direction.
    pub points: Vec<Vec2>,
    #[serde(default)]
    pub left_neighbor_forward_ids: Vec<String>,
    #[serde(default)]
    pub right_neighbor_forward_ids: Vec<String>,
    #[serde(default)]
    pub predecessor_ids: Vec<String>,
    #[serde(default)]
    pub successor_ids: Vec<String>,
}

/// Serialized map: a flat list of lanes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoadMapRecord {
    pub lanes: Vec<LaneRecord>,
}

/// Result of projecting a point onto a lane centerline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneProjection {
    /// Station along the lane; extrapolated past either end.
    pub s: f64,
    /// Signed lateral offset, positive to the left of travel.
    pub l: f64,
    /// Whether `s` lies within `[0, length]`.
    pub in_range: bool,
}

/// Immutable lane geometry with precomputed arc length.
#[derive(Debug, Clone)]
pub struct Lane {
    id: String,
    points: Vec<Vec2>,
    accumulated_s: Vec<f64>,
    headings: Vec<f64>,
    left_neighbor_forward_ids: Vec<String>,
    right_neighbor_forward_ids: Vec<String>,
    predecessor_ids: Vec<String>,
    successor_ids: Vec<String>,
}

impl Lane {
    pub fn from_record(record: LaneRecord) -> PncResult<Self> {
        let invalid = |reason: &str| PncError::InvalidLane {
            lane_id: record.id.clone(),
            reason: reason.to_string(),
        };

        if record.points.iter().any(|p| !p.is_finite()) {
            return Err(invalid("centerline contains non-finite coordinates"));
        }

        let mut points: Vec<Vec2> = Vec::with_capacity(record.points.len());
        for point in &record.points {
            match points.last() {
                Some(last) if last.distance_to(*point) < MIN_POINT_SPACING_M => {}
                _ => points.push(*point),
            }
        }
        if points.len() < 2 {
            return Err(invalid("centerline needs at least two distinct points"));
        }

        let mut accumulated_s = Vec::with_capacity(points.len());
        let mut headings = Vec::with_capacity(points.len() - 1);
        accumulated_s.push(0.0);
        for pair in points.windows(2) {
            let delta = pair[1] - pair[0];
            let last = accumulated_s.last().copied().unwrap_or(0.0);
            accumulated_s.push(last + delta.length());
            headings.push(delta.heading());
        }

        Ok(Self {
            id: record.id,
            points,
            accumulated_s,
            headings,
            left_neighbor_forward_ids: record.left_neighbor_forward_ids,
            right_neighbor_forward_ids: record.right_neighbor_forward_ids,
            predecessor_ids: record.predecessor_ids,
            successor_ids: record.successor_ids,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn length(&self) -> f64 {
        self.accumulated_s.last().copied().unwrap_or(0.0)
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn left_neighbor_forward_ids(&self) -> &[String] {
        &self.left_neighbor_forward_ids
    }

    pub fn right_neighbor_forward_ids(&self) -> &[String] {
        &self.right_neighbor_forward_ids
    }

    pub fn predecessor_ids(&self) -> &[String] {
        &self.predecessor_ids
    }

    pub fn successor_ids(&self) -> &[String] {
        &self.successor_ids
    }

    /// Index of the centerline segment containing station `s`.
    fn segment_index(&self, s: f64) -> usize {
        let upper = self.accumulated_s.partition_point(|&acc| acc <= s);
        upper.saturating_sub(1).min(self.points.len() - 2)
    }

    /// Heading (radians) of the centerline at station `s`.
    pub fn heading(&self, s: f64) -> f64 {
        self.headings[self.segment_index(s)]
    }

    /// Centerline point at station `s`, clamped to the lane extent.
    pub fn sample_point(&self, s: f64) -> Vec2 {
        let s = s.clamp(0.0, self.length());
        let idx = self.segment_index(s);
        let seg_len = self.accumulated_s[idx + 1] - self.accumulated_s[idx];
        let t = if seg_len > 0.0 {
            (s - self.accumulated_s[idx]) / seg_len
        } else {
            0.0
        };
        self.points[idx].lerp(self.points[idx + 1], t)
    }

    /// Centerline samples covering `[start_s, end_s]`: both interpolated
    /// ends plus every native vertex strictly between them.
    pub fn samples_between(&self, start_s: f64, end_s: f64) -> Vec<(f64, Vec2)> {
        let start_s = start_s.clamp(0.0, self.length());
        let end_s = end_s.clamp(start_s, self.length());

        let mut samples = vec![(start_s, self.sample_point(start_s))];
        for (s, point) in self.accumulated_s.iter().zip(&self.points) {
            if *s > start_s && *s < end_s {
                samples.push((*s, *point));
            }
        }
        if end_s > start_s {
            samples.push((end_s, self.sample_point(end_s)));
        }
        samples
    }

    /// Projects `point` onto the centerline.
    ///
    /// The nearest centerline segment wins; only the first and last segments
    /// extrapolate, so points before the start get a negative `s` and points
    /// past the end get `s > length`.
    pub fn project(&self, point: Vec2) -> LaneProjection {
        let last_segment = self.points.len() - 2;

        let mut best_idx = 0;
        let mut best_dist = f64::INFINITY;
        for (idx, pair) in self.points.windows(2).enumerate() {
            let dist = distance_to_segment(point, pair[0], pair[1]);
            if dist < best_dist {
                best_dist = dist;
                best_idx = idx;
            }
        }

        let start = self.points[best_idx];
        let end = self.points[best_idx + 1];
        let mut t = projection_ratio(point, start, end);
        if best_idx > 0 {
            t = t.max(0.0);
        }
        if best_idx < last_segment {
            t = t.min(1.0);
        }

        let seg_len = self.accumulated_s[best_idx + 1] - self.accumulated_s[best_idx];
        let s = self.accumulated_s[best_idx] + t * seg_len;
        let foot = start.lerp(end, t);
        let dist = point.distance_to(foot);
        let l = if (end - start).cross(point - start) < 0.0 {
            -dist
        } else {
            dist
        };

        LaneProjection {
            s,
            l,
            in_range: s >= 0.0 && s <= self.length(),
        }
    }
}

/// Lane lookup seam between the resolver and the map owner.
pub trait LaneGraph: Send + Sync {
    fn lane_by_id(&self, id: &str) -> Option<Arc<Lane>>;
}

/// In-memory lane graph keyed by lane id.
#[derive(Debug, Clone, Default)]
pub struct RoadMap {
    lanes: HashMap<String, Arc<Lane>>,
}

impl RoadMap {
    pub fn from_records(records: Vec<LaneRecord>) -> PncResult<Self> {
        let mut lanes = HashMap::with_capacity(records.len());
        for record in records {
            let lane = Lane::from_record(record)?;
            if lanes.contains_key(lane.id()) {
                return Err(PncError::InvalidLane {
                    lane_id: lane.id().to_string(),
                    reason: "duplicate lane id".to_string(),
                });
            }
            lanes.insert(lane.id().to_string(), Arc::new(lane));
        }
        Ok(Self { lanes })
    }

    pub fn from_record(record: RoadMapRecord) -> PncResult<Self> {
        Self::from_records(record.lanes)
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }
}

impl LaneGraph for RoadMap {
    fn lane_by_id(&self, id: &str) -> Option<Arc<Lane>> {
        self.lanes.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn record(id: &str, points: &[(f64, f64)]) -> LaneRecord {
        LaneRecord {
            id: id.to_string(),
            points: points.iter().map(|&(x, y)| Vec2::new(x, y)).collect(),
            left_neighbor_forward_ids: Vec::new(),
            right_neighbor_forward_ids: Vec::new(),
            predecessor_ids: Vec::new(),
            successor_ids: Vec::new(),
        }
    }

    fn elbow() -> Lane {
        Lane::from_record(record("elbow", &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)])).unwrap()
    }

    #[test]
    fn length_and_sampling_follow_arc_length() {
        let lane = elbow();
        assert_relative_eq!(lane.length(), 20.0);
        assert_eq!(lane.sample_point(5.0), Vec2::new(5.0, 0.0));
        assert_eq!(lane.sample_point(15.0), Vec2::new(10.0, 5.0));
        assert_eq!(lane.sample_point(-3.0), Vec2::new(0.0, 0.0));
        assert_eq!(lane.sample_point(99.0), Vec2::new(10.0, 10.0));
        assert_relative_eq!(lane.heading(5.0), 0.0);
        assert_relative_eq!(lane.heading(15.0), FRAC_PI_2);
        assert_relative_eq!(lane.heading(20.0), FRAC_PI_2);
    }

    #[test]
    fn projection_extrapolates_past_the_ends() {
        let lane = elbow();

        let before = lane.project(Vec2::new(-5.0, 1.0));
        assert_relative_eq!(before.s, -5.0);
        assert_relative_eq!(before.l, 1.0);
        assert!(!before.in_range);

        let after = lane.project(Vec2::new(11.0, 13.0));
        assert_relative_eq!(after.s, 23.0);
        assert_relative_eq!(after.l, -1.0);
        assert!(!after.in_range);

        let inside = lane.project(Vec2::new(4.0, -2.0));
        assert_relative_eq!(inside.s, 4.0);
        assert_relative_eq!(inside.l, -2.0);
        assert!(inside.in_range);
    }

    #[test]
    fn samples_between_keeps_interior_vertices() {
        let lane = elbow();
        let samples = lane.samples_between(5.0, 15.0);
        let stations: Vec<f64> = samples.iter().map(|(s, _)| *s).collect();
        assert_eq!(stations, vec![5.0, 10.0, 15.0]);
        assert_eq!(samples[1].1, Vec2::new(10.0, 0.0));

        let single = lane.samples_between(7.0, 7.0);
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn degenerate_records_are_rejected() {
        let err = Lane::from_record(record("dot", &[(1.0, 1.0), (1.0, 1.0)])).unwrap_err();
        assert!(matches!(err, PncError::InvalidLane { .. }));

        let err = RoadMap::from_records(vec![
            record("a", &[(0.0, 0.0), (1.0, 0.0)]),
            record("a", &[(0.0, 1.0), (1.0, 1.0)]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
