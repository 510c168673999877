//! Planar math for lane geometry in local map coordinates (meters).

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A point or vector in the map plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product; positive when `other` is to the left.
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance_to(self, other: Self) -> f64 {
        (other - self).length()
    }

    pub fn heading(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn lerp(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Parameter of the projection of `point` onto the line through `start`/`end`.
///
/// Unclamped: values below 0 lie before `start`, above 1 past `end`.
/// A degenerate segment returns 0.
pub fn projection_ratio(point: Vec2, start: Vec2, end: Vec2) -> f64 {
    let seg = end - start;
    let seg_len_sq = seg.dot(seg);
    if seg_len_sq < 1e-12 {
        return 0.0;
    }
    (point - start).dot(seg) / seg_len_sq
}

/// Minimum distance from a point to a line segment.
pub fn distance_to_segment(point: Vec2, start: Vec2, end: Vec2) -> f64 {
    let t = projection_ratio(point, start, end).clamp(0.0, 1.0);
    point.distance_to(start.lerp(end, t))
}
