//! 2D geometry primitives
//!
//! Points and vectors are plain `DVec2`. Screen convention: +x right, +y down.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Normalize a vector to unit length.
///
/// # Panics
/// Panics on a zero-length (or non-finite) vector. Callers must guard
/// against degenerate input before asking for a direction.
#[inline]
pub fn unit(v: DVec2) -> DVec2 {
    match v.try_normalize() {
        Some(n) => n,
        None => panic!("cannot normalize degenerate vector ({}, {})", v.x, v.y),
    }
}

/// Perpendicular 90° to the left of `v` (with +y pointing down)
#[inline]
pub fn normal_of(v: DVec2) -> DVec2 {
    DVec2::new(v.y, -v.x)
}

/// A directed ray segment of the beam
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: DVec2,
    /// Unit direction
    pub direction: DVec2,
    /// Distance travelled by the beam before this ray's origin
    pub previous_distance: f64,
    /// Distance to the next interaction (0 until resolved)
    pub length: f64,
}

impl Ray {
    /// Ray from `origin` along `direction` (normalized here)
    pub fn new(origin: DVec2, direction: DVec2) -> Self {
        Self {
            origin,
            direction: unit(direction),
            previous_distance: 0.0,
            length: 0.0,
        }
    }

    /// Move the origin forward, counting the step as travelled distance
    pub fn advance(&mut self, distance: f64) {
        self.origin += self.direction * distance;
        self.previous_distance += distance;
    }

    /// Point `distance` along the ray from its origin
    #[inline]
    pub fn point_at(&self, distance: f64) -> DVec2 {
        self.origin + self.direction * distance
    }

    /// End of the resolved segment
    #[inline]
    pub fn end(&self) -> DVec2 {
        self.point_at(self.length)
    }

    /// Total beam distance at the end of this segment
    #[inline]
    pub fn total_distance(&self) -> f64 {
        self.previous_distance + self.length
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: DVec2,
    pub max: DVec2,
}

impl Rect {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Smallest rectangle covering all points (None for an empty set)
    pub fn from_points(points: impl IntoIterator<Item = DVec2>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |r, p| {
            Self::new(r.min.min(p), r.max.max(p))
        }))
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_of_points_left_on_screen() {
        // Facing +x on screen, left is up (-y)
        assert_eq!(normal_of(DVec2::X), DVec2::new(0.0, -1.0));
        assert_eq!(normal_of(DVec2::Y), DVec2::new(1.0, 0.0));
    }

    #[test]
    #[should_panic(expected = "degenerate vector")]
    fn test_unit_of_zero_panics() {
        unit(DVec2::ZERO);
    }

    #[test]
    fn test_advance_accumulates_distance() {
        let mut ray = Ray::new(DVec2::new(1.0, 1.0), DVec2::new(3.0, 4.0));
        ray.advance(5.0);
        assert!((ray.origin - DVec2::new(4.0, 5.0)).length() < 1e-12);
        assert_eq!(ray.previous_distance, 5.0);
    }

    #[test]
    fn test_rect_from_points() {
        let r = Rect::from_points([
            DVec2::new(3.0, -1.0),
            DVec2::new(-2.0, 4.0),
            DVec2::new(0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(r.min, DVec2::new(-2.0, -1.0));
        assert_eq!(r.max, DVec2::new(3.0, 4.0));
        assert_eq!(r.width(), 5.0);
        assert!(Rect::from_points(std::iter::empty()).is_none());
    }
}
