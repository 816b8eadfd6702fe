//! Scene features: the line segments a beam can strike
//!
//! A feature is logically undirected, but p1→p2 fixes which side its normal
//! faces: 90° to the left when looking from p1 to p2 (+y down).

use std::cell::OnceCell;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::geom::{Ray, normal_of};
use crate::sign;

/// Refractive indices carried by features (only reflection is simulated)
pub mod refractive_index {
    pub const AIR: f64 = 1.0;
    pub const GLASS: f64 = 1.5;
    pub const DIAMOND: f64 = 2.42;
}

/// Index of a feature in its scene's feature list
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeatureId(pub usize);

/// Feature variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeatureKind {
    #[default]
    Wall,
    /// Entry or exit door; the exit door places the target
    Door { exit: bool },
}

fn default_true() -> bool {
    true
}

fn default_index() -> f64 {
    refractive_index::AIR
}

/// A wall, mirror or door segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    p1: DVec2,
    p2: DVec2,
    #[serde(default)]
    pub kind: FeatureKind,
    #[serde(default = "default_true")]
    pub will_reflect: bool,
    #[serde(default)]
    pub will_refract: bool,
    #[serde(default = "default_index")]
    pub left_index: f64,
    #[serde(default = "default_index")]
    pub right_index: f64,
    /// Unit normal, recomputed lazily after an endpoint moves
    #[serde(skip)]
    normal: OnceCell<DVec2>,
}

impl PartialEq for Feature {
    fn eq(&self, other: &Self) -> bool {
        self.p1 == other.p1
            && self.p2 == other.p2
            && self.kind == other.kind
            && self.will_reflect == other.will_reflect
            && self.will_refract == other.will_refract
            && self.left_index == other.left_index
            && self.right_index == other.right_index
    }
}

impl Feature {
    pub fn new(p1: DVec2, p2: DVec2, kind: FeatureKind) -> Self {
        Self {
            p1,
            p2,
            kind,
            will_reflect: true,
            will_refract: false,
            left_index: refractive_index::AIR,
            right_index: refractive_index::AIR,
            normal: OnceCell::new(),
        }
    }

    /// Reflective wall
    pub fn wall(p1: DVec2, p2: DVec2) -> Self {
        Self::new(p1, p2, FeatureKind::Wall)
    }

    pub fn door(p1: DVec2, p2: DVec2, exit: bool) -> Self {
        Self::new(p1, p2, FeatureKind::Door { exit })
    }

    /// Builder: set whether the feature reflects
    pub fn with_reflect(mut self, will_reflect: bool) -> Self {
        self.will_reflect = will_reflect;
        self
    }

    #[inline]
    pub fn p1(&self) -> DVec2 {
        self.p1
    }

    #[inline]
    pub fn p2(&self) -> DVec2 {
        self.p2
    }

    pub fn set_p1(&mut self, p: DVec2) {
        self.p1 = p;
        self.reset_normal();
    }

    pub fn set_p2(&mut self, p: DVec2) {
        self.p2 = p;
        self.reset_normal();
    }

    pub fn set_endpoints(&mut self, p1: DVec2, p2: DVec2) {
        self.p1 = p1;
        self.p2 = p2;
        self.reset_normal();
    }

    /// Move both endpoints by `delta`
    pub fn translate(&mut self, delta: DVec2) {
        self.set_endpoints(self.p1 + delta, self.p2 + delta);
    }

    fn reset_normal(&mut self) {
        self.normal.take();
    }

    pub fn is_exit(&self) -> bool {
        matches!(self.kind, FeatureKind::Door { exit: true })
    }

    pub fn is_door(&self) -> bool {
        matches!(self.kind, FeatureKind::Door { .. })
    }

    pub fn length(&self) -> f64 {
        (self.p2 - self.p1).length()
    }

    pub fn midpoint(&self) -> DVec2 {
        (self.p1 + self.p2) * 0.5
    }

    /// Unit normal, 90° left of p1→p2. Zero for a zero-length feature, which
    /// makes every ray parallel to it.
    pub fn normal(&self) -> DVec2 {
        *self
            .normal
            .get_or_init(|| normal_of((self.p2 - self.p1).normalize_or_zero()))
    }

    /// Normal at a contact point (constant along a straight segment)
    pub fn surface_normal(&self, _point: DVec2) -> DVec2 {
        self.normal()
    }

    /// Other endpoint if `origin` is one of this feature's endpoints
    pub fn connect(&self, origin: DVec2) -> Option<DVec2> {
        if self.p1 == origin {
            Some(self.p2)
        } else if self.p2 == origin {
            Some(self.p1)
        } else {
            None
        }
    }

    /// Normal as seen when walking away from `origin`
    pub fn normal_from(&self, origin: DVec2) -> Option<DVec2> {
        if self.p1 == origin {
            Some(self.normal())
        } else if self.p2 == origin {
            Some(-self.normal())
        } else {
            None
        }
    }

    /// Where `ray` crosses this segment, if it does
    pub fn nearest_intersection(&self, ray: &Ray) -> Option<DVec2> {
        let normal = self.normal();
        // Signed distance of the origin from the line (positive = left side)
        let distance = (ray.origin - self.p1).dot(normal);
        // How quickly the ray closes on the line
        let approach_rate = -ray.direction.dot(normal);
        if approach_rate == 0.0 {
            return None;
        }
        if sign(distance) != sign(approach_rate) {
            return None;
        }

        let point = ray.origin + ray.direction * (distance / approach_rate);
        if (point - self.p1).dot(self.p2 - self.p1) < 0.0 {
            return None; // beyond p1
        }
        if (point - self.p2).dot(self.p1 - self.p2) < 0.0 {
            return None; // beyond p2
        }
        Some(point)
    }

    /// Distance from a point to the segment (for editor picking)
    pub fn distance_to_point(&self, point: DVec2) -> f64 {
        if self.p1 == self.p2 {
            return (point - self.p1).length();
        }
        let normal = self.normal();
        let distance = (point - self.p1).dot(normal);
        let foot = point - normal * distance;
        if (foot - self.p1).dot(self.p2 - self.p1) < 0.0 {
            return (point - self.p1).length();
        }
        if (foot - self.p2).dot(self.p1 - self.p2) < 0.0 {
            return (point - self.p2).length();
        }
        distance.abs()
    }
}
