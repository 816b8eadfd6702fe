//! Ray interaction engine
//!
//! Finds the nearest thing a ray strikes, bounces it off reflective features
//! and builds the beam path one interaction at a time. Tracing is incremental:
//! a path remembers how far it has resolved and only extends from there.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::feature::{Feature, FeatureId};
use super::geom::{Ray, normal_of, unit};
use crate::consts::REFLECT_ADVANCE;

/// The circular goal the beam must reach
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub location: DVec2,
    pub radius: f64,
}

/// One step of the beam: the ray that arrived and what happened to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Incoming ray with resolved length (None for the path's starting entry)
    pub ray_in: Option<Ray>,
    /// Feature struck (None at the start or on a target hit)
    pub feature: Option<FeatureId>,
    /// Reflected ray (None when absorbed)
    pub ray_out: Option<Ray>,
    pub hit_target: bool,
}

/// Where `ray` first touches the target disc, if it does
pub fn hit_target(ray: &Ray, target: &Target) -> Option<DVec2> {
    let ray_normal = unit(normal_of(ray.direction));
    // Perpendicular offset of the ray line from the target center
    let offset = (ray.origin - target.location).dot(ray_normal);
    if offset.abs() > target.radius {
        return None;
    }

    let nearest = target.location + ray_normal * offset;
    // Back off from the closest approach to the edge of the disc
    let chord_angle = (offset.abs() / target.radius).acos();
    let entry = nearest - ray.direction * (chord_angle.sin() * target.radius);
    if (entry - ray.origin).dot(ray.direction) < 0.0 {
        return None;
    }
    Some(entry)
}

/// Resolve the next interaction of `ray` against the scene.
///
/// Features are scanned in order, so the earliest feature wins an exact tie
/// and a feature wins a tie against the target. Returns None when the ray
/// escapes without touching anything.
pub fn interact(ray: &Ray, features: &[Feature], target: &Target) -> Option<Interaction> {
    let mut nearest: Option<(FeatureId, DVec2, f64)> = None;
    for (index, feature) in features.iter().enumerate() {
        if let Some(point) = feature.nearest_intersection(ray) {
            let distance_sq = (point - ray.origin).length_squared();
            if nearest.is_none_or(|(_, _, best)| distance_sq < best) {
                nearest = Some((FeatureId(index), point, distance_sq));
            }
        }
    }

    if let Some(point) = hit_target(ray, target) {
        let distance_sq = (point - ray.origin).length_squared();
        if nearest.is_none_or(|(_, _, best)| distance_sq < best) {
            let mut ray_in = *ray;
            ray_in.length = distance_sq.sqrt();
            return Some(Interaction {
                ray_in: Some(ray_in),
                feature: None,
                ray_out: None,
                hit_target: true,
            });
        }
    }

    let (id, point, distance_sq) = nearest?;
    let feature = &features[id.0];
    let mut ray_in = *ray;
    ray_in.length = distance_sq.sqrt();

    // Non-reflective features absorb the beam (refraction is not simulated)
    let ray_out = feature.will_reflect.then(|| {
        let n = feature.surface_normal(point);
        let d = ray.direction;
        let mut reflected = Ray {
            origin: point,
            direction: d - n * (2.0 * d.dot(n)),
            previous_distance: ray_in.total_distance(),
            length: 0.0,
        };
        // Step off the surface so the next search cannot find the same wall
        reflected.advance(REFLECT_ADVANCE);
        reflected
    });

    Some(Interaction {
        ray_in: Some(ray_in),
        feature: Some(id),
        ray_out,
        hit_target: false,
    })
}

/// The beam as a chain of interactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub interactions: Vec<Interaction>,
    /// Beam distance resolved so far (to the last interaction)
    pub traced_distance: f64,
}

impl Path {
    /// Untraced path starting with `ray`
    pub fn new(start: Ray) -> Self {
        Self {
            interactions: vec![Interaction {
                ray_in: None,
                feature: None,
                ray_out: Some(start),
                hit_target: false,
            }],
            traced_distance: 0.0,
        }
    }

    /// Extend the path until it covers `distance`, is absorbed, or escapes.
    /// Tracing to a distance already covered does nothing.
    pub fn trace(&mut self, features: &[Feature], target: &Target, distance: f64) {
        while distance > self.traced_distance {
            let Some(ray) = self.last().ray_out else {
                break;
            };
            let Some(interaction) = interact(&ray, features, target) else {
                break;
            };
            if let Some(ray_in) = &interaction.ray_in {
                self.traced_distance = ray_in.total_distance();
            }
            log::trace!(
                "beam interaction #{} at {:.4} (feature {:?}, target {})",
                self.interactions.len(),
                self.traced_distance,
                interaction.feature,
                interaction.hit_target
            );
            self.interactions.push(interaction);
        }
    }

    fn last(&self) -> &Interaction {
        // Never empty: `new` seeds the starting entry
        &self.interactions[self.interactions.len() - 1]
    }

    /// Whether the last resolved interaction is the target
    pub fn hit_target(&self) -> bool {
        self.last().hit_target
    }

    /// Whether the beam has been absorbed and cannot be extended
    pub fn is_terminal(&self) -> bool {
        self.last().ray_out.is_none()
    }

    /// Beam polyline truncated at `distance` travelled, for drawing.
    /// An unresolved tail (ray escaping the scene) is drawn out to `distance`.
    pub fn beam_polyline(&self, distance: f64) -> Vec<DVec2> {
        let mut points = Vec::new();
        for interaction in &self.interactions {
            let Some(ray_in) = &interaction.ray_in else {
                if let Some(start) = &interaction.ray_out {
                    points.push(start.origin);
                }
                continue;
            };
            if ray_in.total_distance() >= distance {
                let remaining = (distance - ray_in.previous_distance).max(0.0);
                points.push(ray_in.point_at(remaining));
                return points;
            }
            points.push(ray_in.end());
        }
        if let Some(ray) = self.last().ray_out {
            if distance > ray.previous_distance {
                points.push(ray.point_at(distance - ray.previous_distance));
            }
        }
        points
    }
}
