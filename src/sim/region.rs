//! Region extraction
//!
//! Treats the scene's features as edges of an undirected graph whose vertices
//! are endpoint coordinates (compared exactly; the editor snaps coincident
//! points to identical values) and finds its minimal cycles.
//!
//! The search is a depth-first walk that forks at every branch point, so each
//! simple cycle is reached by some branch. Different walks find the same cycle
//! in different orders; those are collapsed by comparing edge sets.

use std::collections::BTreeSet;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::feature::{Feature, FeatureId};
use super::geom::{Rect, normal_of};

/// One enclosed polygon of the feature graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Vertex where the cycle closed; the perimeter starts and ends here
    pub origin: DVec2,
    /// Features around the cycle, in walking order from `origin`
    pub perimeter: Vec<FeatureId>,
    pub bounds: Rect,
    /// Unsigned polygon area
    pub area: f64,
}

impl Region {
    fn new(origin: DVec2, perimeter: Vec<FeatureId>, features: &[Feature]) -> Self {
        let mut region = Self {
            origin,
            perimeter,
            bounds: Rect::new(DVec2::ZERO, DVec2::ZERO),
            area: 0.0,
        };
        region.bounds = region.compute_bounds(features);
        region.area = region.compute_area(features);
        region
    }

    fn compute_bounds(&self, features: &[Feature]) -> Rect {
        let points = self
            .perimeter
            .iter()
            .flat_map(|id| [features[id.0].p1(), features[id.0].p2()]);
        Rect::from_points(points).unwrap_or(Rect::new(DVec2::ZERO, DVec2::ZERO))
    }

    /// Area as a fan of triangles from the origin. Each triangle's height is
    /// the new edge projected onto the perpendicular of the previous spoke.
    fn compute_area(&self, features: &[Feature]) -> f64 {
        let mut total = 0.0;
        let mut current = self.origin;
        let mut last = self.origin;
        // The closing edge returns to the origin and adds no area
        for (i, id) in self.perimeter.iter().take(self.perimeter.len().saturating_sub(1)).enumerate() {
            let Some(next) = features[id.0].connect(current) else {
                break;
            };
            current = next;
            if i > 0 {
                let spoke = last - self.origin;
                if let Some(spoke_normal) = normal_of(spoke).try_normalize() {
                    let base = spoke.length();
                    let height = (current - last).dot(spoke_normal);
                    total += base * height / 2.0;
                }
            }
            last = current;
        }
        total.abs()
    }

    /// Polygon vertices starting at the origin (the closing vertex is implied)
    pub fn closed_form(&self, features: &[Feature]) -> Vec<DVec2> {
        let mut points = vec![self.origin];
        let mut p = self.origin;
        for id in self.perimeter.iter().take(self.perimeter.len().saturating_sub(1)) {
            match features[id.0].connect(p) {
                Some(next) => {
                    p = next;
                    points.push(p);
                }
                None => break,
            }
        }
        points
    }

    /// The set of features forming this region, independent of walk order
    pub fn edge_set(&self) -> BTreeSet<FeatureId> {
        self.perimeter.iter().copied().collect()
    }

    /// Even-odd point-in-polygon test
    pub fn contains(&self, point: DVec2, features: &[Feature]) -> bool {
        let vertices = self.closed_form(features);
        let n = vertices.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (a, b) = (vertices[i], vertices[j]);
            if (a.y > point.y) != (b.y > point.y) {
                let cross_x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
                if point.x < cross_x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

/// A walk step: the feature taken and the vertex it arrived at
#[derive(Debug, Clone, Copy)]
struct Step {
    feature: FeatureId,
    point: DVec2,
}

/// Find every minimal cycle in the feature graph.
///
/// A scene without cycles yields an empty list.
pub fn extract_regions(features: &[Feature]) -> Vec<Region> {
    let mut regions = Vec::new();
    let mut tagged = vec![false; features.len()];

    while let Some(start) = tagged.iter().position(|t| !t) {
        tagged[start] = true;
        let first = Step {
            feature: FeatureId(start),
            point: features[start].p1(),
        };
        find_loops(features, vec![first], &mut tagged, &mut regions);
    }

    log::debug!("extracted {} regions from {} features", regions.len(), features.len());
    regions
}

/// Walk forward from `start`, forking at branch points. Pending forks live on
/// an explicit stack so pathological scenes cannot exhaust the call stack.
fn find_loops(
    features: &[Feature],
    start: Vec<Step>,
    tagged: &mut [bool],
    regions: &mut Vec<Region>,
) {
    let mut pending = vec![start];
    while let Some(mut path) = pending.pop() {
        let last = path[path.len() - 1];
        let closes = path[..path.len() - 1].iter().any(|s| s.point == last.point);
        if closes {
            record_loop(features, &path, regions);
            continue;
        }

        let mut branches: Vec<Step> = features
            .iter()
            .enumerate()
            .filter(|&(index, _)| index != last.feature.0)
            .filter_map(|(index, f)| {
                f.connect(last.point).map(|point| Step {
                    feature: FeatureId(index),
                    point,
                })
            })
            .collect();
        for branch in &branches {
            tagged[branch.feature.0] = true;
        }

        // Dead end: an open polyline, not a cycle
        let Some(last_branch) = branches.pop() else {
            continue;
        };
        let forks: Vec<Vec<Step>> = branches
            .iter()
            .map(|&branch| {
                let mut fork = path.clone();
                fork.push(branch);
                fork
            })
            .collect();
        // The walk itself continues down the last branch, after every fork
        path.push(last_branch);
        pending.push(path);
        pending.extend(forks.into_iter().rev());
    }
}

/// Build the cycle ending at the path's last vertex and keep it if new
fn record_loop(features: &[Feature], path: &[Step], regions: &mut Vec<Region>) {
    let origin = path[path.len() - 1].point;
    let mut perimeter = Vec::new();
    for step in path.iter().rev() {
        if step.point == origin && !perimeter.is_empty() {
            break;
        }
        perimeter.push(step.feature);
    }

    // Perimeter features are distinct, so equal length plus containment
    // means the same edge set
    let edges: BTreeSet<FeatureId> = perimeter.iter().copied().collect();
    let known = regions.iter().any(|r| {
        r.perimeter.len() == perimeter.len() && r.perimeter.iter().all(|id| edges.contains(id))
    });
    if known {
        return;
    }

    let region = Region::new(origin, perimeter, features);
    log::debug!(
        "region {} with {} edges, area {:.3}",
        regions.len(),
        region.perimeter.len(),
        region.area
    );
    regions.push(region);
}

/// The region with the largest area: the playable interior
pub fn outer_region(regions: &[Region]) -> Option<&Region> {
    regions.iter().max_by(|a, b| a.area.total_cmp(&b.area))
}
