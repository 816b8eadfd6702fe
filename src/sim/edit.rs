//! Editor operations on a scene
//!
//! Every structural edit ends with `Scene::refresh`, so regions and the exit
//! target always match the geometry.

use glam::DVec2;

use super::feature::{Feature, FeatureId};
use super::state::Scene;
use crate::error::SceneError;

/// Snap to the nearest integer grid point when within `snap_distance`
pub fn snap_to_grid(point: DVec2, snap_distance: f64) -> DVec2 {
    let grid = point.round();
    if (point - grid).length() < snap_distance {
        grid
    } else {
        point
    }
}

/// Snap to the half-unit grid (emitter placement)
pub fn snap_to_half_grid(point: DVec2, snap_distance: f64) -> DVec2 {
    let grid = (point * 2.0).round() / 2.0;
    if (point - grid).length() < snap_distance {
        grid
    } else {
        point
    }
}

impl Scene {
    pub fn snap_point(&self, point: DVec2) -> DVec2 {
        snap_to_grid(point, self.tuning.snap_distance)
    }

    /// Closest feature within the highlight distance
    pub fn pick_feature(&self, point: DVec2) -> Option<(FeatureId, f64)> {
        let limit = self.tuning.highlight_distance;
        self.features()
            .iter()
            .enumerate()
            .map(|(i, f)| (FeatureId(i), f.distance_to_point(point)))
            .filter(|&(_, d)| d <= limit)
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Closest feature endpoint within the highlight distance
    pub fn pick_point(&self, point: DVec2) -> Option<DVec2> {
        let limit = self.tuning.highlight_distance;
        self.features()
            .iter()
            .flat_map(|f| [f.p1(), f.p2()])
            .map(|v| (v, (point - v).length()))
            .filter(|&(_, d)| d < limit)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(v, _)| v)
    }

    /// Add a feature; zero-length segments are rejected
    pub fn add_feature(&mut self, feature: Feature) -> Result<FeatureId, SceneError> {
        if feature.p1() == feature.p2() {
            let p = feature.p1();
            log::warn!("rejected zero-length feature at ({}, {})", p.x, p.y);
            return Err(SceneError::ZeroLengthFeature { x: p.x, y: p.y });
        }
        let id = FeatureId(self.features().len());
        self.features_mut().push(feature);
        self.refresh();
        Ok(id)
    }

    /// Remove a feature. Later features shift down one id.
    pub fn remove_feature(&mut self, id: FeatureId) -> Result<Feature, SceneError> {
        self.feature(id)?;
        let removed = self.features_mut().remove(id.0);
        self.refresh();
        Ok(removed)
    }

    /// Move a whole feature, snapping its endpoints to the grid. A move that
    /// would snap both endpoints together is rejected and leaves the feature
    /// where it was.
    pub fn translate_feature(&mut self, id: FeatureId, delta: DVec2) -> Result<(), SceneError> {
        let feature = self.feature(id)?;
        let snap = self.tuning.snap_distance;
        let p1 = snap_to_grid(feature.p1() + delta, snap);
        let p2 = snap_to_grid(feature.p2() + delta, snap);
        if p1 == p2 {
            log::warn!("rejected move collapsing feature {} at ({}, {})", id.0, p1.x, p1.y);
            return Err(SceneError::ZeroLengthFeature { x: p1.x, y: p1.y });
        }
        self.features_mut()[id.0].set_endpoints(p1, p2);
        self.refresh();
        Ok(())
    }

    /// Move a shared vertex: every endpoint at `from` goes to `to`. Endpoints
    /// whose feature would shrink below the highlight distance stay put.
    /// Returns how many endpoints moved.
    pub fn move_point(&mut self, from: DVec2, to: DVec2) -> usize {
        let min_length = self.tuning.highlight_distance;
        let mut moved = 0;
        for feature in self.features_mut().iter_mut() {
            if feature.p1() == from && (to - feature.p2()).length() > min_length {
                feature.set_p1(to);
                moved += 1;
            } else if feature.p2() == from && (to - feature.p1()).length() > min_length {
                feature.set_p2(to);
                moved += 1;
            }
        }
        if moved > 0 {
            self.refresh();
        }
        moved
    }

    /// Flip a feature between mirror and absorber
    pub fn toggle_reflect(&mut self, id: FeatureId) -> Result<bool, SceneError> {
        self.feature(id)?;
        let feature = &mut self.features_mut()[id.0];
        feature.will_reflect = !feature.will_reflect;
        Ok(feature.will_reflect)
    }

    /// Place the emitter, snapped to the half grid
    pub fn set_laser_location(&mut self, point: DVec2) {
        self.emitter.location = snap_to_half_grid(point, self.tuning.snap_distance);
    }
}
