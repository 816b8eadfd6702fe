//! Scene and session state
//!
//! The scene owns the feature list (regions refer to features by index), the
//! emitter and the target. A session wraps a scene with the per-run state the
//! game loop needs; there is no global state.

use std::path::Path as FsPath;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::aim::AimController;
use super::feature::{Feature, FeatureId};
use super::geom::{Ray, Rect};
use super::region::{Region, extract_regions, outer_region};
use super::trace::{Interaction, Path, Target, interact};
use crate::consts::EXIT_TARGET_INSET;
use crate::error::SceneError;
use crate::settings::{ReserveParams, Tuning};
use crate::{direction_to_heading, heading_to_direction};

/// The laser emitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emitter {
    pub location: DVec2,
    /// Direction the laser faces when the level starts
    pub initial_direction: DVec2,
    #[serde(default)]
    pub aim: AimController,
    /// How far the active beam currently reaches
    #[serde(default)]
    pub beam_length: f64,
    /// Power delivered to the target (seconds on target, decays when off)
    #[serde(default)]
    pub power: f64,
    /// Set during a tick when the beam reached the target
    #[serde(skip)]
    pub power_applied: bool,
}

impl Emitter {
    pub fn new(location: DVec2, initial_direction: DVec2) -> Self {
        Self {
            location,
            initial_direction,
            aim: AimController::default(),
            beam_length: 0.0,
            power: 0.0,
            power_applied: false,
        }
    }
}

/// A puzzle level: geometry plus emitter and target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    features: Vec<Feature>,
    pub emitter: Emitter,
    pub target: Target,
    #[serde(default)]
    pub tuning: Tuning,
    /// Derived from `features`; rebuilt by `refresh`
    #[serde(skip)]
    regions: Vec<Region>,
}

impl Scene {
    pub fn new(
        features: Vec<Feature>,
        emitter: Emitter,
        target_location: DVec2,
        tuning: Tuning,
    ) -> Self {
        let target = Target {
            location: target_location,
            radius: tuning.target_radius,
        };
        let mut scene = Self {
            features,
            emitter,
            target,
            tuning,
            regions: Vec::new(),
        };
        scene.refresh();
        scene
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature(&self, id: FeatureId) -> Result<&Feature, SceneError> {
        self.features.get(id.0).ok_or(SceneError::UnknownFeature(id))
    }

    /// Raw feature access for editor operations; callers must `refresh` after
    pub(super) fn features_mut(&mut self) -> &mut Vec<Feature> {
        &mut self.features
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Largest region: the playable interior
    pub fn outer_region(&self) -> Option<&Region> {
        outer_region(&self.regions)
    }

    /// Recompute everything derived from geometry. Call after every
    /// structural edit.
    pub fn refresh(&mut self) {
        self.regions = extract_regions(&self.features);
        self.update_exit_target();
        log::debug!(
            "scene refreshed: {} features, {} regions",
            self.features.len(),
            self.regions.len()
        );
    }

    /// Place the target just inside the exit door, if the scene has one
    fn update_exit_target(&mut self) {
        let Some(door) = self.features.iter().find(|f| f.is_exit()) else {
            return;
        };
        let inward = self.door_inward_normal(door);
        self.target.location = door.midpoint() + inward * EXIT_TARGET_INSET;
    }

    /// Door normal facing into the level: into the outer region when the door
    /// borders one, otherwise toward the middle of the level area.
    fn door_inward_normal(&self, door: &Feature) -> DVec2 {
        let normal = door.normal();
        let probe = door.midpoint() + normal * EXIT_TARGET_INSET;
        if let Some(outer) = self.outer_region() {
            return if outer.contains(probe, &self.features) {
                normal
            } else {
                -normal
            };
        }
        let to_center = self.level_area().center() - door.midpoint();
        if to_center.dot(normal) < 0.0 { -normal } else { normal }
    }

    /// Bounds of all feature endpoints; a unit square when there are none
    pub fn level_area(&self) -> Rect {
        let points = self.features.iter().flat_map(|f| [f.p1(), f.p2()]);
        Rect::from_points(points).unwrap_or(Rect::new(DVec2::ZERO, DVec2::ONE))
    }

    /// Ray leaving the emitter at `angle`
    pub fn ray_from_angle(&self, angle: f64) -> Ray {
        Ray::new(self.emitter.location, heading_to_direction(angle))
    }

    /// Ray from the emitter through `point` (None if they coincide)
    pub fn ray_toward(&self, point: DVec2) -> Option<Ray> {
        let v = point - self.emitter.location;
        (v.length_squared() > 0.0).then(|| Ray::new(self.emitter.location, v))
    }

    pub fn interact(&self, ray: &Ray) -> Option<Interaction> {
        interact(ray, &self.features, &self.target)
    }

    /// Start a path at `ray` and trace it to `distance`
    pub fn trace_path(&self, ray: Ray, distance: f64) -> Path {
        let mut path = Path::new(ray);
        self.extend_path(&mut path, distance);
        path
    }

    /// Continue tracing an existing path out to `distance`
    pub fn extend_path(&self, path: &mut Path, distance: f64) {
        path.trace(&self.features, &self.target, distance);
    }

    /// Reset emitter state for a fresh attempt
    pub fn start_level(&mut self) {
        let direction = self.emitter.initial_direction;
        let angle = if direction.length_squared() != 0.0 {
            direction_to_heading(direction)
        } else {
            0.0
        };
        self.emitter.aim = AimController::new(angle);
        self.emitter.beam_length = 0.0;
        self.emitter.power = 0.0;
        self.emitter.power_applied = false;
        log::info!(
            "level started: emitter at ({:.2}, {:.2}) heading {:.3}",
            self.emitter.location.x,
            self.emitter.location.y,
            angle
        );
    }

    /// Aim along `v` from the emitter (ignored when `v` is zero)
    pub fn set_desired_vector(&mut self, v: DVec2) -> bool {
        self.emitter.aim.set_desired_vector(v)
    }

    pub fn update_aim(&mut self, dt: f64) {
        self.emitter.aim.update(dt, &self.tuning.aim);
    }

    /// Grow the active beam while the laser is on; it vanishes when off
    pub fn update_beam(&mut self, dt: f64, laser_on: bool) {
        if laser_on {
            self.emitter.beam_length += dt * self.tuning.laser_speed;
        } else {
            self.emitter.beam_length = 0.0;
        }
    }

    /// Record that the beam reached the target this tick
    pub fn mark_target_powered(&mut self) {
        self.emitter.power_applied = true;
    }

    /// Settle target power at the end of a tick: accrue while powered,
    /// decay toward zero otherwise.
    pub fn update_target(&mut self, dt: f64) -> f64 {
        let emitter = &mut self.emitter;
        if emitter.power_applied {
            emitter.power += dt;
        } else {
            emitter.power = (emitter.power - self.tuning.target_power_decay * dt).max(0.0);
        }
        emitter.power_applied = false;
        emitter.power
    }

    /// Whether enough power has reached the target
    pub fn is_complete(&self) -> bool {
        self.emitter.power > self.tuning.target_power_required
    }

    /// Parse a scene; derived data is rebuilt after loading
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let mut scene: Self = serde_json::from_str(json)?;
        scene.target.radius = scene.tuning.target_radius;
        scene.refresh();
        Ok(scene)
    }

    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<FsPath>) -> Result<Self, SceneError> {
        let scene = Self::from_json(&std::fs::read_to_string(path.as_ref())?)?;
        log::info!(
            "Loaded scene {} ({} features)",
            path.as_ref().display(),
            scene.features.len()
        );
        Ok(scene)
    }

    pub fn save(&self, path: impl AsRef<FsPath>) -> Result<(), SceneError> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Scene saved to {}", path.as_ref().display());
        Ok(())
    }
}

/// Facility backup power, spent faster while the laser runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerReserve {
    pub params: ReserveParams,
    pub starting: f64,
    pub remaining: f64,
    /// Snapshot taken when the laser switched on; drains down to `remaining`
    /// once the laser has been off for the hold time
    pub when_laser_started: f64,
    pub hold_time: f64,
    pub laser_on_time: f64,
    last_laser_on: bool,
}

impl PowerReserve {
    pub fn new(params: ReserveParams) -> Self {
        Self {
            params,
            starting: params.initial,
            remaining: params.initial,
            when_laser_started: params.initial,
            hold_time: 0.0,
            laser_on_time: 0.0,
            last_laser_on: false,
        }
    }

    pub fn update(&mut self, dt: f64, laser_on: bool) {
        if laser_on && !self.last_laser_on {
            self.when_laser_started = self.remaining;
        }

        if laser_on {
            self.remaining -= dt * self.params.laser_use_rate;
            self.hold_time = self.params.hold_time;
            self.laser_on_time += dt;
        } else {
            self.remaining -= dt;
            self.hold_time -= dt;
            if self.hold_time < 0.0 {
                self.hold_time = 0.0;
                self.when_laser_started -= self.params.laser_use_rate * dt * 4.0;
                self.when_laser_started = self.when_laser_started.max(self.remaining);
            }
        }
        self.last_laser_on = laser_on;
    }

    pub fn is_depleted(&self) -> bool {
        self.remaining <= 0.0
    }
}

/// Outcome of the current level attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelPhase {
    /// Attempt in progress
    Playing,
    /// Target received enough power
    Won,
    /// Facility ran out of power
    PowerDepleted,
}

/// One play session on a scene
#[derive(Debug, Clone)]
pub struct Session {
    pub scene: Scene,
    pub reserve: PowerReserve,
    /// Beam traced on the latest tick
    pub path: Option<Path>,
    pub phase: LevelPhase,
    pub time_ticks: u64,
}

impl Session {
    pub fn new(mut scene: Scene) -> Self {
        scene.start_level();
        let reserve = PowerReserve::new(scene.tuning.reserve);
        Self {
            scene,
            reserve,
            path: None,
            phase: LevelPhase::Playing,
            time_ticks: 0,
        }
    }

    /// Restart the level, keeping the facility reserve
    pub fn restart(&mut self) {
        self.scene.start_level();
        self.path = None;
        self.phase = LevelPhase::Playing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn p(x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y)
    }

    fn room_scene() -> Scene {
        let features = vec![
            Feature::wall(p(0.0, 0.0), p(10.0, 0.0)),
            Feature::wall(p(10.0, 0.0), p(10.0, 8.0)),
            Feature::wall(p(10.0, 8.0), p(0.0, 8.0)),
            Feature::wall(p(0.0, 8.0), p(0.0, 0.0)),
        ];
        Scene::new(
            features,
            Emitter::new(p(1.5, 1.5), DVec2::X),
            p(4.5, 2.5),
            Tuning::default(),
        )
    }

    #[test]
    fn test_start_level_heading_from_direction() {
        let mut scene = room_scene();
        scene.emitter.initial_direction = p(0.0, -1.0);
        scene.emitter.power = 2.0;
        scene.start_level();
        assert!((scene.emitter.aim.angle - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(scene.emitter.aim.desired_angle, scene.emitter.aim.angle);
        assert_eq!(scene.emitter.power, 0.0);

        scene.emitter.initial_direction = DVec2::ZERO;
        scene.start_level();
        assert_eq!(scene.emitter.aim.angle, 0.0);
    }

    #[test]
    fn test_beam_grows_while_on_and_resets_when_off() {
        let mut scene = room_scene();
        scene.update_beam(0.5, true);
        scene.update_beam(0.5, true);
        assert!((scene.emitter.beam_length - 2.0).abs() < 1e-12);
        scene.update_beam(0.1, false);
        assert_eq!(scene.emitter.beam_length, 0.0);
    }

    #[test]
    fn test_target_power_accrues_and_decays() {
        let mut scene = room_scene();
        scene.mark_target_powered();
        assert_eq!(scene.update_target(1.0), 1.0);
        // Flag is consumed by the settle
        assert!(!scene.emitter.power_applied);
        assert_eq!(scene.update_target(0.25), 0.5);
        assert_eq!(scene.update_target(1.0), 0.0);
    }

    #[test]
    fn test_level_area() {
        let scene = room_scene();
        assert_eq!(scene.level_area(), Rect::new(p(0.0, 0.0), p(10.0, 8.0)));

        let empty = Scene::new(Vec::new(), Emitter::new(p(0.0, 0.0), DVec2::X), p(1.0, 1.0), Tuning::default());
        assert_eq!(empty.level_area(), Rect::new(DVec2::ZERO, DVec2::ONE));
        assert!(empty.regions().is_empty());
    }

    #[test]
    fn test_ray_toward_emitter_location_is_none() {
        let scene = room_scene();
        assert!(scene.ray_toward(scene.emitter.location).is_none());
        let ray = scene.ray_toward(p(4.5, 1.5)).unwrap();
        assert_eq!(ray.direction, DVec2::X);
    }

    #[test]
    fn test_exit_door_places_target_inside() {
        let mut features = room_scene().features().to_vec();
        // Split the right wall around a door from (10, 3) to (10, 5)
        features[1] = Feature::wall(p(10.0, 0.0), p(10.0, 3.0));
        features.push(Feature::door(p(10.0, 3.0), p(10.0, 5.0), true));
        features.push(Feature::wall(p(10.0, 5.0), p(10.0, 8.0)));
        let scene = Scene::new(features, Emitter::new(p(1.5, 1.5), DVec2::X), p(0.0, 0.0), Tuning::default());
        assert_eq!(scene.regions().len(), 1);
        assert!((scene.target.location - p(9.0, 4.0)).length() < 1e-12);
    }

    #[test]
    fn test_exit_door_reversed_still_faces_inward() {
        let mut features = room_scene().features().to_vec();
        features[1] = Feature::wall(p(10.0, 0.0), p(10.0, 3.0));
        features.push(Feature::door(p(10.0, 5.0), p(10.0, 3.0), true));
        features.push(Feature::wall(p(10.0, 5.0), p(10.0, 8.0)));
        let scene = Scene::new(features, Emitter::new(p(1.5, 1.5), DVec2::X), p(0.0, 0.0), Tuning::default());
        assert!((scene.target.location - p(9.0, 4.0)).length() < 1e-12);
    }

    #[test]
    fn test_scene_json_roundtrip_rebuilds_regions() {
        let scene = room_scene();
        let loaded = Scene::from_json(&scene.to_json().unwrap()).unwrap();
        assert_eq!(loaded.features(), scene.features());
        assert_eq!(loaded.regions().len(), 1);
        assert_eq!(loaded.target, scene.target);
    }

    #[test]
    fn test_unknown_feature_is_an_error() {
        let scene = room_scene();
        assert!(matches!(
            scene.feature(FeatureId(17)),
            Err(SceneError::UnknownFeature(FeatureId(17)))
        ));
    }

    #[test]
    fn test_reserve_drains_faster_with_laser() {
        let mut reserve = PowerReserve::new(ReserveParams::default());
        reserve.update(1.0, false);
        assert_eq!(reserve.remaining, 1799.0);
        reserve.update(1.0, true);
        assert_eq!(reserve.when_laser_started, 1799.0);
        assert_eq!(reserve.remaining, 1789.0);
        assert_eq!(reserve.laser_on_time, 1.0);

        // Marker holds for 3s after the laser stops, then drains down
        for _ in 0..3 {
            reserve.update(1.0, false);
        }
        assert_eq!(reserve.when_laser_started, 1799.0);
        reserve.update(1.0, false);
        assert_eq!(reserve.when_laser_started, reserve.remaining);
    }
}
