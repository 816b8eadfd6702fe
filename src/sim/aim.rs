//! Aim controller
//!
//! Steers the emitter heading toward the desired heading with drag, a
//! constant-magnitude drive, a speed cap proportional to the remaining error,
//! and a final snap. Ordering and constants matter: they define the feel.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::settings::AimParams;
use crate::{direction_to_heading, normalize_angle, sign};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AimController {
    /// Current heading (radians, 0 = +x, y up on screen is positive). Not
    /// wrapped while turning, so it can leave (-π, π] and then jump by 2π
    /// when it snaps onto the desired heading.
    pub angle: f64,
    /// Angular velocity (rad/s)
    pub angular_speed: f64,
    /// Heading being steered toward
    pub desired_angle: f64,
}

impl AimController {
    pub fn new(angle: f64) -> Self {
        Self {
            angle,
            angular_speed: 0.0,
            desired_angle: angle,
        }
    }

    /// Aim along `v`. A zero vector (cursor on top of the emitter) has no
    /// direction and leaves the desired heading unchanged.
    pub fn set_desired_vector(&mut self, v: DVec2) -> bool {
        if v.length_squared() == 0.0 {
            log::trace!("ignoring zero-length aim vector");
            return false;
        }
        self.desired_angle = direction_to_heading(v);
        true
    }

    /// Signed heading error, wrapped into (-π, π]
    pub fn desired_offset(&self) -> f64 {
        normalize_angle(self.desired_angle - self.angle)
    }

    /// Advance the heading by `dt` seconds
    pub fn update(&mut self, dt: f64, params: &AimParams) {
        let difference = self.desired_offset();

        let drag = params.drag.powf(dt);
        self.angular_speed = self.angular_speed * drag + sign(difference) * dt * params.drive;

        // Limit speed as a function of distance so large turns don't overshoot
        let max_speed = (difference * params.speed_limit_factor).abs();
        self.angular_speed = self.angular_speed.min(max_speed).max(-max_speed);

        self.angle += self.angular_speed * dt;
        // Wrapped, so a turn across ±π still lands on the desired heading
        if self.desired_offset().abs() < params.snap_epsilon {
            self.angle = self.desired_angle;
            self.angular_speed *= params.snap_damping;
        }
    }

    /// Whether the heading sits exactly on the desired heading
    pub fn is_settled(&self) -> bool {
        self.angle == self.desired_angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const STEP: f64 = 1.0 / 60.0;

    #[test]
    fn test_converges_to_half_turn_without_overshoot() {
        let params = AimParams::default();
        let mut aim = AimController::new(0.0);
        aim.desired_angle = PI;

        let mut steps = 0;
        while !aim.is_settled() {
            aim.update(STEP, &params);
            assert!(aim.angle <= PI + params.snap_epsilon);
            steps += 1;
            assert!(steps < 60 * 30, "aim did not settle");
        }
        assert_eq!(aim.angle, PI);
    }

    #[test]
    fn test_turns_the_short_way_round() {
        let params = AimParams::default();
        let mut aim = AimController::new(3.0);
        aim.desired_angle = -3.0;
        aim.update(STEP, &params);
        // Error wraps to about +0.28, so the heading increases
        assert!(aim.angular_speed > 0.0);
        assert!(aim.angle > 3.0);
    }

    #[test]
    fn test_settles_after_turning_across_half_turn() {
        let params = AimParams::default();
        let mut aim = AimController::new(3.0);
        aim.desired_angle = -3.0;
        for _ in 0..600 {
            aim.update(STEP, &params);
        }
        assert!(aim.is_settled());
        assert_eq!(aim.angle, -3.0);
    }

    #[test]
    fn test_error_wraps_for_far_wound_headings() {
        let mut aim = AimController::new(9.0 * 2.0 * PI + 0.1);
        aim.desired_angle = 0.3;
        assert!((aim.desired_offset() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_snap_damps_velocity() {
        let params = AimParams::default();
        let mut aim = AimController::new(1.0);
        aim.desired_angle = 1.001;
        aim.angular_speed = 0.01;
        aim.update(STEP, &params);
        assert_eq!(aim.angle, 1.001);
        assert!(aim.angular_speed.abs() < 0.01);
    }

    #[test]
    fn test_desired_vector_uses_screen_axes() {
        let mut aim = AimController::default();
        assert!(aim.set_desired_vector(DVec2::new(0.0, -2.0)));
        assert!((aim.desired_angle - FRAC_PI_2).abs() < 1e-12);

        assert!(!aim.set_desired_vector(DVec2::ZERO));
        assert!((aim.desired_angle - FRAC_PI_2).abs() < 1e-12);
    }
}
