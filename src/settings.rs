//! Level tuning
//!
//! Every per-level constant the simulation reads lives here so a level file
//! can override it. Missing fields fall back to the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SceneError;

/// Aim controller dynamics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AimParams {
    /// Fraction of angular velocity kept after one second
    pub drag: f64,
    /// Angular acceleration toward the desired heading (rad/s²)
    pub drive: f64,
    /// Heading error below which the aim snaps onto the desired heading
    pub snap_epsilon: f64,
    /// Angular speed is capped at this multiple of the remaining error
    pub speed_limit_factor: f64,
    /// Velocity multiplier applied when snapping
    pub snap_damping: f64,
}

impl Default for AimParams {
    fn default() -> Self {
        Self {
            drag: 0.7,
            drive: 0.6,
            snap_epsilon: 0.002,
            speed_limit_factor: 5.0,
            snap_damping: 0.2,
        }
    }
}

/// Facility power budget (measured in seconds of baseline drain)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReserveParams {
    /// Starting power (30 minutes)
    pub initial: f64,
    /// Drain multiplier while the laser is on
    pub laser_use_rate: f64,
    /// Seconds the "used by laser" marker holds after the laser stops
    pub hold_time: f64,
}

impl Default for ReserveParams {
    fn default() -> Self {
        Self {
            initial: 30.0 * 60.0,
            laser_use_rate: 10.0,
            hold_time: 3.0,
        }
    }
}

/// Per-level tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub aim: AimParams,

    // === Target ===
    /// Radius of the target disc
    pub target_radius: f64,
    /// Power lost per second while the beam is off the target
    pub target_power_decay: f64,
    /// Power (seconds on target) needed to complete the level
    pub target_power_required: f64,

    // === Beam ===
    /// Speed the active beam extends at (units/s)
    pub laser_speed: f64,
    /// Distance the aiming preview is traced to
    pub preview_distance: f64,

    // === Editor ===
    /// Points within this distance of a grid point snap onto it
    pub snap_distance: f64,
    /// Picking radius for features and vertices
    pub highlight_distance: f64,

    pub reserve: ReserveParams,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            aim: AimParams::default(),

            target_radius: 0.13,
            target_power_decay: 2.0,
            target_power_required: 3.0,

            laser_speed: 2.0,
            preview_distance: 10.0,

            snap_distance: 0.3,
            highlight_distance: 0.3,

            reserve: ReserveParams::default(),
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON (missing fields use defaults)
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Tuning saved to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "target_radius": 0.25, "aim": { "drive": 1.0 } }"#)
            .unwrap();
        assert_eq!(tuning.target_radius, 0.25);
        assert_eq!(tuning.aim.drive, 1.0);
        assert_eq!(tuning.aim.drag, 0.7);
        assert_eq!(tuning.laser_speed, 2.0);
        assert_eq!(tuning.reserve.initial, 1800.0);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let err = Tuning::from_json("{ target_radius: ").unwrap_err();
        assert!(matches!(err, SceneError::Json(_)));
    }

    #[test]
    fn test_json_roundtrip_keeps_values() {
        let mut tuning = Tuning::default();
        tuning.target_power_required = 5.5;
        let back = Tuning::from_json(&tuning.to_json().unwrap()).unwrap();
        assert_eq!(back, tuning);
    }
}
