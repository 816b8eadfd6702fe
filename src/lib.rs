//! Laser Maze - simulation core for a 2D laser-reflection puzzle
//!
//! Core modules:
//! - `sim`: Deterministic simulation (ray tracing, aim control, region extraction)
//! - `settings`: Data-driven level tuning
//! - `error`: Recoverable scene/config errors

pub mod error;
pub mod settings;
pub mod sim;

pub use error::SceneError;
pub use settings::{AimParams, ReserveParams, Tuning};

use glam::DVec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (the game loop ticks every 20ms)
    pub const SIM_DT: f64 = 0.02;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Distance a reflected ray is pushed off the surface it bounced from
    pub const REFLECT_ADVANCE: f64 = 0.0001;

    /// Default room the level generator builds (width x height)
    pub const ROOM_WIDTH: f64 = 10.0;
    pub const ROOM_HEIGHT: f64 = 8.0;

    /// Exit target sits this far inside the exit door
    pub const EXIT_TARGET_INSET: f64 = 1.0;
}

/// Normalized angle to (-π, π]
#[inline]
pub fn normalize_angle(mut angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}

/// Sign of a value as -1, 0 or 1 (zero stays zero, unlike `f64::signum`)
#[inline]
pub fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Heading (radians, y axis pointing down) to a unit direction
#[inline]
pub fn heading_to_direction(angle: f64) -> DVec2 {
    DVec2::new(angle.cos(), -angle.sin())
}

/// Direction vector to heading (radians, y axis pointing down)
#[inline]
pub fn direction_to_heading(v: DVec2) -> f64 {
    (-v.y).atan2(v.x)
}
