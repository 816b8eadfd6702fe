//! Deterministic simulation module
//!
//! All puzzle logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by feature index)
//! - No rendering or platform dependencies

pub mod aim;
pub mod edit;
pub mod feature;
pub mod generate;
pub mod geom;
pub mod region;
pub mod state;
pub mod tick;
pub mod trace;

pub use aim::AimController;
pub use edit::{snap_to_grid, snap_to_half_grid};
pub use feature::{Feature, FeatureId, FeatureKind, refractive_index};
pub use generate::generate_level;
pub use geom::{Ray, Rect};
pub use region::{Region, extract_regions, outer_region};
pub use state::{Emitter, LevelPhase, PowerReserve, Scene, Session};
pub use tick::{TickInput, TickReport, tick};
pub use trace::{Interaction, Path, Target, hit_target, interact};
