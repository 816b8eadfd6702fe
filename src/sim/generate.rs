//! Seeded level generation
//!
//! Same seed, same level: the generator draws from a PCG32 stream and nothing
//! else.

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::feature::Feature;
use super::state::{Emitter, Scene};
use crate::consts::{ROOM_HEIGHT, ROOM_WIDTH};
use crate::settings::Tuning;

/// Emitter spawn point
pub const EMITTER_START: DVec2 = DVec2::new(1.5, 1.5);
/// Default target location
pub const TARGET_START: DVec2 = DVec2::new(4.5, 2.5);

const MIN_MIRRORS: u32 = 2;
const MAX_MIRRORS: u32 = 4;
const MAX_ATTEMPTS: u32 = 32;
/// Mirrors keep at least this far from the target centre
const TARGET_CLEARANCE: f64 = 0.75;

/// Closed rectangular room with a corner at the origin
pub fn room_walls(width: f64, height: f64) -> Vec<Feature> {
    vec![
        Feature::wall(DVec2::new(0.0, 0.0), DVec2::new(width, 0.0)),
        Feature::wall(DVec2::new(width, 0.0), DVec2::new(width, height)),
        Feature::wall(DVec2::new(width, height), DVec2::new(0.0, height)),
        Feature::wall(DVec2::new(0.0, height), DVec2::new(0.0, 0.0)),
    ]
}

/// Build a playable level from `seed`
pub fn generate_level(seed: u64, tuning: Tuning) -> Scene {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut features = room_walls(ROOM_WIDTH, ROOM_HEIGHT);
    let wall_count = features.len();

    let wanted = rng.random_range(MIN_MIRRORS..=MAX_MIRRORS);
    let mut attempts = 0;
    while features.len() - wall_count < wanted as usize && attempts < MAX_ATTEMPTS {
        attempts += 1;
        let mirror = random_mirror(&mut rng);
        if mirror.distance_to_point(TARGET_START) < TARGET_CLEARANCE {
            continue;
        }
        let duplicate = features.iter().any(|f| {
            (f.p1() == mirror.p1() && f.p2() == mirror.p2())
                || (f.p1() == mirror.p2() && f.p2() == mirror.p1())
        });
        if duplicate {
            continue;
        }
        features.push(mirror);
    }

    log::debug!(
        "generated level for seed {}: {} mirrors in {} attempts",
        seed,
        features.len() - wall_count,
        attempts
    );
    Scene::new(features, Emitter::new(EMITTER_START, DVec2::X), TARGET_START, tuning)
}

/// Unit mirror on the integer grid, well clear of the room walls and the
/// emitter corner
fn random_mirror(rng: &mut Pcg32) -> Feature {
    if rng.random_bool(0.5) {
        let x = rng.random_range(3..=6) as f64;
        let y = rng.random_range(3..=5) as f64;
        Feature::wall(DVec2::new(x, y), DVec2::new(x + 1.0, y))
    } else {
        let x = rng.random_range(3..=7) as f64;
        let y = rng.random_range(3..=4) as f64;
        Feature::wall(DVec2::new(x, y), DVec2::new(x, y + 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_level() {
        let a = generate_level(42, Tuning::default());
        let b = generate_level(42, Tuning::default());
        assert_eq!(a.features(), b.features());
        assert_eq!(a.emitter, b.emitter);
    }

    #[test]
    fn test_seeds_vary_the_level() {
        let first = generate_level(0, Tuning::default());
        let differs = (1..16).any(|seed| generate_level(seed, Tuning::default()).features() != first.features());
        assert!(differs);
    }

    #[test]
    fn test_room_is_the_outer_region() {
        for seed in 0..8 {
            let scene = generate_level(seed, Tuning::default());
            let outer = scene.outer_region().unwrap();
            assert!((outer.area - ROOM_WIDTH * ROOM_HEIGHT).abs() < 1e-9);
            assert_eq!(scene.emitter.location, EMITTER_START);
            assert_eq!(scene.target.location, TARGET_START);
        }
    }

    #[test]
    fn test_mirrors_stay_inside_and_clear_of_target() {
        for seed in 0..32 {
            let scene = generate_level(seed, Tuning::default());
            let mirrors = &scene.features()[4..];
            assert!(mirrors.len() >= MIN_MIRRORS as usize);
            for mirror in mirrors {
                for point in [mirror.p1(), mirror.p2()] {
                    assert!(point.x > 2.0 && point.x < 8.0);
                    assert!(point.y > 2.0 && point.y < 6.0);
                }
                assert!(mirror.distance_to_point(TARGET_START) >= TARGET_CLEARANCE);
            }
        }
    }
}
