//! Laser Maze headless runner
//!
//! Loads or generates a level, then plays it with the laser held on and aimed
//! at the target, using the same fixed-timestep loop a frontend would.

use std::path::PathBuf;

use clap::Parser;

use laser_maze::consts::{MAX_SUBSTEPS, SIM_DT};
use laser_maze::sim::{LevelPhase, Scene, Session, TickInput, generate_level, tick};
use laser_maze::{SceneError, Tuning};

/// Frame interval of the simulated display
const FRAME_DT: f64 = 1.0 / 60.0;

#[derive(Debug, Parser)]
#[command(name = "laser-maze", version, about = "Play a laser maze level headlessly")]
struct Args {
    /// Scene JSON to load
    #[arg(conflicts_with = "seed")]
    scene: Option<PathBuf>,

    /// Generate a level from this seed instead of loading one
    #[arg(short, long)]
    seed: Option<u64>,

    /// Tuning JSON overriding the scene's tuning
    #[arg(short, long, value_name = "FILE")]
    tuning: Option<PathBuf>,

    /// Simulated seconds to run before giving up
    #[arg(long, default_value_t = 30.0)]
    seconds: f64,

    /// Write the scene as JSON after loading or generating it
    #[arg(long, value_name = "FILE")]
    save: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    log::info!("Laser Maze (headless) starting...");

    let args = Args::parse();
    if let Err(e) = run(&args) {
        log::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), SceneError> {
    let tuning = match &args.tuning {
        Some(path) => Some(Tuning::load(path)?),
        None => None,
    };

    let mut scene = match &args.scene {
        Some(path) => Scene::load(path)?,
        None => generate_level(args.seed.unwrap_or(0), tuning.clone().unwrap_or_default()),
    };
    if let Some(tuning) = tuning {
        scene.target.radius = tuning.target_radius;
        scene.tuning = tuning;
    }
    if let Some(path) = &args.save {
        scene.save(path)?;
    }

    print_regions(&scene);

    let mut session = Session::new(scene);
    let input = TickInput {
        aim_vector: Some(session.scene.target.location - session.scene.emitter.location),
        laser_on: true,
    };

    let mut accumulator = 0.0;
    let mut elapsed = 0.0;
    while session.phase == LevelPhase::Playing && elapsed < args.seconds {
        accumulator += FRAME_DT;
        elapsed += FRAME_DT;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut session, &input, SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;
        }
    }

    print_path(&session);
    println!(
        "outcome: {:?} after {} ticks, target power {:.2}, reserve {:.1}/{:.1}",
        session.phase,
        session.time_ticks,
        session.scene.emitter.power,
        session.reserve.remaining,
        session.reserve.starting
    );
    Ok(())
}

fn print_regions(scene: &Scene) {
    let area = scene.level_area();
    println!(
        "{} features, level area {:.1} x {:.1}",
        scene.features().len(),
        area.width(),
        area.height()
    );
    for (i, region) in scene.regions().iter().enumerate() {
        println!(
            "  region {i}: {} edges, area {:.2}, bounds ({:.1}, {:.1})-({:.1}, {:.1})",
            region.perimeter.len(),
            region.area,
            region.bounds.min.x,
            region.bounds.min.y,
            region.bounds.max.x,
            region.bounds.max.y
        );
    }
}

fn print_path(session: &Session) {
    let Some(path) = &session.path else {
        println!("no beam traced");
        return;
    };
    println!("beam path ({:.2} traced):", path.traced_distance);
    for interaction in &path.interactions {
        let Some(ray) = &interaction.ray_in else {
            continue;
        };
        let end = ray.end();
        let what = if interaction.hit_target {
            "target".to_string()
        } else {
            let id = interaction.feature.map_or(0, |id| id.0);
            match interaction.ray_out {
                Some(_) => format!("reflect off feature {id}"),
                None => format!("absorbed by feature {id}"),
            }
        };
        println!("  ({:.3}, {:.3}) {what}", end.x, end.y);
    }
    if !path.is_terminal() {
        println!("  ...beam continues");
    }
}
