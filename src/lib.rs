#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! A streaming voxel terrain engine: procedural terrain generation, chunk
//! streaming around a moving viewer, and greedy mesh extraction on worker
//! threads.
//!
//! The crate is graphics-API agnostic. It produces per-chunk mesh payloads
//! (positions, normals, atlas UVs, indices) for a renderer and shared solid
//! meshes for a physics engine, and leaves uploading and simulation to them.
//!
//! ## Key Modules
//!
//! * `engine_state` - The engine entry point and all of its subsystems
//!
//! ## Architecture
//!
//! * Terrain: layered Perlin height field, cave carving, strata and trees
//! * World: sparse chunk storage with cross-chunk block queries and edits
//! * Meshing: halo snapshots, face culling and greedy quad merging
//! * Streaming: nearest-first creation, neighbor-gated meshing, revisioned results
//!
//! ## Usage
//!
//! ```no_run
//! use cgmath::Point3;
//! use voxel_world::engine_state::{config::EngineConfig, EngineState};
//! use web_time::Duration;
//!
//! let mut engine = EngineState::new(EngineConfig::default()).unwrap();
//! for _ in 0..100 {
//!     engine.update(Point3::new(8.0, 60.0, 8.0));
//! }
//! engine.wait_for_meshes(Duration::from_secs(5));
//! println!("{:?}", engine.stats());
//! ```

use std::env;

use cgmath::Point3;
use log::{info, warn};
use web_time::{Duration, Instant};

pub mod engine_state;

pub use engine_state::{config::EngineConfig, EngineError, EngineState};

/// Number of ticks the headless demo runs.
const DEMO_TICKS: usize = 600;

/// Blocks the demo viewer moves along +X per tick.
const DEMO_SPEED: f32 = 0.25;

/// Runs the headless demo.
///
/// Loads the JSON configuration named by the first command line argument,
/// or the defaults, walks a viewer along +X and logs streaming statistics.
pub fn run() -> Result<(), EngineError> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = match env::args().nth(1) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let start = Instant::now();
    let mut engine = EngineState::new(config)?;
    let generator = engine.scheduler().generator();
    let eye_height = generator.ground_level_at(8, 8).max(generator.water_level()) as f32 + 2.0;

    for tick in 0..DEMO_TICKS {
        let viewer = Point3::new(8.0 + tick as f32 * DEMO_SPEED, eye_height, 8.0);
        engine.update(viewer);
    }

    if !engine.wait_for_meshes(Duration::from_secs(30)) {
        warn!("Mesh workers did not finish within 30s");
    }

    let stats = engine.stats();
    info!(
        "Ran {} ticks in {:?}: {} chunks loaded, {} meshes applied",
        DEMO_TICKS,
        start.elapsed(),
        engine.world().len(),
        stats.meshes_applied
    );
    match serde_json::to_string_pretty(&stats) {
        Ok(json) => info!("Streaming stats: {}", json),
        Err(error) => warn!("Could not serialize stats: {}", error),
    }
    Ok(())
}
