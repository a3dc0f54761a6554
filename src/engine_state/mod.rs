//! # Engine State Module
//!
//! The core engine module that owns every subsystem of the voxel world.
//!
//! ## Key Components
//!
//! * `EngineState` - The main state container and the public entry point
//! * `config` - JSON configuration and validation
//! * `rendering` - Atlas layout, mesh extraction and mesh tasks
//! * `streaming` - Chunk creation, meshing and visibility around the viewer
//! * `task_management` - Worker threads running mesh extraction
//! * `voxels` - Blocks, chunks, terrain generation and the world
//!
//! ## Architecture
//!
//! There are no global singletons. `EngineState` builds the block registry,
//! the atlas, the terrain generator and the worker pool from one
//! `EngineConfig` and hands them to the streaming scheduler, which owns the
//! world. Everything is driven from the caller's thread through `update`;
//! only mesh extraction runs on workers.

use std::io;
use std::sync::Arc;

use cgmath::Point3;
use log::info;
use thiserror::Error;
use web_time::Duration;

use config::{ConfigError, EngineConfig};
use rendering::atlas::TextureAtlas;
use rendering::meshing::mesh::{ChunkMesh, MeshData};
use rendering::meshing::MeshExtractor;
use streaming::{StreamingScheduler, StreamingStats};
use task_management::TaskManager;
use voxels::block::{registry::BlockRegistry, BlockId};
use voxels::terrain::generator::TerrainGenerator;
use voxels::world::{World, WorldError};

pub mod config;
pub mod rendering;
pub mod streaming;
pub mod task_management;
pub mod voxels;

/// Errors surfaced by the engine's public API.
///
/// Terrain generation failures stay inside the streaming scheduler, which
/// drops the chunk and retries it on a later tick.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The configuration is unreadable or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A block edit failed.
    #[error(transparent)]
    World(#[from] WorldError),
    /// A worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] io::Error),
}

/// The main state container for the voxel engine
///
/// # Examples
///
/// ```no_run
/// use cgmath::Point3;
/// use voxel_world::engine_state::{config::EngineConfig, EngineState};
///
/// let mut engine = EngineState::new(EngineConfig::default()).unwrap();
///
/// // Main loop
/// loop {
///     engine.update(Point3::new(0.0, 40.0, 0.0));
/// }
/// ```
pub struct EngineState {
    config: EngineConfig,
    registry: Arc<BlockRegistry>,
    scheduler: StreamingScheduler,
}

impl EngineState {
    /// Creates a new engine state with all subsystems initialized
    ///
    /// # Arguments
    ///
    /// * `config` - Engine configuration; validated before anything is built
    ///
    /// # Returns
    ///
    /// The engine, or the first configuration or worker error
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let registry = Arc::new(BlockRegistry::new(config.blocks.clone()));
        let atlas = TextureAtlas::new(&config.meshing.atlas)?;
        atlas.check_blocks(&config.blocks);

        let extractor = Arc::new(MeshExtractor::new(
            Arc::clone(&registry),
            atlas,
            config.meshing.greedy,
        ));
        let generator = TerrainGenerator::new(config.seed, &config.terrain);
        let task_manager =
            TaskManager::new(config.worker_threads).map_err(EngineError::WorkerSpawn)?;

        info!(
            "Engine ready: seed {}, {} block types, {} workers, view {} x {}",
            config.seed,
            registry.len(),
            config.worker_threads,
            config.streaming.view_distance,
            config.streaming.view_distance_y
        );

        let scheduler =
            StreamingScheduler::new(&config.streaming, generator, extractor, task_manager);

        Ok(EngineState {
            config,
            registry,
            scheduler,
        })
    }

    /// The configuration the engine was built from.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The block definitions in use.
    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Read access to the loaded world.
    pub fn world(&self) -> &World {
        self.scheduler.world()
    }

    /// The streaming scheduler.
    pub fn scheduler(&self) -> &StreamingScheduler {
        &self.scheduler
    }

    /// Runs one streaming tick for a viewer at `viewer_position`
    ///
    /// Never blocks on workers.
    pub fn update(&mut self, viewer_position: Point3<f32>) {
        self.scheduler.tick(viewer_position);
    }

    /// Applies finished meshes without running a full tick
    pub fn process_tasks(&mut self) {
        self.scheduler.process_tasks();
    }

    /// Blocks until every submitted mesh has been applied or `timeout` passes
    ///
    /// # Returns
    ///
    /// `true` if no mesh work is left in flight
    pub fn wait_for_meshes(&mut self, timeout: Duration) -> bool {
        self.scheduler.wait_for_meshes(timeout)
    }

    /// Returns the block at a world position (air if not loaded)
    pub fn block_at(&self, world_pos: Point3<i32>) -> BlockId {
        self.scheduler.block_at(world_pos)
    }

    /// Edits a block; affected chunks are remeshed on the next `update`
    ///
    /// # Returns
    ///
    /// The chunk coordinates marked for remeshing
    pub fn set_block(
        &mut self,
        world_pos: Point3<i32>,
        block: BlockId,
    ) -> Result<Vec<Point3<i32>>, EngineError> {
        Ok(self.scheduler.set_block(world_pos, block)?)
    }

    /// Changes the view radii; offsets are rebuilt on the next `update`
    pub fn set_view_distance(&mut self, view_distance: i32, view_distance_y: i32) {
        self.scheduler.set_view_distance(view_distance, view_distance_y);
    }

    /// The current mesh of a chunk, if one has been applied
    pub fn chunk_mesh(&self, position: Point3<i32>) -> Option<&ChunkMesh> {
        self.world()
            .get_chunk_at(position)
            .and_then(|chunk| chunk.render_state.mesh.as_ref())
    }

    /// The collider mesh of a chunk, if one is attached
    pub fn collider(&self, position: Point3<i32>) -> Option<Arc<MeshData>> {
        self.world()
            .get_chunk_at(position)
            .and_then(|chunk| chunk.render_state.collider.clone())
    }

    /// Whether a chunk is loaded, meshed and currently visible
    pub fn is_chunk_active(&self, position: Point3<i32>) -> bool {
        self.world()
            .get_chunk_at(position)
            .is_some_and(|chunk| chunk.render_state.is_active)
    }

    /// Work counters of the streaming scheduler
    pub fn stats(&self) -> StreamingStats {
        self.scheduler.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_configs_are_rejected() {
        let mut config = EngineConfig::default();
        config.streaming.max_creates_per_tick = 0;
        assert!(matches!(
            EngineState::new(config),
            Err(EngineError::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn edits_to_unloaded_chunks_fail() {
        let config = EngineConfig {
            worker_threads: 0,
            ..EngineConfig::default()
        };
        let mut engine = EngineState::new(config).unwrap();
        let result = engine.set_block(Point3::new(0, 0, 0), 1);
        assert!(matches!(
            result,
            Err(EngineError::World(WorldError::ChunkNotLoaded { .. }))
        ));
    }

    #[test]
    fn errors_keep_their_source() {
        use std::error::Error as _;

        let spawn = EngineError::WorkerSpawn(io::Error::new(io::ErrorKind::Other, "no threads"));
        assert_eq!(spawn.to_string(), "failed to spawn worker thread: no threads");
        assert!(spawn.source().is_some());

        let edit = EngineError::from(WorldError::ChunkNotLoaded {
            chunk: Point3::new(0, 0, 0),
            block: Point3::new(1, 2, 3),
        });
        assert!(edit.to_string().contains("not loaded"));
    }
}
