//! # Streaming Scheduler
//!
//! Keeps the chunks around a moving viewer resident and meshed.
//!
//! ## Chunk Lifecycle
//!
//! ```text
//! Unwanted -> QueuedForCreation -> Created -> QueuedForGeneration
//!          -> Generated (mesh requested) -> MeshReady (active / inactive)
//! ```
//!
//! `Unwanted` and `QueuedForCreation` are tracked by the scheduler's queue
//! and set; every later state lives on the chunk itself.
//!
//! Chunks waiting for a mesh are either queued or parked. A chunk is parked
//! while a face neighbor is missing or while it is out of view, and goes
//! back to the queue when a neighbor is created or the view covers it again.
//! The mesh queue therefore only holds chunks in view.
//!
//! ## Tick
//!
//! 1. When the viewer entered another chunk (or the view must be
//!    refreshed), walk the view offsets, queue every missing chunk for
//!    creation and move parked chunks back into the mesh queue.
//! 2. Create and generate up to `max_creates_per_tick` chunks.
//! 3. Request up to `max_generates_per_tick` meshes. Blocked chunks are
//!    parked and do not count against the cap.
//! 4. Remesh chunks dirtied by block edits.
//! 5. Apply finished meshes.
//! 6. When the viewer moved past the update threshold, recompute
//!    visibility, colliders and eviction.
//!
//! None of these steps blocks on a worker.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use cgmath::{MetricSpace, Point3};
use log::{debug, info, warn};
use web_time::{Duration, Instant};

use crate::engine_state::config::StreamingSettings;
use crate::engine_state::rendering::meshing::{mesh::ChunkMesh, HaloVolume, MeshExtractor};
use crate::engine_state::rendering::tasks::chunk_mesh_generation_task::ChunkMeshGenerationTask;
use crate::engine_state::task_management::{task::TaskContext, TaskManager};
use crate::engine_state::voxels::block::{block_side::BlockSide, BlockId};
use crate::engine_state::voxels::chunk::{Chunk, ChunkLifecycle};
use crate::engine_state::voxels::terrain::generator::TerrainGenerator;
use crate::engine_state::voxels::world::{World, WorldError};

use super::{StreamingStats, ViewOffsets};

/// Owns the world and drives chunk creation, meshing and visibility.
pub struct StreamingScheduler {
    settings: StreamingSettings,
    world: World,
    generator: TerrainGenerator,
    extractor: Arc<MeshExtractor>,
    task_manager: TaskManager,
    view_offsets: ViewOffsets,
    chunks_to_create: VecDeque<Point3<i32>>,
    queued_chunks: HashSet<Point3<i32>>,
    chunks_to_generate: VecDeque<Point3<i32>>,
    parked_chunks: HashSet<Point3<i32>>,
    active_chunks: HashSet<Point3<i32>>,
    last_update_position: Option<Point3<f32>>,
    last_viewer_chunk: Option<Point3<i32>>,
    viewer_position: Point3<f32>,
    needs_refresh: bool,
    stats: StreamingStats,
}

impl StreamingScheduler {
    /// Creates a scheduler with an empty world.
    ///
    /// # Arguments
    /// * `settings` - View radii, per-tick caps and visibility options
    /// * `generator` - Terrain generator filling new chunks
    /// * `extractor` - Mesh extractor shared with mesh tasks
    /// * `task_manager` - Worker pool running mesh tasks
    pub fn new(
        settings: &StreamingSettings,
        generator: TerrainGenerator,
        extractor: Arc<MeshExtractor>,
        task_manager: TaskManager,
    ) -> Self {
        StreamingScheduler {
            settings: settings.clone(),
            world: World::new(),
            generator,
            extractor,
            task_manager,
            view_offsets: ViewOffsets::new(settings.view_distance, settings.view_distance_y),
            chunks_to_create: VecDeque::new(),
            queued_chunks: HashSet::new(),
            chunks_to_generate: VecDeque::new(),
            parked_chunks: HashSet::new(),
            active_chunks: HashSet::new(),
            last_update_position: None,
            last_viewer_chunk: None,
            viewer_position: Point3::new(0.0, 0.0, 0.0),
            needs_refresh: true,
            stats: StreamingStats::default(),
        }
    }

    /// The world owned by the scheduler.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The terrain generator.
    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    /// Current streaming settings.
    pub fn settings(&self) -> &StreamingSettings {
        &self.settings
    }

    /// Work counters since creation.
    pub fn stats(&self) -> StreamingStats {
        self.stats
    }

    /// The precomputed view offsets.
    pub fn view_offsets(&self) -> &ViewOffsets {
        &self.view_offsets
    }

    /// Chunks waiting to be created.
    pub fn pending_creations(&self) -> usize {
        self.chunks_to_create.len()
    }

    /// Chunks in view queued for a mesh request.
    pub fn pending_generations(&self) -> usize {
        self.chunks_to_generate.len()
    }

    /// Chunks waiting for a mesh that are blocked on a missing neighbor or
    /// out of view.
    pub fn parked_generations(&self) -> usize {
        self.parked_chunks.len()
    }

    /// Chunks that were in view at the last visibility update.
    pub fn active_chunks(&self) -> &HashSet<Point3<i32>> {
        &self.active_chunks
    }

    /// Mesh tasks queued or running.
    pub fn meshes_in_flight(&self) -> usize {
        self.task_manager.in_flight() + self.task_manager.queued()
    }

    /// Changes the view radii. Offsets are rebuilt on the next tick.
    pub fn set_view_distance(&mut self, view_distance: i32, view_distance_y: i32) {
        self.settings.view_distance = view_distance;
        self.settings.view_distance_y = view_distance_y;
    }

    /// Returns the block at a world position (air if not loaded).
    pub fn block_at(&self, world_pos: Point3<i32>) -> BlockId {
        self.world.block_at(world_pos)
    }

    /// Edits a block. Affected chunks are remeshed on the next tick.
    ///
    /// # Returns
    /// The chunks marked dirty by the edit.
    pub fn set_block(
        &mut self,
        world_pos: Point3<i32>,
        block: BlockId,
    ) -> Result<Vec<Point3<i32>>, WorldError> {
        self.world.set_block(world_pos, block)
    }

    /// Runs one scheduler tick for a viewer at `viewer_position`.
    pub fn tick(&mut self, viewer_position: Point3<f32>) {
        let start = Instant::now();
        self.stats.ticks += 1;
        self.viewer_position = viewer_position;

        if self
            .view_offsets
            .is_stale(self.settings.view_distance, self.settings.view_distance_y)
        {
            info!(
                "View distance changed to {} x {}",
                self.settings.view_distance, self.settings.view_distance_y
            );
            self.view_offsets =
                ViewOffsets::new(self.settings.view_distance, self.settings.view_distance_y);
            self.needs_refresh = true;
        }

        let threshold = self.settings.chunk_update_threshold;
        let moved = match self.last_update_position {
            Some(last) => last.distance2(viewer_position) >= threshold * threshold,
            None => true,
        };
        let refresh = moved || self.needs_refresh;
        let viewer_chunk = World::chunk_coord_of_point(viewer_position);

        if refresh || self.last_viewer_chunk != Some(viewer_chunk) {
            self.enqueue_wanted(viewer_chunk);
            self.requeue_for_view(viewer_chunk);
            self.last_viewer_chunk = Some(viewer_chunk);
        }
        self.create_chunks(viewer_chunk);
        self.request_meshes(viewer_chunk);
        self.remesh_dirty();
        self.apply_completed();

        if refresh {
            self.update_visibility(viewer_chunk);
            self.last_update_position = Some(viewer_position);
            self.needs_refresh = false;
        }

        debug!(
            "Tick {} took {:?}: {} to create, {} to generate, {} meshes in flight",
            self.stats.ticks,
            start.elapsed(),
            self.chunks_to_create.len(),
            self.chunks_to_generate.len(),
            self.meshes_in_flight()
        );
    }

    /// Drains finished meshes without running a tick.
    pub fn process_tasks(&mut self) {
        self.apply_completed();
    }

    /// Blocks until all submitted meshes are applied or `timeout` passes.
    ///
    /// # Returns
    /// `true` if nothing is left in flight.
    pub fn wait_for_meshes(&mut self, timeout: Duration) -> bool {
        let mut applied = Vec::new();
        let idle = {
            let mut context = TaskContext {
                world: &mut self.world,
                stats: &mut self.stats,
                applied: &mut applied,
            };
            self.task_manager.block_until_idle(&mut context, timeout)
        };
        self.stats.failed_tasks = self.task_manager.failed_tasks();
        self.attach_colliders(&applied);
        idle
    }

    /// Step 1: queue every missing chunk in view for creation, nearest first.
    fn enqueue_wanted(&mut self, viewer_chunk: Point3<i32>) {
        for offset in self.view_offsets.offsets() {
            let position = viewer_chunk + *offset;
            if !self.world.contains_chunk(position) && self.queued_chunks.insert(position) {
                self.chunks_to_create.push_back(position);
            }
        }
    }

    /// Step 2: allocate, generate and insert queued chunks.
    fn create_chunks(&mut self, viewer_chunk: Point3<i32>) {
        let mut created = 0;
        while created < self.settings.max_creates_per_tick {
            let Some(position) = self.chunks_to_create.pop_front() else {
                break;
            };
            self.queued_chunks.remove(&position);

            // The viewer may have moved on since the chunk was queued.
            if !self.view_offsets.contains(viewer_chunk, position) {
                continue;
            }

            let mut chunk = Chunk::new(position);
            if let Err(error) = self.generator.generate(&mut chunk) {
                warn!("Dropping chunk {:?}: {}", position, error);
                self.stats.generation_failures += 1;
                self.needs_refresh = true;
                continue;
            }

            chunk.lifecycle = ChunkLifecycle::QueuedForGeneration;
            self.world.insert_chunk(chunk);
            self.chunks_to_generate.push_back(position);
            self.wake_neighbors(position, viewer_chunk);
            self.stats.chunks_created += 1;
            created += 1;
        }
    }

    /// Moves parked neighbors of a new chunk that are in view and now
    /// complete back into the mesh queue.
    fn wake_neighbors(&mut self, position: Point3<i32>, viewer_chunk: Point3<i32>) {
        for side in BlockSide::all() {
            let neighbor = position + side.normal();
            if self.parked_chunks.contains(&neighbor)
                && self.view_offsets.contains(viewer_chunk, neighbor)
                && self.world.has_all_neighbors(neighbor)
            {
                self.parked_chunks.remove(&neighbor);
                self.chunks_to_generate.push_back(neighbor);
            }
        }
    }

    /// Parks queued chunks that left the view and queues parked chunks the
    /// view covers again, nearest first.
    fn requeue_for_view(&mut self, viewer_chunk: Point3<i32>) {
        let view_offsets = &self.view_offsets;
        let parked_chunks = &mut self.parked_chunks;
        self.chunks_to_generate.retain(|position| {
            let visible = view_offsets.contains(viewer_chunk, *position);
            if !visible {
                parked_chunks.insert(*position);
            }
            visible
        });

        let mut resumed: Vec<_> = self
            .parked_chunks
            .iter()
            .copied()
            .filter(|position| {
                self.view_offsets.contains(viewer_chunk, *position)
                    && self.world.has_all_neighbors(*position)
            })
            .collect();
        resumed.sort_by_key(|position| {
            let offset = *position - viewer_chunk;
            (
                offset.x.abs().max(offset.y.abs()).max(offset.z.abs()),
                offset.x * offset.x + offset.y * offset.y + offset.z * offset.z,
            )
        });
        for position in resumed {
            self.parked_chunks.remove(&position);
            self.chunks_to_generate.push_back(position);
        }
    }

    /// Step 3: request meshes for queued chunks whose neighbors all exist.
    fn request_meshes(&mut self, viewer_chunk: Point3<i32>) {
        let mut requested = 0;
        while requested < self.settings.max_generates_per_tick {
            let Some(position) = self.chunks_to_generate.pop_front() else {
                break;
            };
            if !self.world.contains_chunk(position) {
                continue;
            }
            if !self.view_offsets.contains(viewer_chunk, position) {
                self.parked_chunks.insert(position);
                continue;
            }
            if !self.world.has_all_neighbors(position) {
                self.parked_chunks.insert(position);
                self.stats.generation_retries += 1;
                continue;
            }
            self.request_mesh(position);
            requested += 1;
        }
    }

    /// Step 4: remesh chunks whose blocks or boundary neighbors changed.
    fn remesh_dirty(&mut self) {
        let mut dirty = self.world.take_dirty();
        dirty.sort_by_key(|position| (position.x, position.y, position.z));
        for position in dirty {
            let requested = self
                .world
                .get_chunk_at(position)
                .is_some_and(Chunk::has_requested_mesh);
            if requested {
                self.request_mesh(position);
            }
        }
    }

    /// Submits a mesh task under a new revision. Air-only chunks get an
    /// empty mesh right away.
    fn request_mesh(&mut self, position: Point3<i32>) {
        let air_only = match self.world.get_chunk_at(position) {
            Some(chunk) => chunk.is_air_only,
            None => return,
        };

        if air_only {
            if let Some(chunk) = self.world.get_chunk_at_mut(position) {
                let revision = chunk.render_state.next_revision();
                chunk.render_state.apply_mesh(revision, ChunkMesh::default());
                chunk.render_state.collider = None;
                if chunk.lifecycle != ChunkLifecycle::MeshReady {
                    chunk.lifecycle = ChunkLifecycle::MeshReady;
                    chunk.render_state.is_active = true;
                }
                self.stats.empty_meshes += 1;
            }
            return;
        }

        let Some(halo) = HaloVolume::build(&self.world, position) else {
            return;
        };
        let Some(chunk) = self.world.get_chunk_at_mut(position) else {
            return;
        };
        let revision = chunk.render_state.next_revision();
        if chunk.lifecycle != ChunkLifecycle::MeshReady {
            chunk.lifecycle = ChunkLifecycle::Generated;
        }

        self.task_manager.publish_task(Box::new(ChunkMeshGenerationTask::new(
            revision,
            halo,
            Arc::clone(&self.extractor),
        )));
        self.stats.meshes_submitted += 1;
    }

    /// Step 5: apply every mesh that has arrived.
    fn apply_completed(&mut self) {
        self.task_manager.process_queued_tasks();

        let mut applied = Vec::new();
        {
            let mut context = TaskContext {
                world: &mut self.world,
                stats: &mut self.stats,
                applied: &mut applied,
            };
            self.task_manager.process_completed_tasks(&mut context);
        }
        self.stats.failed_tasks = self.task_manager.failed_tasks();

        self.task_manager.process_queued_tasks();
        self.attach_colliders(&applied);
    }

    /// Step 6: visibility, colliders and eviction after the viewer moved.
    fn update_visibility(&mut self, viewer_chunk: Point3<i32>) {
        let mut current_active = HashSet::new();
        for offset in self.view_offsets.offsets() {
            let position = viewer_chunk + *offset;
            if self.world.contains_chunk(position) {
                current_active.insert(position);
            }
        }

        if self.settings.deactivate_out_of_range {
            for previous in &self.active_chunks {
                let visible = self.view_offsets.contains(viewer_chunk, *previous);
                if let Some(chunk) = self.world.get_chunk_at_mut(*previous) {
                    chunk.render_state.is_active = visible;
                }
            }
            for position in &current_active {
                if let Some(chunk) = self.world.get_chunk_at_mut(*position) {
                    if chunk.lifecycle == ChunkLifecycle::MeshReady {
                        chunk.render_state.is_active = true;
                    }
                }
            }
        }

        let candidates: Vec<_> = current_active.iter().copied().collect();
        self.attach_colliders(&candidates);
        self.active_chunks = current_active;

        if self.settings.evict_out_of_range {
            self.evict(viewer_chunk);
        }
    }

    /// Drops chunks outside the view volume grown by the eviction margin.
    fn evict(&mut self, viewer_chunk: Point3<i32>) {
        let margin = self.settings.eviction_margin;
        let doomed: Vec<_> = self
            .world
            .chunk_positions()
            .into_iter()
            .filter(|position| {
                !self
                    .view_offsets
                    .contains_with_margin(viewer_chunk, *position, margin)
            })
            .collect();

        for position in doomed {
            self.world.remove_chunk(position);
            self.active_chunks.remove(&position);
            self.parked_chunks.remove(&position);
            self.stats.chunks_evicted += 1;
        }
    }

    /// Hands the solid mesh of eligible chunks to the physics side.
    ///
    /// A chunk is eligible when it has a mesh, is not air-only and its
    /// origin is within `collider_distance` blocks of the viewer.
    fn attach_colliders(&mut self, positions: &[Point3<i32>]) {
        if !self.settings.add_colliders {
            return;
        }
        let max_distance = self.settings.collider_distance;

        for position in positions {
            let Some(chunk) = self.world.get_chunk_at_mut(*position) else {
                continue;
            };
            if chunk.is_air_only || chunk.render_state.collider.is_some() {
                continue;
            }
            let Some(mesh) = chunk.render_state.mesh.as_ref() else {
                continue;
            };

            let origin = chunk.origin().cast::<f32>();
            let in_range = origin.is_some_and(|origin| {
                origin.distance2(self.viewer_position) <= max_distance * max_distance
            });
            if in_range {
                chunk.render_state.collider = Some(Arc::clone(&mesh.solid));
                self.stats.colliders_attached += 1;
            }
        }
    }
}
