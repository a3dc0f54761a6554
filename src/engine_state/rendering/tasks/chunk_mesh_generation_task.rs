//! Task for generating mesh data for chunks in a background thread.
//!
//! This module contains the `ChunkMeshGenerationTask`, which turns a halo
//! snapshot into a `ChunkMesh` on a worker and hands it back to the control
//! thread tagged with the revision it was requested under.

use std::sync::Arc;

use cgmath::Point3;
use log::trace;

use crate::engine_state::{
    rendering::meshing::{mesh::ChunkMesh, HaloVolume, MeshExtractor},
    task_management::task::{Task, TaskContext, TaskResult},
    voxels::chunk::ChunkLifecycle,
};

/// A task that generates mesh data for a chunk in a background thread.
///
/// This task owns:
/// 1. A point-in-time halo copy of the chunk and its border
/// 2. The revision number the mesh is requested under
/// 3. A shared handle to the extractor
pub struct ChunkMeshGenerationTask {
    /// The chunk the mesh belongs to
    position: Point3<i32>,
    /// Revision reserved on the chunk when the task was created
    revision: u64,
    /// Snapshot of the chunk and its neighbors' border cells
    halo: HaloVolume,
    /// Shared mesh extractor
    extractor: Arc<MeshExtractor>,
}

impl ChunkMeshGenerationTask {
    /// Creates a new chunk mesh generation task.
    ///
    /// # Arguments
    /// * `revision` - The revision reserved via `ChunkRenderState::next_revision`
    /// * `halo` - Snapshot of the chunk to mesh
    /// * `extractor` - The extractor shared by all mesh tasks
    ///
    /// # Returns
    /// A new `ChunkMeshGenerationTask` instance
    pub fn new(revision: u64, halo: HaloVolume, extractor: Arc<MeshExtractor>) -> Self {
        ChunkMeshGenerationTask {
            position: halo.position(),
            revision,
            halo,
            extractor,
        }
    }
}

impl Task for ChunkMeshGenerationTask {
    /// Extracts the mesh from the halo snapshot.
    fn process(&self) -> Box<dyn TaskResult + Send> {
        Box::new(ChunkMeshGenerationTaskResult {
            position: self.position,
            revision: self.revision,
            mesh: self.extractor.extract(&self.halo),
        })
    }

    fn describe(&self) -> String {
        format!("mesh of chunk {:?} rev {}", self.position, self.revision)
    }
}

/// The result of a chunk mesh generation task.
pub struct ChunkMeshGenerationTaskResult {
    position: Point3<i32>,
    revision: u64,
    mesh: ChunkMesh,
}

impl TaskResult for ChunkMeshGenerationTaskResult {
    /// Applies the mesh to the chunk's render state.
    ///
    /// Results for evicted chunks and results older than the chunk's latest
    /// submitted revision are dropped and counted as stale.
    fn handle_result(self: Box<Self>, context: &mut TaskContext<'_>) -> Vec<Box<dyn Task + Send>> {
        let Some(chunk) = context.world.get_chunk_at_mut(self.position) else {
            trace!("Dropping mesh for evicted chunk {:?}", self.position);
            context.stats.stale_results += 1;
            return Vec::new();
        };

        if !chunk.render_state.apply_mesh(self.revision, self.mesh) {
            trace!(
                "Dropping stale mesh rev {} for {:?} (latest {})",
                self.revision,
                self.position,
                chunk.render_state.submitted_revision
            );
            context.stats.stale_results += 1;
            return Vec::new();
        }

        if chunk.lifecycle != ChunkLifecycle::MeshReady {
            chunk.lifecycle = ChunkLifecycle::MeshReady;
            chunk.render_state.is_active = true;
        }
        context.stats.meshes_applied += 1;
        context.applied.push(self.position);
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::config::AtlasSettings;
    use crate::engine_state::rendering::atlas::TextureAtlas;
    use crate::engine_state::streaming::StreamingStats;
    use crate::engine_state::voxels::block::{block_type::BlockType, registry::BlockRegistry, AIR};
    use crate::engine_state::voxels::chunk::Chunk;
    use crate::engine_state::voxels::world::World;

    fn extractor() -> Arc<MeshExtractor> {
        Arc::new(MeshExtractor::new(
            Arc::new(BlockRegistry::default()),
            TextureAtlas::new(&AtlasSettings::default()).unwrap(),
            true,
        ))
    }

    fn stone_halo(position: Point3<i32>) -> HaloVolume {
        let stone = BlockType::STONE.id();
        HaloVolume::from_fn(position, move |x, y, z| {
            if (x, y, z) == (0, 0, 0) {
                stone
            } else {
                AIR
            }
        })
    }

    #[test]
    fn only_the_latest_revision_lands() {
        let position = Point3::new(0, 0, 0);
        let mut world = World::new();
        let mut chunk = Chunk::new(position);
        chunk.lifecycle = ChunkLifecycle::Generated;
        let first = chunk.render_state.next_revision();
        let second = chunk.render_state.next_revision();
        world.insert_chunk(chunk);

        let extractor = extractor();
        let old = ChunkMeshGenerationTask::new(first, stone_halo(position), extractor.clone());
        let new = ChunkMeshGenerationTask::new(second, stone_halo(position), extractor);

        let mut stats = StreamingStats::default();
        let mut applied = Vec::new();
        let mut context = TaskContext {
            world: &mut world,
            stats: &mut stats,
            applied: &mut applied,
        };
        new.process().handle_result(&mut context);
        old.process().handle_result(&mut context);

        assert_eq!(stats.meshes_applied, 1);
        assert_eq!(stats.stale_results, 1);
        assert_eq!(applied, vec![position]);

        let chunk = world.get_chunk_at(position).unwrap();
        assert_eq!(chunk.lifecycle, ChunkLifecycle::MeshReady);
        assert_eq!(chunk.render_state.applied_revision, Some(second));
        assert_eq!(chunk.render_state.mesh.as_ref().unwrap().solid.quad_count(), 6);
    }

    #[test]
    fn evicted_chunks_drop_results() {
        let position = Point3::new(3, 0, 3);
        let task = ChunkMeshGenerationTask::new(1, stone_halo(position), extractor());

        let mut world = World::new();
        let mut stats = StreamingStats::default();
        let mut applied = Vec::new();
        let mut context = TaskContext {
            world: &mut world,
            stats: &mut stats,
            applied: &mut applied,
        };
        assert!(task.process().handle_result(&mut context).is_empty());
        assert_eq!(stats.stale_results, 1);
        assert!(applied.is_empty());
    }
}
