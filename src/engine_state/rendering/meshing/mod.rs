//! Mesh extraction for voxel chunks.
//!
//! Meshing runs on worker threads and never touches the world. The control
//! thread snapshots a chunk together with a one-block border of its
//! neighbors into a [`HaloVolume`]; the [`MeshExtractor`] turns that
//! snapshot into a [`ChunkMesh`] with separate solid and fluid payloads.
//!
//! # Architecture
//! - `halo`: border snapshots built from the world
//! - `mesh`: face culling, quad merging and payload packing
//! - [`MeshExtractor`]: shared, immutable entry point used by mesh tasks

use std::sync::Arc;

use log::debug;
use web_time::Instant;

use crate::engine_state::rendering::atlas::TextureAtlas;
use crate::engine_state::voxels::block::registry::BlockRegistry;

pub mod halo;
pub mod mesh;

pub use halo::HaloVolume;
use mesh::{greedy_faces, naive_faces, ChunkMesh, ChunkMeshBuilder};

/// Converts halo snapshots into chunk meshes.
///
/// The extractor is immutable after construction and shared between mesh
/// tasks behind an `Arc`.
#[derive(Debug)]
pub struct MeshExtractor {
    registry: Arc<BlockRegistry>,
    atlas: TextureAtlas,
    greedy: bool,
}

impl MeshExtractor {
    /// Creates a new extractor.
    ///
    /// # Arguments
    /// * `registry` - Block definitions used for culling and face textures
    /// * `atlas` - Atlas layout used to compute UVs
    /// * `greedy` - Merge coplanar faces when `true`, one quad per face otherwise
    pub fn new(registry: Arc<BlockRegistry>, atlas: TextureAtlas, greedy: bool) -> Self {
        MeshExtractor {
            registry,
            atlas,
            greedy,
        }
    }

    /// The block registry used for culling.
    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// The atlas layout used for UVs.
    pub fn atlas(&self) -> &TextureAtlas {
        &self.atlas
    }

    /// Whether faces are merged.
    pub fn is_greedy(&self) -> bool {
        self.greedy
    }

    /// Builds the mesh of the chunk wrapped by `halo`.
    ///
    /// Faces on the chunk border are culled against the halo, so no face is
    /// emitted between two opaque blocks even across chunk boundaries.
    pub fn extract(&self, halo: &HaloVolume) -> ChunkMesh {
        if halo.interior_is_air() {
            return ChunkMesh::default();
        }

        let start = Instant::now();
        let mut builder = ChunkMeshBuilder::new(&self.atlas);
        let quads = if self.greedy {
            greedy_faces(halo, &self.registry, |face| builder.push_face(&face))
        } else {
            naive_faces(halo, &self.registry, |face| builder.push_face(&face))
        };
        let mesh = builder.finish();

        debug!(
            "Meshed chunk {:?}: {} quads ({} solid, {} fluid) in {:?}",
            halo.position(),
            quads,
            mesh.solid.quad_count(),
            mesh.fluid.quad_count(),
            start.elapsed()
        );
        mesh
    }
}
