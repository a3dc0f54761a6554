//! Per-chunk streaming and renderable state.

use std::sync::Arc;

use crate::engine_state::rendering::meshing::mesh::{ChunkMesh, MeshData};

/// Where a chunk is in the streaming pipeline.
///
/// `Unwanted` and `QueuedForCreation` have no chunk object yet; they are
/// tracked by the scheduler's sets instead.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkLifecycle {
    /// Blocks allocated and filled by the terrain generator.
    Created,
    /// Waiting for all six face neighbors before a mesh can be requested.
    QueuedForGeneration,
    /// A mesh has been requested and not yet applied.
    Generated,
    /// A mesh has been applied at least once.
    MeshReady,
}

/// Renderable state of a chunk, written only on the control thread.
#[derive(Debug, Default)]
pub struct ChunkRenderState {
    /// The most recently applied mesh.
    pub mesh: Option<ChunkMesh>,

    /// Shared solid mesh handed to the physics side, when in range.
    pub collider: Option<Arc<MeshData>>,

    /// Visibility flag driven by the viewer distance.
    pub is_active: bool,

    /// Revision of the most recently submitted mesh request.
    pub submitted_revision: u64,

    /// Revision of the mesh currently in `mesh`.
    pub applied_revision: Option<u64>,
}

impl ChunkRenderState {
    /// Reserves the revision number for a new mesh request.
    pub fn next_revision(&mut self) -> u64 {
        self.submitted_revision += 1;
        self.submitted_revision
    }

    /// Stores `mesh` if it belongs to the latest submitted request.
    ///
    /// # Returns
    /// `false` if the result is stale and was dropped.
    pub fn apply_mesh(&mut self, revision: u64, mesh: ChunkMesh) -> bool {
        if revision != self.submitted_revision {
            return false;
        }

        if self.collider.is_some() {
            self.collider = Some(Arc::clone(&mesh.solid));
        }
        self.mesh = Some(mesh);
        self.applied_revision = Some(revision);
        true
    }

    /// Whether the mesh for the latest request has arrived.
    pub fn is_up_to_date(&self) -> bool {
        self.applied_revision == Some(self.submitted_revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_latest_revision_is_applied() {
        let mut state = ChunkRenderState::default();
        let first = state.next_revision();
        let second = state.next_revision();

        assert!(!state.apply_mesh(first, ChunkMesh::default()));
        assert!(state.mesh.is_none());
        assert!(state.apply_mesh(second, ChunkMesh::default()));
        assert!(state.is_up_to_date());
        assert_eq!(state.applied_revision, Some(second));
    }

    #[test]
    fn collider_follows_new_meshes() {
        let mut state = ChunkRenderState::default();
        let revision = state.next_revision();
        state.collider = Some(Arc::new(MeshData::default()));

        let mesh = ChunkMesh::default();
        let solid = Arc::clone(&mesh.solid);
        assert!(state.apply_mesh(revision, mesh));
        assert!(Arc::ptr_eq(state.collider.as_ref().unwrap(), &solid));
    }
}
