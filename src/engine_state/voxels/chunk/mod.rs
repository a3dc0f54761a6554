//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a fixed-size, dense block volume
//! that is the unit of terrain generation, meshing and streaming.
//!
//! ## Storage Layout
//!
//! Blocks are stored as one byte per cell in a single flat array. The
//! linearization is fixed for the whole crate:
//!
//! ```text
//! index = x + y * CHUNK_DIMENSION_X + z * CHUNK_DIMENSION_X * CHUNK_DIMENSION_Y
//! ```
//!
//! The same formula with the `_WRAPPED` dimensions indexes halo volumes.
//!
//! ## Derived Data
//!
//! Besides its blocks a chunk carries a handful of scalars computed by the
//! terrain generator (ground level range, air-only, surface and buried flags)
//! and its renderable state, which is only ever written on the control thread.

use cgmath::Point3;

use super::block::{BlockId, AIR};
use chunk_iteration::ChunkBlockIterator;
pub use chunk_state::{ChunkLifecycle, ChunkRenderState};

pub mod chunk_iteration;
pub mod chunk_state;

/// Width of a chunk in blocks (X axis).
pub const CHUNK_DIMENSION_X: usize = 16;
/// Height of a chunk in blocks (Y axis).
pub const CHUNK_DIMENSION_Y: usize = 64;
/// Depth of a chunk in blocks (Z axis).
pub const CHUNK_DIMENSION_Z: usize = 16;
/// Chunk dimensions indexed by axis.
pub const CHUNK_DIMENSIONS: [usize; 3] = [CHUNK_DIMENSION_X, CHUNK_DIMENSION_Y, CHUNK_DIMENSION_Z];
/// Number of blocks in one Z layer (stride of the Z axis).
pub const CHUNK_LAYER_SIZE: usize = CHUNK_DIMENSION_X * CHUNK_DIMENSION_Y;
/// Total number of blocks in a chunk.
pub const CHUNK_SIZE: usize = CHUNK_LAYER_SIZE * CHUNK_DIMENSION_Z;

/// Width of a chunk including the one-block halo on each side.
pub const CHUNK_DIMENSION_X_WRAPPED: usize = CHUNK_DIMENSION_X + 2;
/// Height of a chunk including the one-block halo on each side.
pub const CHUNK_DIMENSION_Y_WRAPPED: usize = CHUNK_DIMENSION_Y + 2;
/// Depth of a chunk including the one-block halo on each side.
pub const CHUNK_DIMENSION_Z_WRAPPED: usize = CHUNK_DIMENSION_Z + 2;
/// Number of blocks in one Z layer of a wrapped chunk.
pub const CHUNK_LAYER_SIZE_WRAPPED: usize = CHUNK_DIMENSION_X_WRAPPED * CHUNK_DIMENSION_Y_WRAPPED;
/// Total number of blocks in a wrapped chunk.
pub const CHUNK_SIZE_WRAPPED: usize = CHUNK_LAYER_SIZE_WRAPPED * CHUNK_DIMENSION_Z_WRAPPED;

/// A fixed-size column segment of the voxel world.
///
/// Chunks are created filled with air, filled in place by the terrain
/// generator and afterwards only mutated through block edits on the control
/// thread. Mesh workers never see a `Chunk`, only a halo copy of it.
#[derive(Debug)]
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    pub position: Point3<i32>,

    blocks: Box<[BlockId]>,

    /// Lowest surface height over the chunk's (x, z) footprint, in world blocks.
    pub lowest_ground_level: i32,

    /// Highest surface height over the chunk's (x, z) footprint, in world blocks.
    pub highest_ground_level: i32,

    /// True when every block is air. Air-only chunks are never meshed.
    pub is_air_only: bool,

    /// True once the terrain generator has filled the chunk.
    pub is_generated: bool,

    /// True when the terrain surface passes through this chunk's vertical span.
    pub contains_surface: bool,

    /// True when the whole chunk lies below the dirt band of every column.
    pub is_buried: bool,

    /// Streaming lifecycle of the chunk.
    pub lifecycle: ChunkLifecycle,

    /// Mesh, collider and visibility state owned by the control thread.
    pub render_state: ChunkRenderState,
}

impl Chunk {
    /// Creates a new chunk filled with air.
    ///
    /// # Arguments
    /// * `position` - The chunk coordinates of the new chunk
    pub fn new(position: Point3<i32>) -> Self {
        Chunk {
            position,
            blocks: vec![AIR; CHUNK_SIZE].into_boxed_slice(),
            lowest_ground_level: i32::MAX,
            highest_ground_level: i32::MIN,
            is_air_only: true,
            is_generated: false,
            contains_surface: false,
            is_buried: false,
            lifecycle: ChunkLifecycle::Created,
            render_state: ChunkRenderState::default(),
        }
    }

    /// Converts local coordinates to a flat array index.
    #[inline]
    pub const fn index(x: usize, y: usize, z: usize) -> usize {
        x + y * CHUNK_DIMENSION_X + z * CHUNK_LAYER_SIZE
    }

    /// Converts a flat array index back to local coordinates.
    #[inline]
    pub const fn local_position(index: usize) -> (usize, usize, usize) {
        (
            index % CHUNK_DIMENSION_X,
            (index / CHUNK_DIMENSION_X) % CHUNK_DIMENSION_Y,
            index / CHUNK_LAYER_SIZE,
        )
    }

    /// Whether signed local coordinates fall inside the chunk.
    #[inline]
    pub fn contains_local(x: i32, y: i32, z: i32) -> bool {
        (0..CHUNK_DIMENSION_X as i32).contains(&x)
            && (0..CHUNK_DIMENSION_Y as i32).contains(&y)
            && (0..CHUNK_DIMENSION_Z as i32).contains(&z)
    }

    /// World block coordinates of the chunk's (0, 0, 0) cell.
    pub fn origin(&self) -> Point3<i32> {
        Chunk::origin_of(self.position)
    }

    /// World block coordinates of the (0, 0, 0) cell of the chunk at `position`.
    pub fn origin_of(position: Point3<i32>) -> Point3<i32> {
        Point3::new(
            position.x * CHUNK_DIMENSION_X as i32,
            position.y * CHUNK_DIMENSION_Y as i32,
            position.z * CHUNK_DIMENSION_Z as i32,
        )
    }

    /// Returns the block at local coordinates.
    ///
    /// Local coordinates must be inside the chunk; cross-chunk lookups go
    /// through `World::block_at_relative`.
    #[inline]
    pub fn get_block(&self, x: usize, y: usize, z: usize) -> BlockId {
        debug_assert!(
            x < CHUNK_DIMENSION_X && y < CHUNK_DIMENSION_Y && z < CHUNK_DIMENSION_Z,
            "local position ({}, {}, {}) outside chunk",
            x,
            y,
            z
        );
        self.blocks[Chunk::index(x, y, z)]
    }

    /// Returns the block at signed local coordinates, or `None` outside the chunk.
    pub fn try_get_block(&self, x: i32, y: i32, z: i32) -> Option<BlockId> {
        if Chunk::contains_local(x, y, z) {
            Some(self.get_block(x as usize, y as usize, z as usize))
        } else {
            None
        }
    }

    /// Writes a block at local coordinates and keeps `is_air_only` current.
    ///
    /// # Returns
    /// `true` if the stored block changed.
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, block: BlockId) -> bool {
        debug_assert!(
            x < CHUNK_DIMENSION_X && y < CHUNK_DIMENSION_Y && z < CHUNK_DIMENSION_Z,
            "local position ({}, {}, {}) outside chunk",
            x,
            y,
            z
        );
        let index = Chunk::index(x, y, z);
        if self.blocks[index] == block {
            return false;
        }

        self.blocks[index] = block;
        if block != AIR {
            self.is_air_only = false;
        } else if !self.is_air_only {
            self.refresh_air_only();
        }
        true
    }

    /// Read-only view of the flat block array.
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// Mutable view of the flat block array.
    ///
    /// Callers that write through this must call `refresh_air_only` afterwards.
    pub fn blocks_mut(&mut self) -> &mut [BlockId] {
        &mut self.blocks
    }

    /// Overwrites every block with `block`.
    pub fn fill(&mut self, block: BlockId) {
        self.blocks.fill(block);
        self.is_air_only = block == AIR;
    }

    /// Recomputes `is_air_only` from the block array.
    pub fn refresh_air_only(&mut self) {
        self.is_air_only = self.blocks.iter().all(|block| *block == AIR);
    }

    /// Iterates over every non-air block with its local position.
    pub fn iter_blocks(&self) -> ChunkBlockIterator<'_> {
        ChunkBlockIterator::new(self)
    }

    /// Whether a mesh has been requested for this chunk at least once.
    pub fn has_requested_mesh(&self) -> bool {
        matches!(
            self.lifecycle,
            ChunkLifecycle::Generated | ChunkLifecycle::MeshReady
        )
    }
}
