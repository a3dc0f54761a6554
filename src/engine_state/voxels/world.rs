//! # World Module
//!
//! This module provides the `World` struct, the single authority on which
//! chunks exist and which block sits at any world position.
//!
//! ## Architecture
//!
//! The world uses sparse storage: a hash map from chunk coordinates to
//! chunks. Only the control thread owns and mutates it; mesh workers receive
//! halo copies instead of references.
//!
//! ## Coordinates
//!
//! World block coordinates map to chunk coordinates by floor division per
//! axis, so `-1` belongs to chunk `-1`, not chunk `0`. Positions inside
//! chunks that are not loaded read as air.
//!
//! ## Edits
//!
//! `set_block` marks the owning chunk dirty, plus every loaded face neighbor
//! that shares the edited cell's boundary, so both sides of a chunk border
//! are remeshed.

use std::collections::{HashMap, HashSet};

use cgmath::{Point3, Vector3};
use log::warn;
use thiserror::Error;

use super::block::{block_side::BlockSide, BlockId, AIR};
use super::chunk::{Chunk, CHUNK_DIMENSIONS, CHUNK_DIMENSION_X, CHUNK_DIMENSION_Y, CHUNK_DIMENSION_Z};

/// Errors raised by world edits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    /// The edited position belongs to a chunk that is not loaded.
    #[error("block {block:?} belongs to chunk {chunk:?}, which is not loaded")]
    ChunkNotLoaded {
        /// Chunk coordinates of the missing chunk.
        chunk: Point3<i32>,
        /// World coordinates of the edited block.
        block: Point3<i32>,
    },
}

/// Represents a voxel world composed of multiple chunks.
#[derive(Debug, Default)]
pub struct World {
    chunks: HashMap<Point3<i32>, Chunk>,
    dirty: HashSet<Point3<i32>>,
}

impl World {
    /// Creates a new, empty world.
    pub fn new() -> Self {
        World::default()
    }

    /// Chunk coordinates of the chunk containing the world block `world_pos`.
    ///
    /// Uses floor division, so negative coordinates land in negative chunks.
    pub fn chunk_coord_of(world_pos: Point3<i32>) -> Point3<i32> {
        Point3::new(
            world_pos.x.div_euclid(CHUNK_DIMENSION_X as i32),
            world_pos.y.div_euclid(CHUNK_DIMENSION_Y as i32),
            world_pos.z.div_euclid(CHUNK_DIMENSION_Z as i32),
        )
    }

    /// Local coordinates of the world block `world_pos` inside its chunk.
    pub fn local_coord_of(world_pos: Point3<i32>) -> Point3<usize> {
        Point3::new(
            world_pos.x.rem_euclid(CHUNK_DIMENSION_X as i32) as usize,
            world_pos.y.rem_euclid(CHUNK_DIMENSION_Y as i32) as usize,
            world_pos.z.rem_euclid(CHUNK_DIMENSION_Z as i32) as usize,
        )
    }

    /// Chunk coordinates of the chunk containing a continuous world position.
    pub fn chunk_coord_of_point(position: Point3<f32>) -> Point3<i32> {
        World::chunk_coord_of(Point3::new(
            position.x.floor() as i32,
            position.y.floor() as i32,
            position.z.floor() as i32,
        ))
    }

    /// Returns the block at a world position.
    ///
    /// # Returns
    /// The stored block, or air if the owning chunk is not loaded.
    pub fn block_at(&self, world_pos: Point3<i32>) -> BlockId {
        match self.chunks.get(&World::chunk_coord_of(world_pos)) {
            Some(chunk) => {
                let local = World::local_coord_of(world_pos);
                chunk.get_block(local.x, local.y, local.z)
            }
            None => AIR,
        }
    }

    /// Returns the block at local coordinates of `chunk`, which may lie outside it.
    ///
    /// Out-of-range coordinates are translated to world coordinates and
    /// resolved through `block_at`, never by indexing past the chunk.
    pub fn block_at_relative(&self, chunk: Point3<i32>, local: Vector3<i32>) -> BlockId {
        if Chunk::contains_local(local.x, local.y, local.z) {
            if let Some(owner) = self.chunks.get(&chunk) {
                return owner.get_block(local.x as usize, local.y as usize, local.z as usize);
            }
            return AIR;
        }
        self.block_at(Chunk::origin_of(chunk) + local)
    }

    /// Writes a block and marks every chunk whose mesh depends on it dirty.
    ///
    /// # Returns
    /// The chunk coordinates marked dirty (empty if the block did not change),
    /// or `WorldError::ChunkNotLoaded`.
    pub fn set_block(
        &mut self,
        world_pos: Point3<i32>,
        block: BlockId,
    ) -> Result<Vec<Point3<i32>>, WorldError> {
        let chunk_pos = World::chunk_coord_of(world_pos);
        let local = World::local_coord_of(world_pos);

        let Some(chunk) = self.chunks.get_mut(&chunk_pos) else {
            warn!(
                "Ignoring edit at {:?}: chunk {:?} is not loaded",
                world_pos, chunk_pos
            );
            return Err(WorldError::ChunkNotLoaded {
                chunk: chunk_pos,
                block: world_pos,
            });
        };

        if !chunk.set_block(local.x, local.y, local.z, block) {
            return Ok(Vec::new());
        }

        let mut affected = vec![chunk_pos];
        let local = [local.x, local.y, local.z];
        for side in BlockSide::all() {
            let axis = side.axis();
            let on_boundary = if side.is_positive() {
                local[axis] == CHUNK_DIMENSIONS[axis] - 1
            } else {
                local[axis] == 0
            };
            if !on_boundary {
                continue;
            }

            let neighbor = chunk_pos + side.normal();
            if self.chunks.contains_key(&neighbor) {
                affected.push(neighbor);
            }
        }

        self.dirty.extend(affected.iter().copied());
        Ok(affected)
    }

    /// Inserts a chunk, replacing any chunk at the same position.
    pub fn insert_chunk(&mut self, chunk: Chunk) -> Option<Chunk> {
        self.chunks.insert(chunk.position, chunk)
    }

    /// Removes and returns the chunk at `pos`.
    pub fn remove_chunk(&mut self, pos: Point3<i32>) -> Option<Chunk> {
        self.dirty.remove(&pos);
        self.chunks.remove(&pos)
    }

    /// Retrieves a reference to the chunk at the specified chunk coordinates.
    pub fn get_chunk_at(&self, pos: Point3<i32>) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    /// Retrieves a mutable reference to the chunk at the specified chunk coordinates.
    pub fn get_chunk_at_mut(&mut self, pos: Point3<i32>) -> Option<&mut Chunk> {
        self.chunks.get_mut(&pos)
    }

    /// Whether a chunk exists at `pos`.
    pub fn contains_chunk(&self, pos: Point3<i32>) -> bool {
        self.chunks.contains_key(&pos)
    }

    /// Whether all six face neighbors of `pos` exist.
    pub fn has_all_neighbors(&self, pos: Point3<i32>) -> bool {
        BlockSide::all()
            .into_iter()
            .all(|side| self.chunks.contains_key(&(pos + side.normal())))
    }

    /// Number of loaded chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether no chunk is loaded.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Iterates over loaded chunks.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    /// Iterates mutably over loaded chunks.
    pub fn chunks_mut(&mut self) -> impl Iterator<Item = &mut Chunk> {
        self.chunks.values_mut()
    }

    /// Coordinates of every loaded chunk.
    pub fn chunk_positions(&self) -> Vec<Point3<i32>> {
        self.chunks.keys().copied().collect()
    }

    /// Marks `pos` as needing a new mesh.
    pub fn mark_dirty(&mut self, pos: Point3<i32>) {
        if self.chunks.contains_key(&pos) {
            self.dirty.insert(pos);
        }
    }

    /// Whether `pos` is waiting for a new mesh.
    pub fn is_dirty(&self, pos: Point3<i32>) -> bool {
        self.dirty.contains(&pos)
    }

    /// Drains the set of chunks needing a new mesh.
    pub fn take_dirty(&mut self) -> Vec<Point3<i32>> {
        self.dirty.drain().collect()
    }
}
