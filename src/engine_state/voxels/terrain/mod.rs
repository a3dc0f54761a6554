//! # Terrain Module
//!
//! Procedural terrain: the noise fields, the per-footprint height maps and
//! the generator that turns them into chunk blocks.
//!
//! ## Pipeline
//!
//! 1. Ground levels are evaluated once per (x, z) column into a `HeightMap`,
//!    cached per footprint so vertically stacked chunks share it.
//! 2. Every voxel is classified by its height relative to the ground level
//!    (water or air above, grass or snow-grass on the surface, a dirt band,
//!    stone below).
//! 3. Caves are carved out of non-air cells deep enough below the surface.
//! 4. Trees are planted on grass cells away from the chunk edges.

use thiserror::Error;

pub mod generator;
pub mod height_map;
pub mod noise_field;
pub mod vegetation;

/// Errors raised by terrain generation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TerrainError {
    /// A scratch buffer could not be allocated.
    #[error("failed to allocate {bytes} bytes of terrain scratch memory")]
    ScratchAllocation {
        /// Size of the failed allocation.
        bytes: usize,
    },
}
