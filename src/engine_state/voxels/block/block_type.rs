//! # Block Type Module
//!
//! The built-in block ids written by the terrain generator. Content may
//! register more blocks after these; the generator only ever emits the ones
//! listed here.

use num_derive::FromPrimitive;

use super::BlockId;

/// Enumerates the block types the terrain generator knows about.
///
/// The discriminant is the block id stored in chunk arrays and must match the
/// position of the block in the configured block list.
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// Empty space. Transparent, never meshed.
    AIR = 0,

    /// Soil band directly below the surface.
    DIRT = 1,

    /// Surface block below the snow line.
    GRASS = 2,

    /// Everything deeper than the dirt band.
    STONE = 3,

    /// Tree trunks.
    WOOD = 4,

    /// Tree canopies.
    LEAVES = 5,

    /// Fills columns whose ground sits below the water level.
    WATER = 6,

    /// Surface block at or above the snow line.
    SNOW_GRASS = 7,
}

impl BlockType {
    /// The id stored in chunk arrays for this block type.
    #[inline]
    pub fn id(self) -> BlockId {
        self as BlockId
    }

    /// Converts a stored id back to a built-in block type.
    ///
    /// # Returns
    /// `None` for ids registered by content beyond the built-in set.
    pub fn from_id(id: BlockId) -> Option<Self> {
        num::FromPrimitive::from_u8(id)
    }
}
