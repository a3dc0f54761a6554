//! # Block Module
//!
//! This module provides the block-related data of the voxel engine: the
//! compact id stored in chunks, the per-type definitions loaded from
//! configuration and the registry that resolves one into the other.

use serde::{Deserialize, Serialize};

use block_side::BlockSide;

pub mod block_side;
pub mod block_type;
pub mod registry;

/// The underlying integer type used to represent block types in memory.
pub type BlockId = u8;

/// Index of a tile inside the texture atlas.
pub type TextureIndex = u16;

/// The id of air. Air is always the first entry of a block list.
pub const AIR: BlockId = 0;

/// Static description of a block type.
///
/// Definitions are loaded once as an ordered list; the position in the list
/// is the block id. After loading they are shared read-only between the
/// control thread and the meshing workers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    /// Human readable name, used by configuration and logs.
    pub name: String,

    /// Whether faces of neighboring blocks are visible through this block.
    #[serde(default)]
    pub is_transparent: bool,

    /// Whether this block is rendered in the fluid pass.
    #[serde(default)]
    pub is_fluid: bool,

    /// Atlas tile for each face, in `BlockSide` order:
    /// [back, front, top, bottom, left, right]
    pub textures: [TextureIndex; 6],
}

impl BlockDefinition {
    /// Creates an opaque block using `texture` on all six faces.
    pub fn uniform(name: &str, texture: TextureIndex) -> Self {
        BlockDefinition {
            name: name.to_string(),
            is_transparent: false,
            is_fluid: false,
            textures: [texture; 6],
        }
    }

    /// Creates an opaque block with distinct top, bottom and side textures.
    pub fn column(name: &str, side: TextureIndex, top: TextureIndex, bottom: TextureIndex) -> Self {
        BlockDefinition {
            name: name.to_string(),
            is_transparent: false,
            is_fluid: false,
            textures: [side, side, top, bottom, side, side],
        }
    }

    /// Marks the block as transparent.
    pub fn transparent(mut self) -> Self {
        self.is_transparent = true;
        self
    }

    /// Marks the block as a transparent fluid.
    pub fn fluid(mut self) -> Self {
        self.is_transparent = true;
        self.is_fluid = true;
        self
    }

    /// Returns the atlas tile used by `side`.
    #[inline]
    pub fn texture_for_face(&self, side: BlockSide) -> TextureIndex {
        self.textures[side as usize]
    }
}

/// The block list used when no configuration provides one.
///
/// Ids follow `block_type::BlockType`; textures assume the default 4x4 atlas.
pub fn default_block_definitions() -> Vec<BlockDefinition> {
    vec![
        BlockDefinition::uniform("air", 0).transparent(),
        BlockDefinition::uniform("dirt", 0),
        BlockDefinition::column("grass", 1, 2, 0),
        BlockDefinition::uniform("stone", 3),
        BlockDefinition::column("wood", 4, 5, 5),
        BlockDefinition::uniform("leaves", 6).transparent(),
        BlockDefinition::uniform("water", 7).fluid(),
        BlockDefinition::column("snow_grass", 8, 9, 0),
    ]
}

#[cfg(test)]
mod tests {
    use super::block_type::BlockType;
    use super::*;

    #[test]
    fn default_list_is_ordered_by_block_type() {
        let definitions = default_block_definitions();
        assert_eq!(definitions[BlockType::AIR.id() as usize].name, "air");
        assert_eq!(definitions[BlockType::WATER.id() as usize].name, "water");
        assert_eq!(
            definitions[BlockType::SNOW_GRASS.id() as usize].name,
            "snow_grass"
        );
        assert!(definitions[BlockType::WATER.id() as usize].is_fluid);
        assert!(definitions[BlockType::LEAVES.id() as usize].is_transparent);
    }

    #[test]
    fn column_blocks_use_top_and_bottom_textures() {
        let grass = BlockDefinition::column("grass", 1, 2, 0);
        assert_eq!(grass.texture_for_face(BlockSide::TOP), 2);
        assert_eq!(grass.texture_for_face(BlockSide::BOTTOM), 0);
        assert_eq!(grass.texture_for_face(BlockSide::LEFT), 1);
    }

    #[test]
    fn definitions_deserialize_with_default_flags() {
        let json = r#"{ "name": "brick", "textures": [10, 10, 11, 11, 10, 10] }"#;
        let definition: BlockDefinition = serde_json::from_str(json).unwrap();
        assert!(!definition.is_transparent);
        assert!(!definition.is_fluid);
        assert_eq!(definition.texture_for_face(BlockSide::TOP), 11);
    }
}
