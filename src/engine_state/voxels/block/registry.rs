//! Id → definition lookup shared by terrain generation and meshing.

use std::sync::atomic::{AtomicBool, Ordering};

use log::warn;

use super::{default_block_definitions, BlockDefinition, BlockId, AIR};

/// Resolves block ids into their static definitions.
///
/// Ids beyond the configured list are a content error, not a core error:
/// they resolve to the definition of air and a warning is logged the first
/// time each unknown id is seen.
#[derive(Debug)]
pub struct BlockRegistry {
    definitions: Vec<BlockDefinition>,
    fallback: BlockDefinition,
    warned: [AtomicBool; 256],
}

impl BlockRegistry {
    /// Builds a registry from an ordered block list. Position in the list is the id.
    ///
    /// Lists longer than the id space are truncated.
    pub fn new(mut definitions: Vec<BlockDefinition>) -> Self {
        if definitions.len() > BlockId::MAX as usize + 1 {
            warn!(
                "Block list has {} entries, ignoring everything past id {}",
                definitions.len(),
                BlockId::MAX
            );
            definitions.truncate(BlockId::MAX as usize + 1);
        }

        let fallback = definitions
            .get(AIR as usize)
            .cloned()
            .unwrap_or_else(|| BlockDefinition::uniform("air", 0).transparent());

        BlockRegistry {
            definitions,
            fallback,
            warned: std::array::from_fn(|_| AtomicBool::new(false)),
        }
    }

    /// Looks up the definition of `id`.
    ///
    /// # Returns
    /// The configured definition, or the air definition when `id` is unknown.
    #[inline]
    pub fn get(&self, id: BlockId) -> &BlockDefinition {
        match self.definitions.get(id as usize) {
            Some(definition) => definition,
            None => {
                if !self.warned[id as usize].swap(true, Ordering::Relaxed) {
                    warn!(
                        "Block id {} is not registered ({} known), treating it as air",
                        id,
                        self.definitions.len()
                    );
                }
                &self.fallback
            }
        }
    }

    /// Whether `id` is transparent for face culling.
    #[inline]
    pub fn is_transparent(&self, id: BlockId) -> bool {
        id == AIR || self.get(id).is_transparent
    }

    /// Whether `id` is rendered in the fluid pass.
    #[inline]
    pub fn is_fluid(&self, id: BlockId) -> bool {
        id != AIR && self.get(id).is_fluid
    }

    /// Finds the id registered under `name`.
    pub fn id_of(&self, name: &str) -> Option<BlockId> {
        self.definitions
            .iter()
            .position(|definition| definition.name == name)
            .map(|index| index as BlockId)
    }

    /// Number of registered block types.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no block type is registered.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        BlockRegistry::new(default_block_definitions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_side::BlockSide;
    use crate::engine_state::voxels::block::block_type::BlockType;

    #[test]
    fn unknown_ids_fall_back_to_air() {
        let registry = BlockRegistry::default();
        let definition = registry.get(250);
        assert_eq!(definition.name, "air");
        assert!(registry.is_transparent(250));
        assert!(!registry.is_fluid(250));
        // Second lookup takes the already-warned path.
        assert_eq!(registry.get(250).texture_for_face(BlockSide::BACK), 0);
    }

    #[test]
    fn flags_come_from_the_definitions() {
        let registry = BlockRegistry::default();
        assert!(registry.is_transparent(BlockType::AIR.id()));
        assert!(registry.is_transparent(BlockType::LEAVES.id()));
        assert!(!registry.is_transparent(BlockType::STONE.id()));
        assert!(registry.is_fluid(BlockType::WATER.id()));
        assert_eq!(registry.id_of("stone"), Some(BlockType::STONE.id()));
        assert_eq!(registry.id_of("lava"), None);
    }
}
