//! Face visibility between a voxel and its face neighbor.

use crate::engine_state::rendering::meshing::halo::HaloVolume;
use crate::engine_state::voxels::block::{
    block_side::BlockSide, registry::BlockRegistry, TextureIndex, AIR,
};

/// What a visible face looks like. Faces merge only when their cells are equal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MaskCell {
    /// Atlas tile of the face.
    pub texture: TextureIndex,
    /// Whether the face belongs to the fluid pass.
    pub fluid: bool,
}

/// Decides whether the `side` face of the voxel at chunk-local (x, y, z) is drawn.
///
/// A face is drawn when the voxel is not air and its neighbor is
/// transparent, except between two cells of the same fluid.
#[inline]
pub fn visible_face(
    halo: &HaloVolume,
    registry: &BlockRegistry,
    x: i32,
    y: i32,
    z: i32,
    side: BlockSide,
) -> Option<MaskCell> {
    let block = halo.get(x, y, z);
    if block == AIR {
        return None;
    }

    let normal = side.normal();
    let neighbor = halo.get(x + normal.x, y + normal.y, z + normal.z);
    if !registry.is_transparent(neighbor) {
        return None;
    }

    let definition = registry.get(block);
    if definition.is_fluid && neighbor == block {
        return None;
    }

    Some(MaskCell {
        texture: definition.texture_for_face(side),
        fluid: definition.is_fluid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::BlockType;
    use cgmath::Point3;

    fn pair(a: u8, b: u8) -> HaloVolume {
        HaloVolume::from_fn(Point3::new(0, 0, 0), move |x, y, z| match (x, y, z) {
            (4, 4, 4) => a,
            (5, 4, 4) => b,
            _ => AIR,
        })
    }

    #[test]
    fn culling_rules() {
        let registry = BlockRegistry::default();
        let stone = BlockType::STONE.id();
        let water = BlockType::WATER.id();
        let leaves = BlockType::LEAVES.id();

        let visible = |a, b| visible_face(&pair(a, b), &registry, 4, 4, 4, BlockSide::RIGHT);

        assert!(visible(stone, AIR).is_some());
        assert!(visible(stone, stone).is_none());
        assert!(visible(stone, water).is_some());
        assert!(visible(water, stone).is_none());
        assert!(visible(water, water).is_none());
        assert!(visible(water, AIR).is_some());
        assert!(visible(leaves, leaves).is_some());
        assert!(visible(AIR, stone).is_none());

        let cell = visible(water, AIR).unwrap();
        assert!(cell.fluid);
        assert_eq!(cell.texture, registry.get(water).texture_for_face(BlockSide::RIGHT));
    }
}
