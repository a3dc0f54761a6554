//! # Vegetation
//!
//! Tree placement on generated terrain. Every decision is drawn from an RNG
//! seeded by a hash of the world seed and the voxel's world position, so the
//! result does not depend on the order chunks are generated in or on which
//! thread generates them.

use crate::engine_state::config::TreeSettings;
use crate::engine_state::voxels::block::{block_type::BlockType, AIR};
use crate::engine_state::voxels::chunk::{
    Chunk, CHUNK_DIMENSION_X, CHUNK_DIMENSION_Y, CHUNK_DIMENSION_Z,
};

use super::height_map::HeightMap;

/// Largest canopy radius. Also the minimum distance of a trunk from the chunk
/// edge, which keeps every canopy inside its own chunk.
pub const MAX_CANOPY_RADIUS: usize = 3;
/// Distance of a trunk from the chunk edge.
pub const TREE_MARGIN: usize = MAX_CANOPY_RADIUS;
/// Shortest trunk.
pub const MIN_TRUNK_HEIGHT: usize = 4;
/// Tallest trunk.
pub const MAX_TRUNK_HEIGHT: usize = 6;

/// Mixes a seed and a world position into a 64 bit stream selector.
pub fn voxel_hash(seed: u64, x: i32, y: i32, z: i32) -> u64 {
    let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
    for coordinate in [x, y, z] {
        state ^= coordinate as u32 as u64;
        state = state.wrapping_mul(0xBF58_476D_1CE4_E5B9);
        state ^= state >> 31;
        state = state.wrapping_mul(0x94D0_49BB_1331_11EB);
        state ^= state >> 29;
    }
    state
}

/// RNG dedicated to one voxel of one world.
pub fn voxel_rng(seed: u64, x: i32, y: i32, z: i32) -> fastrand::Rng {
    fastrand::Rng::with_seed(voxel_hash(seed, x, y, z))
}

/// Shape of a single tree, rooted on the grass cell below its trunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Tree {
    /// Local position of the grass cell the tree grows from.
    pub root: (usize, usize, usize),
    /// Number of wood cells above the root.
    pub trunk_height: usize,
    /// Canopy radius in cells.
    pub canopy_radius: usize,
}

impl Tree {
    /// Highest local Y the tree occupies.
    pub fn top(&self) -> usize {
        self.root.1 + self.trunk_height + self.canopy_radius - 1
    }
}

/// Rolls the tree growing from the grass cell at `root`, if any.
pub fn roll_tree(
    seed: u64,
    chance: u32,
    world: (i32, i32, i32),
    root: (usize, usize, usize),
) -> Option<Tree> {
    let mut rng = voxel_rng(seed, world.0, world.1, world.2);
    if rng.u32(0..chance.max(1)) != 0 {
        return None;
    }

    Some(Tree {
        root,
        trunk_height: rng.usize(MIN_TRUNK_HEIGHT..=MAX_TRUNK_HEIGHT),
        canopy_radius: rng.usize(2..=MAX_CANOPY_RADIUS),
    })
}

/// Places trees on the chunk's grass cells.
///
/// Candidates are grass cells at the column's ground level that are not under
/// water, lie below the tree line and keep `TREE_MARGIN` cells from the chunk
/// edge. Trees that would poke out of the top of the chunk are skipped.
///
/// # Returns
/// The number of trees placed.
pub fn plant_trees(
    chunk: &mut Chunk,
    height_map: &HeightMap,
    seed: u64,
    settings: &TreeSettings,
    water_level: i32,
) -> usize {
    let origin = chunk.origin();
    let mut planted = 0;

    for z in TREE_MARGIN..CHUNK_DIMENSION_Z - TREE_MARGIN {
        for x in TREE_MARGIN..CHUNK_DIMENSION_X - TREE_MARGIN {
            let ground = height_map.get(x, z);
            if ground >= settings.tree_line || ground < water_level {
                continue;
            }

            let local_y = ground - origin.y;
            if !(0..CHUNK_DIMENSION_Y as i32).contains(&local_y) {
                continue;
            }
            let y = local_y as usize;
            if chunk.get_block(x, y, z) != BlockType::GRASS.id() {
                continue;
            }

            let world = (origin.x + x as i32, ground, origin.z + z as i32);
            let Some(tree) = roll_tree(seed, settings.chance, world, (x, y, z)) else {
                continue;
            };
            if tree.top() >= CHUNK_DIMENSION_Y {
                continue;
            }

            grow(chunk, &tree);
            planted += 1;
        }
    }

    planted
}

fn grow(chunk: &mut Chunk, tree: &Tree) {
    let (x, y, z) = tree.root;
    for dy in 1..=tree.trunk_height {
        chunk.set_block(x, y + dy, z, BlockType::WOOD.id());
    }

    let radius = tree.canopy_radius as i32;
    let center = (x as i32, (y + tree.trunk_height) as i32, z as i32);
    for dy in 0..=radius {
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy + dz * dz >= radius * radius {
                    continue;
                }
                let (lx, ly, lz) = (center.0 + dx, center.1 + dy, center.2 + dz);
                debug_assert!(Chunk::contains_local(lx, ly, lz));
                if chunk.try_get_block(lx, ly, lz) == Some(AIR) {
                    chunk.set_block(lx as usize, ly as usize, lz as usize, BlockType::LEAVES.id());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point3;

    #[test]
    fn hash_depends_on_every_input() {
        let base = voxel_hash(1, 2, 3, 4);
        assert_eq!(base, voxel_hash(1, 2, 3, 4));
        assert_ne!(base, voxel_hash(2, 2, 3, 4));
        assert_ne!(base, voxel_hash(1, 3, 3, 4));
        assert_ne!(base, voxel_hash(1, 2, 4, 4));
        assert_ne!(base, voxel_hash(1, 2, 3, 5));
        assert_ne!(voxel_hash(0, 1, 0, 0), voxel_hash(0, 0, 1, 0));
    }

    #[test]
    fn rolled_trees_stay_in_range() {
        let mut rolled = 0;
        for x in 0..500 {
            if let Some(tree) = roll_tree(77, 1, (x, 10, -x), (5, 10, 5)) {
                rolled += 1;
                assert!((MIN_TRUNK_HEIGHT..=MAX_TRUNK_HEIGHT).contains(&tree.trunk_height));
                assert!((2..=MAX_CANOPY_RADIUS).contains(&tree.canopy_radius));
            }
        }
        assert_eq!(rolled, 500);
    }

    #[test]
    fn trees_grow_inside_the_chunk() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0));
        let height_map = HeightMap::build(|_, _| 10).unwrap();
        for z in 0..CHUNK_DIMENSION_Z {
            for x in 0..CHUNK_DIMENSION_X {
                chunk.set_block(x, 10, z, BlockType::GRASS.id());
            }
        }
        let settings = TreeSettings {
            enabled: true,
            tree_line: 100,
            chance: 1,
        };

        let planted = plant_trees(&mut chunk, &height_map, 3, &settings, 0);
        let span = CHUNK_DIMENSION_X - 2 * TREE_MARGIN;
        assert_eq!(planted, span * (CHUNK_DIMENSION_Z - 2 * TREE_MARGIN));

        let wood = chunk
            .iter_blocks()
            .filter(|(_, block)| *block == BlockType::WOOD.id())
            .count();
        let leaves = chunk
            .iter_blocks()
            .filter(|(_, block)| *block == BlockType::LEAVES.id())
            .count();
        assert!(wood > 0);
        assert!(leaves > 0);
        for (position, block) in chunk.iter_blocks() {
            if block == BlockType::LEAVES.id() {
                assert!(position.x > 0 && position.x < CHUNK_DIMENSION_X - 1);
                assert!(position.z > 0 && position.z < CHUNK_DIMENSION_Z - 1);
            }
        }
    }

    #[test]
    fn no_trees_above_the_tree_line_or_under_water() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0));
        let height_map = HeightMap::build(|_, _| 10).unwrap();
        for z in 0..CHUNK_DIMENSION_Z {
            for x in 0..CHUNK_DIMENSION_X {
                chunk.set_block(x, 10, z, BlockType::GRASS.id());
            }
        }
        let settings = TreeSettings {
            enabled: true,
            tree_line: 10,
            chance: 1,
        };
        assert_eq!(plant_trees(&mut chunk, &height_map, 3, &settings, 0), 0);

        let settings = TreeSettings {
            tree_line: 100,
            ..settings
        };
        assert_eq!(plant_trees(&mut chunk, &height_map, 3, &settings, 11), 0);
    }
}
