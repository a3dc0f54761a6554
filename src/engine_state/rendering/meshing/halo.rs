//! # Halo Volumes
//!
//! A halo is a point-in-time copy of one chunk plus a one-cell border taken
//! from its neighbors. Mesh workers read only the halo, so edits made on the
//! control thread after the copy can never be observed mid-extraction.
//!
//! ## Layout
//!
//! Padded coordinates run over `0..CHUNK_DIMENSION_*_WRAPPED`; chunk-local
//! coordinate `c` lives at padded coordinate `c + 1`:
//!
//! ```text
//! index = hx + hy * CHUNK_DIMENSION_X_WRAPPED + hz * CHUNK_LAYER_SIZE_WRAPPED
//! ```
//!
//! ## Sources
//!
//! * Interior: copied row by row from the chunk
//! * Face shells: the neighbor's boundary layer when the neighbor is loaded,
//!   otherwise a world query (air)
//! * Edges and corners: a world query per cell along the 12 edges

use cgmath::{Point3, Vector3};
use log::trace;
use web_time::Instant;

use crate::engine_state::voxels::block::{block_side::BlockSide, BlockId, AIR};
use crate::engine_state::voxels::chunk::{
    Chunk, CHUNK_DIMENSIONS, CHUNK_DIMENSION_X, CHUNK_DIMENSION_X_WRAPPED, CHUNK_DIMENSION_Y,
    CHUNK_DIMENSION_Y_WRAPPED, CHUNK_DIMENSION_Z, CHUNK_DIMENSION_Z_WRAPPED,
    CHUNK_LAYER_SIZE_WRAPPED, CHUNK_SIZE_WRAPPED,
};
use crate::engine_state::voxels::world::World;

const WRAPPED_DIMENSIONS: [usize; 3] = [
    CHUNK_DIMENSION_X_WRAPPED,
    CHUNK_DIMENSION_Y_WRAPPED,
    CHUNK_DIMENSION_Z_WRAPPED,
];

/// A chunk's blocks wrapped in a one-cell border of neighbor blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HaloVolume {
    position: Point3<i32>,
    blocks: Box<[BlockId]>,
}

impl HaloVolume {
    /// Converts padded coordinates to a flat index.
    #[inline]
    pub const fn index(hx: usize, hy: usize, hz: usize) -> usize {
        hx + hy * CHUNK_DIMENSION_X_WRAPPED + hz * CHUNK_LAYER_SIZE_WRAPPED
    }

    /// Builds the halo of the chunk at `position`.
    ///
    /// # Returns
    /// `None` if the chunk itself is not loaded.
    pub fn build(world: &World, position: Point3<i32>) -> Option<HaloVolume> {
        let start = Instant::now();
        let chunk = world.get_chunk_at(position)?;
        let mut blocks = vec![AIR; CHUNK_SIZE_WRAPPED].into_boxed_slice();

        let source = chunk.blocks();
        for z in 0..CHUNK_DIMENSION_Z {
            for y in 0..CHUNK_DIMENSION_Y {
                let from = Chunk::index(0, y, z);
                let to = HaloVolume::index(1, y + 1, z + 1);
                blocks[to..to + CHUNK_DIMENSION_X]
                    .copy_from_slice(&source[from..from + CHUNK_DIMENSION_X]);
            }
        }

        for side in BlockSide::all() {
            copy_face_shell(world, position, side, &mut blocks);
        }
        copy_edges_and_corners(world, position, &mut blocks);

        trace!("Built halo for {:?} in {:?}", position, start.elapsed());
        Some(HaloVolume { position, blocks })
    }

    /// Builds a halo by evaluating `block(x, y, z)` for every chunk-local
    /// coordinate in `-1..=SIZE` on each axis.
    pub fn from_fn<F>(position: Point3<i32>, mut block: F) -> HaloVolume
    where
        F: FnMut(i32, i32, i32) -> BlockId,
    {
        let mut blocks = vec![AIR; CHUNK_SIZE_WRAPPED].into_boxed_slice();
        for hz in 0..CHUNK_DIMENSION_Z_WRAPPED {
            for hy in 0..CHUNK_DIMENSION_Y_WRAPPED {
                for hx in 0..CHUNK_DIMENSION_X_WRAPPED {
                    blocks[HaloVolume::index(hx, hy, hz)] =
                        block(hx as i32 - 1, hy as i32 - 1, hz as i32 - 1);
                }
            }
        }
        HaloVolume { position, blocks }
    }

    /// Chunk coordinates of the wrapped chunk.
    pub fn position(&self) -> Point3<i32> {
        self.position
    }

    /// Returns the block at chunk-local coordinates in `-1..=SIZE`.
    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> BlockId {
        debug_assert!(
            (-1..=CHUNK_DIMENSION_X as i32).contains(&x)
                && (-1..=CHUNK_DIMENSION_Y as i32).contains(&y)
                && (-1..=CHUNK_DIMENSION_Z as i32).contains(&z),
            "({}, {}, {}) outside halo",
            x,
            y,
            z
        );
        self.blocks[HaloVolume::index((x + 1) as usize, (y + 1) as usize, (z + 1) as usize)]
    }

    /// Whether the wrapped chunk contains only air.
    pub fn interior_is_air(&self) -> bool {
        (0..CHUNK_DIMENSION_Z as i32).all(|z| {
            (0..CHUNK_DIMENSION_Y as i32)
                .all(|y| (0..CHUNK_DIMENSION_X as i32).all(|x| self.get(x, y, z) == AIR))
        })
    }
}

fn copy_face_shell(world: &World, position: Point3<i32>, side: BlockSide, blocks: &mut [BlockId]) {
    let axis = side.axis();
    let u_axis = (axis + 1) % 3;
    let v_axis = (axis + 2) % 3;
    let neighbor = world.get_chunk_at(position + side.normal());

    let (shell, source_layer) = if side.is_positive() {
        (CHUNK_DIMENSIONS[axis] as i32, 0)
    } else {
        (-1, CHUNK_DIMENSIONS[axis] - 1)
    };

    for v in 0..CHUNK_DIMENSIONS[v_axis] {
        for u in 0..CHUNK_DIMENSIONS[u_axis] {
            let mut local = [0i32; 3];
            local[axis] = shell;
            local[u_axis] = u as i32;
            local[v_axis] = v as i32;

            let block = match neighbor {
                Some(neighbor) => {
                    let mut source = [0usize; 3];
                    source[axis] = source_layer;
                    source[u_axis] = u;
                    source[v_axis] = v;
                    neighbor.get_block(source[0], source[1], source[2])
                }
                None => world.block_at_relative(position, Vector3::new(local[0], local[1], local[2])),
            };

            let padded = local.map(|c| (c + 1) as usize);
            blocks[HaloVolume::index(padded[0], padded[1], padded[2])] = block;
        }
    }
}

fn copy_edges_and_corners(world: &World, position: Point3<i32>, blocks: &mut [BlockId]) {
    // Each edge runs along one axis with the other two at a boundary.
    for along in 0..3 {
        let a = (along + 1) % 3;
        let b = (along + 2) % 3;
        for ha in [0, WRAPPED_DIMENSIONS[a] - 1] {
            for hb in [0, WRAPPED_DIMENSIONS[b] - 1] {
                for t in 0..WRAPPED_DIMENSIONS[along] {
                    let mut padded = [0usize; 3];
                    padded[along] = t;
                    padded[a] = ha;
                    padded[b] = hb;

                    let local = Vector3::new(
                        padded[0] as i32 - 1,
                        padded[1] as i32 - 1,
                        padded[2] as i32 - 1,
                    );
                    blocks[HaloVolume::index(padded[0], padded[1], padded[2])] =
                        world.block_at_relative(position, local);
                }
            }
        }
    }
}
