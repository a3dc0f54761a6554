//! One quad per visible voxel face.

use crate::engine_state::rendering::meshing::halo::HaloVolume;
use crate::engine_state::voxels::block::{block_side::BlockSide, registry::BlockRegistry};
use crate::engine_state::voxels::chunk::{CHUNK_DIMENSION_X, CHUNK_DIMENSION_Y, CHUNK_DIMENSION_Z};

use super::culling::visible_face;
use super::face::Face;

/// Emits a unit `Face` for every visible face of `halo`'s interior.
///
/// # Returns
/// The number of quads emitted.
pub fn naive_faces<F>(halo: &HaloVolume, registry: &BlockRegistry, mut emit: F) -> usize
where
    F: FnMut(Face),
{
    let mut quads = 0;
    for z in 0..CHUNK_DIMENSION_Z {
        for y in 0..CHUNK_DIMENSION_Y {
            for x in 0..CHUNK_DIMENSION_X {
                for side in BlockSide::all() {
                    if let Some(cell) =
                        visible_face(halo, registry, x as i32, y as i32, z as i32, side)
                    {
                        quads += 1;
                        emit(Face::unit(side, x, y, z, cell));
                    }
                }
            }
        }
    }
    quads
}
