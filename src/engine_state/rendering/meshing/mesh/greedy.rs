//! Greedy quad merging.
//!
//! For each of the six face directions the chunk is swept slice by slice.
//! Every slice produces a 2D mask holding the visible face (texture and
//! pass) of each cell. Rectangles are grown from the first unconsumed cell,
//! first along the u axis while the cell matches, then along the v axis
//! while the whole row matches, and emitted as one quad.

use bitvec::prelude::BitVec;
use log::trace;
use web_time::Instant;

use crate::engine_state::rendering::meshing::halo::HaloVolume;
use crate::engine_state::voxels::block::{block_side::BlockSide, registry::BlockRegistry};
use crate::engine_state::voxels::chunk::CHUNK_DIMENSIONS;

use super::culling::{visible_face, MaskCell};
use super::face::Face;

/// Emits one `Face` per maximal rectangle of equal cells of a `width` x
/// `height` row-major mask.
///
/// `consumed` must hold `width * height` bits and is cleared on entry.
pub fn greedy_rects<F>(
    width: usize,
    height: usize,
    mask: &[Option<MaskCell>],
    consumed: &mut BitVec,
    mut emit: F,
) where
    F: FnMut(usize, usize, usize, usize, MaskCell),
{
    consumed.fill(false);

    for v in 0..height {
        let mut u = 0;
        while u < width {
            let index = v * width + u;
            let cell = match mask[index] {
                Some(cell) if !consumed[index] => cell,
                _ => {
                    u += 1;
                    continue;
                }
            };

            let mut quad_width = 1;
            while u + quad_width < width {
                let next = index + quad_width;
                if mask[next] != Some(cell) || consumed[next] {
                    break;
                }
                quad_width += 1;
            }

            let mut quad_height = 1;
            'grow: while v + quad_height < height {
                let row = (v + quad_height) * width + u;
                for k in 0..quad_width {
                    if mask[row + k] != Some(cell) || consumed[row + k] {
                        break 'grow;
                    }
                }
                quad_height += 1;
            }

            for dv in 0..quad_height {
                let row = (v + dv) * width + u;
                for k in 0..quad_width {
                    consumed.set(row + k, true);
                }
            }

            emit(u, v, quad_width, quad_height, cell);
            u += quad_width;
        }
    }
}

/// Runs greedy meshing over every slice of every face direction of `halo`.
///
/// # Arguments
/// * `halo` - Snapshot of the chunk and its border
/// * `registry` - Block definitions for culling and textures
/// * `emit` - Receives every merged quad
///
/// # Returns
/// The number of quads emitted.
pub fn greedy_faces<F>(halo: &HaloVolume, registry: &BlockRegistry, mut emit: F) -> usize
where
    F: FnMut(Face),
{
    let start = Instant::now();
    let mut quads = 0;

    for side in BlockSide::all() {
        let axis = side.axis();
        let u_axis = (axis + 1) % 3;
        let v_axis = (axis + 2) % 3;
        let width = CHUNK_DIMENSIONS[u_axis];
        let height = CHUNK_DIMENSIONS[v_axis];

        let mut mask = vec![None; width * height];
        let mut consumed = BitVec::repeat(false, width * height);

        for slice in 0..CHUNK_DIMENSIONS[axis] {
            let mut any_visible = false;
            for v in 0..height {
                for u in 0..width {
                    let mut position = [0i32; 3];
                    position[axis] = slice as i32;
                    position[u_axis] = u as i32;
                    position[v_axis] = v as i32;

                    let cell = visible_face(
                        halo,
                        registry,
                        position[0],
                        position[1],
                        position[2],
                        side,
                    );
                    any_visible |= cell.is_some();
                    mask[v * width + u] = cell;
                }
            }
            if !any_visible {
                continue;
            }

            greedy_rects(width, height, &mask, &mut consumed, |u, v, w, h, cell| {
                quads += 1;
                emit(Face {
                    side,
                    slice,
                    u,
                    v,
                    width: w,
                    height: h,
                    cell,
                });
            });
        }
    }

    trace!(
        "Greedy meshing of {:?} produced {} quads in {:?}",
        halo.position(),
        quads,
        start.elapsed()
    );
    quads
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: MaskCell = MaskCell {
        texture: 1,
        fluid: false,
    };
    const B: MaskCell = MaskCell {
        texture: 2,
        fluid: false,
    };

    fn rects(width: usize, height: usize, mask: &[Option<MaskCell>]) -> Vec<(usize, usize, usize, usize, MaskCell)> {
        let mut consumed = BitVec::repeat(false, width * height);
        let mut out = Vec::new();
        greedy_rects(width, height, mask, &mut consumed, |u, v, w, h, cell| {
            out.push((u, v, w, h, cell))
        });
        out
    }

    #[test]
    fn uniform_masks_become_one_rectangle() {
        let mask = vec![Some(A); 12];
        assert_eq!(rects(4, 3, &mask), vec![(0, 0, 4, 3, A)]);
    }

    #[test]
    fn rectangles_never_cross_textures() {
        #[rustfmt::skip]
        let mask = vec![
            Some(A), Some(A), Some(B),
            Some(A), Some(A), Some(B),
            None,    Some(B), Some(B),
        ];
        let out = rects(3, 3, &mask);
        assert_eq!(
            out,
            vec![(0, 0, 2, 2, A), (2, 0, 1, 3, B), (1, 2, 1, 1, B)]
        );
        let covered: usize = out.iter().map(|(_, _, w, h, _)| w * h).sum();
        assert_eq!(covered, 8);
    }

    #[test]
    fn l_shapes_split_into_two_rectangles() {
        #[rustfmt::skip]
        let mask = vec![
            Some(A), None,
            Some(A), Some(A),
        ];
        assert_eq!(rects(2, 2, &mask), vec![(0, 0, 1, 2, A), (1, 1, 1, 1, A)]);
    }
}
