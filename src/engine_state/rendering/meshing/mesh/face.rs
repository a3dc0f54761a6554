use crate::engine_state::voxels::block::block_side::BlockSide;

use super::culling::MaskCell;

/// A rectangular quad covering `width` x `height` visible faces of one slice.
///
/// `u` and `v` are the grid axes `(axis + 1) % 3` and `(axis + 2) % 3` of
/// the face's axis; `slice` is the voxel layer the faces belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    /// Which side of the blocks this quad covers
    pub side: BlockSide,
    /// Voxel layer along the face axis
    pub slice: usize,
    /// First cell along the u axis
    pub u: usize,
    /// First cell along the v axis
    pub v: usize,
    /// Number of cells along the u axis
    pub width: usize,
    /// Number of cells along the v axis
    pub height: usize,
    /// Texture and pass shared by every merged cell
    pub cell: MaskCell,
}

/// Texture frame of a side: the (axis, positive) pairs of the right and up
/// directions as seen from outside the face. Right x up equals the normal.
fn texture_frame(side: BlockSide) -> ((usize, bool), (usize, bool)) {
    match side {
        BlockSide::TOP => ((0, true), (2, false)),
        BlockSide::BOTTOM => ((0, true), (2, true)),
        BlockSide::RIGHT => ((2, false), (1, true)),
        BlockSide::LEFT => ((2, true), (1, true)),
        BlockSide::FRONT => ((0, true), (1, true)),
        BlockSide::BACK => ((0, false), (1, true)),
    }
}

impl Face {
    /// Creates a quad for a single voxel face at chunk-local (x, y, z).
    pub fn unit(side: BlockSide, x: usize, y: usize, z: usize, cell: MaskCell) -> Self {
        let position = [x, y, z];
        let axis = side.axis();
        Face {
            side,
            slice: position[axis],
            u: position[(axis + 1) % 3],
            v: position[(axis + 2) % 3],
            width: 1,
            height: 1,
            cell,
        }
    }

    /// Corner positions in chunk-local space as
    /// [lower-left, lower-right, upper-right, upper-left], seen from outside.
    ///
    /// The order is counter-clockwise around the outward normal.
    pub fn corners(&self) -> [[f32; 3]; 4] {
        let axis = self.side.axis();
        let u_axis = (axis + 1) % 3;
        let v_axis = (axis + 2) % 3;

        let mut lo = [0usize; 3];
        let mut hi = [0usize; 3];
        let plane = self.slice + usize::from(self.side.is_positive());
        lo[axis] = plane;
        hi[axis] = plane;
        lo[u_axis] = self.u;
        hi[u_axis] = self.u + self.width;
        lo[v_axis] = self.v;
        hi[v_axis] = self.v + self.height;

        let ((right_axis, right_positive), (up_axis, up_positive)) = texture_frame(self.side);
        let corner = |right_high: bool, up_high: bool| {
            let mut point = lo;
            point[right_axis] = if right_high == right_positive {
                hi[right_axis]
            } else {
                lo[right_axis]
            };
            point[up_axis] = if up_high == up_positive {
                hi[up_axis]
            } else {
                lo[up_axis]
            };
            [point[0] as f32, point[1] as f32, point[2] as f32]
        };

        [
            corner(false, false),
            corner(true, false),
            corner(true, true),
            corner(false, true),
        ]
    }

    /// Size of the quad in blocks along its texture right and up directions.
    pub fn tile_extent(&self) -> [f32; 2] {
        let axis = self.side.axis();
        let ((right_axis, _), _) = texture_frame(self.side);
        if right_axis == (axis + 1) % 3 {
            [self.width as f32, self.height as f32]
        } else {
            [self.height as f32, self.width as f32]
        }
    }

    /// Number of unit faces covered by this quad.
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELL: MaskCell = MaskCell {
        texture: 0,
        fluid: false,
    };

    fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    #[test]
    fn corners_wind_counter_clockwise_around_the_normal() {
        for side in BlockSide::all() {
            let face = Face::unit(side, 2, 3, 4, CELL);
            let [ll, lr, ur, ul] = face.corners();
            let normal = side.normal_f32();
            for (a, b, c) in [(ll, lr, ur), (ll, ur, ul)] {
                let n = cross(sub(b, a), sub(c, a));
                let dot = n[0] * normal[0] + n[1] * normal[1] + n[2] * normal[2];
                assert!(dot > 0.0, "{side:?} winds the wrong way");
            }
        }
    }

    #[test]
    fn corners_lie_on_the_outer_plane() {
        let top = Face::unit(BlockSide::TOP, 2, 3, 4, CELL);
        assert!(top.corners().iter().all(|c| c[1] == 4.0));
        let bottom = Face::unit(BlockSide::BOTTOM, 2, 3, 4, CELL);
        assert!(bottom.corners().iter().all(|c| c[1] == 3.0));
        let left = Face::unit(BlockSide::LEFT, 2, 3, 4, CELL);
        assert!(left.corners().iter().all(|c| c[0] == 2.0));
        let front = Face::unit(BlockSide::FRONT, 2, 3, 4, CELL);
        assert!(front.corners().iter().all(|c| c[2] == 5.0));
    }

    #[test]
    fn extents_follow_the_texture_frame() {
        // TOP: u axis is z, v axis is x, texture right is x.
        let face = Face {
            width: 3,
            height: 5,
            ..Face::unit(BlockSide::TOP, 0, 0, 0, CELL)
        };
        assert_eq!(face.tile_extent(), [5.0, 3.0]);
        assert_eq!(face.area(), 15);

        // FRONT: u axis is x, v axis is y, texture right is x.
        let face = Face {
            width: 3,
            height: 5,
            ..Face::unit(BlockSide::FRONT, 0, 0, 0, CELL)
        };
        assert_eq!(face.tile_extent(), [3.0, 5.0]);
    }
}
