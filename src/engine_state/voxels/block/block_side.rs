//! # Block Side Module
//!
//! This module defines the six faces of a voxel block together with the
//! axis and normal information the mesher needs to sweep each face direction.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
///
/// The discriminants double as the index into a block's per-face texture
/// table, so the order here is the order texture lists are written in
/// configuration files.
///
/// The order is: [BACK, FRONT, TOP, BOTTOM, LEFT, RIGHT]
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The back face (facing negative Z)
    BACK = 0,

    /// The front face (facing positive Z)
    FRONT = 1,

    /// The top face (facing positive Y)
    TOP = 2,

    /// The bottom face (facing negative Y)
    BOTTOM = 3,

    /// The left face (facing negative X)
    LEFT = 4,

    /// The right face (facing positive X)
    RIGHT = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in texture order.
    ///
    /// # Returns
    /// An array containing all `BlockSide` variants.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::BACK,
            BlockSide::FRONT,
            BlockSide::TOP,
            BlockSide::BOTTOM,
            BlockSide::LEFT,
            BlockSide::RIGHT,
        ]
    }

    /// The axis this face is perpendicular to (0 = X, 1 = Y, 2 = Z).
    pub fn axis(&self) -> usize {
        match self {
            BlockSide::LEFT | BlockSide::RIGHT => 0,
            BlockSide::TOP | BlockSide::BOTTOM => 1,
            BlockSide::BACK | BlockSide::FRONT => 2,
        }
    }

    /// Whether the face normal points along the positive direction of its axis.
    pub fn is_positive(&self) -> bool {
        matches!(self, BlockSide::FRONT | BlockSide::TOP | BlockSide::RIGHT)
    }

    /// Integer unit normal of the face, used to step to the neighboring cell.
    pub fn normal(&self) -> Vector3<i32> {
        let mut normal = [0i32; 3];
        normal[self.axis()] = if self.is_positive() { 1 } else { -1 };
        Vector3::new(normal[0], normal[1], normal[2])
    }

    /// Floating point unit normal written into mesh payloads.
    pub fn normal_f32(&self) -> [f32; 3] {
        let normal = self.normal();
        [normal.x as f32, normal.y as f32, normal.z as f32]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_lists_sides_in_texture_order() {
        for (index, side) in BlockSide::all().into_iter().enumerate() {
            assert_eq!(side as usize, index);
        }
    }

    #[test]
    fn normals_point_away_from_the_block() {
        assert_eq!(BlockSide::TOP.normal(), Vector3::new(0, 1, 0));
        assert_eq!(BlockSide::BOTTOM.normal(), Vector3::new(0, -1, 0));
        assert_eq!(BlockSide::LEFT.normal(), Vector3::new(-1, 0, 0));
        assert_eq!(BlockSide::RIGHT.normal(), Vector3::new(1, 0, 0));
        assert_eq!(BlockSide::BACK.normal(), Vector3::new(0, 0, -1));
        assert_eq!(BlockSide::FRONT.normal(), Vector3::new(0, 0, 1));
    }
}
