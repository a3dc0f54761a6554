//! Interleaved vertex format for uploading chunk meshes.

/// A vertex of a chunk mesh, ready to be copied into a vertex buffer.
///
/// # Memory Layout
/// - Position: [f32; 3] (12 bytes), chunk-local
/// - Normal: [f32; 3] (12 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes), inside one atlas tile
/// - Tile Extent: [f32; 2] (8 bytes), size of the quad in blocks
///
/// Total size: 40 bytes
///
/// A renderer that wants textures repeated once per block across merged
/// quads can tile with `fract(tex_coords_local * tile_extent)` in the shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position relative to the chunk origin
    pub position: [f32; 3],
    /// Outward face normal
    pub normal: [f32; 3],
    /// Atlas UV coordinates
    pub tex_coords: [f32; 2],
    /// Quad width and height in blocks
    pub tile_extent: [f32; 2],
}

impl Vertex {
    /// Size of one vertex in bytes.
    pub const SIZE: usize = std::mem::size_of::<Vertex>();

    /// Creates a new vertex.
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2], tile_extent: [f32; 2]) -> Self {
        Vertex {
            position,
            normal,
            tex_coords,
            tile_extent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertices_cast_to_tightly_packed_bytes() {
        let vertices = [
            Vertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.25, 0.5], [2.0, 1.0]),
            Vertex::new([4.0, 5.0, 6.0], [0.0, 1.0, 0.0], [0.5, 0.75], [2.0, 1.0]),
        ];
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(Vertex::SIZE, 40);
        assert_eq!(bytes.len(), 2 * Vertex::SIZE);
        let back: &[Vertex] = bytemuck::cast_slice(bytes);
        assert_eq!(back, &vertices);
    }
}
