//! Mesh payloads handed from mesh workers to the renderer and physics.
//!
//! A chunk produces two independent payloads from one extraction pass:
//! `solid` for opaque and cutout blocks and `fluid` for fluid blocks. Both
//! store flat attribute arrays plus 32 bit triangle indices; the index width
//! a renderer should upload is decided by `MeshData::index_format`.

use std::sync::Arc;

use crate::engine_state::rendering::atlas::{TextureAtlas, UvRect};
use crate::engine_state::rendering::Vertex;

use super::face::Face;

/// Width of the index buffer a renderer should use for a mesh.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IndexFormat {
    /// 16 bit indices, enough for up to 65535 vertices.
    U16,
    /// 32 bit indices.
    U32,
}

/// Flat vertex attribute arrays and triangle indices of one render pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    /// Chunk-local vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Outward unit normals
    pub normals: Vec<[f32; 3]>,
    /// Atlas UV coordinates, all four corners of a quad inside one tile
    pub uvs: Vec<[f32; 2]>,
    /// Quad size in blocks, repeated on every vertex of the quad
    pub tile_extents: Vec<[f32; 2]>,
    /// Triangle list, counter-clockwise seen from outside
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of quads (two triangles each).
    pub fn quad_count(&self) -> usize {
        self.indices.len() / 6
    }

    /// Whether the mesh has no geometry.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Index width needed to address every vertex.
    pub fn index_format(&self) -> IndexFormat {
        if self.vertex_count() <= u16::MAX as usize {
            IndexFormat::U16
        } else {
            IndexFormat::U32
        }
    }

    /// Indices narrowed to 16 bits, if `index_format` allows it.
    pub fn indices_u16(&self) -> Option<Vec<u16>> {
        match self.index_format() {
            IndexFormat::U16 => Some(self.indices.iter().map(|&index| index as u16).collect()),
            IndexFormat::U32 => None,
        }
    }

    /// Interleaves the attribute arrays into upload-ready vertices.
    pub fn to_vertices(&self) -> Vec<Vertex> {
        (0..self.vertex_count())
            .map(|i| {
                Vertex::new(
                    self.positions[i],
                    self.normals[i],
                    self.uvs[i],
                    self.tile_extents[i],
                )
            })
            .collect()
    }

    /// Appends the four vertices and two triangles of `face`.
    ///
    /// Every corner maps to the matching corner of `uv_rect`, so the whole
    /// quad samples exactly one atlas tile regardless of its size.
    pub fn push_face(&mut self, face: &Face, uv_rect: UvRect) {
        let base = self.positions.len() as u32;
        let normal = face.side.normal_f32();
        let extent = face.tile_extent();

        self.positions.extend_from_slice(&face.corners());
        self.normals.extend_from_slice(&[normal; 4]);
        self.uvs.extend_from_slice(&[
            [uv_rect.u_min, uv_rect.v_min],
            [uv_rect.u_max, uv_rect.v_min],
            [uv_rect.u_max, uv_rect.v_max],
            [uv_rect.u_min, uv_rect.v_max],
        ]);
        self.tile_extents.extend_from_slice(&[extent; 4]);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// The solid and fluid meshes of one chunk.
///
/// Payloads are reference counted so the physics side can hold the solid
/// mesh as its collider without copying it.
#[derive(Clone, Debug, Default)]
pub struct ChunkMesh {
    /// Opaque and cutout geometry
    pub solid: Arc<MeshData>,
    /// Fluid geometry
    pub fluid: Arc<MeshData>,
}

impl ChunkMesh {
    /// Whether neither pass has geometry.
    pub fn is_empty(&self) -> bool {
        self.solid.is_empty() && self.fluid.is_empty()
    }

    /// Triangles over both passes.
    pub fn triangle_count(&self) -> usize {
        self.solid.triangle_count() + self.fluid.triangle_count()
    }
}

/// Accumulates quads into the solid and fluid payloads.
pub struct ChunkMeshBuilder<'a> {
    atlas: &'a TextureAtlas,
    solid: MeshData,
    fluid: MeshData,
}

impl<'a> ChunkMeshBuilder<'a> {
    /// Creates an empty builder mapping textures through `atlas`.
    pub fn new(atlas: &'a TextureAtlas) -> Self {
        ChunkMeshBuilder {
            atlas,
            solid: MeshData::default(),
            fluid: MeshData::default(),
        }
    }

    /// Routes `face` to the pass of its cell.
    pub fn push_face(&mut self, face: &Face) {
        let uv_rect = self.atlas.uv_rect(face.cell.texture);
        if face.cell.fluid {
            self.fluid.push_face(face, uv_rect);
        } else {
            self.solid.push_face(face, uv_rect);
        }
    }

    /// Finishes both payloads.
    pub fn finish(self) -> ChunkMesh {
        ChunkMesh {
            solid: Arc::new(self.solid),
            fluid: Arc::new(self.fluid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::config::AtlasSettings;
    use crate::engine_state::rendering::meshing::mesh::MaskCell;
    use crate::engine_state::voxels::block::block_side::BlockSide;

    #[test]
    fn faces_add_four_vertices_and_two_triangles() {
        let atlas = TextureAtlas::new(&AtlasSettings::default()).unwrap();
        let face = Face::unit(
            BlockSide::TOP,
            1,
            1,
            1,
            MaskCell {
                texture: 2,
                fluid: false,
            },
        );

        let mut mesh = MeshData::default();
        mesh.push_face(&face, atlas.uv_rect(2));
        mesh.push_face(&face, atlas.uv_rect(2));

        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(mesh.quad_count(), 2);
        assert_eq!(&mesh.indices[6..], &[4, 5, 6, 4, 6, 7]);
        assert_eq!(mesh.to_vertices().len(), 8);
        assert_eq!(mesh.normals[0], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn index_format_switches_past_u16_range() {
        let mut mesh = MeshData {
            positions: vec![[0.0; 3]; u16::MAX as usize],
            ..MeshData::default()
        };
        assert_eq!(mesh.index_format(), IndexFormat::U16);
        assert!(mesh.indices_u16().is_some());

        mesh.positions.push([0.0; 3]);
        assert_eq!(mesh.index_format(), IndexFormat::U32);
        assert!(mesh.indices_u16().is_none());
    }

    #[test]
    fn builder_splits_passes() {
        let atlas = TextureAtlas::new(&AtlasSettings::default()).unwrap();
        let mut builder = ChunkMeshBuilder::new(&atlas);
        let solid = MaskCell {
            texture: 3,
            fluid: false,
        };
        let fluid = MaskCell {
            texture: 7,
            fluid: true,
        };
        builder.push_face(&Face::unit(BlockSide::TOP, 0, 0, 0, solid));
        builder.push_face(&Face::unit(BlockSide::TOP, 1, 0, 0, fluid));
        builder.push_face(&Face::unit(BlockSide::LEFT, 1, 0, 0, fluid));

        let mesh = builder.finish();
        assert_eq!(mesh.solid.quad_count(), 1);
        assert_eq!(mesh.fluid.quad_count(), 2);
        assert_eq!(mesh.triangle_count(), 6);
        assert!(!mesh.is_empty());
        assert!(ChunkMesh::default().is_empty());
    }
}
