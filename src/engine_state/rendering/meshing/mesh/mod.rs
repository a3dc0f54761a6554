//! Chunk mesh construction.
//!
//! Turns a halo snapshot into quads and packs them into render payloads.
//!
//! # Architecture
//! - [`visible_face`]: decides per voxel face whether it is drawn and with which texture
//! - [`greedy_faces`]: merges coplanar faces with equal texture and pass into rectangles
//! - [`naive_faces`]: emits one quad per visible face, used for reference and debugging
//! - [`ChunkMeshBuilder`]: packs quads into the solid and fluid [`MeshData`]

mod culling;
mod face;
mod greedy;
mod mesh;
mod naive;

pub use culling::{visible_face, MaskCell};
pub use face::Face;
pub use greedy::{greedy_faces, greedy_rects};
pub use mesh::*;
pub use naive::naive_faces;
