//! Renderer-facing data for the voxel engine.
//!
//! This module turns voxel data into the buffers a renderer consumes. It
//! does not talk to any graphics API: meshes come out as flat attribute
//! arrays, or as interleaved [`Vertex`] buffers ready for upload, together
//! with the index width to use.
//!
//! - `atlas`: texture atlas layout and UV rectangles
//! - `meshing`: halo snapshots, face culling and greedy meshing
//! - `tasks`: background mesh generation
//! - `vertex`: the interleaved vertex format

pub mod atlas;
pub mod meshing;
pub mod tasks;
mod vertex;

// Re-export commonly used types
pub use vertex::Vertex;
