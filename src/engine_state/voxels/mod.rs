//! # Voxel Data
//!
//! This module contains the voxel data of the engine: block definitions,
//! chunks, the world that maps coordinates to chunks and the terrain
//! generator that fills them.
//!
//! ## Architecture
//!
//! * **Block**: block ids, per-type definitions and the registry resolving them
//! * **Chunk**: fixed-size dense block volumes plus their derived state
//! * **World**: sparse chunk storage and cross-chunk block queries
//! * **Terrain**: noise fields, height maps, strata, caves and trees
//!
//! ## Data Flow
//!
//! 1. The streaming scheduler asks the terrain generator to fill a new chunk
//! 2. The chunk is inserted into the world
//! 3. Edits go through `World::set_block`, which marks affected chunks dirty
//! 4. Dirty chunks are copied into halos and remeshed on worker threads
//!
//! ## Thread Safety
//!
//! Everything in here is owned by the control thread. Workers only ever see
//! copies.

pub mod block;
pub mod chunk;
pub mod terrain;
pub mod world;
