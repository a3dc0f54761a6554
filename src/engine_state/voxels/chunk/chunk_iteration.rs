//! # Chunk Iteration Module
//!
//! This module provides an iterator over all non-air blocks of a chunk. It
//! walks the flat block array in storage order and skips air, so callers get
//! local positions without having to repeat the linearization math.

use cgmath::Point3;

use crate::engine_state::voxels::block::{BlockId, AIR};

use super::{Chunk, CHUNK_SIZE};

/// An iterator over all non-air blocks in a chunk.
///
/// Yields `(local_position, block_id)` pairs in storage order
/// (X fastest, then Y, then Z).
pub struct ChunkBlockIterator<'a> {
    /// Reference to the chunk being iterated over
    chunk_ref: &'a Chunk,
    /// Next flat index to inspect
    current_offset: usize,
}

impl<'a> ChunkBlockIterator<'a> {
    /// Creates a new `ChunkBlockIterator` for the given chunk.
    ///
    /// # Arguments
    /// * `chunk_ref` - A reference to the chunk to iterate over
    pub fn new(chunk_ref: &'a Chunk) -> Self {
        ChunkBlockIterator {
            chunk_ref,
            current_offset: 0,
        }
    }
}

impl Iterator for ChunkBlockIterator<'_> {
    type Item = (Point3<usize>, BlockId);

    fn next(&mut self) -> Option<Self::Item> {
        let blocks = self.chunk_ref.blocks();
        while self.current_offset < CHUNK_SIZE {
            let index = self.current_offset;
            self.current_offset += 1;

            let block = blocks[index];
            if block != AIR {
                let (x, y, z) = Chunk::local_position(index);
                return Some((Point3::new(x, y, z), block));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_only_non_air_blocks_in_storage_order() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0));
        chunk.set_block(0, 0, 1, 3);
        chunk.set_block(2, 0, 0, 1);
        chunk.set_block(0, 5, 0, 2);

        let blocks: Vec<_> = chunk.iter_blocks().collect();
        assert_eq!(
            blocks,
            vec![
                (Point3::new(2, 0, 0), 1),
                (Point3::new(0, 5, 0), 2),
                (Point3::new(0, 0, 1), 3),
            ]
        );
    }

    #[test]
    fn air_only_chunks_yield_nothing() {
        let chunk = Chunk::new(Point3::new(0, 0, 0));
        assert_eq!(chunk.iter_blocks().count(), 0);
    }
}
