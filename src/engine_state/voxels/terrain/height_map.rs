//! Per-footprint ground levels, computed once per (x, z) column.

use std::mem::size_of;

use crate::engine_state::voxels::chunk::{CHUNK_DIMENSION_X, CHUNK_DIMENSION_Z};

use super::TerrainError;

const COLUMN_COUNT: usize = CHUNK_DIMENSION_X * CHUNK_DIMENSION_Z;

/// Ground level of every column of one chunk footprint.
///
/// Indexed `x + z * CHUNK_DIMENSION_X`. The buffer is owned, so any early
/// return while it is being filled releases it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeightMap {
    levels: Vec<i32>,
    lowest: i32,
    highest: i32,
}

impl HeightMap {
    /// Fills a height map by evaluating `ground_level(local_x, local_z)` once per column.
    ///
    /// # Returns
    /// `TerrainError::ScratchAllocation` if the buffer cannot be reserved.
    pub fn build<F>(mut ground_level: F) -> Result<Self, TerrainError>
    where
        F: FnMut(usize, usize) -> i32,
    {
        let mut levels = Vec::new();
        levels
            .try_reserve_exact(COLUMN_COUNT)
            .map_err(|_| TerrainError::ScratchAllocation {
                bytes: COLUMN_COUNT * size_of::<i32>(),
            })?;

        let mut lowest = i32::MAX;
        let mut highest = i32::MIN;
        for z in 0..CHUNK_DIMENSION_Z {
            for x in 0..CHUNK_DIMENSION_X {
                let level = ground_level(x, z);
                lowest = lowest.min(level);
                highest = highest.max(level);
                levels.push(level);
            }
        }

        Ok(HeightMap {
            levels,
            lowest,
            highest,
        })
    }

    /// Ground level of the local column (x, z).
    #[inline]
    pub fn get(&self, x: usize, z: usize) -> i32 {
        debug_assert!(x < CHUNK_DIMENSION_X && z < CHUNK_DIMENSION_Z);
        self.levels[x + z * CHUNK_DIMENSION_X]
    }

    /// Lowest ground level over the footprint.
    pub fn lowest(&self) -> i32 {
        self.lowest
    }

    /// Highest ground level over the footprint.
    pub fn highest(&self) -> i32 {
        self.highest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_extremes_and_layout() {
        let map = HeightMap::build(|x, z| (x as i32) - (z as i32) * 2).unwrap();
        assert_eq!(map.get(3, 0), 3);
        assert_eq!(map.get(0, 4), -8);
        assert_eq!(map.lowest(), -2 * (CHUNK_DIMENSION_Z as i32 - 1));
        assert_eq!(map.highest(), CHUNK_DIMENSION_X as i32 - 1);
    }

    #[test]
    fn evaluates_each_column_once() {
        let mut calls = 0;
        let map = HeightMap::build(|_, _| {
            calls += 1;
            10
        })
        .unwrap();
        assert_eq!(calls, COLUMN_COUNT);
        assert_eq!(map.lowest(), 10);
        assert_eq!(map.highest(), 10);
    }
}
