//! # Terrain Generator
//!
//! Fills a chunk's blocks from the height field, cave field and vegetation
//! rules. Generation is a pure function of the world seed, the terrain
//! settings and the chunk coordinate: generating the same chunk twice yields
//! byte-identical blocks.

use std::num::NonZeroUsize;
use std::sync::Arc;

use log::{debug, trace};
use lru::LruCache;
use web_time::Instant;

use crate::engine_state::config::TerrainSettings;
use crate::engine_state::voxels::block::{block_type::BlockType, BlockId, AIR};
use crate::engine_state::voxels::chunk::{
    Chunk, CHUNK_DIMENSION_X, CHUNK_DIMENSION_Y, CHUNK_DIMENSION_Z,
};

use super::height_map::HeightMap;
use super::noise_field::{CaveField, NoiseField};
use super::vegetation;
use super::TerrainError;

/// Thickness of the dirt band below the surface block, surface included.
pub const DIRT_DEPTH: i32 = 5;

/// Generates terrain for chunks of one world.
///
/// The generator keeps an LRU cache of height maps keyed by the chunk's
/// (x, z) footprint. A column of chunks shares one height map, so the height
/// field is evaluated once per column no matter how many chunks are stacked
/// on it.
pub struct TerrainGenerator {
    seed: u64,
    settings: TerrainSettings,
    height_field: NoiseField,
    caves: Option<CaveField>,
    height_maps: LruCache<(i32, i32), Arc<HeightMap>>,
}

impl TerrainGenerator {
    /// Creates a generator for `seed`.
    ///
    /// # Arguments
    /// * `seed` - World seed
    /// * `settings` - Terrain shape parameters
    pub fn new(seed: u64, settings: &TerrainSettings) -> Self {
        let capacity = NonZeroUsize::new(settings.height_cache_capacity.max(1))
            .unwrap_or(NonZeroUsize::MIN);

        TerrainGenerator {
            seed,
            settings: settings.clone(),
            height_field: NoiseField::new(seed, settings),
            caves: settings
                .caves
                .enabled
                .then(|| CaveField::new(seed, &settings.caves)),
            height_maps: LruCache::new(capacity),
        }
    }

    /// World seed of this generator.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Highest world Y filled with water.
    pub fn water_level(&self) -> i32 {
        self.settings.ground_offset + self.settings.water_margin
    }

    /// Ground level of the world column (x, z), evaluated directly from the height field.
    pub fn ground_level_at(&self, x: i32, z: i32) -> i32 {
        let height = self.height_field.height_at(x, z);
        (height * self.settings.noise_height).floor() as i32 + self.settings.ground_offset
    }

    /// Classifies a cell by its height relative to the column's ground level.
    pub fn block_for(&self, world_y: i32, ground_level: i32) -> BlockId {
        if world_y > ground_level {
            if world_y <= self.water_level() {
                BlockType::WATER.id()
            } else {
                AIR
            }
        } else if world_y == ground_level {
            if ground_level >= self.settings.snow_level {
                BlockType::SNOW_GRASS.id()
            } else {
                BlockType::GRASS.id()
            }
        } else if world_y > ground_level - DIRT_DEPTH {
            BlockType::DIRT.id()
        } else {
            BlockType::STONE.id()
        }
    }

    /// Returns the height map of the footprint (cx, cz), computing it on a cache miss.
    pub fn height_map(&mut self, cx: i32, cz: i32) -> Result<Arc<HeightMap>, TerrainError> {
        if let Some(height_map) = self.height_maps.get(&(cx, cz)) {
            return Ok(Arc::clone(height_map));
        }

        let origin_x = cx * CHUNK_DIMENSION_X as i32;
        let origin_z = cz * CHUNK_DIMENSION_Z as i32;
        let height_map = Arc::new(HeightMap::build(|x, z| {
            self.ground_level_at(origin_x + x as i32, origin_z + z as i32)
        })?);
        self.height_maps.put((cx, cz), Arc::clone(&height_map));
        Ok(height_map)
    }

    /// Fills `chunk` with terrain and updates its derived fields.
    ///
    /// # Returns
    /// `TerrainError::ScratchAllocation` if the height map could not be
    /// allocated. The chunk is left untouched in that case.
    pub fn generate(&mut self, chunk: &mut Chunk) -> Result<(), TerrainError> {
        let start = Instant::now();
        let height_map = self.height_map(chunk.position.x, chunk.position.z)?;
        let origin = chunk.origin();
        let bottom = origin.y;
        let top = origin.y + CHUNK_DIMENSION_Y as i32 - 1;

        chunk.lowest_ground_level = height_map.lowest();
        chunk.highest_ground_level = height_map.highest();
        chunk.contains_surface = bottom <= height_map.highest() && top >= height_map.lowest();
        chunk.is_buried = top <= height_map.lowest() - DIRT_DEPTH;

        if bottom > height_map.highest() && bottom > self.water_level() {
            chunk.fill(AIR);
            chunk.is_generated = true;
            trace!("Chunk {:?} is above the surface, left as air", chunk.position);
            return Ok(());
        }

        if chunk.is_buried && self.caves.is_none() {
            chunk.fill(BlockType::STONE.id());
            chunk.is_generated = true;
            trace!("Chunk {:?} is buried, filled with stone", chunk.position);
            return Ok(());
        }

        self.fill_columns(chunk, &height_map);

        let trees = if self.settings.trees.enabled {
            vegetation::plant_trees(
                chunk,
                &height_map,
                self.seed,
                &self.settings.trees,
                self.water_level(),
            )
        } else {
            0
        };

        chunk.refresh_air_only();
        chunk.is_generated = true;

        debug!(
            "Generated chunk {:?} ({} trees) in {:?}",
            chunk.position,
            trees,
            start.elapsed()
        );
        Ok(())
    }

    fn fill_columns(&self, chunk: &mut Chunk, height_map: &HeightMap) {
        let origin = chunk.origin();
        let caves = self.caves.as_ref();
        let blocks = chunk.blocks_mut();

        for z in 0..CHUNK_DIMENSION_Z {
            let world_z = origin.z + z as i32;
            for x in 0..CHUNK_DIMENSION_X {
                let world_x = origin.x + x as i32;
                let ground = height_map.get(x, z);

                for y in 0..CHUNK_DIMENSION_Y {
                    let world_y = origin.y + y as i32;
                    let mut block = self.block_for(world_y, ground);

                    if block != AIR {
                        if let Some(caves) = caves {
                            if caves.should_carve(world_x, world_y, world_z, ground) {
                                block = AIR;
                            }
                        }
                    }

                    blocks[Chunk::index(x, y, z)] = block;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point3;

    fn flat_settings() -> TerrainSettings {
        let mut settings = TerrainSettings {
            noise_height: 0.0,
            ground_offset: 10,
            water_margin: 0,
            ..TerrainSettings::default()
        };
        settings.caves.enabled = false;
        settings.trees.enabled = false;
        settings
    }

    #[test]
    fn flat_world_has_fixed_strata() {
        let mut generator = TerrainGenerator::new(99, &flat_settings());
        let mut chunk = Chunk::new(Point3::new(0, 0, 0));
        generator.generate(&mut chunk).unwrap();

        assert_eq!(chunk.lowest_ground_level, 10);
        assert_eq!(chunk.highest_ground_level, 10);
        assert!(chunk.contains_surface);
        assert!(!chunk.is_air_only);
        for z in 0..CHUNK_DIMENSION_Z {
            for x in 0..CHUNK_DIMENSION_X {
                for y in 0..CHUNK_DIMENSION_Y {
                    let expected = match y {
                        11.. => AIR,
                        10 => BlockType::GRASS.id(),
                        6..=9 => BlockType::DIRT.id(),
                        _ => BlockType::STONE.id(),
                    };
                    assert_eq!(chunk.get_block(x, y, z), expected, "({x}, {y}, {z})");
                }
            }
        }
    }

    #[test]
    fn water_fills_up_to_the_margin() {
        let settings = TerrainSettings {
            water_margin: 3,
            ..flat_settings()
        };
        let generator = TerrainGenerator::new(1, &settings);
        assert_eq!(generator.block_for(11, 10), BlockType::WATER.id());
        assert_eq!(generator.block_for(13, 10), BlockType::WATER.id());
        assert_eq!(generator.block_for(14, 10), AIR);
    }

    #[test]
    fn snow_caps_high_ground() {
        let settings = TerrainSettings {
            snow_level: 20,
            ..flat_settings()
        };
        let generator = TerrainGenerator::new(1, &settings);
        assert_eq!(generator.block_for(20, 20), BlockType::SNOW_GRASS.id());
        assert_eq!(generator.block_for(19, 19), BlockType::GRASS.id());
    }

    #[test]
    fn fast_paths_classify_whole_chunks() {
        let mut generator = TerrainGenerator::new(4, &flat_settings());

        let mut sky = Chunk::new(Point3::new(0, 1, 0));
        generator.generate(&mut sky).unwrap();
        assert!(sky.is_air_only);
        assert!(sky.is_generated);
        assert!(!sky.contains_surface);

        let mut deep = Chunk::new(Point3::new(0, -1, 0));
        generator.generate(&mut deep).unwrap();
        assert!(deep.is_buried);
        assert!(deep.blocks().iter().all(|b| *b == BlockType::STONE.id()));
    }

    #[test]
    fn height_maps_match_the_direct_formula() {
        let mut generator = TerrainGenerator::new(2024, &TerrainSettings::default());
        for (cx, cz) in [(0, 0), (-1, 3), (7, -5)] {
            let height_map = generator.height_map(cx, cz).unwrap();
            for z in 0..CHUNK_DIMENSION_Z {
                for x in 0..CHUNK_DIMENSION_X {
                    let world_x = cx * CHUNK_DIMENSION_X as i32 + x as i32;
                    let world_z = cz * CHUNK_DIMENSION_Z as i32 + z as i32;
                    assert_eq!(height_map.get(x, z), generator.ground_level_at(world_x, world_z));
                }
            }
        }
    }

    #[test]
    fn cached_height_maps_are_shared_by_stacked_chunks() {
        let mut generator = TerrainGenerator::new(5, &TerrainSettings::default());
        let a = generator.height_map(2, 3).unwrap();
        let b = generator.height_map(2, 3).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn generation_is_deterministic() {
        let settings = TerrainSettings::default();
        for position in [Point3::new(0, 0, 0), Point3::new(-3, 0, 2), Point3::new(1, 1, -1)] {
            let mut first = Chunk::new(position);
            let mut second = Chunk::new(position);
            TerrainGenerator::new(31337, &settings)
                .generate(&mut first)
                .unwrap();
            let mut reused = TerrainGenerator::new(31337, &settings);
            reused.generate(&mut Chunk::new(Point3::new(9, 0, 9))).unwrap();
            reused.generate(&mut second).unwrap();
            assert_eq!(first.blocks(), second.blocks());
        }
    }
}
