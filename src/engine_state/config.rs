//! # Engine Configuration
//!
//! All tunables of the engine in one serde-friendly tree. Every section has
//! defaults, so a configuration file only needs to name the values it
//! changes:
//!
//! ```json
//! {
//!     "seed": 1234,
//!     "streaming": { "view_distance": 8 },
//!     "terrain": { "caves": { "enabled": false } }
//! }
//! ```

use std::{fs, path::Path, path::PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::rendering::atlas::TextureAtlas;
use super::voxels::block::{block_type::BlockType, default_block_definitions, BlockDefinition};
use super::voxels::chunk::CHUNK_DIMENSION_X;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for `EngineConfig`.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of its allowed range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Parameters of one coherent-noise layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseLayerSettings {
    /// Feature size in blocks. The sampling frequency is `1 / scale`.
    pub scale: f64,
    /// Output multiplier, clamped to be non-negative.
    pub amplitude: f64,
    /// Exponent applied to the remapped noise value.
    pub redistribution: f64,
    /// Static (x, z) offset added to the sample position.
    pub offset: [f64; 2],
}

impl NoiseLayerSettings {
    /// Creates layer settings with a zero offset.
    pub fn new(scale: f64, amplitude: f64, redistribution: f64) -> Self {
        NoiseLayerSettings {
            scale,
            amplitude,
            redistribution,
            offset: [0.0, 0.0],
        }
    }
}

impl Default for NoiseLayerSettings {
    fn default() -> Self {
        NoiseLayerSettings::new(100.0, 1.0, 1.0)
    }
}

/// Cave carving parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveSettings {
    /// Whether caves are carved at all.
    pub enabled: bool,
    /// Feature size of caves along X and Z.
    pub horizontal_scale: f64,
    /// Feature size of caves along Y.
    pub vertical_scale: f64,
    /// Remapped noise value above which a cell is carved.
    pub threshold: f64,
    /// Minimum depth below the surface before carving starts.
    pub surface_clearance: i32,
    /// Static offset added to the sample position.
    pub offset: [f64; 3],
}

impl Default for CaveSettings {
    fn default() -> Self {
        CaveSettings {
            enabled: true,
            horizontal_scale: 24.0,
            vertical_scale: 16.0,
            threshold: 0.72,
            surface_clearance: 4,
            offset: [0.0, 0.0, 0.0],
        }
    }
}

/// Vegetation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeSettings {
    /// Whether trees are placed at all.
    pub enabled: bool,
    /// No tree grows on surfaces at or above this world height.
    pub tree_line: i32,
    /// One grass cell in `chance` grows a tree.
    pub chance: u32,
}

impl Default for TreeSettings {
    fn default() -> Self {
        TreeSettings {
            enabled: true,
            tree_line: 70,
            chance: 50,
        }
    }
}

/// Terrain shape parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    /// Large, smooth landmass layer.
    pub continent: NoiseLayerSettings,
    /// Layer deciding where mountains rise.
    pub mountain: NoiseLayerSettings,
    /// Small scale surface variation.
    pub detail: NoiseLayerSettings,
    /// Ridged layer shaping mountain crests.
    pub ridge: NoiseLayerSettings,
    /// Multiplier of the continent layer in flat areas.
    pub flat_multiplier: f64,
    /// Multiplier of the mountain term.
    pub mountain_multiplier: f64,
    /// Mountain layer value where the blend towards mountains starts.
    pub mountain_blend_start: f64,
    /// How quickly the blend saturates past `mountain_blend_start`.
    pub mountain_blend_sharpness: f64,
    /// Height in blocks spanned by a normalized height of 1.
    pub noise_height: f64,
    /// World height of a normalized height of 0.
    pub ground_offset: i32,
    /// Water fills air up to `ground_offset + water_margin`.
    pub water_margin: i32,
    /// Surface blocks at or above this height are snow-grass.
    pub snow_level: i32,
    /// Number of per-column heightmaps kept in the LRU cache.
    pub height_cache_capacity: usize,
    /// Cave carving.
    pub caves: CaveSettings,
    /// Vegetation.
    pub trees: TreeSettings,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        TerrainSettings {
            continent: NoiseLayerSettings::new(320.0, 1.0, 1.15),
            mountain: NoiseLayerSettings::new(120.0, 1.0, 1.05),
            detail: NoiseLayerSettings::new(40.0, 0.5, 1.0),
            ridge: NoiseLayerSettings::new(60.0, 0.8, 2.0),
            flat_multiplier: 0.65,
            mountain_multiplier: 2.5,
            mountain_blend_start: 0.55,
            mountain_blend_sharpness: 2.0,
            noise_height: 48.0,
            ground_offset: 32,
            water_margin: 6,
            snow_level: 72,
            height_cache_capacity: 1024,
            caves: CaveSettings::default(),
            trees: TreeSettings::default(),
        }
    }
}

/// Chunk streaming parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingSettings {
    /// Horizontal view radius in chunks.
    pub view_distance: i32,
    /// Vertical view radius in chunks.
    pub view_distance_y: i32,
    /// Chunks allocated and filled per tick.
    pub max_creates_per_tick: usize,
    /// Mesh requests attempted per tick.
    pub max_generates_per_tick: usize,
    /// Distance in blocks the viewer must move before visibility is recomputed.
    pub chunk_update_threshold: f32,
    /// Whether solid meshes are shared with the physics side.
    pub add_colliders: bool,
    /// Maximum distance in blocks from viewer to chunk origin for a collider.
    pub collider_distance: f32,
    /// Deactivate chunks that leave the horizontal view radius.
    pub deactivate_out_of_range: bool,
    /// Drop chunks that leave the view radius by more than `eviction_margin`.
    pub evict_out_of_range: bool,
    /// Extra chunks kept around the view radius before eviction.
    pub eviction_margin: i32,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        StreamingSettings {
            view_distance: 5,
            view_distance_y: 2,
            max_creates_per_tick: 2,
            max_generates_per_tick: 2,
            chunk_update_threshold: 1.0,
            add_colliders: true,
            collider_distance: (CHUNK_DIMENSION_X + 5) as f32,
            deactivate_out_of_range: true,
            evict_out_of_range: false,
            eviction_margin: 2,
        }
    }
}

/// Layout of the texture atlas the mesher maps UVs into.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasSettings {
    /// Atlas width in pixels.
    pub width: u32,
    /// Atlas height in pixels.
    pub height: u32,
    /// Edge length of one square tile in pixels.
    pub tile_resolution: u32,
}

impl Default for AtlasSettings {
    fn default() -> Self {
        AtlasSettings {
            width: 64,
            height: 64,
            tile_resolution: 16,
        }
    }
}

/// Mesh extraction parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshingSettings {
    /// Merge coplanar faces into rectangles. When off, one quad per face.
    pub greedy: bool,
    /// Atlas layout for UV mapping.
    pub atlas: AtlasSettings,
}

impl Default for MeshingSettings {
    fn default() -> Self {
        MeshingSettings {
            greedy: true,
            atlas: AtlasSettings::default(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// World seed. The same seed always produces the same terrain.
    pub seed: u64,
    /// Mesh worker threads. Zero runs mesh tasks inline on the control thread.
    pub worker_threads: usize,
    /// Terrain shape.
    pub terrain: TerrainSettings,
    /// Chunk streaming.
    pub streaming: StreamingSettings,
    /// Mesh extraction.
    pub meshing: MeshingSettings,
    /// Ordered block list; the position is the block id.
    pub blocks: Vec<BlockDefinition>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            seed: 0,
            worker_threads: 4,
            terrain: TerrainSettings::default(),
            streaming: StreamingSettings::default(),
            meshing: MeshingSettings::default(),
            blocks: default_block_definitions(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = EngineConfig::from_json_str(&json)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks value ranges.
    ///
    /// Content mismatches that the engine can work around (an atlas that is
    /// not an exact multiple of the tile size, a block list missing some
    /// terrain ids) only log a warning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        TextureAtlas::new(&self.meshing.atlas)?;

        let streaming = &self.streaming;
        if streaming.view_distance < 0 || streaming.view_distance_y < 0 {
            return Err(ConfigError::Invalid(format!(
                "view distances must be non-negative, got ({}, {})",
                streaming.view_distance, streaming.view_distance_y
            )));
        }
        if streaming.max_creates_per_tick == 0 || streaming.max_generates_per_tick == 0 {
            return Err(ConfigError::Invalid(
                "per-tick creation and generation caps must be at least 1".to_string(),
            ));
        }
        if streaming.eviction_margin < 0 {
            return Err(ConfigError::Invalid(format!(
                "eviction margin must be non-negative, got {}",
                streaming.eviction_margin
            )));
        }

        if self.terrain.noise_height < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "noise height must be non-negative, got {}",
                self.terrain.noise_height
            )));
        }
        if self.terrain.trees.chance == 0 {
            return Err(ConfigError::Invalid(
                "tree chance must be at least 1".to_string(),
            ));
        }

        match self.blocks.first() {
            None => {
                return Err(ConfigError::Invalid("block list is empty".to_string()));
            }
            Some(air) if !air.is_transparent => {
                return Err(ConfigError::Invalid(format!(
                    "block id 0 must be a transparent air block, got '{}'",
                    air.name
                )));
            }
            Some(_) => {}
        }

        let terrain_ids = BlockType::SNOW_GRASS as usize + 1;
        if self.blocks.len() < terrain_ids {
            warn!(
                "Block list has {} entries but terrain uses ids up to {}; missing ids render as air",
                self.blocks.len(),
                terrain_ids - 1
            );
        }

        Ok(())
    }
}
