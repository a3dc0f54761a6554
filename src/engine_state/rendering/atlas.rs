//! Texture atlas layout and UV lookup.
//!
//! Tiles are numbered row by row starting at the top-left tile of the atlas
//! image, while UV space has V pointing up, so row 0 of the numbering is the
//! last row in UV space.

use log::warn;

use crate::engine_state::config::{AtlasSettings, ConfigError};
use crate::engine_state::voxels::block::{BlockDefinition, TextureIndex};

/// Normalized UV rectangle of one atlas tile.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UvRect {
    /// Left edge.
    pub u_min: f32,
    /// Bottom edge.
    pub v_min: f32,
    /// Right edge.
    pub u_max: f32,
    /// Top edge.
    pub v_max: f32,
}

impl UvRect {
    /// Whether `uv` lies inside the rectangle, edges included.
    pub fn contains(&self, uv: [f32; 2]) -> bool {
        (self.u_min..=self.u_max).contains(&uv[0]) && (self.v_min..=self.v_max).contains(&uv[1])
    }
}

/// Grid layout of the texture atlas.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TextureAtlas {
    columns: u32,
    rows: u32,
    half_texel_u: f32,
    half_texel_v: f32,
}

impl TextureAtlas {
    /// Derives the tile grid from the atlas size and tile resolution.
    ///
    /// # Returns
    /// `ConfigError::Invalid` if the tile resolution is zero or the atlas has
    /// no complete row or column of tiles. An atlas that is not an exact
    /// multiple of the tile size only logs a warning; the partial tiles are
    /// ignored.
    pub fn new(settings: &AtlasSettings) -> Result<Self, ConfigError> {
        if settings.tile_resolution == 0 {
            return Err(ConfigError::Invalid(
                "atlas tile resolution must be non-zero".to_string(),
            ));
        }

        let columns = settings.width / settings.tile_resolution;
        let rows = settings.height / settings.tile_resolution;
        if columns == 0 || rows == 0 {
            return Err(ConfigError::Invalid(format!(
                "atlas of {}x{} pixels holds no {} pixel tiles",
                settings.width, settings.height, settings.tile_resolution
            )));
        }

        if settings.width % settings.tile_resolution != 0
            || settings.height % settings.tile_resolution != 0
        {
            warn!(
                "Atlas size {}x{} is not a multiple of the tile resolution {}",
                settings.width, settings.height, settings.tile_resolution
            );
        }

        Ok(TextureAtlas {
            columns,
            rows,
            half_texel_u: 0.5 / settings.width as f32,
            half_texel_v: 0.5 / settings.height as f32,
        })
    }

    /// Number of tile columns.
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of tiles.
    pub fn tile_count(&self) -> u32 {
        self.columns * self.rows
    }

    /// Column and row of a texture index in UV space (row 0 at the bottom).
    ///
    /// Indices past the last tile resolve to tile 0.
    pub fn tile_of(&self, texture: TextureIndex) -> (u32, u32) {
        let texture = if (texture as u32) < self.tile_count() {
            texture as u32
        } else {
            0
        };
        let column = texture % self.columns;
        let row = self.rows - 1 - texture / self.columns;
        (column, row)
    }

    /// UV rectangle of a texture index, inset by half a texel on every edge.
    pub fn uv_rect(&self, texture: TextureIndex) -> UvRect {
        let (column, row) = self.tile_of(texture);
        let tile_u = 1.0 / self.columns as f32;
        let tile_v = 1.0 / self.rows as f32;

        UvRect {
            u_min: column as f32 * tile_u + self.half_texel_u,
            v_min: row as f32 * tile_v + self.half_texel_v,
            u_max: (column + 1) as f32 * tile_u - self.half_texel_u,
            v_max: (row + 1) as f32 * tile_v - self.half_texel_v,
        }
    }

    /// Column and row of the tile containing a UV coordinate.
    pub fn tile_at(&self, uv: [f32; 2]) -> (u32, u32) {
        let column = (uv[0] * self.columns as f32).floor() as u32;
        let row = (uv[1] * self.rows as f32).floor() as u32;
        (column.min(self.columns - 1), row.min(self.rows - 1))
    }

    /// Logs every block texture that does not fit in the atlas.
    ///
    /// # Returns
    /// The number of out-of-range texture references.
    pub fn check_blocks(&self, blocks: &[BlockDefinition]) -> usize {
        let mut missing = 0;
        for block in blocks {
            for texture in block.textures {
                if texture as u32 >= self.tile_count() {
                    warn!(
                        "Block '{}' uses texture {} but the atlas only has {} tiles",
                        block.name,
                        texture,
                        self.tile_count()
                    );
                    missing += 1;
                }
            }
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atlas(width: u32, height: u32, tile_resolution: u32) -> Result<TextureAtlas, ConfigError> {
        TextureAtlas::new(&AtlasSettings {
            width,
            height,
            tile_resolution,
        })
    }

    #[test]
    fn rows_are_counted_from_the_top() {
        let atlas = atlas(64, 32, 16).unwrap();
        assert_eq!((atlas.columns(), atlas.rows()), (4, 2));
        assert_eq!(atlas.tile_of(0), (0, 1));
        assert_eq!(atlas.tile_of(3), (3, 1));
        assert_eq!(atlas.tile_of(4), (0, 0));
        assert_eq!(atlas.tile_of(99), (0, 1));
    }

    #[test]
    fn uv_rects_are_inset_by_half_a_texel() {
        let atlas = atlas(64, 64, 16).unwrap();
        let rect = atlas.uv_rect(5);
        let half = 0.5 / 64.0;
        assert!((rect.u_min - (0.25 + half)).abs() < 1e-6);
        assert!((rect.u_max - (0.5 - half)).abs() < 1e-6);
        assert!((rect.v_min - (0.5 + half)).abs() < 1e-6);
        assert!((rect.v_max - (0.75 - half)).abs() < 1e-6);
        assert_eq!(atlas.tile_at([rect.u_min, rect.v_min]), atlas.tile_of(5));
        assert_eq!(atlas.tile_at([rect.u_max, rect.v_max]), atlas.tile_of(5));
    }

    #[test]
    fn degenerate_layouts_are_rejected() {
        assert!(atlas(64, 64, 0).is_err());
        assert!(atlas(8, 64, 16).is_err());
        assert!(atlas(70, 64, 16).is_ok());
    }

    #[test]
    fn out_of_range_block_textures_are_counted() {
        let atlas = atlas(32, 32, 16).unwrap();
        let blocks = vec![
            BlockDefinition::uniform("ok", 3),
            BlockDefinition::column("too_big", 1, 4, 1),
        ];
        assert_eq!(atlas.check_blocks(&blocks), 1);
    }
}
