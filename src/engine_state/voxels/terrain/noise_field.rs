//! # Noise Field
//!
//! Stateless scalar fields built from layered coherent noise. Every function
//! here is a pure function of its inputs, so the same seed and position
//! always produce the same value on any thread.
//!
//! ## Layers
//!
//! A layer samples noise at `(pos + offset) * frequency`, remaps it from
//! [-1, 1] to [0, 1], applies a redistribution exponent and scales the result
//! by its amplitude. Ridged layers fold the raw noise as `(1 - |n|)^2` before
//! redistribution, which produces sharp crests.
//!
//! ## Height Blend
//!
//! The normalized terrain height is not a plain sum of layers. A mountain
//! mask blends flatlands towards mountains so biome transitions stay
//! seamless:
//!
//! ```text
//! mask      = saturate((mountain - blend_start) * sharpness)^2
//! flat      = continent * flat_multiplier
//! mountains = (ridge + mountain^2) * mountain_multiplier
//! height    = saturate(lerp(flat, mountains, mask) + detail * (0.5 + 0.5 * mask))
//! ```

use cgmath::{Vector2, Vector3};
use noise::{NoiseFn, Perlin};

use crate::engine_state::config::{CaveSettings, NoiseLayerSettings, TerrainSettings};

/// Half-range of the seed-derived offsets applied to every layer.
pub const RUNTIME_OFFSET_RANGE: f64 = 100_000.0;

/// Runtime parameters of one noise layer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NoiseLayer {
    /// Sampling frequency (inverse feature size).
    pub frequency: f64,
    /// Output multiplier.
    pub amplitude: f64,
    /// Exponent applied to the remapped value.
    pub redistribution: f64,
    /// Offset added to the sample position before scaling.
    pub offset: Vector2<f64>,
}

impl NoiseLayer {
    /// Builds a layer from its settings plus a seed-derived offset.
    ///
    /// Scale and redistribution are clamped away from zero and the amplitude
    /// is clamped to be non-negative.
    pub fn from_settings(settings: &NoiseLayerSettings, runtime_offset: Vector2<f64>) -> Self {
        NoiseLayer {
            frequency: 1.0 / settings.scale.max(1e-4),
            amplitude: settings.amplitude.max(0.0),
            redistribution: settings.redistribution.max(1e-4),
            offset: Vector2::new(settings.offset[0], settings.offset[1]) + runtime_offset,
        }
    }

    fn shape(&self, value: f64) -> f64 {
        let value = if (self.redistribution - 1.0).abs() > 1e-4 {
            value.powf(self.redistribution)
        } else {
            value
        };
        value * self.amplitude
    }
}

#[inline]
fn remap(noise: f64) -> f64 {
    (noise * 0.5 + 0.5).clamp(0.0, 1.0)
}

#[inline]
fn saturate(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Samples one layer at a 2D world position.
pub fn sample_layer<N: NoiseFn<f64, 2>>(noise: &N, pos: Vector2<f64>, layer: &NoiseLayer) -> f64 {
    let p = (pos + layer.offset) * layer.frequency;
    layer.shape(remap(noise.get([p.x, p.y])))
}

/// Samples one layer as ridged noise at a 2D world position.
pub fn sample_ridged<N: NoiseFn<f64, 2>>(noise: &N, pos: Vector2<f64>, layer: &NoiseLayer) -> f64 {
    let p = (pos + layer.offset) * layer.frequency;
    let n = noise.get([p.x, p.y]).clamp(-1.0, 1.0);
    let ridge = (1.0 - n.abs()).powi(2);
    layer.shape(ridge)
}

/// The four layers feeding the height blend.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HeightLayers {
    /// Large landmasses.
    pub continent: NoiseLayer,
    /// Mountain placement.
    pub mountain: NoiseLayer,
    /// Small scale variation.
    pub detail: NoiseLayer,
    /// Mountain crests.
    pub ridge: NoiseLayer,
}

/// Coefficients of the flat/mountain blend.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HeightBlend {
    /// Continent multiplier in flat areas.
    pub flat_multiplier: f64,
    /// Multiplier of the mountain term.
    pub mountain_multiplier: f64,
    /// Mountain value where the blend starts.
    pub blend_start: f64,
    /// Blend steepness.
    pub blend_sharpness: f64,
}

/// Evaluates the blended terrain height in [0, 1] at a 2D world position.
pub fn sample_normalized_height<N: NoiseFn<f64, 2>>(
    noise: &N,
    pos: Vector2<f64>,
    layers: &HeightLayers,
    blend: &HeightBlend,
) -> f64 {
    let continent = sample_layer(noise, pos, &layers.continent);
    let mountain = sample_layer(noise, pos, &layers.mountain);
    let detail = sample_layer(noise, pos, &layers.detail);
    let ridge = sample_ridged(noise, pos, &layers.ridge);

    let mask = saturate((mountain - blend.blend_start) * blend.blend_sharpness).powi(2);
    let flat = continent * blend.flat_multiplier;
    let mountains = (ridge + mountain * mountain) * blend.mountain_multiplier;
    let blended = flat + (mountains - flat) * mask + detail * (0.5 + 0.5 * mask);

    saturate(blended)
}

/// Seeded height field: a noise source plus its configured layers.
#[derive(Clone, Debug)]
pub struct NoiseField {
    noise: Perlin,
    layers: HeightLayers,
    blend: HeightBlend,
}

impl NoiseField {
    /// Creates the height field for `seed`.
    ///
    /// Each layer receives its own offset drawn from a seed-derived stream,
    /// so changing the seed moves every layer independently.
    pub fn new(seed: u64, settings: &TerrainSettings) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut next_offset = || {
            Vector2::new(
                (rng.f64() * 2.0 - 1.0) * RUNTIME_OFFSET_RANGE,
                (rng.f64() * 2.0 - 1.0) * RUNTIME_OFFSET_RANGE,
            )
        };

        let layers = HeightLayers {
            continent: NoiseLayer::from_settings(&settings.continent, next_offset()),
            mountain: NoiseLayer::from_settings(&settings.mountain, next_offset()),
            detail: NoiseLayer::from_settings(&settings.detail, next_offset()),
            ridge: NoiseLayer::from_settings(&settings.ridge, next_offset()),
        };

        NoiseField {
            noise: Perlin::new(seed as u32),
            layers,
            blend: HeightBlend {
                flat_multiplier: settings.flat_multiplier,
                mountain_multiplier: settings.mountain_multiplier,
                blend_start: settings.mountain_blend_start,
                blend_sharpness: settings.mountain_blend_sharpness,
            },
        }
    }

    /// Normalized height in [0, 1] of the world column (x, z).
    pub fn height_at(&self, x: i32, z: i32) -> f64 {
        sample_normalized_height(
            &self.noise,
            Vector2::new(x as f64, z as f64),
            &self.layers,
            &self.blend,
        )
    }

    /// The configured layers.
    pub fn layers(&self) -> &HeightLayers {
        &self.layers
    }
}

/// Seeded 3D density field deciding where caves are carved.
#[derive(Clone, Debug)]
pub struct CaveField {
    noise: Perlin,
    frequency: Vector3<f64>,
    offset: Vector3<f64>,
    threshold: f64,
    surface_clearance: i32,
}

impl CaveField {
    /// Creates the cave field for `seed`.
    pub fn new(seed: u64, settings: &CaveSettings) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed ^ 0xCA7E_CA7E_CA7E_CA7E);
        let runtime_offset = Vector3::new(
            (rng.f64() * 2.0 - 1.0) * RUNTIME_OFFSET_RANGE,
            (rng.f64() * 2.0 - 1.0) * RUNTIME_OFFSET_RANGE,
            (rng.f64() * 2.0 - 1.0) * RUNTIME_OFFSET_RANGE,
        );
        let horizontal = 1.0 / settings.horizontal_scale.max(1e-4);
        let vertical = 1.0 / settings.vertical_scale.max(1e-4);

        CaveField {
            noise: Perlin::new((seed as u32).wrapping_add(1)),
            frequency: Vector3::new(horizontal, vertical, horizontal),
            offset: Vector3::new(settings.offset[0], settings.offset[1], settings.offset[2])
                + runtime_offset,
            threshold: settings.threshold,
            surface_clearance: settings.surface_clearance,
        }
    }

    /// Cave density in [0, 1] at a world position.
    pub fn density(&self, x: i32, y: i32, z: i32) -> f64 {
        let p = Vector3::new(x as f64, y as f64, z as f64) + self.offset;
        remap(self.noise.get([
            p.x * self.frequency.x,
            p.y * self.frequency.y,
            p.z * self.frequency.z,
        ]))
    }

    /// Whether the cell at (x, y, z) is carved out for a column whose surface is `ground_level`.
    pub fn should_carve(&self, x: i32, y: i32, z: i32, ground_level: i32) -> bool {
        y < ground_level - self.surface_clearance && self.density(x, y, z) > self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(scale: f64, amplitude: f64, redistribution: f64) -> NoiseLayer {
        NoiseLayer::from_settings(
            &NoiseLayerSettings::new(scale, amplitude, redistribution),
            Vector2::new(0.0, 0.0),
        )
    }

    #[test]
    fn settings_are_clamped() {
        let layer = NoiseLayer::from_settings(
            &NoiseLayerSettings::new(0.0, -3.0, 0.0),
            Vector2::new(1.0, 2.0),
        );
        assert_eq!(layer.frequency, 1.0 / 1e-4);
        assert_eq!(layer.amplitude, 0.0);
        assert_eq!(layer.redistribution, 1e-4);
        assert_eq!(layer.offset, Vector2::new(1.0, 2.0));
    }

    #[test]
    fn layers_stay_within_amplitude() {
        let noise = Perlin::new(3);
        let layer = layer(37.0, 0.75, 1.7);
        for x in -50..50 {
            let value = sample_layer(&noise, Vector2::new(x as f64 * 3.1, x as f64 * -1.3), &layer);
            assert!((0.0..=0.75).contains(&value), "{value}");
            let ridged =
                sample_ridged(&noise, Vector2::new(x as f64 * 3.1, x as f64 * -1.3), &layer);
            assert!((0.0..=0.75).contains(&ridged), "{ridged}");
        }
    }

    #[test]
    fn unit_redistribution_is_identity() {
        let noise = Perlin::new(9);
        let pos = Vector2::new(12.5, -40.25);
        let plain = sample_layer(&noise, pos, &layer(20.0, 1.0, 1.0));
        let expected = remap(noise.get([pos.x / 20.0, pos.y / 20.0]));
        assert!((plain - expected).abs() < 1e-12);
    }

    #[test]
    fn normalized_height_is_saturated_and_deterministic() {
        let settings = TerrainSettings::default();
        let a = NoiseField::new(42, &settings);
        let b = NoiseField::new(42, &settings);
        for i in -64..64 {
            let (x, z) = (i * 17, i * -29);
            let height = a.height_at(x, z);
            assert!((0.0..=1.0).contains(&height));
            assert_eq!(height.to_bits(), b.height_at(x, z).to_bits());
        }
    }

    #[test]
    fn zero_amplitudes_give_flat_terrain() {
        let mut settings = TerrainSettings::default();
        for layer in [
            &mut settings.continent,
            &mut settings.mountain,
            &mut settings.detail,
            &mut settings.ridge,
        ] {
            layer.amplitude = 0.0;
        }
        let field = NoiseField::new(5, &settings);
        for i in 0..32 {
            assert_eq!(field.height_at(i * 7, i * 3), 0.0);
        }
    }

    #[test]
    fn different_seeds_move_the_layers() {
        let settings = TerrainSettings::default();
        let a = NoiseField::new(1, &settings);
        let b = NoiseField::new(2, &settings);
        assert_ne!(a.layers().continent.offset, b.layers().continent.offset);
    }

    #[test]
    fn caves_respect_surface_clearance() {
        let settings = CaveSettings {
            threshold: -1.0,
            ..CaveSettings::default()
        };
        let caves = CaveField::new(11, &settings);
        assert!(!caves.should_carve(0, 20, 0, 24));
        assert!(caves.should_carve(0, 19, 0, 24));
        for y in -20..20 {
            let density = caves.density(3, y, -7);
            assert!((0.0..=1.0).contains(&density));
        }
    }
}
