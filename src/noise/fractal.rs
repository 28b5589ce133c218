//! Multi-octave fractal Brownian motion (fBm) over 2D simplex noise.

use ::noise::{NoiseFn, Simplex};

use super::config::NoiseConfig;
use super::shaping::shape_value;

/// Seed stride between octave layers.
const OCTAVE_SEED_STRIDE: u32 = 31337;

/// Fractal sampler for one noise channel.
///
/// Holds one simplex layer per octave, each seeded from the channel seed so
/// octaves decorrelate. Both full-grid generation and single-point queries
/// go through [`FractalSampler::sample`], which keeps tiles seamless.
#[derive(Clone)]
pub struct FractalSampler {
    config: NoiseConfig,
    layers: Vec<Simplex>,
}

impl std::fmt::Debug for FractalSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FractalSampler")
            .field("config", &self.config)
            .field("layers", &self.layers.len())
            .finish()
    }
}

impl FractalSampler {
    pub fn new(config: NoiseConfig) -> Self {
        let layers = (0..config.octaves)
            .map(|octave| Simplex::new(config.seed.wrapping_add(octave.wrapping_mul(OCTAVE_SEED_STRIDE))))
            .collect();
        Self { config, layers }
    }

    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    /// Raw fractal value at cell coordinate `(cx, cy)` of a `width`×`height` grid.
    ///
    /// Normalised by the amplitude sum, multiplied by contrast and clamped
    /// to [-1, 1]. No post-processing.
    pub fn sample_raw(&self, cx: f64, cy: f64, width: usize, height: usize) -> f32 {
        let config = &self.config;
        let (cx, cy) = if config.symmetric {
            (cx.abs(), cy.abs())
        } else {
            (cx, cy)
        };

        let resolution = config.resolution as f64;
        let scale = config.scale as f64;
        let u = cx * resolution / width as f64 * scale;
        let v = cy * resolution / height as f64 * scale;

        let mut total = 0.0f64;
        let mut amplitude = 1.0f64;
        let mut frequency = 1.0f64;
        let mut max_amplitude = 0.0f64;

        for layer in &self.layers {
            let nx = u * frequency + config.offset_x as f64;
            let ny = v * frequency + config.offset_y as f64;
            total += layer.get([nx, ny]) * amplitude;

            max_amplitude += amplitude;
            amplitude *= config.persistence as f64;
            frequency *= config.lacunarity as f64;
        }

        if max_amplitude <= 0.0 {
            return 0.0;
        }

        let value = (total / max_amplitude) as f32 * config.contrast;
        value.clamp(-1.0, 1.0)
    }

    /// Fully post-processed value at cell coordinate `(cx, cy)` of the grid
    /// whose cell `(0, 0)` sits at `origin`.
    ///
    /// The noise depends only on `(cx, cy)`; the island mask is positioned
    /// relative to the grid, so every tile gets its own island.
    pub fn sample(&self, cx: f64, cy: f64, origin: (f64, f64), width: usize, height: usize) -> f32 {
        let raw = self.sample_raw(cx, cy, width, height);
        let nx = (2.0 * (cx - origin.0) / width as f64 - 1.0) as f32;
        let ny = (2.0 * (cy - origin.1) / height as f64 - 1.0) as f32;
        shape_value(raw, &self.config, nx, ny)
    }
}
