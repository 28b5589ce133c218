//! Noise generation module for terrain synthesis.
//!
//! Fractal simplex noise (via the `noise` crate) with configurable shaping:
//! refit/flatten/revert of negatives, ridging, redistribution and island masks.

mod config;
mod field;
mod fractal;
mod shaping;

pub use config::{IslandConfig, IslandShape, NegativeHandling, NoiseConfig, RidgeConfig};
pub use field::{NoiseError, NoiseField};
pub use fractal::FractalSampler;
pub use shaping::{island_distance, shape_value};
