//! Procedural terrain synthesis.
//!
//! Layered fractal noise channels are combined into a height map, cells are
//! classified into biomes from five climate axes, and a droplet simulation
//! erodes the height map in place.

pub mod biomes;
pub mod config;
pub mod erosion;
pub mod export;
pub mod noise;
pub mod pipeline;
pub mod spline;
pub mod terrain;

pub use crate::biomes::{Biome, BiomeConfig, BiomeGenerator, BiomeId, ClimateAxis};
pub use crate::config::{ConfigError, WorldConfig};
pub use crate::erosion::{ErosionConfig, ErosionSimulator, ErosionStats};
pub use crate::noise::{NoiseConfig, NoiseField};
pub use crate::pipeline::{GenerationStage, Pipeline, World};
pub use crate::spline::{SplineEvaluator, SplineKind, SplinePoint};
pub use crate::terrain::{EvaluationMethod, HeightMap, TerrainConfig, TerrainGenerator, TerrainParameter};
