//! Terrain generation module.
//!
//! Combines three noise channels into a height map, either as a plain
//! product or through per-channel response splines.

mod config;
mod generator;
mod heightmap;

pub use config::{EvaluationMethod, TerrainConfig, TerrainParameter};
pub use generator::{TerrainError, TerrainGenerator};
pub use heightmap::HeightMap;
