//! Terrain generator configuration.

use serde::{Deserialize, Serialize};

use crate::noise::{NegativeHandling, NoiseConfig, RidgeConfig};
use crate::spline::{SplineConfig, SplineKind};

/// The three noise channels combined into elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainParameter {
    Continentalness,
    Mountainousness,
    /// Peaks-and-valleys channel.
    Weirdness,
}

impl TerrainParameter {
    pub const ALL: [TerrainParameter; 3] = [
        TerrainParameter::Continentalness,
        TerrainParameter::Mountainousness,
        TerrainParameter::Weirdness,
    ];

    /// Stable slot in per-parameter tables.
    pub fn index(self) -> usize {
        match self {
            TerrainParameter::Continentalness => 0,
            TerrainParameter::Mountainousness => 1,
            TerrainParameter::Weirdness => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TerrainParameter::Continentalness => "continentalness",
            TerrainParameter::Mountainousness => "mountainousness",
            TerrainParameter::Weirdness => "weirdness",
        }
    }
}

/// How the three channels are combined per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EvaluationMethod {
    /// Rescale each channel to [0, 1]; `c * m * (1 - w)`.
    #[default]
    LinearCombine,
    /// `spline_c(c) * spline_m(m) * spline_w(w)` on raw channel values.
    SplineCombine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub method: EvaluationMethod,
    pub continentalness: NoiseConfig,
    pub mountainousness: NoiseConfig,
    pub weirdness: NoiseConfig,
    pub continentalness_spline: SplineConfig,
    pub mountainousness_spline: SplineConfig,
    pub weirdness_spline: SplineConfig,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self::with_seed(42)
    }
}

impl TerrainConfig {
    /// Default channels with seeds derived from `seed`.
    pub fn with_seed(seed: u32) -> Self {
        Self {
            method: EvaluationMethod::default(),
            continentalness: NoiseConfig::continental(seed),
            mountainousness: NoiseConfig {
                ridge: RidgeConfig {
                    enabled: true,
                    gain: 1.0,
                    offset: 1.0,
                },
                ..NoiseConfig::mountainous(seed.wrapping_add(1))
            },
            weirdness: NoiseConfig {
                scale: 2.0,
                octaves: 4,
                negative: NegativeHandling::Keep,
                ..NoiseConfig::with_seed(seed.wrapping_add(2))
            },
            continentalness_spline: SplineConfig::new(
                SplineKind::Cubic,
                &[(-1.0, 0.05), (-0.4, 0.1), (-0.1, 0.35), (0.2, 0.6), (1.0, 1.0)],
            ),
            mountainousness_spline: SplineConfig::new(
                SplineKind::Linear,
                &[(-1.0, 0.3), (0.0, 0.6), (0.6, 0.9), (1.0, 1.0)],
            ),
            weirdness_spline: SplineConfig::new(
                SplineKind::Cubic,
                &[(-1.0, 1.0), (-0.2, 0.85), (0.4, 0.7), (1.0, 0.4)],
            ),
        }
    }

    pub fn noise(&self, param: TerrainParameter) -> &NoiseConfig {
        match param {
            TerrainParameter::Continentalness => &self.continentalness,
            TerrainParameter::Mountainousness => &self.mountainousness,
            TerrainParameter::Weirdness => &self.weirdness,
        }
    }

    pub fn spline(&self, param: TerrainParameter) -> &SplineConfig {
        match param {
            TerrainParameter::Continentalness => &self.continentalness_spline,
            TerrainParameter::Mountainousness => &self.mountainousness_spline,
            TerrainParameter::Weirdness => &self.weirdness_spline,
        }
    }
}
