//! Noise channel configuration.

use serde::{Deserialize, Serialize};

/// How values below zero are treated after the fractal sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NegativeHandling {
    /// Leave negative values untouched.
    #[default]
    Keep,
    /// Remap the whole range from [-1, 1] to [0, 1].
    Refit,
    /// Clamp negative values to zero.
    Flatten,
    /// Mirror negative values into the positive range.
    Revert,
}

/// Ridge transform `(offset - |h|)^2 * gain`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RidgeConfig {
    pub enabled: bool,
    pub gain: f32,
    pub offset: f32,
}

impl Default for RidgeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            gain: 1.0,
            offset: 1.0,
        }
    }
}

/// Shape of the radial falloff used for island masking.
///
/// All shapes map a grid-normalised position in [-1, 1]² to a distance in
/// [0, 1], where 0 is the grid centre and 1 the rim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IslandShape {
    /// Euclidean distance, a round cone.
    #[default]
    Cone,
    /// Chebyshev distance, a square pyramid.
    Diagonal,
    /// Squared Euclidean distance scaled by 1/√2.
    EuclideanSquared,
    /// `1 - (1 - x²)(1 - y²)`.
    SquareBump,
    /// Hyperboloid with a rounded peak.
    Hyperboloid,
    /// `√(x⁴ + y⁴)`.
    Squircle,
    /// `1 - cos(πx/2)·cos(πy/2)`.
    TrigProduct,
}

/// Island masking: attenuates cells toward zero as they approach the grid rim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IslandConfig {
    pub enabled: bool,
    pub shape: IslandShape,
    /// Exponent applied to the falloff; 0 disables the mask, larger is harsher.
    pub mix_power: f32,
}

impl Default for IslandConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            shape: IslandShape::default(),
            mix_power: 1.0,
        }
    }
}

/// Configuration for one fractal noise channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Random seed for reproducible generation.
    pub seed: u32,
    /// Number of grid widths covered by one unit of base frequency.
    pub scale: f32,
    /// Number of noise octaves.
    pub octaves: u32,
    /// Frequency multiplier per octave.
    pub lacunarity: f32,
    /// Amplitude decay per octave.
    pub persistence: f32,
    /// Multiplier applied after normalisation, before clamping.
    pub contrast: f32,
    /// Exponent applied after ridging.
    pub redistribution: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub negative: NegativeHandling,
    /// Fold cell coordinates with `|c|`, mirroring the field across the axes.
    pub symmetric: bool,
    /// Cell-to-sample spacing; decouples mesh density from sampling density.
    pub resolution: f32,
    pub ridge: RidgeConfig,
    pub island: IslandConfig,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            scale: 1.0,
            octaves: 6,
            lacunarity: 2.0,
            persistence: 0.5,
            contrast: 1.0,
            redistribution: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            negative: NegativeHandling::default(),
            ridge: RidgeConfig::default(),
            island: IslandConfig::default(),
            symmetric: false,
            resolution: 1.0,
        }
    }
}

impl NoiseConfig {
    /// Creates a new noise configuration with the given seed.
    pub fn with_seed(seed: u32) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Broad, low-frequency channel suited to continent shapes.
    pub fn continental(seed: u32) -> Self {
        Self {
            seed,
            scale: 1.5,
            octaves: 5,
            persistence: 0.5,
            ..Default::default()
        }
    }

    /// Ridged channel suited to mountain ranges.
    pub fn mountainous(seed: u32) -> Self {
        Self {
            seed,
            scale: 3.0,
            octaves: 6,
            persistence: 0.55,
            ..Default::default()
        }
    }

    /// Checks that the configuration can drive a sampler.
    pub fn validate(&self) -> Result<(), String> {
        if self.octaves == 0 {
            return Err("octaves must be at least 1".into());
        }
        let finite = [
            ("scale", self.scale),
            ("lacunarity", self.lacunarity),
            ("persistence", self.persistence),
            ("contrast", self.contrast),
            ("redistribution", self.redistribution),
            ("offset_x", self.offset_x),
            ("offset_y", self.offset_y),
            ("resolution", self.resolution),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{name} must be finite"));
        }
        if self.persistence <= 0.0 {
            return Err("persistence must be positive".into());
        }
        if self.resolution <= 0.0 {
            return Err("resolution must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NoiseConfig::default();
        assert_eq!(config.octaves, 6);
        assert_eq!(config.lacunarity, 2.0);
        assert_eq!(config.persistence, 0.5);
        assert_eq!(config.negative, NegativeHandling::Keep);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_octaves() {
        let config = NoiseConfig {
            octaves: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: NoiseConfig = toml::from_str("seed = 7\nnegative = \"Refit\"").unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.negative, NegativeHandling::Refit);
        assert_eq!(config.octaves, NoiseConfig::default().octaves);
    }
}
