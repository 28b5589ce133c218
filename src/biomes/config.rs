//! Biome classification configuration and the default preset.

use serde::{Deserialize, Serialize};

use super::biome::{Biome, ClimateAxis};
use super::BiomeError;
use crate::noise::NoiseConfig;

/// Ascending threshold lists, one per climate axis.
///
/// A value `v` has level `i` when `thresholds[i] <= v < thresholds[i + 1]`.
/// The last entry must sit above the highest value the channel can produce
/// (e.g. `1.01` for noise clamped to [-1, 1]); values at or above it have no level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateBands {
    pub temperature: Vec<f32>,
    pub humidity: Vec<f32>,
    pub continentalness: Vec<f32>,
    pub mountainousness: Vec<f32>,
    pub weirdness: Vec<f32>,
}

impl Default for ClimateBands {
    fn default() -> Self {
        Self {
            temperature: vec![-1.0, -0.45, -0.15, 0.2, 0.55, 1.01],
            humidity: vec![-1.0, -0.35, -0.1, 0.1, 0.3, 1.01],
            continentalness: vec![-1.0, -0.455, -0.19, -0.11, 0.03, 0.3, 1.01],
            mountainousness: vec![-1.0, -0.78, -0.375, -0.2225, 0.05, 0.45, 0.55, 1.01],
            weirdness: vec![-1.0, -0.56, -0.16, 0.16, 0.56, 1.01],
        }
    }
}

impl ClimateBands {
    pub fn get(&self, axis: ClimateAxis) -> &[f32] {
        match axis {
            ClimateAxis::Temperature => &self.temperature,
            ClimateAxis::Humidity => &self.humidity,
            ClimateAxis::Continentalness => &self.continentalness,
            ClimateAxis::Mountainousness => &self.mountainousness,
            ClimateAxis::Weirdness => &self.weirdness,
        }
    }

    /// Replaces one list after checking it. The list is never sorted.
    pub fn set(&mut self, axis: ClimateAxis, thresholds: Vec<f32>) -> Result<(), BiomeError> {
        validate_thresholds(axis, &thresholds)?;
        match axis {
            ClimateAxis::Temperature => self.temperature = thresholds,
            ClimateAxis::Humidity => self.humidity = thresholds,
            ClimateAxis::Continentalness => self.continentalness = thresholds,
            ClimateAxis::Mountainousness => self.mountainousness = thresholds,
            ClimateAxis::Weirdness => self.weirdness = thresholds,
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), BiomeError> {
        ClimateAxis::ALL
            .iter()
            .try_for_each(|&axis| validate_thresholds(axis, self.get(axis)))
    }

    /// Level of `value` on `axis`, or `None` if it falls outside every band.
    pub fn level(&self, axis: ClimateAxis, value: f32) -> Option<usize> {
        let thresholds = self.get(axis);
        if thresholds.is_empty() || value.is_nan() || value < thresholds[0] {
            return None;
        }
        thresholds
            .iter()
            .position(|&t| value < t)
            .map(|i| i - 1)
    }
}

fn validate_thresholds(axis: ClimateAxis, thresholds: &[f32]) -> Result<(), BiomeError> {
    if thresholds.len() < 2 {
        return Err(BiomeError::EmptyBands(axis.name()));
    }
    if thresholds.iter().any(|t| !t.is_finite()) || thresholds.windows(2).any(|w| w[1] <= w[0]) {
        return Err(BiomeError::UnorderedBands(axis.name()));
    }
    Ok(())
}

/// Configuration for the biome generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeConfig {
    pub temperature: NoiseConfig,
    pub humidity: NoiseConfig,
    pub bands: ClimateBands,
    /// Rules, matched in order.
    pub biomes: Vec<Biome>,
}

impl Default for BiomeConfig {
    fn default() -> Self {
        Self::with_seed(42)
    }
}

impl BiomeConfig {
    pub fn with_seed(seed: u32) -> Self {
        Self {
            temperature: NoiseConfig {
                scale: 1.2,
                octaves: 4,
                ..NoiseConfig::with_seed(seed.wrapping_add(100))
            },
            humidity: NoiseConfig {
                scale: 1.6,
                octaves: 4,
                ..NoiseConfig::with_seed(seed.wrapping_add(200))
            },
            bands: ClimateBands::default(),
            biomes: default_biomes(),
        }
    }

    pub fn noise(&self, axis: ClimateAxis) -> Option<&NoiseConfig> {
        match axis {
            ClimateAxis::Temperature => Some(&self.temperature),
            ClimateAxis::Humidity => Some(&self.humidity),
            _ => None,
        }
    }
}

/// Six-biome preset matching [`ClimateBands::default`].
pub fn default_biomes() -> Vec<Biome> {
    use ClimateAxis::*;
    vec![
        Biome::catch_all(1, "Ocean", [15, 40, 90]).with_range(Continentalness, 0, 2),
        Biome::catch_all(2, "Beach", [230, 215, 160])
            .with_range(Continentalness, 2, 3)
            .with_vegetation(1),
        Biome::catch_all(5, "Mountains", [140, 140, 140])
            .with_range(Mountainousness, 5, 7)
            .with_vegetation(2),
        Biome::catch_all(3, "Desert", [220, 205, 140])
            .with_range(Temperature, 3, 5)
            .with_range(Humidity, 0, 2),
        Biome::catch_all(4, "Forest", [40, 120, 60])
            .with_range(Humidity, 2, 5)
            .with_vegetation(8),
        Biome::catch_all(0, "Plains", [130, 180, 90]).with_vegetation(4),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bands_are_valid() {
        assert!(ClimateBands::default().validate().is_ok());
    }

    #[test]
    fn test_level_lookup() {
        let mut bands = ClimateBands::default();
        bands
            .set(ClimateAxis::Temperature, vec![-1.0, -0.5, 0.0, 0.5, 1.01])
            .unwrap();
        let t = ClimateAxis::Temperature;
        assert_eq!(bands.level(t, -0.5), Some(1));
        assert_eq!(bands.level(t, -0.6), Some(0));
        assert_eq!(bands.level(t, 1.0), Some(3));
        assert_eq!(bands.level(t, -1.0), Some(0));
        assert_eq!(bands.level(t, -1.5), None);
        assert_eq!(bands.level(t, 1.01), None);
        assert_eq!(bands.level(t, f32::NAN), None);
    }

    #[test]
    fn test_set_rejects_bad_lists() {
        let mut bands = ClimateBands::default();
        assert_eq!(
            bands.set(ClimateAxis::Humidity, vec![0.5]),
            Err(BiomeError::EmptyBands("humidity"))
        );
        assert_eq!(
            bands.set(ClimateAxis::Humidity, vec![0.0, 0.5, 0.5]),
            Err(BiomeError::UnorderedBands("humidity"))
        );
        assert_eq!(bands.humidity, ClimateBands::default().humidity);
    }

    #[test]
    fn test_default_preset_has_six_biomes_and_catch_all() {
        let biomes = default_biomes();
        assert_eq!(biomes.len(), 6);
        let last = biomes.last().unwrap();
        assert!(last.matches(&[0, 0, 5, 5, 0]));
    }
}
