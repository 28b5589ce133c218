//! Top-level world configuration, loadable from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::biomes::{BiomeConfig, BiomeTable};
use crate::erosion::ErosionConfig;
use crate::spline::SplineEvaluator;
use crate::terrain::{TerrainConfig, TerrainParameter};

/// Errors produced while loading or validating a [`WorldConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Everything needed to build and run a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: usize,
    pub height: usize,
    /// Grid origin in cell units; shifting it by the grid size yields the adjacent tile.
    pub origin_x: f64,
    pub origin_y: f64,
    /// Run the erosion stage.
    pub erode: bool,
    /// Keep the per-droplet trace of the erosion pass.
    pub trace: bool,
    pub terrain: TerrainConfig,
    pub biomes: BiomeConfig,
    pub erosion: ErosionConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::with_seed(42)
    }
}

impl WorldConfig {
    /// 256x256 world with every subsystem seeded from `seed`.
    pub fn with_seed(seed: u32) -> Self {
        Self {
            width: 256,
            height: 256,
            origin_x: 0.0,
            origin_y: 0.0,
            erode: true,
            trace: false,
            terrain: TerrainConfig::with_seed(seed),
            biomes: BiomeConfig::with_seed(seed),
            erosion: ErosionConfig {
                seed: seed as u64,
                ..Default::default()
            },
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates; missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 2 || self.height < 2 {
            return Err(ConfigError::Invalid(format!(
                "grid must be at least 2x2, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.origin_x.is_finite() || !self.origin_y.is_finite() {
            return Err(ConfigError::Invalid("origin must be finite".into()));
        }
        for param in TerrainParameter::ALL {
            self.terrain
                .noise(param)
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("terrain.{}: {e}", param.name())))?;
            SplineEvaluator::from_config(self.terrain.spline(param))
                .map_err(|e| ConfigError::Invalid(format!("terrain.{}_spline: {e}", param.name())))?;
        }
        self.biomes
            .temperature
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("biomes.temperature: {e}")))?;
        self.biomes
            .humidity
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("biomes.humidity: {e}")))?;
        self.biomes
            .bands
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("biomes.bands: {e}")))?;
        if self.biomes.biomes.is_empty() {
            return Err(ConfigError::Invalid("biomes.biomes: rule table is empty".into()));
        }
        BiomeTable::from_biomes(self.biomes.biomes.clone())
            .map_err(|e| ConfigError::Invalid(format!("biomes.biomes: {e}")))?;
        self.erosion
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("erosion: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::{BiomeId, ClimateBands};
    use crate::terrain::EvaluationMethod;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        assert!(WorldConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = WorldConfig::from_toml_str(
            r#"
            width = 64
            height = 32

            [terrain]
            method = "SplineCombine"

            [erosion]
            droplet_count = 10
            "#,
        )
        .unwrap();
        assert_eq!((config.width, config.height), (64, 32));
        assert_eq!(config.terrain.method, EvaluationMethod::SplineCombine);
        assert_eq!(config.erosion.droplet_count, 10);
        assert_eq!(config.erosion.droplet_lifetime, ErosionConfig::default().droplet_lifetime);
        assert!(config.erode);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            WorldConfig::from_toml_str("width = 1"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            WorldConfig::from_toml_str("[erosion]\ninertia = 2.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            WorldConfig::from_toml_str("width = \"wide\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_bad_rule_table_and_splines() {
        let mut config = WorldConfig::default();
        config.biomes.biomes.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = WorldConfig::default();
        let first = config.biomes.biomes[0].clone();
        config.biomes.biomes.push(first);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = WorldConfig::default();
        config.biomes.biomes[0].id = BiomeId::UNCLASSIFIED;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = WorldConfig::default();
        config.terrain.weirdness_spline.points.truncate(1);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = WorldConfig::default();
        config.terrain.continentalness_spline.points.reverse();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_partial_bands_table_keeps_other_axes() {
        let config = WorldConfig::from_toml_str(
            r#"
            [biomes.bands]
            temperature = [-1.0, 0.0, 1.01]
            "#,
        )
        .unwrap();
        let defaults = ClimateBands::default();
        assert_eq!(config.biomes.bands.temperature, vec![-1.0, 0.0, 1.01]);
        assert_eq!(config.biomes.bands.humidity, defaults.humidity);
        assert_eq!(config.biomes.bands.weirdness, defaults.weirdness);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "width = 16\nheight = 16\nerode = false").unwrap();

        let config = WorldConfig::load(&path).unwrap();
        assert_eq!(config.width, 16);
        assert!(!config.erode);

        assert!(matches!(
            WorldConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = WorldConfig::with_seed(9);
        let text = toml::to_string(&config).unwrap();
        assert_eq!(WorldConfig::from_toml_str(&text).unwrap(), config);
    }
}
