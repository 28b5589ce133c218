//! Biome classification.
//!
//! Each cell is classified into a discrete level on five climate axes
//! (temperature, humidity, continentalness, mountainousness, weirdness) using
//! ascending threshold bands. The level tuple is then matched against an
//! ordered table of biome rules.
//!
//! Temperature and humidity come from noise channels owned by the
//! [`BiomeGenerator`]; the other three are borrowed from the terrain generator.

mod biome;
mod config;

pub use biome::{Biome, BiomeId, BiomeTable, ClimateAxis, LevelRange};
pub use config::{default_biomes, BiomeConfig, ClimateBands};

use log::{debug, info, warn};
use rayon::prelude::*;
use thiserror::Error;

use crate::noise::{NoiseConfig, NoiseError, NoiseField};

/// Errors produced by biome classification.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BiomeError {
    #[error("Invalid biome map dimensions {0}x{1}")]
    InvalidDimensions(usize, usize),
    #[error("Biome map already initialized; resize instead")]
    AlreadyInitialized,
    #[error("Biome map has not been initialized")]
    NotInitialized,
    #[error("{axis} noise is {got:?}, biome map is {expected:?}")]
    DimensionMismatch {
        axis: &'static str,
        got: (usize, usize),
        expected: (usize, usize),
    },
    #[error("{0} is not owned by the biome generator")]
    ForeignAxis(&'static str),
    #[error("{0} threshold list needs at least 2 entries")]
    EmptyBands(&'static str),
    #[error("{0} threshold list must be finite and strictly increasing")]
    UnorderedBands(&'static str),
    #[error("Biome table is empty")]
    EmptyTable,
    #[error("Duplicate biome id {0}")]
    DuplicateId(u16),
    #[error("Biome id {0} is reserved")]
    ReservedId(u16),
    #[error("{0} noise: {1}")]
    Noise(&'static str, NoiseError),
}

/// Per-pass classification counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BiomifyStats {
    /// Cells with no level on at least one axis.
    pub unclassified: usize,
    /// Classified cells that fell back to [`BiomeId::DEFAULT`].
    pub unmatched: usize,
}

/// Classifies cells into biomes.
#[derive(Debug, Clone)]
pub struct BiomeGenerator {
    width: usize,
    height: usize,
    temperature: NoiseField,
    humidity: NoiseField,
    bands: ClimateBands,
    table: BiomeTable,
    biome_map: Vec<BiomeId>,
    generated: bool,
}

impl BiomeGenerator {
    /// Builds an uninitialized generator; bands and rules are validated here.
    pub fn new(config: &BiomeConfig) -> Result<Self, BiomeError> {
        config.bands.validate()?;
        if config.biomes.is_empty() {
            return Err(BiomeError::EmptyTable);
        }
        let table = BiomeTable::from_biomes(config.biomes.clone())?;
        for (axis, noise) in [
            (ClimateAxis::Temperature, &config.temperature),
            (ClimateAxis::Humidity, &config.humidity),
        ] {
            noise
                .validate()
                .map_err(|e| BiomeError::Noise(axis.name(), NoiseError::InvalidConfig(e)))?;
        }

        Ok(Self {
            width: 0,
            height: 0,
            temperature: NoiseField::new(config.temperature.clone()),
            humidity: NoiseField::new(config.humidity.clone()),
            bands: config.bands.clone(),
            table,
            biome_map: Vec::new(),
            generated: false,
        })
    }

    /// Allocates the biome map and generates the temperature and humidity channels.
    ///
    /// Fails with [`BiomeError::AlreadyInitialized`] if the map already exists.
    pub fn initialize(&mut self, width: usize, height: usize) -> Result<(), BiomeError> {
        if !self.biome_map.is_empty() {
            return Err(BiomeError::AlreadyInitialized);
        }
        self.allocate(width, height)
    }

    /// Reallocates for new dimensions and marks the map stale.
    ///
    /// Returns `Ok(false)` when the size is unchanged.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<bool, BiomeError> {
        if !self.biome_map.is_empty() && width == self.width && height == self.height {
            return Ok(false);
        }
        self.allocate(width, height)?;
        Ok(true)
    }

    fn allocate(&mut self, width: usize, height: usize) -> Result<(), BiomeError> {
        if width == 0 || height == 0 {
            return Err(BiomeError::InvalidDimensions(width, height));
        }
        for axis in [ClimateAxis::Temperature, ClimateAxis::Humidity] {
            let field = self.field_mut(axis)?;
            field.resize(width, height).map_err(|e| BiomeError::Noise(axis.name(), e))?;
            field.generate(0.0, 0.0).map_err(|e| BiomeError::Noise(axis.name(), e))?;
        }
        self.width = width;
        self.height = height;
        self.biome_map = vec![BiomeId::DEFAULT; width * height];
        self.generated = false;
        debug!("biome map allocated at {}x{}", width, height);
        Ok(())
    }

    /// Regenerates one owned channel at the given origin. The map becomes stale.
    pub fn regenerate(&mut self, axis: ClimateAxis, origin_x: f64, origin_y: f64) -> Result<(), BiomeError> {
        let field = self.field_mut(axis)?;
        field
            .generate(origin_x, origin_y)
            .map_err(|e| BiomeError::Noise(axis.name(), e))?;
        self.generated = false;
        Ok(())
    }

    /// Classifies every cell using the terrain channels plus the owned climate channels.
    ///
    /// All three borrowed fields must match the biome map dimensions; on mismatch
    /// nothing is written and the map stays stale.
    pub fn biomify(
        &mut self,
        continentalness: &NoiseField,
        mountainousness: &NoiseField,
        weirdness: &NoiseField,
    ) -> Result<BiomifyStats, BiomeError> {
        if self.biome_map.is_empty() {
            return Err(BiomeError::NotInitialized);
        }
        self.generated = false;

        let expected = (self.width, self.height);
        for (axis, field) in [
            (ClimateAxis::Temperature, &self.temperature),
            (ClimateAxis::Humidity, &self.humidity),
            (ClimateAxis::Continentalness, continentalness),
            (ClimateAxis::Mountainousness, mountainousness),
            (ClimateAxis::Weirdness, weirdness),
        ] {
            let got = (field.width(), field.height());
            if got != expected || !field.is_allocated() {
                return Err(BiomeError::DimensionMismatch {
                    axis: axis.name(),
                    got,
                    expected,
                });
            }
        }

        let channels: [&[f32]; ClimateAxis::COUNT] = [
            self.temperature.values(),
            self.humidity.values(),
            continentalness.values(),
            mountainousness.values(),
            weirdness.values(),
        ];
        let bands = &self.bands;
        let table = &self.table;

        let (unclassified, unmatched) = self
            .biome_map
            .par_iter_mut()
            .enumerate()
            .map(|(i, cell)| {
                let mut levels = [None; ClimateAxis::COUNT];
                for axis in ClimateAxis::ALL {
                    levels[axis.index()] = bands.level(axis, channels[axis.index()][i]);
                }
                let (id, outcome) = classify(table, &levels);
                *cell = id;
                match outcome {
                    Outcome::Matched => (0, 0),
                    Outcome::Unclassified => (1, 0),
                    Outcome::Unmatched => (0, 1),
                }
            })
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

        let stats = BiomifyStats { unclassified, unmatched };
        if stats.unclassified > 0 {
            warn!(
                "{} of {} cells fell outside the climate bands and are unclassified",
                stats.unclassified,
                self.biome_map.len()
            );
        }
        if stats.unmatched > 0 {
            debug!("{} cells matched no biome rule, using the default biome", stats.unmatched);
        }

        self.generated = true;
        info!("classified {}x{} biome map", self.width, self.height);
        Ok(stats)
    }

    /// Level of `value` on `axis`, or `None` when it falls outside every band.
    pub fn determine_level(&self, axis: ClimateAxis, value: f32) -> Option<usize> {
        self.bands.level(axis, value)
    }

    /// Biome for a level tuple.
    ///
    /// Any missing level yields [`BiomeId::UNCLASSIFIED`]; a complete tuple no rule
    /// matches yields [`BiomeId::DEFAULT`].
    pub fn determine_biome(&self, levels: &[Option<usize>; ClimateAxis::COUNT]) -> BiomeId {
        classify(&self.table, levels).0
    }

    /// Replaces all five threshold lists.
    pub fn set_ranges(&mut self, bands: ClimateBands) -> Result<(), BiomeError> {
        bands.validate()?;
        self.bands = bands;
        self.generated = false;
        Ok(())
    }

    /// Replaces one threshold list.
    pub fn set_range(&mut self, axis: ClimateAxis, thresholds: Vec<f32>) -> Result<(), BiomeError> {
        self.bands.set(axis, thresholds)?;
        self.generated = false;
        Ok(())
    }

    pub fn ranges(&self) -> &ClimateBands {
        &self.bands
    }

    /// Replaces the rule table.
    pub fn set_biomes(&mut self, biomes: Vec<Biome>) -> Result<(), BiomeError> {
        if biomes.is_empty() {
            return Err(BiomeError::EmptyTable);
        }
        self.table = BiomeTable::from_biomes(biomes)?;
        self.generated = false;
        Ok(())
    }

    /// Appends a rule; it is matched after all existing rules.
    pub fn add_biome(&mut self, biome: Biome) -> Result<(), BiomeError> {
        self.table.push(biome)?;
        self.generated = false;
        Ok(())
    }

    pub fn biome(&self, id: BiomeId) -> Option<&Biome> {
        self.table.get(id)
    }

    pub fn biomes(&self) -> &BiomeTable {
        &self.table
    }

    /// Owned climate channel. Terrain axes are not owned and yield an error.
    pub fn noise(&self, axis: ClimateAxis) -> Result<&NoiseField, BiomeError> {
        match axis {
            ClimateAxis::Temperature => Ok(&self.temperature),
            ClimateAxis::Humidity => Ok(&self.humidity),
            other => Err(BiomeError::ForeignAxis(other.name())),
        }
    }

    fn field_mut(&mut self, axis: ClimateAxis) -> Result<&mut NoiseField, BiomeError> {
        match axis {
            ClimateAxis::Temperature => Ok(&mut self.temperature),
            ClimateAxis::Humidity => Ok(&mut self.humidity),
            other => Err(BiomeError::ForeignAxis(other.name())),
        }
    }

    /// Replaces an owned channel's configuration without regenerating it.
    pub fn set_config(&mut self, axis: ClimateAxis, config: NoiseConfig) -> Result<(), BiomeError> {
        self.field_mut(axis)?
            .set_config(config)
            .map_err(|e| BiomeError::Noise(axis.name(), e))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// True once [`BiomeGenerator::biomify`] has run since the last invalidation.
    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn biome_map(&self) -> &[BiomeId] {
        &self.biome_map
    }

    pub fn biome_at(&self, x: usize, y: usize) -> Option<BiomeId> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.biome_map[y * self.width + x])
    }
}

enum Outcome {
    Matched,
    Unclassified,
    Unmatched,
}

fn classify(table: &BiomeTable, levels: &[Option<usize>; ClimateAxis::COUNT]) -> (BiomeId, Outcome) {
    let mut resolved = [0usize; ClimateAxis::COUNT];
    for (slot, level) in resolved.iter_mut().zip(levels) {
        match level {
            Some(l) => *slot = *l,
            None => return (BiomeId::UNCLASSIFIED, Outcome::Unclassified),
        }
    }
    match table.find(&resolved) {
        Some(biome) => (biome.id, Outcome::Matched),
        None => (BiomeId::DEFAULT, Outcome::Unmatched),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(width: usize, height: usize, seed: u32) -> NoiseField {
        let mut field = NoiseField::with_size(width, height, NoiseConfig::with_seed(seed)).unwrap();
        field.generate(0.0, 0.0).unwrap();
        field
    }

    fn initialized(config: &BiomeConfig, width: usize, height: usize) -> BiomeGenerator {
        let mut generator = BiomeGenerator::new(config).unwrap();
        generator.initialize(width, height).unwrap();
        generator
    }

    #[test]
    fn test_initialize_twice_fails() {
        let mut generator = initialized(&BiomeConfig::default(), 8, 8);
        assert_eq!(generator.initialize(8, 8), Err(BiomeError::AlreadyInitialized));
        assert!(!generator.is_generated());
    }

    #[test]
    fn test_initialize_rejects_zero() {
        let mut generator = BiomeGenerator::new(&BiomeConfig::default()).unwrap();
        assert_eq!(generator.initialize(0, 3), Err(BiomeError::InvalidDimensions(0, 3)));
    }

    #[test]
    fn test_determine_level_examples() {
        let mut generator = BiomeGenerator::new(&BiomeConfig::default()).unwrap();
        generator
            .set_range(ClimateAxis::Temperature, vec![-1.0, -0.5, 0.0, 0.5, 1.01])
            .unwrap();
        let t = ClimateAxis::Temperature;
        assert_eq!(generator.determine_level(t, -0.5), Some(1));
        assert_eq!(generator.determine_level(t, -0.6), Some(0));
        assert_eq!(generator.determine_level(t, 1.0), Some(3));
        assert_eq!(generator.determine_level(t, -1.5), None);
    }

    #[test]
    fn test_catch_all_rule_classifies_every_cell() {
        let config = BiomeConfig {
            biomes: vec![Biome::catch_all(7, "Everything", [1, 2, 3])],
            ..Default::default()
        };
        let mut generator = initialized(&config, 12, 9);
        let stats = generator
            .biomify(&field(12, 9, 1), &field(12, 9, 2), &field(12, 9, 3))
            .unwrap();
        assert_eq!(stats, BiomifyStats::default());
        assert!(generator.is_generated());
        assert!(generator.biome_map().iter().all(|&id| id == BiomeId(7)));
    }

    #[test]
    fn test_dimension_mismatch_aborts() {
        let mut generator = initialized(&BiomeConfig::default(), 8, 8);
        let err = generator
            .biomify(&field(8, 8, 1), &field(8, 7, 2), &field(8, 8, 3))
            .unwrap_err();
        assert_eq!(
            err,
            BiomeError::DimensionMismatch {
                axis: "mountainousness",
                got: (8, 7),
                expected: (8, 8),
            }
        );
        assert!(!generator.is_generated());
    }

    #[test]
    fn test_map_goes_stale_after_resize_and_regenerate() {
        let mut generator = initialized(&BiomeConfig::default(), 8, 8);
        let (c, m, w) = (field(8, 8, 1), field(8, 8, 2), field(8, 8, 3));
        generator.biomify(&c, &m, &w).unwrap();
        assert!(generator.is_generated());

        generator.regenerate(ClimateAxis::Humidity, 4.0, 0.0).unwrap();
        assert!(!generator.is_generated());

        generator.biomify(&c, &m, &w).unwrap();
        assert_eq!(generator.resize(8, 8), Ok(false));
        assert!(generator.is_generated());
        assert_eq!(generator.resize(6, 6), Ok(true));
        assert!(!generator.is_generated());
        assert_eq!(generator.biome_map().len(), 36);
    }

    #[test]
    fn test_regenerate_rejects_terrain_axes() {
        let mut generator = initialized(&BiomeConfig::default(), 4, 4);
        assert_eq!(
            generator.regenerate(ClimateAxis::Weirdness, 0.0, 0.0),
            Err(BiomeError::ForeignAxis("weirdness"))
        );
    }

    #[test]
    fn test_unclassified_is_distinct_from_unmatched() {
        let config = BiomeConfig {
            biomes: vec![Biome::catch_all(3, "Cold", [0; 3]).with_range(ClimateAxis::Temperature, 0, 1)],
            ..Default::default()
        };
        let generator = BiomeGenerator::new(&config).unwrap();
        assert_eq!(
            generator.determine_biome(&[None, Some(0), Some(0), Some(0), Some(0)]),
            BiomeId::UNCLASSIFIED
        );
        assert_eq!(
            generator.determine_biome(&[Some(2), Some(0), Some(0), Some(0), Some(0)]),
            BiomeId::DEFAULT
        );
        assert_eq!(
            generator.determine_biome(&[Some(0), Some(0), Some(0), Some(0), Some(0)]),
            BiomeId(3)
        );
    }

    #[test]
    fn test_out_of_band_cells_are_counted() {
        let mut config = BiomeConfig::default();
        config.bands.weirdness = vec![2.0, 3.0];
        let mut generator = initialized(&config, 5, 5);
        let stats = generator
            .biomify(&field(5, 5, 1), &field(5, 5, 2), &field(5, 5, 3))
            .unwrap();
        assert_eq!(stats.unclassified, 25);
        assert!(generator.biome_map().iter().all(|&id| id == BiomeId::UNCLASSIFIED));
    }

    #[test]
    fn test_default_preset_only_emits_known_ids() {
        let mut generator = initialized(&BiomeConfig::default(), 16, 16);
        generator
            .biomify(&field(16, 16, 1), &field(16, 16, 2), &field(16, 16, 3))
            .unwrap();
        for &id in generator.biome_map() {
            assert!(generator.biome(id).is_some(), "unknown biome id {id:?}");
        }
    }

    #[test]
    fn test_new_rejects_empty_table() {
        let config = BiomeConfig {
            biomes: Vec::new(),
            ..Default::default()
        };
        assert_eq!(BiomeGenerator::new(&config).unwrap_err(), BiomeError::EmptyTable);
    }
}
