//! Biome rules and the rule table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::BiomeError;

/// The five climate axes a cell is classified on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClimateAxis {
    Temperature,
    Humidity,
    Continentalness,
    Mountainousness,
    Weirdness,
}

impl ClimateAxis {
    pub const COUNT: usize = 5;

    pub const ALL: [ClimateAxis; Self::COUNT] = [
        ClimateAxis::Temperature,
        ClimateAxis::Humidity,
        ClimateAxis::Continentalness,
        ClimateAxis::Mountainousness,
        ClimateAxis::Weirdness,
    ];

    pub fn index(self) -> usize {
        match self {
            ClimateAxis::Temperature => 0,
            ClimateAxis::Humidity => 1,
            ClimateAxis::Continentalness => 2,
            ClimateAxis::Mountainousness => 3,
            ClimateAxis::Weirdness => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ClimateAxis::Temperature => "temperature",
            ClimateAxis::Humidity => "humidity",
            ClimateAxis::Continentalness => "continentalness",
            ClimateAxis::Mountainousness => "mountainousness",
            ClimateAxis::Weirdness => "weirdness",
        }
    }
}

/// Biome identifier stored in the biome map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BiomeId(pub u16);

impl BiomeId {
    /// Assigned to classified cells that no rule matches.
    pub const DEFAULT: BiomeId = BiomeId(0);
    /// Reserved for cells whose level could not be determined on some axis.
    pub const UNCLASSIFIED: BiomeId = BiomeId(u16::MAX);

    pub fn as_u16(self) -> u16 {
        self.0
    }
}

/// Half-open level range `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRange {
    pub min: usize,
    pub max: usize,
}

impl LevelRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Range matching every level.
    pub const fn any() -> Self {
        Self {
            min: 0,
            max: u32::MAX as usize,
        }
    }

    pub fn contains(&self, level: usize) -> bool {
        self.min <= level && level < self.max
    }
}

/// One classification rule plus display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Biome {
    pub id: BiomeId,
    pub name: String,
    /// RGB preview color.
    pub color: [u8; 3],
    /// Vegetation density level consumed by decoration layers.
    pub vegetation: u8,
    /// Level range per axis, indexed by [`ClimateAxis::index`].
    pub ranges: [LevelRange; ClimateAxis::COUNT],
}

impl Biome {
    /// A biome matching every level combination.
    pub fn catch_all(id: u16, name: &str, color: [u8; 3]) -> Self {
        Self {
            id: BiomeId(id),
            name: name.to_string(),
            color,
            vegetation: 0,
            ranges: [LevelRange::any(); ClimateAxis::COUNT],
        }
    }

    pub fn with_range(mut self, axis: ClimateAxis, min: usize, max: usize) -> Self {
        self.ranges[axis.index()] = LevelRange::new(min, max);
        self
    }

    pub fn with_vegetation(mut self, vegetation: u8) -> Self {
        self.vegetation = vegetation;
        self
    }

    pub fn range(&self, axis: ClimateAxis) -> LevelRange {
        self.ranges[axis.index()]
    }

    /// True iff every axis range contains the corresponding level.
    pub fn matches(&self, levels: &[usize; ClimateAxis::COUNT]) -> bool {
        self.ranges.iter().zip(levels).all(|(range, &level)| range.contains(level))
    }
}

/// Insertion-ordered rule table with lookup by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BiomeTable {
    rules: Vec<Biome>,
    by_id: HashMap<BiomeId, usize>,
}

impl BiomeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_biomes(biomes: Vec<Biome>) -> Result<Self, BiomeError> {
        let mut table = Self::new();
        for biome in biomes {
            table.push(biome)?;
        }
        Ok(table)
    }

    /// Appends a rule. Rules are matched in insertion order.
    pub fn push(&mut self, biome: Biome) -> Result<(), BiomeError> {
        if biome.id == BiomeId::UNCLASSIFIED {
            return Err(BiomeError::ReservedId(biome.id.0));
        }
        if self.by_id.contains_key(&biome.id) {
            return Err(BiomeError::DuplicateId(biome.id.0));
        }
        self.by_id.insert(biome.id, self.rules.len());
        self.rules.push(biome);
        Ok(())
    }

    pub fn get(&self, id: BiomeId) -> Option<&Biome> {
        self.by_id.get(&id).map(|&i| &self.rules[i])
    }

    /// First rule matching `levels`.
    pub fn find(&self, levels: &[usize; ClimateAxis::COUNT]) -> Option<&Biome> {
        self.rules.iter().find(|b| b.matches(levels))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Biome> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_range_is_half_open() {
        let range = LevelRange::new(1, 3);
        assert!(!range.contains(0));
        assert!(range.contains(1));
        assert!(range.contains(2));
        assert!(!range.contains(3));
    }

    #[test]
    fn test_biome_matches_all_axes() {
        let biome = Biome::catch_all(3, "desert", [220, 205, 140])
            .with_range(ClimateAxis::Temperature, 3, 5)
            .with_range(ClimateAxis::Humidity, 0, 2);
        assert!(biome.matches(&[4, 1, 0, 0, 0]));
        assert!(!biome.matches(&[2, 1, 0, 0, 0]));
        assert!(!biome.matches(&[4, 2, 0, 0, 0]));
    }

    #[test]
    fn test_table_matches_in_insertion_order() {
        let table = BiomeTable::from_biomes(vec![
            Biome::catch_all(1, "cold", [0, 0, 255]).with_range(ClimateAxis::Temperature, 0, 2),
            Biome::catch_all(2, "anything", [0, 255, 0]),
        ])
        .unwrap();
        assert_eq!(table.find(&[1, 0, 0, 0, 0]).map(|b| b.id), Some(BiomeId(1)));
        assert_eq!(table.find(&[3, 0, 0, 0, 0]).map(|b| b.id), Some(BiomeId(2)));
        assert_eq!(table.get(BiomeId(2)).map(|b| b.name.as_str()), Some("anything"));
    }

    #[test]
    fn test_table_rejects_duplicate_and_reserved_ids() {
        let mut table = BiomeTable::new();
        table.push(Biome::catch_all(1, "a", [0; 3])).unwrap();
        assert_eq!(
            table.push(Biome::catch_all(1, "b", [0; 3])),
            Err(BiomeError::DuplicateId(1))
        );
        assert_eq!(
            table.push(Biome::catch_all(u16::MAX, "c", [0; 3])),
            Err(BiomeError::ReservedId(u16::MAX))
        );
        assert_eq!(table.len(), 1);
    }
}
