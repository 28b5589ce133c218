//! Erosion configuration.

use serde::{Deserialize, Serialize};

/// Parameters for droplet hydraulic erosion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErosionConfig {
    /// Number of droplets spawned per pass.
    pub droplet_count: u32,
    /// Maximum number of steps a droplet survives.
    pub droplet_lifetime: u32,
    /// Seed for droplet spawn positions and random directions.
    pub seed: u64,

    /// Fraction of spare capacity taken from the terrain per step (0-1).
    pub erosion_rate: f32,
    /// Fraction of excess sediment dropped per step (0-1).
    pub deposition_rate: f32,
    /// Fraction of water lost per step (0-1).
    pub evaporation_rate: f32,
    /// How much of the previous direction is kept (0-1).
    pub inertia: f32,
    /// Floor on the slope used for capacity, so flat ground still carries sediment.
    pub min_slope: f32,
    pub gravity: f32,
    /// Radius of the erosion disc, in cells.
    pub erosion_radius: f32,
    /// Fraction of each cell's erosion share that is kept (0 = full erosion).
    pub blur: f32,

    pub initial_water: f32,
    pub initial_velocity: f32,
    /// Sediment capacity factor.
    pub initial_capacity: f32,
}

impl Default for ErosionConfig {
    fn default() -> Self {
        Self {
            droplet_count: 50_000,
            droplet_lifetime: 30,
            seed: 0,

            erosion_rate: 0.3,
            deposition_rate: 0.3,
            evaporation_rate: 0.01,
            inertia: 0.05,
            min_slope: 0.01,
            gravity: 4.0,
            erosion_radius: 3.0,
            blur: 0.0,

            initial_water: 1.0,
            initial_velocity: 1.0,
            initial_capacity: 4.0,
        }
    }
}

impl ErosionConfig {
    /// Checks ranges; returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        let unit = [
            ("erosion_rate", self.erosion_rate),
            ("deposition_rate", self.deposition_rate),
            ("evaporation_rate", self.evaporation_rate),
            ("inertia", self.inertia),
            ("blur", self.blur),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be in [0, 1], got {value}"));
            }
        }

        let non_negative = [
            ("min_slope", self.min_slope),
            ("gravity", self.gravity),
            ("initial_water", self.initial_water),
            ("initial_velocity", self.initial_velocity),
            ("initial_capacity", self.initial_capacity),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be finite and non-negative, got {value}"));
            }
        }

        if !self.erosion_radius.is_finite() || self.erosion_radius <= 0.0 {
            return Err(format!("erosion_radius must be positive, got {}", self.erosion_radius));
        }
        Ok(())
    }
}
