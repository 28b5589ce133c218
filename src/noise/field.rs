//! Materialised fractal noise grid.

use log::debug;
use rayon::prelude::*;
use thiserror::Error;

use super::config::NoiseConfig;
use super::fractal::FractalSampler;

/// Errors produced by [`NoiseField`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NoiseError {
    #[error("Invalid noise dimensions {0}x{1}")]
    InvalidDimensions(usize, usize),
    #[error("Noise field has not been allocated")]
    NotAllocated,
    #[error("Invalid sample coordinate ({0}, {1})")]
    InvalidCoordinate(f64, f64),
    #[error("Invalid noise configuration: {0}")]
    InvalidConfig(String),
}

/// A `width`×`height` grid of fractal noise values, stored row-major.
///
/// The grid is only regenerated on an explicit [`NoiseField::generate`];
/// resizing and reconfiguring never touch the values.
#[derive(Debug, Clone)]
pub struct NoiseField {
    width: usize,
    height: usize,
    sampler: FractalSampler,
    values: Vec<f32>,
    origin: (f64, f64),
    dirty: bool,
}

impl NoiseField {
    /// Creates an unallocated field. Call [`NoiseField::resize`] before generating.
    pub fn new(config: NoiseConfig) -> Self {
        Self {
            width: 0,
            height: 0,
            sampler: FractalSampler::new(config),
            values: Vec::new(),
            origin: (0.0, 0.0),
            dirty: true,
        }
    }

    /// Creates a field allocated to `width`×`height`, not yet generated.
    pub fn with_size(width: usize, height: usize, config: NoiseConfig) -> Result<Self, NoiseError> {
        let mut field = Self::new(config);
        field.resize(width, height)?;
        Ok(field)
    }

    /// Reallocates the grid if the dimensions change.
    ///
    /// Returns `Ok(false)` when the dimensions are unchanged, leaving the
    /// buffer untouched. Never regenerates.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<bool, NoiseError> {
        if width == 0 || height == 0 {
            return Err(NoiseError::InvalidDimensions(width, height));
        }
        if width == self.width && height == self.height {
            return Ok(false);
        }

        self.width = width;
        self.height = height;
        self.values = vec![0.0; width * height];
        self.dirty = true;
        Ok(true)
    }

    /// Fills the grid with noise; cell `(x, y)` samples `(x + origin_x, y + origin_y)`.
    pub fn generate(&mut self, origin_x: f64, origin_y: f64) -> Result<(), NoiseError> {
        if !self.is_allocated() {
            return Err(NoiseError::NotAllocated);
        }
        if !origin_x.is_finite() || !origin_y.is_finite() {
            return Err(NoiseError::InvalidCoordinate(origin_x, origin_y));
        }

        let (width, height) = (self.width, self.height);
        let sampler = &self.sampler;
        self.values
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                let cy = y as f64 + origin_y;
                for (x, value) in row.iter_mut().enumerate() {
                    *value = sampler.sample(x as f64 + origin_x, cy, (origin_x, origin_y), width, height);
                }
            });

        self.origin = (origin_x, origin_y);
        self.dirty = false;
        debug!(
            "generated {}x{} noise field (seed {}) at origin ({}, {})",
            width,
            height,
            sampler.config().seed,
            origin_x,
            origin_y
        );
        Ok(())
    }

    /// Evaluates a single cell coordinate without touching the grid.
    ///
    /// Uses the same formula as [`NoiseField::generate`], so
    /// `point_noise(x + ox, y + oy)` equals cell `(x, y)` after `generate(ox, oy)`.
    /// The island mask is placed relative to the stored [`NoiseField::origin`].
    pub fn point_noise(&self, x: f64, y: f64) -> Result<f32, NoiseError> {
        self.point_noise_in_tile(x, y, self.origin)
    }

    /// Like [`NoiseField::point_noise`], with the island mask placed for the
    /// tile at `origin` instead of the stored one.
    pub fn point_noise_in_tile(&self, x: f64, y: f64, origin: (f64, f64)) -> Result<f32, NoiseError> {
        if !self.is_allocated() {
            return Err(NoiseError::NotAllocated);
        }
        if !x.is_finite() || !y.is_finite() {
            return Err(NoiseError::InvalidCoordinate(x, y));
        }
        Ok(self.sampler.sample(x, y, origin, self.width, self.height))
    }

    pub fn config(&self) -> &NoiseConfig {
        self.sampler.config()
    }

    /// Replaces the configuration and marks the field dirty. Does not regenerate.
    pub fn set_config(&mut self, config: NoiseConfig) -> Result<(), NoiseError> {
        config.validate().map_err(NoiseError::InvalidConfig)?;
        self.sampler = FractalSampler::new(config);
        self.dirty = true;
        Ok(())
    }

    /// True when configuration or size changed since the last generation.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_allocated(&self) -> bool {
        self.width > 0 && self.height > 0 && self.values.len() == self.width * self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Origin used by the most recent generation.
    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn value_at(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.values[y * self.width + x])
    }

    /// Computes the min and max values in the grid.
    pub fn value_range(&self) -> (f32, f32) {
        self.values
            .iter()
            .fold((f32::MAX, f32::MIN), |(min, max), &v| (min.min(v), max.max(v)))
    }
}
