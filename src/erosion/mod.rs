//! Droplet-based hydraulic erosion.
//!
//! Droplets are spawned at random interior positions and stepped one cell at
//! a time down the bilinear slope of the height map. Moving downhill they pick
//! up material from a disc around their previous position; moving uphill or
//! carrying more than they can hold they drop it again. The simulator mutates a
//! borrowed height slice in place and never owns the map.
//!
//! Droplets are processed sequentially: writes to the shared map overlap, so
//! the result depends on the order in which droplets are advanced.

mod brush;
mod config;
mod droplet;

pub use config::ErosionConfig;

use brush::ErosionBrush;
use droplet::Droplet;

use std::f32::consts::TAU;

use glam::Vec2;
use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Errors produced by the erosion simulator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErosionError {
    #[error("Erosion grid must be at least 2x2, got {0}x{1}")]
    InvalidDimensions(usize, usize),
    #[error("Height map has {got} cells, grid needs {expected}")]
    LengthMismatch { got: usize, expected: usize },
    #[error("Trace buffer has {got} floats, needs at least {expected}")]
    TraceTooSmall { got: usize, expected: usize },
    #[error("Invalid erosion config: {0}")]
    InvalidConfig(String),
}

/// Material moved by one [`ErosionSimulator::erode`] call.
///
/// The height map changes by `deposited - eroded` in total; whatever droplets
/// still carried when they left the grid or ran out of lifetime is `carried_lost`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ErosionStats {
    pub eroded: f64,
    pub deposited: f64,
    pub carried_lost: f64,
    pub droplets_exited: usize,
}

/// Runs erosion passes over externally owned height maps of a fixed size.
#[derive(Debug, Clone)]
pub struct ErosionSimulator {
    config: ErosionConfig,
    width: usize,
    height: usize,
    brush: ErosionBrush,
    rng: ChaCha8Rng,
    droplets: Vec<Droplet>,
}

impl ErosionSimulator {
    pub fn new(config: ErosionConfig, width: usize, height: usize) -> Result<Self, ErosionError> {
        config.validate().map_err(ErosionError::InvalidConfig)?;
        check_dimensions(width, height)?;

        let brush = ErosionBrush::new(config.erosion_radius, width, height);
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            width,
            height,
            brush,
            rng,
            droplets: Vec::new(),
        })
    }

    /// Updates the grid size; only the erosion brush is rebuilt.
    ///
    /// Returns `Ok(false)` when the size is unchanged.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<bool, ErosionError> {
        check_dimensions(width, height)?;
        if width == self.width && height == self.height {
            return Ok(false);
        }
        self.width = width;
        self.height = height;
        self.brush = ErosionBrush::new(self.config.erosion_radius, width, height);
        Ok(true)
    }

    pub fn config(&self) -> &ErosionConfig {
        &self.config
    }

    /// Replaces the parameters and reseeds the droplet RNG from `config.seed`.
    pub fn set_config(&mut self, config: ErosionConfig) -> Result<(), ErosionError> {
        config.validate().map_err(ErosionError::InvalidConfig)?;
        self.brush = ErosionBrush::new(config.erosion_radius, self.width, self.height);
        self.rng = ChaCha8Rng::seed_from_u64(config.seed);
        self.config = config;
        Ok(())
    }

    /// Restarts the droplet RNG.
    pub fn reseed(&mut self, seed: u64) {
        self.config.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Floats needed for a trace buffer: `(lifetime + 1) * droplets * 3`.
    pub fn trace_len(&self) -> usize {
        (self.config.droplet_lifetime as usize + 1) * self.config.droplet_count as usize * 3
    }

    /// Runs one erosion pass over `heights`.
    ///
    /// When `trace` is given, droplet `slot` at `step` writes `(x, height, y)` at
    /// float offset `(slot * (lifetime + 1) + step) * 3`; step 0 is the spawn
    /// point. Steps a droplet never reached are left as NaN.
    pub fn erode(
        &mut self,
        heights: &mut [f32],
        mut trace: Option<&mut [f32]>,
    ) -> Result<ErosionStats, ErosionError> {
        let (width, height) = (self.width, self.height);
        let expected = width * height;
        if heights.len() != expected {
            return Err(ErosionError::LengthMismatch {
                got: heights.len(),
                expected,
            });
        }
        let trace_len = self.trace_len();
        if let Some(buf) = trace.as_deref_mut() {
            if buf.len() < trace_len {
                return Err(ErosionError::TraceTooSmall {
                    got: buf.len(),
                    expected: trace_len,
                });
            }
            buf[..trace_len].fill(f32::NAN);
        }

        let mut stats = ErosionStats::default();
        let count = self.config.droplet_count as usize;
        let lifetime = self.config.droplet_lifetime as usize;
        if count == 0 {
            return Ok(stats);
        }
        if is_flat(heights) {
            warn!("Eroding a flat {width}x{height} map; droplets will wander without moving material");
        }

        let max_x = (width - 2) as f32;
        let max_y = (height - 2) as f32;
        let mut droplets = std::mem::take(&mut self.droplets);
        droplets.clear();
        droplets.reserve(count);
        for slot in 0..count {
            let pos = Vec2::new(
                self.rng.random_range(0.0..=max_x),
                self.rng.random_range(0.0..=max_y),
            );
            let droplet = Droplet::new(slot, pos, self.config.initial_velocity, self.config.initial_water);
            if let Some(buf) = trace.as_deref_mut() {
                record(buf, lifetime, &droplet, 0, heights, width);
            }
            droplets.push(droplet);
        }

        for step in 1..=lifetime {
            let mut i = 0;
            while i < droplets.len() {
                if self.advance(&mut droplets[i], heights, &mut stats) {
                    if let Some(buf) = trace.as_deref_mut() {
                        record(buf, lifetime, &droplets[i], step, heights, width);
                    }
                    i += 1;
                } else {
                    let dead = droplets.swap_remove(i);
                    stats.carried_lost += dead.sediment as f64;
                    stats.droplets_exited += 1;
                }
            }
            if droplets.is_empty() {
                debug!("All droplets left the grid after {step} steps");
                break;
            }
        }
        stats.carried_lost += droplets.iter().map(|d| d.sediment as f64).sum::<f64>();
        droplets.clear();
        self.droplets = droplets;

        info!(
            "Eroded {width}x{height} with {count} droplets: eroded {:.4}, deposited {:.4}, {} exited",
            stats.eroded, stats.deposited, stats.droplets_exited
        );
        Ok(stats)
    }

    /// Moves a droplet one cell. Returns `false` if it left the interior.
    fn advance(&mut self, d: &mut Droplet, heights: &mut [f32], stats: &mut ErosionStats) -> bool {
        let (width, height) = (self.width, self.height);
        let inertia = self.config.inertia;

        let old = d.pos;
        let surface = droplet::sample(heights, width, old);

        let blended = d.dir * inertia - surface.gradient * (1.0 - inertia);
        d.dir = blended
            .try_normalize()
            .unwrap_or_else(|| Vec2::from_angle(self.rng.random_range(0.0..TAU)));

        let new = old + d.dir;
        if !droplet::in_interior(new, width, height) {
            return false;
        }

        // Positive means the droplet climbed.
        let delta = droplet::sample(heights, width, new).height - surface.height;
        if delta >= 0.0 {
            let dropped = delta.min(d.sediment);
            if dropped > 0.0 {
                droplet::deposit(heights, width, old, dropped);
                d.sediment -= dropped;
                stats.deposited += dropped as f64;
            }
        } else {
            d.capacity = (-delta).max(self.config.min_slope) * d.velocity * d.water * self.config.initial_capacity;
            if d.sediment > d.capacity {
                let dropped = (d.sediment - d.capacity) * self.config.deposition_rate;
                droplet::deposit(heights, width, old, dropped);
                d.sediment -= dropped;
                stats.deposited += dropped as f64;
            } else {
                let amount = ((d.capacity - d.sediment) * self.config.erosion_rate).min(-delta);
                let cell = droplet::cell_of(old);
                let removed = self
                    .brush
                    .erode(heights, (width, height), cell, amount, self.config.blur);
                d.sediment += removed;
                stats.eroded += removed as f64;
            }
        }

        d.velocity = (d.velocity * d.velocity + delta.abs() * self.config.gravity).sqrt();
        d.water *= 1.0 - self.config.evaporation_rate;
        d.pos = new;
        true
    }
}

fn check_dimensions(width: usize, height: usize) -> Result<(), ErosionError> {
    if width <= 1 || height <= 1 {
        return Err(ErosionError::InvalidDimensions(width, height));
    }
    Ok(())
}

fn is_flat(heights: &[f32]) -> bool {
    heights.windows(2).all(|w| w[0] == w[1])
}

fn record(buf: &mut [f32], lifetime: usize, d: &Droplet, step: usize, heights: &[f32], width: usize) {
    let base = (d.slot * (lifetime + 1) + step) * 3;
    buf[base] = d.pos.x;
    buf[base + 1] = droplet::sample(heights, width, d.pos).height;
    buf[base + 2] = d.pos.y;
}
