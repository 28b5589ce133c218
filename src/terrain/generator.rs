//! Elevation from three combined noise channels.

use log::{debug, info};
use rayon::prelude::*;
use thiserror::Error;

use super::config::{EvaluationMethod, TerrainConfig, TerrainParameter};
use super::heightmap::HeightMap;
use crate::noise::{NoiseConfig, NoiseError, NoiseField};
use crate::spline::{SplineError, SplineEvaluator, SplineKind, SplinePoint};

/// Errors produced by [`TerrainGenerator`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TerrainError {
    #[error("Invalid terrain dimensions {0}x{1}")]
    InvalidDimensions(usize, usize),
    #[error("Terrain has not been sized; call resize first")]
    NotInitialized,
    #[error("Invalid resolution {0}")]
    InvalidResolution(f32),
    #[error("{0} noise: {1}")]
    Noise(&'static str, NoiseError),
    #[error("{0} spline: {1}")]
    Spline(&'static str, SplineError),
}

/// Produces a height map from continentalness, mountainousness and weirdness.
///
/// Channels and splines are held in fixed tables indexed by
/// [`TerrainParameter::index`].
#[derive(Debug, Clone)]
pub struct TerrainGenerator {
    width: usize,
    height: usize,
    fields: [NoiseField; 3],
    splines: [SplineEvaluator; 3],
    method: EvaluationMethod,
    heights: HeightMap,
    generated: bool,
}

impl TerrainGenerator {
    /// Builds an unsized generator from `config`.
    pub fn new(config: &TerrainConfig) -> Result<Self, TerrainError> {
        let mut splines = [
            SplineEvaluator::identity(),
            SplineEvaluator::identity(),
            SplineEvaluator::identity(),
        ];
        for param in TerrainParameter::ALL {
            config
                .noise(param)
                .validate()
                .map_err(|e| TerrainError::Noise(param.name(), NoiseError::InvalidConfig(e)))?;
            splines[param.index()] = SplineEvaluator::from_config(config.spline(param))
                .map_err(|e| TerrainError::Spline(param.name(), e))?;
        }

        Ok(Self {
            width: 0,
            height: 0,
            fields: TerrainParameter::ALL.map(|p| NoiseField::new(config.noise(p).clone())),
            splines,
            method: config.method,
            heights: HeightMap::new(0, 0),
            generated: false,
        })
    }

    /// Builds a generator and sizes it in one step.
    pub fn with_size(config: &TerrainConfig, width: usize, height: usize) -> Result<Self, TerrainError> {
        let mut generator = Self::new(config)?;
        generator.resize(width, height)?;
        Ok(generator)
    }

    /// Reallocates the height map and resizes + regenerates all three channels.
    ///
    /// Returns `Ok(false)` without touching anything when the size is unchanged.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<bool, TerrainError> {
        if width == 0 || height == 0 {
            return Err(TerrainError::InvalidDimensions(width, height));
        }
        if width == self.width && height == self.height {
            return Ok(false);
        }

        for param in TerrainParameter::ALL {
            let field = &mut self.fields[param.index()];
            field.resize(width, height).map_err(|e| TerrainError::Noise(param.name(), e))?;
            field.generate(0.0, 0.0).map_err(|e| TerrainError::Noise(param.name(), e))?;
        }

        self.width = width;
        self.height = height;
        self.heights = HeightMap::new(width, height);
        self.generated = false;
        debug!("terrain resized to {}x{}", width, height);
        Ok(true)
    }

    /// Evaluates elevation for every cell with the grid origin at `(origin_x, origin_y)`.
    ///
    /// Each cell samples its three channels at `(x + origin_x, y + origin_y)`,
    /// with island masks placed for this tile; any failed sample aborts the whole call. Afterwards the channel grids are
    /// regenerated at the same origin so biome classification reads aligned inputs.
    pub fn generate_terrain(&mut self, origin_x: f64, origin_y: f64) -> Result<(), TerrainError> {
        if self.width == 0 || self.height == 0 {
            return Err(TerrainError::NotInitialized);
        }

        let width = self.width;
        let fields = &self.fields;
        let splines = &self.splines;
        let method = self.method;

        self.heights
            .as_mut_slice()
            .par_chunks_mut(width)
            .enumerate()
            .try_for_each(|(y, row)| -> Result<(), TerrainError> {
                let cy = y as f64 + origin_y;
                for (x, cell) in row.iter_mut().enumerate() {
                    let cx = x as f64 + origin_x;
                    let mut sample = [0.0f32; 3];
                    for param in TerrainParameter::ALL {
                        sample[param.index()] = fields[param.index()]
                            .point_noise_in_tile(cx, cy, (origin_x, origin_y))
                            .map_err(|e| TerrainError::Noise(param.name(), e))?;
                    }
                    *cell = combine(method, splines, sample);
                }
                Ok(())
            })?;

        for param in TerrainParameter::ALL {
            let field = &mut self.fields[param.index()];
            if field.is_dirty() || field.origin() != (origin_x, origin_y) {
                field
                    .generate(origin_x, origin_y)
                    .map_err(|e| TerrainError::Noise(param.name(), e))?;
            }
        }

        self.generated = true;
        let (min, max) = self.heights.height_range();
        info!(
            "generated {}x{} terrain ({:?}) at origin ({}, {}), heights [{:.4}, {:.4}]",
            self.width, self.height, method, origin_x, origin_y, min, max
        );
        Ok(())
    }

    /// Evaluates the elevation of a single channel sample triple.
    pub fn evaluate(&self, continentalness: f32, mountainousness: f32, weirdness: f32) -> f32 {
        combine(self.method, &self.splines, [continentalness, mountainousness, weirdness])
    }

    /// Sets the sampling resolution on every channel and regenerates them.
    pub fn set_resolution(&mut self, resolution: f32) -> Result<(), TerrainError> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(TerrainError::InvalidResolution(resolution));
        }
        for param in TerrainParameter::ALL {
            let field = &mut self.fields[param.index()];
            let config = NoiseConfig {
                resolution,
                ..field.config().clone()
            };
            field.set_config(config).map_err(|e| TerrainError::Noise(param.name(), e))?;
            if field.is_allocated() {
                let (ox, oy) = field.origin();
                field.generate(ox, oy).map_err(|e| TerrainError::Noise(param.name(), e))?;
            }
        }
        self.generated = false;
        Ok(())
    }

    /// Rebuilds one spline. Only consulted under [`EvaluationMethod::SplineCombine`].
    pub fn set_spline(
        &mut self,
        param: TerrainParameter,
        points: &[SplinePoint],
        kind: SplineKind,
    ) -> Result<(), TerrainError> {
        let spline = SplineEvaluator::new(points, kind).map_err(|e| TerrainError::Spline(param.name(), e))?;
        self.splines[param.index()] = spline;
        Ok(())
    }

    /// Rebuilds all three splines; nothing changes if any of them is invalid.
    pub fn set_splines(&mut self, splines: [(&[SplinePoint], SplineKind); 3]) -> Result<(), TerrainError> {
        let mut built = self.splines.clone();
        for param in TerrainParameter::ALL {
            let (points, kind) = splines[param.index()];
            built[param.index()] =
                SplineEvaluator::new(points, kind).map_err(|e| TerrainError::Spline(param.name(), e))?;
        }
        self.splines = built;
        Ok(())
    }

    pub fn spline_points(&self, param: TerrainParameter) -> &[SplinePoint] {
        self.splines[param.index()].points()
    }

    pub fn spline(&self, param: TerrainParameter) -> &SplineEvaluator {
        &self.splines[param.index()]
    }

    pub fn noise(&self, param: TerrainParameter) -> &NoiseField {
        &self.fields[param.index()]
    }

    pub fn config(&self, param: TerrainParameter) -> &NoiseConfig {
        self.fields[param.index()].config()
    }

    /// Replaces one channel's configuration. The channel is marked dirty and is
    /// regenerated by the next [`TerrainGenerator::generate_terrain`].
    pub fn set_config(&mut self, param: TerrainParameter, config: NoiseConfig) -> Result<(), TerrainError> {
        self.fields[param.index()]
            .set_config(config)
            .map_err(|e| TerrainError::Noise(param.name(), e))
    }

    /// True when any channel changed since it was last generated.
    pub fn is_dirty(&self) -> bool {
        self.fields.iter().any(NoiseField::is_dirty)
    }

    pub fn evaluation_method(&self) -> EvaluationMethod {
        self.method
    }

    pub fn set_evaluation_method(&mut self, method: EvaluationMethod) {
        self.method = method;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn height_map(&self) -> &HeightMap {
        &self.heights
    }

    /// Mutable access for in-place transforms such as erosion.
    pub fn height_map_mut(&mut self) -> &mut HeightMap {
        &mut self.heights
    }

    pub fn height_at(&self, x: usize, y: usize) -> Option<f32> {
        self.heights.get(x, y)
    }
}

fn combine(method: EvaluationMethod, splines: &[SplineEvaluator; 3], sample: [f32; 3]) -> f32 {
    let [c, m, w] = sample;
    match method {
        EvaluationMethod::LinearCombine => {
            let c = (c + 1.0) * 0.5;
            let m = (m + 1.0) * 0.5;
            let w = (w + 1.0) * 0.5;
            c * m * (1.0 - w)
        }
        EvaluationMethod::SplineCombine => {
            splines[TerrainParameter::Continentalness.index()].evaluate(c)
                * splines[TerrainParameter::Mountainousness.index()].evaluate(m)
                * splines[TerrainParameter::Weirdness.index()].evaluate(w)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::IslandConfig;

    fn small_config() -> TerrainConfig {
        let mut config = TerrainConfig::with_seed(7);
        for noise in [
            &mut config.continentalness,
            &mut config.mountainousness,
            &mut config.weirdness,
        ] {
            noise.octaves = 3;
        }
        config
    }

    #[test]
    fn test_generate_requires_size() {
        let mut generator = TerrainGenerator::new(&small_config()).unwrap();
        assert_eq!(generator.generate_terrain(0.0, 0.0), Err(TerrainError::NotInitialized));
    }

    #[test]
    fn test_resize_rejects_zero_and_is_idempotent() {
        let mut generator = TerrainGenerator::new(&small_config()).unwrap();
        assert_eq!(generator.resize(0, 5), Err(TerrainError::InvalidDimensions(0, 5)));
        assert_eq!(generator.resize(16, 8), Ok(true));
        generator.generate_terrain(0.0, 0.0).unwrap();
        let before = generator.height_map().clone();
        assert_eq!(generator.resize(16, 8), Ok(false));
        assert_eq!(generator.height_map(), &before);
        assert!(generator.is_generated());
    }

    #[test]
    fn test_resize_regenerates_channels() {
        let generator = TerrainGenerator::with_size(&small_config(), 12, 10).unwrap();
        for param in TerrainParameter::ALL {
            let field = generator.noise(param);
            assert_eq!((field.width(), field.height()), (12, 10));
            assert!(!field.is_dirty(), "{} should be generated", param.name());
        }
        assert_eq!(generator.height_map().len(), 120);
    }

    #[test]
    fn test_linear_combine_matches_formula() {
        let mut generator = TerrainGenerator::with_size(&small_config(), 10, 10).unwrap();
        generator.generate_terrain(3.0, -2.0).unwrap();
        for y in 0..10 {
            for x in 0..10 {
                let c = generator.noise(TerrainParameter::Continentalness).value_at(x, y).unwrap();
                let m = generator.noise(TerrainParameter::Mountainousness).value_at(x, y).unwrap();
                let w = generator.noise(TerrainParameter::Weirdness).value_at(x, y).unwrap();
                let expected = (c + 1.0) * 0.5 * ((m + 1.0) * 0.5) * (1.0 - (w + 1.0) * 0.5);
                let got = generator.height_at(x, y).unwrap();
                assert!((got - expected).abs() < 1e-6, "cell ({x}, {y}): {got} vs {expected}");
            }
        }
    }

    #[test]
    fn test_spline_combine_uses_splines() {
        let mut config = small_config();
        config.method = EvaluationMethod::SplineCombine;
        let mut generator = TerrainGenerator::with_size(&config, 8, 8).unwrap();

        let flat = [SplinePoint::new(-1.0, 0.5), SplinePoint::new(1.0, 0.5)];
        generator
            .set_splines([
                (&flat[..], SplineKind::Linear),
                (&flat[..], SplineKind::Linear),
                (&flat[..], SplineKind::Cubic),
            ])
            .unwrap();
        generator.generate_terrain(0.0, 0.0).unwrap();
        assert!(generator
            .height_map()
            .as_slice()
            .iter()
            .all(|&h| (h - 0.125).abs() < 1e-6));
    }

    #[test]
    fn test_set_spline_rejects_bad_points_without_change() {
        let mut generator = TerrainGenerator::new(&small_config()).unwrap();
        let before = generator.spline_points(TerrainParameter::Weirdness).to_vec();
        let bad = [SplinePoint::new(0.0, 0.0)];
        assert!(matches!(
            generator.set_spline(TerrainParameter::Weirdness, &bad, SplineKind::Linear),
            Err(TerrainError::Spline("weirdness", SplineError::TooFewPoints(1)))
        ));
        assert_eq!(generator.spline_points(TerrainParameter::Weirdness), &before[..]);
    }

    #[test]
    fn test_tiles_are_seamless() {
        let config = small_config();
        let mut left = TerrainGenerator::with_size(&config, 8, 8).unwrap();
        let mut right = TerrainGenerator::with_size(&config, 8, 8).unwrap();
        let mut wide = TerrainGenerator::with_size(&config, 8, 8).unwrap();
        left.generate_terrain(0.0, 0.0).unwrap();
        right.generate_terrain(4.0, 0.0).unwrap();
        wide.generate_terrain(0.0, 0.0).unwrap();
        for y in 0..8 {
            for x in 4..8 {
                assert_eq!(left.height_at(x, y), right.height_at(x - 4, y));
            }
        }
        assert_eq!(left.height_map(), wide.height_map());
    }

    #[test]
    fn test_set_config_marks_dirty_and_regenerates_on_generate() {
        let mut generator = TerrainGenerator::with_size(&small_config(), 8, 8).unwrap();
        generator.generate_terrain(0.0, 0.0).unwrap();
        let before = generator.height_map().clone();

        generator
            .set_config(TerrainParameter::Continentalness, NoiseConfig::with_seed(999))
            .unwrap();
        assert!(generator.is_dirty());
        assert_eq!(generator.height_map(), &before, "setting config must not regenerate");

        generator.generate_terrain(0.0, 0.0).unwrap();
        assert!(!generator.is_dirty());
        assert_ne!(generator.height_map(), &before);
    }

    #[test]
    fn test_set_resolution_updates_channels() {
        let mut generator = TerrainGenerator::with_size(&small_config(), 8, 8).unwrap();
        generator.set_resolution(2.0).unwrap();
        for param in TerrainParameter::ALL {
            assert_eq!(generator.config(param).resolution, 2.0);
            assert!(!generator.noise(param).is_dirty());
        }
        assert_eq!(generator.set_resolution(0.0), Err(TerrainError::InvalidResolution(0.0)));
    }

    #[test]
    fn test_island_channel_survives_away_from_origin() {
        let mut config = small_config();
        for noise in [
            &mut config.continentalness,
            &mut config.mountainousness,
            &mut config.weirdness,
        ] {
            noise.island = IslandConfig {
                enabled: true,
                ..Default::default()
            };
        }
        let mut generator = TerrainGenerator::with_size(&config, 16, 16).unwrap();
        generator.generate_terrain(160.0, -48.0).unwrap();

        let continents = generator.noise(TerrainParameter::Continentalness);
        let nonzero = continents.values().iter().filter(|&&v| v != 0.0).count();
        assert!(nonzero > 128, "only {nonzero} / 256 continentalness cells survive");
        assert_ne!(continents.value_at(8, 8), Some(0.0));

        for y in 0..16 {
            for x in 0..16 {
                let c = generator.noise(TerrainParameter::Continentalness).value_at(x, y).unwrap();
                let m = generator.noise(TerrainParameter::Mountainousness).value_at(x, y).unwrap();
                let w = generator.noise(TerrainParameter::Weirdness).value_at(x, y).unwrap();
                let expected = generator.evaluate(c, m, w);
                let got = generator.height_at(x, y).unwrap();
                assert!((got - expected).abs() < 1e-6, "cell ({x}, {y}): {got} vs {expected}");
            }
        }
    }

    #[test]
    fn test_heights_are_finite() {
        let mut generator = TerrainGenerator::with_size(&TerrainConfig::default(), 32, 24).unwrap();
        generator.generate_terrain(0.0, 0.0).unwrap();
        assert!(generator.height_map().as_slice().iter().all(|h| h.is_finite()));
    }
}
