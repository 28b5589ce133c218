//! Post-processing applied to raw fractal values.

use std::f32::consts::{FRAC_1_SQRT_2, PI};

use super::config::{IslandShape, NegativeHandling, NoiseConfig};

/// Distance of a grid-normalised position from the grid centre, in [0, 1].
///
/// `nx`, `ny` are expected in [-1, 1]; positions outside the grid saturate at 1.
pub fn island_distance(shape: IslandShape, nx: f32, ny: f32) -> f32 {
    let d = match shape {
        IslandShape::Cone => (nx * nx + ny * ny).sqrt(),
        IslandShape::Diagonal => nx.abs().max(ny.abs()),
        IslandShape::EuclideanSquared => (nx * nx + ny * ny) * FRAC_1_SQRT_2,
        IslandShape::SquareBump => 1.0 - (1.0 - nx * nx) * (1.0 - ny * ny),
        IslandShape::Hyperboloid => {
            const PEAK: f32 = 0.2;
            let rim = (1.0 + PEAK * PEAK).sqrt() - PEAK;
            ((nx * nx + ny * ny + PEAK * PEAK).sqrt() - PEAK) / rim
        }
        IslandShape::Squircle => (nx.powi(4) + ny.powi(4)).sqrt(),
        IslandShape::TrigProduct => {
            let cx = (nx.clamp(-1.0, 1.0) * PI * 0.5).cos();
            let cy = (ny.clamp(-1.0, 1.0) * PI * 0.5).cos();
            1.0 - cx * cy
        }
    };
    if nx.abs() > 1.0 || ny.abs() > 1.0 {
        return 1.0;
    }
    d.clamp(0.0, 1.0)
}

/// Applies negative handling, ridging, redistribution and island masking,
/// in that order.
///
/// `nx`, `ny` locate the sample inside the grid (see [`island_distance`]).
pub fn shape_value(value: f32, config: &NoiseConfig, nx: f32, ny: f32) -> f32 {
    let mut h = value;

    match config.negative {
        NegativeHandling::Refit => h = (h + 1.0) * 0.5,
        NegativeHandling::Flatten if h < 0.0 => h = 0.0,
        NegativeHandling::Revert if h < 0.0 => h = -h,
        _ => {}
    }

    if config.ridge.enabled {
        let r = config.ridge.offset - h.abs();
        h = r * r * config.ridge.gain;
    }

    // Sign-preserving so fractional exponents never produce NaN.
    if config.redistribution != 1.0 {
        h = h.signum() * h.abs().powf(config.redistribution);
    }

    if config.island.enabled {
        let d = island_distance(config.island.shape, nx, ny);
        let falloff = (1.0 - d).max(0.0).powf(config.island.mix_power.max(0.0));
        h *= falloff;
    }

    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::config::{IslandConfig, RidgeConfig};

    const ALL_SHAPES: [IslandShape; 7] = [
        IslandShape::Cone,
        IslandShape::Diagonal,
        IslandShape::EuclideanSquared,
        IslandShape::SquareBump,
        IslandShape::Hyperboloid,
        IslandShape::Squircle,
        IslandShape::TrigProduct,
    ];

    #[test]
    fn island_distance_is_zero_at_centre_and_saturates_at_rim() {
        for shape in ALL_SHAPES {
            let centre = island_distance(shape, 0.0, 0.0);
            assert!(centre.abs() < 1e-6, "{shape:?} centre distance {centre}");
            let corner = island_distance(shape, 1.0, 1.0);
            assert!((corner - 1.0).abs() < 1e-6, "{shape:?} corner distance {corner}");
            assert_eq!(island_distance(shape, 1.5, 0.0), 1.0);
        }
    }

    #[test]
    fn refit_maps_range_to_unit_interval() {
        let config = NoiseConfig {
            negative: NegativeHandling::Refit,
            ..Default::default()
        };
        assert_eq!(shape_value(-1.0, &config, 0.0, 0.0), 0.0);
        assert_eq!(shape_value(1.0, &config, 0.0, 0.0), 1.0);
        assert_eq!(shape_value(0.0, &config, 0.0, 0.0), 0.5);
    }

    #[test]
    fn flatten_and_revert_only_touch_negatives() {
        let flatten = NoiseConfig {
            negative: NegativeHandling::Flatten,
            ..Default::default()
        };
        let revert = NoiseConfig {
            negative: NegativeHandling::Revert,
            ..Default::default()
        };
        assert_eq!(shape_value(-0.4, &flatten, 0.0, 0.0), 0.0);
        assert_eq!(shape_value(0.4, &flatten, 0.0, 0.0), 0.4);
        assert_eq!(shape_value(-0.4, &revert, 0.0, 0.0), 0.4);
    }

    #[test]
    fn ridge_transform() {
        let config = NoiseConfig {
            ridge: RidgeConfig {
                enabled: true,
                gain: 2.0,
                offset: 1.0,
            },
            ..Default::default()
        };
        let h = shape_value(-0.5, &config, 0.0, 0.0);
        assert!((h - 0.5).abs() < 1e-6, "(1 - 0.5)^2 * 2 = 0.5, got {h}");
    }

    #[test]
    fn fractional_redistribution_keeps_sign_and_is_finite() {
        let config = NoiseConfig {
            redistribution: 0.5,
            ..Default::default()
        };
        let h = shape_value(-0.25, &config, 0.0, 0.0);
        assert!(h.is_finite());
        assert!((h + 0.5).abs() < 1e-6);
    }

    #[test]
    fn island_mask_attenuates_rim() {
        let config = NoiseConfig {
            island: IslandConfig {
                enabled: true,
                shape: IslandShape::Diagonal,
                mix_power: 1.0,
            },
            ..Default::default()
        };
        assert_eq!(shape_value(0.8, &config, 0.0, 0.0), 0.8);
        assert_eq!(shape_value(0.8, &config, 1.0, 0.2), 0.0);
        let mid = shape_value(0.8, &config, 0.5, 0.0);
        assert!((mid - 0.4).abs() < 1e-6);
    }
}
