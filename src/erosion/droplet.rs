//! Droplet state and bilinear sampling helpers.

use glam::Vec2;

/// A simulated water particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Droplet {
    /// Position in cell-grid space.
    pub pos: Vec2,
    /// Unit direction once the droplet has taken a step; zero at spawn.
    pub dir: Vec2,
    pub velocity: f32,
    pub water: f32,
    /// Last computed sediment capacity.
    pub capacity: f32,
    pub sediment: f32,
    /// Spawn slot, used to address the trace buffer.
    pub slot: usize,
}

impl Droplet {
    pub fn new(slot: usize, pos: Vec2, velocity: f32, water: f32) -> Self {
        Self {
            pos,
            dir: Vec2::ZERO,
            velocity,
            water,
            capacity: 0.0,
            sediment: 0.0,
            slot,
        }
    }
}

/// Bilinear height and slope at a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    pub height: f32,
    /// Uphill gradient `(dh/dx, dh/dy)`.
    pub gradient: Vec2,
}

/// True iff `pos` lies in `[0, width - 2] x [0, height - 2]`.
#[inline]
pub fn in_interior(pos: Vec2, width: usize, height: usize) -> bool {
    let max_x = (width - 2) as f32;
    let max_y = (height - 2) as f32;
    pos.x >= 0.0 && pos.y >= 0.0 && pos.x <= max_x && pos.y <= max_y
}

/// Top-left cell of the 2x2 neighbourhood of `pos` and the offsets inside it.
#[inline]
fn cell(pos: Vec2) -> (usize, usize, f32, f32) {
    let cx = pos.x.floor();
    let cy = pos.y.floor();
    (cx as usize, cy as usize, pos.x - cx, pos.y - cy)
}

/// Samples the surface at `pos`, which must be in the interior.
pub fn sample(heights: &[f32], width: usize, pos: Vec2) -> SurfaceSample {
    let (cx, cy, fx, fy) = cell(pos);
    let i = cy * width + cx;
    let h00 = heights[i];
    let h10 = heights[i + 1];
    let h01 = heights[i + width];
    let h11 = heights[i + width + 1];

    let gx = (h10 - h00) * (1.0 - fy) + (h11 - h01) * fy;
    let gy = (h01 - h00) * (1.0 - fx) + (h11 - h10) * fx;
    let top = h00 + (h10 - h00) * fx;
    let bottom = h01 + (h11 - h01) * fx;
    let height = top + (bottom - top) * fy;

    SurfaceSample {
        height,
        gradient: Vec2::new(gx, gy),
    }
}

/// Spreads `amount` over the four corners around `pos` by bilinear weight.
pub fn deposit(heights: &mut [f32], width: usize, pos: Vec2, amount: f32) {
    let (cx, cy, fx, fy) = cell(pos);
    let i = cy * width + cx;
    heights[i] += amount * (1.0 - fx) * (1.0 - fy);
    heights[i + 1] += amount * fx * (1.0 - fy);
    heights[i + width] += amount * (1.0 - fx) * fy;
    heights[i + width + 1] += amount * fx * fy;
}

/// Grid cell containing `pos`.
#[inline]
pub fn cell_of(pos: Vec2) -> (usize, usize) {
    let (cx, cy, _, _) = cell(pos);
    (cx, cy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize) -> Vec<f32> {
        (0..width * height).map(|i| (i % width) as f32).collect()
    }

    #[test]
    fn test_sample_on_ramp() {
        let heights = ramp(4, 4);
        let s = sample(&heights, 4, Vec2::new(1.5, 1.25));
        assert!((s.height - 1.5).abs() < 1e-6);
        assert!((s.gradient.x - 1.0).abs() < 1e-6);
        assert!(s.gradient.y.abs() < 1e-6);
    }

    #[test]
    fn test_deposit_conserves_amount() {
        let mut heights = vec![0.0f32; 16];
        deposit(&mut heights, 4, Vec2::new(1.3, 2.7), 1.0);
        let total: f32 = heights.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(heights[2 * 4 + 1] > 0.0 && heights[3 * 4 + 2] > 0.0);
    }

    #[test]
    fn test_interior_bounds() {
        assert!(in_interior(Vec2::new(0.0, 0.0), 4, 4));
        assert!(in_interior(Vec2::new(2.0, 2.0), 4, 4));
        assert!(!in_interior(Vec2::new(2.01, 1.0), 4, 4));
        assert!(!in_interior(Vec2::new(-0.01, 1.0), 4, 4));
    }

    #[test]
    fn test_sample_at_last_interior_point() {
        // pos = width - 2 has fx = 0, so the +1 column is read with zero weight.
        let heights = ramp(3, 3);
        let s = sample(&heights, 3, Vec2::new(1.0, 1.0));
        assert!((s.height - 1.0).abs() < 1e-6);
    }
}
