//! Erosion disc weights.

/// Cell offsets inside the erosion radius with their `1 - d/r` weights.
///
/// Offsets are clipped against the grid when applied; weights of the cells
/// that survive clipping are renormalised so the full amount is distributed.
#[derive(Debug, Clone)]
pub struct ErosionBrush {
    offsets: Vec<(isize, isize, f32)>,
    /// Reused per application: (cell index, weight) of the cells inside the grid.
    scratch: Vec<(usize, f32)>,
}

impl ErosionBrush {
    /// Builds the disc for `radius`, capped to the larger grid dimension.
    pub fn new(radius: f32, width: usize, height: usize) -> Self {
        let radius = radius.min(width.max(height) as f32).max(f32::EPSILON);
        let reach = radius.ceil() as isize;

        let mut offsets = Vec::new();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let d = ((dx * dx + dy * dy) as f32).sqrt();
                let weight = 1.0 - d / radius;
                if weight > 0.0 {
                    offsets.push((dx, dy, weight));
                }
            }
        }

        let scratch = Vec::with_capacity(offsets.len());
        Self { offsets, scratch }
    }

    /// Removes up to `amount` of material around `cell` on a `size` grid.
    ///
    /// Each cell gives at most its weighted share and never drops below zero;
    /// `blur` keeps that fraction of the share in place. Returns the total removed.
    pub fn erode(
        &mut self,
        heights: &mut [f32],
        size: (usize, usize),
        cell: (usize, usize),
        amount: f32,
        blur: f32,
    ) -> f32 {
        let (width, height) = size;
        let (cx, cy) = cell;
        self.scratch.clear();
        let mut total_weight = 0.0f32;
        for &(dx, dy, weight) in &self.offsets {
            let x = cx as isize + dx;
            let y = cy as isize + dy;
            if x < 0 || y < 0 || x >= width as isize || y >= height as isize {
                continue;
            }
            self.scratch.push((y as usize * width + x as usize, weight));
            total_weight += weight;
        }
        if total_weight <= 0.0 {
            return 0.0;
        }

        let mut removed = 0.0f32;
        for &(index, weight) in &self.scratch {
            let old = heights[index];
            let share = amount * weight / total_weight;
            let take = share.min(old.max(0.0));
            let new = old * blur + (old - take) * (1.0 - blur);
            heights[index] = new;
            removed += old - new;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_fall_off_with_distance() {
        let brush = ErosionBrush::new(2.0, 16, 16);
        let centre = brush.offsets.iter().find(|o| o.0 == 0 && o.1 == 0).unwrap();
        assert_eq!(centre.2, 1.0);
        let edge = brush.offsets.iter().find(|o| o.0 == 1 && o.1 == 0).unwrap();
        assert!((edge.2 - 0.5).abs() < 1e-6);
        assert!(brush.offsets.iter().all(|o| o.0.abs() <= 2 && o.1.abs() <= 2));
    }

    #[test]
    fn test_radius_is_capped_to_grid() {
        let brush = ErosionBrush::new(100.0, 4, 3);
        assert!(brush.offsets.iter().all(|o| o.0.abs() <= 3 && o.1.abs() <= 3));
        assert!(brush.offsets.iter().any(|o| o.0 == 3));
    }

    #[test]
    fn test_erode_distributes_full_amount_when_clipped() {
        let mut brush = ErosionBrush::new(3.0, 8, 8);
        let mut heights = vec![1.0f32; 64];
        let removed = brush.erode(&mut heights, (8, 8), (0, 0), 0.5, 0.0);
        assert!((removed - 0.5).abs() < 1e-5);
        let total: f32 = heights.iter().sum();
        assert!((total - 63.5).abs() < 1e-4);
    }

    #[test]
    fn test_erode_never_goes_below_zero() {
        let mut brush = ErosionBrush::new(1.0, 3, 3);
        let mut heights = vec![0.0f32; 9];
        heights[4] = 0.1;
        let removed = brush.erode(&mut heights, (3, 3), (1, 1), 5.0, 0.0);
        assert!((removed - 0.1).abs() < 1e-6);
        assert!(heights.iter().all(|&h| h >= 0.0));
    }

    #[test]
    fn test_blur_keeps_fraction() {
        let mut brush = ErosionBrush::new(1.0, 3, 3);
        let mut heights = vec![1.0f32; 9];
        let removed = brush.erode(&mut heights, (3, 3), (1, 1), 0.4, 0.5);
        assert!((removed - 0.2).abs() < 1e-6);
        assert!((heights[4] - 0.8).abs() < 1e-6);
    }
}
