//! Dense row-major height grid.

use serde::{Deserialize, Serialize};

/// A `width`×`height` grid of elevations stored in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightMap {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl HeightMap {
    /// Creates a zero-filled map.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Wraps an existing buffer. Returns `None` if the length does not match.
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Option<Self> {
        (data.len() == width * height).then_some(Self { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        (x < self.width && y < self.height).then(|| self.data[y * self.width + x])
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut f32> {
        if x < self.width && y < self.height {
            Some(&mut self.data[y * self.width + x])
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable view of the cells, e.g. for in-place erosion.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Computes the min and max heights.
    pub fn height_range(&self) -> (f32, f32) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for &h in &self.data {
            min = min.min(h);
            max = max.max(h);
        }
        (min, max)
    }

    /// Sum of all cells, accumulated in f64.
    pub fn sum(&self) -> f64 {
        self.data.iter().map(|&h| h as f64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_indexing() {
        let map = HeightMap::from_vec(3, 2, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(map.get(2, 0), Some(2.0));
        assert_eq!(map.get(0, 1), Some(3.0));
        assert_eq!(map.get(3, 0), None);
        assert_eq!(map.height_range(), (0.0, 5.0));
        assert_eq!(map.sum(), 15.0);
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(HeightMap::from_vec(2, 2, vec![0.0; 3]).is_none());
    }

    #[test]
    fn test_get_mut_writes_cell() {
        let mut map = HeightMap::new(2, 2);
        *map.get_mut(1, 1).unwrap() = 4.0;
        assert_eq!(map.as_slice(), &[0.0, 0.0, 0.0, 4.0]);
    }
}
