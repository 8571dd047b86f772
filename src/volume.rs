use std::fmt::Debug;

use ndarray::Array3;
use num_traits::{Bounded, NumCast, ToPrimitive};

/// Scalar voxel types that can be sliced and pushed through an intensity cache.
///
/// Only narrow integer types qualify: the cache holds one entry per
/// representable value in the evaluated range.
pub trait Sample:
    Copy + Default + PartialOrd + Debug + NumCast + ToPrimitive + Bounded + 'static
{
}

impl Sample for u8 {}
impl Sample for i8 {}
impl Sample for u16 {}
impl Sample for i16 {}

/// A 3D scalar volume indexed `[x, y, z]`, with spacing (mm per voxel) and origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume<T> {
    pub data: Array3<T>,
    pub spacing: [f32; 3],
    pub origin: [f32; 3],
}

impl<T: Sample> Volume<T> {
    pub fn new(data: Array3<T>, spacing: [f32; 3], origin: [f32; 3]) -> Self {
        Self {
            data,
            spacing,
            origin,
        }
    }

    /// A volume of default-valued voxels with the given size.
    pub fn zeros(size: [usize; 3], spacing: [f32; 3], origin: [f32; 3]) -> Self {
        Self::new(Array3::default((size[0], size[1], size[2])), spacing, origin)
    }

    /// Get the dimensions of the volume (x, y, z)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn size(&self) -> [usize; 3] {
        let (x, y, z) = self.data.dim();
        [x, y, z]
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying data
    pub fn data_mut(&mut self) -> &mut Array3<T> {
        &mut self.data
    }

    pub fn spacing(&self) -> [f32; 3] {
        self.spacing
    }

    pub fn origin(&self) -> [f32; 3] {
        self.origin
    }

    pub fn voxel(&self, index: [usize; 3]) -> T {
        self.data[index]
    }

    pub fn set_voxel(&mut self, index: [usize; 3], value: T) {
        self.data[index] = value;
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains(&self, index: [usize; 3]) -> bool {
        let size = self.size();
        index.iter().zip(size).all(|(&i, extent)| i < extent)
    }

    /// Smallest and largest voxel value, found in a single pass.
    /// Returns `None` for an empty volume.
    pub fn min_max(&self) -> Option<(T, T)> {
        let mut values = self.data.iter().copied();
        let first = values.next()?;
        Some(values.fold((first, first), |(min, max), v| {
            (
                if v < min { v } else { min },
                if v > max { v } else { max },
            )
        }))
    }

    /// Physical position of the centre of voxel `index`, ignoring direction cosines.
    pub fn index_to_physical(&self, index: [usize; 3]) -> [f32; 3] {
        [0, 1, 2].map(|axis| self.origin[axis] + index[axis] as f32 * self.spacing[axis])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(size: [usize; 3]) -> Volume<i16> {
        let data = Array3::from_shape_fn((size[0], size[1], size[2]), |(x, y, z)| {
            (x + 10 * y + 100 * z) as i16 - 50
        });
        Volume::new(data, [1.0, 1.0, 2.5], [0.0, -10.0, 4.0])
    }

    #[test]
    fn test_min_max_scans_all_voxels() {
        let volume = ramp([3, 4, 5]);
        assert_eq!(volume.min_max(), Some((-50, 2 + 30 + 400 - 50)));
    }

    #[test]
    fn test_min_max_empty() {
        let volume = Volume::<u8>::zeros([0, 3, 3], [1.0; 3], [0.0; 3]);
        assert!(volume.is_empty());
        assert_eq!(volume.min_max(), None);
    }

    #[test]
    fn test_voxel_access() {
        let mut volume = ramp([2, 2, 2]);
        assert_eq!(volume.voxel([1, 1, 1]), 61);
        volume.set_voxel([1, 1, 1], 7);
        assert_eq!(volume.voxel([1, 1, 1]), 7);
        assert!(volume.contains([1, 1, 1]));
        assert!(!volume.contains([2, 0, 0]));
    }

    #[test]
    fn test_index_to_physical() {
        let volume = ramp([4, 4, 4]);
        assert_eq!(volume.index_to_physical([1, 2, 2]), [1.0, -8.0, 9.0]);
    }
}
