//! Slice extraction along one axis of display space.
//!
//! The slicer owns no voxels. It is configured with the input geometry, an
//! image-to-display transform, a slice axis and a slice index, and extracts
//! the matching plane from a [`Volume`] on request. The traversal plan (which
//! image axis runs along each display axis, and in which direction) is derived
//! once per transform change, so extraction is a plain strided copy.

use log::debug;
use ndarray::{Array2, ArrayView2, Axis};
use web_time::Instant;

use crate::transform::CoordinateTransform;
use crate::volume::{Sample, Volume};

/// Extent, spacing and origin of an extracted slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceGeometry {
    /// `[rows, columns]`
    pub size: [usize; 2],
    pub spacing: [f32; 2],
    /// Physical coordinate of pixel `[0, 0]` along the two in-plane image axes.
    pub origin: [f32; 2],
}

#[derive(Debug, Clone)]
pub struct Slicer<T> {
    image_to_display: CoordinateTransform,
    display_to_image: CoordinateTransform,
    slice_index: usize,
    slice_axis: usize,
    // Display axes of the slice: depth, rows, columns.
    display_axes: [usize; 3],
    // Image axes read along the display axes above.
    image_axes: [usize; 3],
    // +1 or -1 per entry of `image_axes`.
    axes_direction: [i32; 3],
    input_size: [usize; 3],
    input_spacing: [f32; 3],
    input_origin: [f32; 3],
    output: Option<Array2<T>>,
}

impl<T: Sample> Default for Slicer<T> {
    fn default() -> Self {
        Self::new(2)
    }
}

impl<T: Sample> Slicer<T> {
    /// A slicer along display axis `slice_axis`, with the identity transform.
    pub fn new(slice_axis: usize) -> Self {
        assert!(slice_axis < 3, "slice axis {slice_axis} out of range");
        let mut slicer = Self {
            image_to_display: CoordinateTransform::identity(),
            display_to_image: CoordinateTransform::identity(),
            slice_index: 0,
            slice_axis,
            display_axes: [0, 1, 2],
            image_axes: [0, 1, 2],
            axes_direction: [1; 3],
            input_size: [0; 3],
            input_spacing: [1.0; 3],
            input_origin: [0.0; 3],
            output: None,
        };
        slicer.compute_axes();
        slicer
    }

    pub fn set_image_to_display_transform(&mut self, transform: CoordinateTransform) {
        self.image_to_display = transform;
        self.display_to_image = transform.inverse();
        self.compute_axes();
        self.output = None;
    }

    pub fn image_to_display_transform(&self) -> CoordinateTransform {
        self.image_to_display
    }

    pub fn display_to_image_transform(&self) -> CoordinateTransform {
        self.display_to_image
    }

    /// Set the depth index along the slice axis, in display coordinates.
    /// Callers keep it inside `[0, depth_extent())`.
    pub fn set_slice_index(&mut self, index: usize) {
        if index != self.slice_index {
            self.slice_index = index;
            self.output = None;
        }
    }

    pub fn slice_index(&self) -> usize {
        self.slice_index
    }

    pub fn set_slice_axis(&mut self, axis: usize) {
        assert!(axis < 3, "slice axis {axis} out of range");
        self.slice_axis = axis;
        self.compute_axes();
        self.output = None;
    }

    pub fn slice_axis(&self) -> usize {
        self.slice_axis
    }

    /// Record the geometry of the volume that will be sliced.
    pub fn set_input_information(&mut self, size: [usize; 3], spacing: [f32; 3], origin: [f32; 3]) {
        self.input_size = size;
        self.input_spacing = spacing;
        self.input_origin = origin;
        self.output = None;
    }

    pub fn input_size(&self) -> [usize; 3] {
        self.input_size
    }

    /// Display axes of the slice: depth, rows, columns.
    pub fn display_axes(&self) -> [usize; 3] {
        self.display_axes
    }

    /// Image axes traversed along depth, rows and columns.
    pub fn image_axes(&self) -> [usize; 3] {
        self.image_axes
    }

    pub fn axes_direction(&self) -> [i32; 3] {
        self.axes_direction
    }

    /// Number of slices along the slice axis.
    pub fn depth_extent(&self) -> usize {
        self.input_size[self.image_axes[0]]
    }

    /// Display depth index of the slice through image voxel `cursor`. An empty
    /// extent yields 0.
    pub fn depth_index_of(&self, cursor: [usize; 3]) -> usize {
        let axis = self.image_axes[0];
        if self.axes_direction[0] > 0 {
            cursor[axis]
        } else {
            self.input_size[axis].saturating_sub(cursor[axis] + 1)
        }
    }

    /// Image index along the depth axis for the current slice index.
    pub fn image_depth_index(&self) -> usize {
        if self.axes_direction[0] > 0 {
            self.slice_index
        } else {
            self.depth_extent().saturating_sub(self.slice_index + 1)
        }
    }

    pub fn output_information(&self) -> SliceGeometry {
        let [_, row_axis, col_axis] = self.image_axes;
        let plane_origin = |slot: usize, axis: usize| {
            let origin = self.input_origin[axis];
            if self.axes_direction[slot] > 0 {
                origin
            } else {
                let last = self.input_size[axis].saturating_sub(1) as f32;
                origin + last * self.input_spacing[axis]
            }
        };
        SliceGeometry {
            size: [self.input_size[row_axis], self.input_size[col_axis]],
            spacing: [self.input_spacing[row_axis], self.input_spacing[col_axis]],
            origin: [plane_origin(1, row_axis), plane_origin(2, col_axis)],
        }
    }

    /// Whether the last extracted slice is still current.
    pub fn is_up_to_date(&self) -> bool {
        self.output.is_some()
    }

    /// Drop the last extracted slice, e.g. after the voxels changed.
    pub fn invalidate(&mut self) {
        self.output = None;
    }

    pub fn output(&self) -> Option<&Array2<T>> {
        self.output.as_ref()
    }

    /// Extract the current slice from `volume` if it is stale and return it.
    ///
    /// # Panics
    ///
    /// Panics if `volume` does not match the input information or the slice
    /// index is outside the depth extent.
    pub fn update(&mut self, volume: &Volume<T>) -> &Array2<T> {
        let slice = match self.output.take() {
            Some(slice) => slice,
            None => self.extract(volume),
        };
        self.output.insert(slice)
    }

    /// Extract the current slice from `volume` unconditionally.
    pub fn extract(&self, volume: &Volume<T>) -> Array2<T> {
        assert_eq!(
            volume.size(),
            self.input_size,
            "volume does not match the slicer input information"
        );
        assert!(
            self.slice_index < self.depth_extent(),
            "slice index {} outside [0, {})",
            self.slice_index,
            self.depth_extent()
        );

        let start = Instant::now();
        let plane = self.oriented_plane(volume);
        // One pass in row-major display order, following the (possibly negative) strides.
        let slice = plane.as_standard_layout().into_owned();
        debug!(
            "Extracted {}x{} slice {} along display axis {} in {:?}",
            slice.nrows(),
            slice.ncols(),
            self.slice_index,
            self.slice_axis,
            start.elapsed()
        );
        slice
    }

    fn oriented_plane<'a>(&self, volume: &'a Volume<T>) -> ArrayView2<'a, T> {
        let [depth_axis, row_axis, _] = self.image_axes;
        let mut plane = volume
            .data()
            .index_axis(Axis(depth_axis), self.image_depth_index());

        // After removing the depth axis, the lower remaining image axis comes first.
        let lower_remaining = if depth_axis == 0 { 1 } else { 0 };
        if row_axis != lower_remaining {
            plane = plane.reversed_axes();
        }
        for slot in 0..2 {
            if self.axes_direction[slot + 1] < 0 {
                plane.invert_axis(Axis(slot));
            }
        }
        plane
    }

    fn compute_axes(&mut self) {
        let k = self.slice_axis;
        self.display_axes = [k, (k + 1) % 3, (k + 2) % 3];
        for slot in 0..3 {
            let display_axis = self.display_axes[slot];
            self.image_axes[slot] = self.image_to_display.coordinate_index_zero_based(display_axis);
            self.axes_direction[slot] = self.image_to_display.coordinate_orientation(display_axis);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn numbered(size: [usize; 3]) -> Volume<i16> {
        let data = Array3::from_shape_fn((size[0], size[1], size[2]), |(x, y, z)| {
            (x + 10 * y + 100 * z) as i16
        });
        Volume::new(data, [0.5, 1.0, 2.0], [10.0, 20.0, 30.0])
    }

    fn slicer_for(volume: &Volume<i16>, axis: usize, transform: CoordinateTransform) -> Slicer<i16> {
        let mut slicer = Slicer::new(axis);
        slicer.set_input_information(volume.size(), volume.spacing(), volume.origin());
        slicer.set_image_to_display_transform(transform);
        slicer
    }

    #[test]
    fn test_axes_for_identity() {
        let volume = numbered([2, 3, 4]);
        let slicer = slicer_for(&volume, 0, CoordinateTransform::identity());
        assert_eq!(slicer.display_axes(), [0, 1, 2]);
        assert_eq!(slicer.image_axes(), [0, 1, 2]);
        assert_eq!(slicer.depth_extent(), 2);

        let slicer = slicer_for(&volume, 1, CoordinateTransform::identity());
        assert_eq!(slicer.image_axes(), [1, 2, 0]);
        assert_eq!(slicer.output_information().size, [4, 2]);
    }

    #[test]
    fn test_flipped_depth_on_empty_extent_is_zero() {
        let mut slicer = Slicer::<i16>::new(2);
        slicer.set_image_to_display_transform(CoordinateTransform::new(1, 2, -3));
        assert_eq!(slicer.depth_extent(), 0);
        assert_eq!(slicer.depth_index_of([0, 0, 0]), 0);
        assert_eq!(slicer.image_depth_index(), 0);
    }

    #[test]
    fn test_flipped_depth_index_counts_from_far_end() {
        let volume = numbered([3, 4, 5]);
        let slicer = slicer_for(&volume, 2, CoordinateTransform::new(1, 2, -3));
        assert_eq!(slicer.depth_index_of([0, 0, 0]), 4);
        assert_eq!(slicer.depth_index_of([2, 3, 4]), 0);
    }

    #[test]
    fn test_identity_axial_slice_matches_direct_indexing() {
        let volume = numbered([3, 4, 5]);
        let mut slicer = slicer_for(&volume, 2, CoordinateTransform::identity());
        slicer.set_slice_index(3);
        let slice = slicer.update(&volume);
        assert_eq!(slice.dim(), (3, 4));
        for x in 0..3 {
            for y in 0..4 {
                assert_eq!(slice[[x, y]], volume.voxel([x, y, 3]));
            }
        }
    }

    #[test]
    fn test_permuted_transform_transposes_plane() {
        // Display x reads image y, display y reads image x.
        let volume = numbered([3, 4, 5]);
        let mut slicer = slicer_for(&volume, 2, CoordinateTransform::new(2, 1, 3));
        slicer.set_slice_index(1);
        let slice = slicer.update(&volume);
        assert_eq!(slice.dim(), (4, 3));
        assert_eq!(slice[[3, 2]], volume.voxel([2, 3, 1]));
    }

    #[test]
    fn test_negated_axes_walk_backwards() {
        let volume = numbered([3, 4, 5]);
        let mut slicer = slicer_for(&volume, 0, CoordinateTransform::new(-1, 2, -3));
        slicer.set_slice_index(0);
        let slice = slicer.update(&volume);
        assert_eq!(slice.dim(), (4, 5));
        for y in 0..4 {
            for z in 0..5 {
                assert_eq!(slice[[y, z]], volume.voxel([2, y, 4 - z]));
            }
        }
    }

    #[test]
    fn test_depth_index_of_cursor() {
        let volume = numbered([3, 4, 5]);
        let slicer = slicer_for(&volume, 2, CoordinateTransform::new(1, 2, -3));
        assert_eq!(slicer.depth_index_of([0, 0, 1]), 3);
        let slicer = slicer_for(&volume, 2, CoordinateTransform::identity());
        assert_eq!(slicer.depth_index_of([0, 0, 1]), 1);
    }

    #[test]
    fn test_output_information_follows_flips() {
        let volume = numbered([3, 4, 5]);
        let slicer = slicer_for(&volume, 2, CoordinateTransform::new(-2, 1, 3));
        let info = slicer.output_information();
        assert_eq!(info.size, [4, 3]);
        assert_eq!(info.spacing, [1.0, 0.5]);
        assert_eq!(info.origin, [23.0, 10.0]);
    }

    #[test]
    fn test_setters_mark_output_stale() {
        let volume = numbered([2, 2, 2]);
        let mut slicer = slicer_for(&volume, 2, CoordinateTransform::identity());
        slicer.update(&volume);
        assert!(slicer.is_up_to_date());
        slicer.set_slice_index(1);
        assert!(!slicer.is_up_to_date());
        slicer.update(&volume);
        slicer.set_slice_index(1);
        assert!(slicer.is_up_to_date());
        slicer.set_image_to_display_transform(CoordinateTransform::new(-1, 2, 3));
        assert!(!slicer.is_up_to_date());
    }

    #[test]
    #[should_panic(expected = "slice index")]
    fn test_out_of_range_index_panics() {
        let volume = numbered([2, 2, 2]);
        let mut slicer = slicer_for(&volume, 2, CoordinateTransform::identity());
        slicer.set_slice_index(2);
        slicer.update(&volume);
    }
}
