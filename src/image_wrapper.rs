//! The part of an image wrapper shared by the grayscale and label variants:
//! one volume, three slicers and a 3-D cursor.

use image::{GrayImage, Luma, Rgba, RgbaImage};
use log::{info, warn};
use ndarray::Array2;

use crate::orientation::ImageGeometry;
use crate::slicer::Slicer;
use crate::transform::CoordinateTransform;
use crate::volume::{Sample, Volume};

/// What a renderer needs from a wrapper: install a volume, orient it, move the
/// cursor, and fetch display-ready slices.
pub trait DisplaySliceSource {
    /// Voxel type of the backing volume.
    type Sample: Sample;
    /// Display-ready raster, e.g. [`GrayImage`] or [`RgbaImage`].
    type Output;

    fn set_image(&mut self, volume: Volume<Self::Sample>);
    fn set_image_to_display_transform(&mut self, axis: usize, transform: CoordinateTransform);
    fn set_slice_index(&mut self, cursor: [usize; 3]);
    fn size(&self) -> [usize; 3];
    fn display_slice(&mut self, axis: usize) -> &Self::Output;
}

#[derive(Debug, Clone)]
pub struct ImageWrapper<T> {
    volume: Option<Volume<T>>,
    // Slicer k cuts along display axis k.
    slicers: [Slicer<T>; 3],
    cursor: [usize; 3],
}

impl<T: Sample> Default for ImageWrapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Sample> ImageWrapper<T> {
    pub fn new() -> Self {
        Self {
            volume: None,
            slicers: [Slicer::new(0), Slicer::new(1), Slicer::new(2)],
            cursor: [0; 3],
        }
    }

    /// Install `volume` and hand its geometry to the three slicers. The cursor
    /// is kept, clamped to the new extent.
    pub fn set_image(&mut self, volume: Volume<T>) {
        let (size, spacing, origin) = (volume.size(), volume.spacing(), volume.origin());
        info!("Installed {}x{}x{} volume, spacing {spacing:?}", size[0], size[1], size[2]);
        for slicer in &mut self.slicers {
            slicer.set_input_information(size, spacing, origin);
        }
        self.volume = Some(volume);
        self.apply_cursor(self.clamp_cursor(self.cursor));
    }

    /// Drop the volume. Display slices cannot be requested until the next
    /// [`set_image`](Self::set_image).
    pub fn reset(&mut self) {
        self.volume = None;
        for slicer in &mut self.slicers {
            slicer.set_input_information([0; 3], [1.0; 3], [0.0; 3]);
        }
        self.cursor = [0; 3];
    }

    pub fn is_initialized(&self) -> bool {
        self.volume.is_some()
    }

    pub fn image(&self) -> Option<&Volume<T>> {
        self.volume.as_ref()
    }

    /// Extent of the volume, zero without one.
    pub fn size(&self) -> [usize; 3] {
        self.volume.as_ref().map_or([0; 3], Volume::size)
    }

    pub fn voxel(&self, index: [usize; 3]) -> T {
        self.installed_volume().voxel(index)
    }

    /// Overwrite one voxel. Every slicer is marked stale.
    pub fn set_voxel(&mut self, index: [usize; 3], value: T) {
        let Some(volume) = self.volume.as_mut() else {
            panic!("voxel written before an image was set");
        };
        volume.set_voxel(index, value);
        for slicer in &mut self.slicers {
            slicer.invalidate();
        }
    }

    pub fn set_image_to_display_transform(&mut self, axis: usize, transform: CoordinateTransform) {
        self.slicers[axis].set_image_to_display_transform(transform);
        if self.volume.is_some() {
            self.apply_cursor(self.cursor);
        }
    }

    pub fn image_to_display_transform(&self, axis: usize) -> CoordinateTransform {
        self.slicers[axis].image_to_display_transform()
    }

    /// Orient all three slicers from `geometry`.
    pub fn set_image_geometry(&mut self, geometry: &ImageGeometry) {
        for axis in 0..3 {
            self.set_image_to_display_transform(axis, geometry.image_to_display(axis));
        }
    }

    /// Move the shared cursor, given in image coordinates. Positions outside
    /// the volume are clamped to the nearest voxel.
    pub fn set_slice_index(&mut self, cursor: [usize; 3]) {
        let clamped = self.clamp_cursor(cursor);
        if clamped != cursor {
            warn!("Cursor {cursor:?} outside volume of size {:?}, clamped to {clamped:?}", self.size());
        }
        self.apply_cursor(clamped);
    }

    /// The shared cursor in image coordinates.
    pub fn slice_index(&self) -> [usize; 3] {
        self.cursor
    }

    /// Depth index of the slice shown along display axis `axis`.
    pub fn display_slice_index(&self, axis: usize) -> usize {
        self.slicers[axis].slice_index()
    }

    pub fn slicer(&self, axis: usize) -> &Slicer<T> {
        &self.slicers[axis]
    }

    /// The raw slice along display axis `axis`, extracted if stale.
    ///
    /// # Panics
    ///
    /// Panics if no image has been set.
    pub fn slice(&mut self, axis: usize) -> &Array2<T> {
        let Some(volume) = self.volume.as_ref() else {
            panic!("display slice requested before an image was set");
        };
        self.slicers[axis].update(volume)
    }

    fn installed_volume(&self) -> &Volume<T> {
        match self.volume.as_ref() {
            Some(volume) => volume,
            None => panic!("image accessed before an image was set"),
        }
    }

    fn clamp_cursor(&self, cursor: [usize; 3]) -> [usize; 3] {
        let size = self.size();
        [0, 1, 2].map(|i| cursor[i].min(size[i].saturating_sub(1)))
    }

    fn apply_cursor(&mut self, cursor: [usize; 3]) {
        self.cursor = cursor;
        let empty = self.volume.as_ref().is_none_or(Volume::is_empty);
        if empty {
            return;
        }
        for slicer in &mut self.slicers {
            let depth = slicer.depth_index_of(cursor);
            slicer.set_slice_index(depth);
        }
    }
}

/// Lay a `[row, column]` array out as an image with rows along `x`.
pub(crate) fn gray_image_from(slice: &Array2<u8>) -> GrayImage {
    let (rows, cols) = slice.dim();
    GrayImage::from_fn(rows as u32, cols as u32, |x, y| {
        Luma([slice[[x as usize, y as usize]]])
    })
}

pub(crate) fn rgba_image_from(slice: &Array2<[u8; 4]>) -> RgbaImage {
    let (rows, cols) = slice.dim();
    RgbaImage::from_fn(rows as u32, cols as u32, |x, y| {
        Rgba(slice[[x as usize, y as usize]])
    })
}
