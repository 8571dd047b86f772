//! Grayscale image wrapper: raw intensities to display bytes through a cached
//! intensity curve.

use std::fmt;

use image::GrayImage;
use num_traits::ToPrimitive;

use crate::image_wrapper::{DisplaySliceSource, ImageWrapper, gray_image_from};
use crate::intensity_cache::{IntensityCache, UnaryFunctor};
use crate::intensity_curve::IntensityMap;
use crate::orientation::ImageGeometry;
use crate::transform::CoordinateTransform;
use crate::volume::{Sample, Volume};

/// Maps a raw intensity to a display byte: normalize against the image range,
/// apply the intensity map, scale to `0..=255`.
pub struct GreyIntensityFunctor {
    map: Box<dyn IntensityMap>,
    min: f32,
    span: f32,
}

impl fmt::Debug for GreyIntensityFunctor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreyIntensityFunctor")
            .field("min", &self.min)
            .field("span", &self.span)
            .finish_non_exhaustive()
    }
}

impl Default for GreyIntensityFunctor {
    fn default() -> Self {
        Self {
            map: Box::new(|t: f32| t),
            min: 0.0,
            span: 0.0,
        }
    }
}

impl GreyIntensityFunctor {
    /// Set the input range normalized onto `[0, 1]`. A flat range maps everything to 0.
    pub fn set_range(&mut self, min: f32, max: f32) {
        self.min = min;
        self.span = max - min;
    }

    pub fn set_map(&mut self, map: Box<dyn IntensityMap>) {
        self.map = map;
    }

    pub fn map(&self) -> &dyn IntensityMap {
        self.map.as_ref()
    }
}

impl<T: Sample> UnaryFunctor<T, u8> for GreyIntensityFunctor {
    fn evaluate(&self, value: T) -> u8 {
        let offset = value.to_f32().unwrap_or(self.min) - self.min;
        let normalized = if self.span > 0.0 { offset / self.span } else { 0.0 };
        let out = IntensityMap::evaluate(self.map.as_ref(), normalized).clamp(0.0, 1.0);
        (255.0 * out) as u8
    }
}

#[derive(Debug)]
pub struct GreyImageWrapper<T: Sample> {
    core: ImageWrapper<T>,
    cache: IntensityCache<T, u8, GreyIntensityFunctor>,
    image_min: T,
    image_max: T,
    display: [Option<GrayImage>; 3],
}

impl<T: Sample> Default for GreyImageWrapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Sample> GreyImageWrapper<T> {
    pub fn new() -> Self {
        Self {
            core: ImageWrapper::new(),
            cache: IntensityCache::new(GreyIntensityFunctor::default()),
            image_min: T::default(),
            image_max: T::default(),
            display: [None, None, None],
        }
    }

    /// Install `volume`, scan it for its intensity range and rebuild the cache
    /// over that range.
    pub fn set_image(&mut self, volume: Volume<T>) {
        let (min, max) = volume.min_max().unwrap_or_default();
        self.image_min = min;
        self.image_max = max;
        self.core.set_image(volume);

        let (low, high) = (as_f32(min), as_f32(max));
        self.cache.functor_mut().set_range(low, high);
        let length = (high - low) as usize + 1;
        self.cache.set_evaluation_range(min, length);
        self.refresh_cache();
    }

    /// Install the curve shaping normalized intensities, then rebuild the cache.
    /// The map is cached as given, monotone or not.
    pub fn set_intensity_map_function(&mut self, map: impl IntensityMap + 'static) {
        self.cache.functor_mut().set_map(Box::new(map));
        if self.core.is_initialized() {
            self.refresh_cache();
        }
    }

    pub fn intensity_map_function(&self) -> &dyn IntensityMap {
        self.cache.functor().map()
    }

    pub fn image_min(&self) -> T {
        self.image_min
    }

    pub fn image_max(&self) -> T {
        self.image_max
    }

    pub fn intensity_cache(&self) -> &IntensityCache<T, u8, GreyIntensityFunctor> {
        &self.cache
    }

    pub fn image_wrapper(&self) -> &ImageWrapper<T> {
        &self.core
    }

    pub fn is_initialized(&self) -> bool {
        self.core.is_initialized()
    }

    pub fn set_image_to_display_transform(&mut self, axis: usize, transform: CoordinateTransform) {
        self.core.set_image_to_display_transform(axis, transform);
    }

    pub fn set_image_geometry(&mut self, geometry: &ImageGeometry) {
        self.core.set_image_geometry(geometry);
    }

    pub fn set_slice_index(&mut self, cursor: [usize; 3]) {
        self.core.set_slice_index(cursor);
    }

    pub fn slice_index(&self) -> [usize; 3] {
        self.core.slice_index()
    }

    pub fn size(&self) -> [usize; 3] {
        self.core.size()
    }

    /// The display slice along `axis`, recomputed when the slice or the cache changed.
    ///
    /// # Panics
    ///
    /// Panics if no image has been set.
    pub fn display_slice(&mut self, axis: usize) -> &GrayImage {
        let image = match self.display[axis].take() {
            Some(image) if self.core.slicer(axis).is_up_to_date() => image,
            _ => {
                let slice = self.core.slice(axis);
                gray_image_from(&self.cache.caching_functor().map_slice(slice))
            }
        };
        self.display[axis].insert(image)
    }

    fn refresh_cache(&mut self) {
        self.cache.compute_cache();
        self.display = [None, None, None];
    }
}

impl<T: Sample> DisplaySliceSource for GreyImageWrapper<T> {
    type Sample = T;
    type Output = GrayImage;

    fn set_image(&mut self, volume: Volume<T>) {
        GreyImageWrapper::set_image(self, volume);
    }

    fn set_image_to_display_transform(&mut self, axis: usize, transform: CoordinateTransform) {
        GreyImageWrapper::set_image_to_display_transform(self, axis, transform);
    }

    fn set_slice_index(&mut self, cursor: [usize; 3]) {
        GreyImageWrapper::set_slice_index(self, cursor);
    }

    fn size(&self) -> [usize; 3] {
        GreyImageWrapper::size(self)
    }

    fn display_slice(&mut self, axis: usize) -> &GrayImage {
        GreyImageWrapper::display_slice(self, axis)
    }
}

fn as_f32<T: Sample>(value: T) -> f32 {
    value.to_f32().unwrap_or_default()
}
