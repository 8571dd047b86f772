//! Label image wrapper: segmentation labels to RGBA through the shared label table.

use std::cell::RefCell;
use std::rc::Rc;

use image::RgbaImage;

use crate::color_label::{ColorLabelTable, MAX_COLOR_LABELS, build_default_palette};
use crate::image_wrapper::{DisplaySliceSource, ImageWrapper, rgba_image_from};
use crate::intensity_cache::{IntensityCache, UnaryFunctor};
use crate::orientation::ImageGeometry;
use crate::transform::CoordinateTransform;
use crate::volume::Volume;

/// Looks a label up in the shared table and returns its display colour.
#[derive(Debug, Clone)]
pub struct LabelColorFunctor {
    table: Rc<RefCell<ColorLabelTable>>,
}

impl UnaryFunctor<u8, [u8; 4]> for LabelColorFunctor {
    fn evaluate(&self, label: u8) -> [u8; 4] {
        self.table.borrow().get(label).display_rgba()
    }
}

/// The label table is shared with whoever edits it. After any edit,
/// [`update_color_mapping_cache`](Self::update_color_mapping_cache) must be
/// called before the next display slice is fetched.
#[derive(Debug)]
pub struct LabelImageWrapper {
    core: ImageWrapper<u8>,
    cache: IntensityCache<u8, [u8; 4], LabelColorFunctor>,
    display: [Option<RgbaImage>; 3],
}

impl Default for LabelImageWrapper {
    fn default() -> Self {
        Self::new(Rc::new(RefCell::new(build_default_palette())))
    }
}

impl LabelImageWrapper {
    pub fn new(table: Rc<RefCell<ColorLabelTable>>) -> Self {
        let mut cache = IntensityCache::new(LabelColorFunctor { table });
        cache.set_evaluation_range(0, MAX_COLOR_LABELS);
        cache.compute_cache();
        Self {
            core: ImageWrapper::new(),
            cache,
            display: [None, None, None],
        }
    }

    pub fn set_image(&mut self, volume: Volume<u8>) {
        self.core.set_image(volume);
        self.display = [None, None, None];
    }

    /// Switch to another label table and rebuild the colour cache from it.
    pub fn set_label_color_table(&mut self, table: Rc<RefCell<ColorLabelTable>>) {
        self.cache.set_functor(LabelColorFunctor { table });
        self.update_color_mapping_cache();
    }

    pub fn label_color_table(&self) -> Rc<RefCell<ColorLabelTable>> {
        Rc::clone(&self.cache.functor().table)
    }

    /// Re-read all 256 entries of the label table.
    pub fn update_color_mapping_cache(&mut self) {
        self.cache.compute_cache();
        self.display = [None, None, None];
    }

    pub fn intensity_cache(&self) -> &IntensityCache<u8, [u8; 4], LabelColorFunctor> {
        &self.cache
    }

    pub fn image_wrapper(&self) -> &ImageWrapper<u8> {
        &self.core
    }

    pub fn is_initialized(&self) -> bool {
        self.core.is_initialized()
    }

    pub fn voxel(&self, index: [usize; 3]) -> u8 {
        self.core.voxel(index)
    }

    pub fn set_voxel(&mut self, index: [usize; 3], label: u8) {
        self.core.set_voxel(index, label);
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

    /// The RGBA display slice along `axis`.
    ///
    /// # Panics
    ///
    /// Panics if no image has been set.
    pub fn display_slice(&mut self, axis: usize) -> &RgbaImage {
        let image = match self.display[axis].take() {
            Some(image) if self.core.slicer(axis).is_up_to_date() => image,
            _ => {
                let slice = self.core.slice(axis);
                rgba_image_from(&self.cache.caching_functor().map_slice(slice))
            }
        };
        self.display[axis].insert(image)
    }
}

impl DisplaySliceSource for LabelImageWrapper {
    type Sample = u8;
    type Output = RgbaImage;

    fn set_image(&mut self, volume: Volume<u8>) {
        LabelImageWrapper::set_image(self, volume);
    }

    fn set_image_to_display_transform(&mut self, axis: usize, transform: CoordinateTransform) {
        LabelImageWrapper::set_image_to_display_transform(self, axis, transform);
    }

    fn set_slice_index(&mut self, cursor: [usize; 3]) {
        LabelImageWrapper::set_slice_index(self, cursor);
    }

    fn size(&self) -> [usize; 3] {
        LabelImageWrapper::size(self)
    }

    fn display_slice(&mut self, axis: usize) -> &RgbaImage {
        LabelImageWrapper::display_slice(self, axis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_label::ColorLabel;
    use image::Rgba;
    use ndarray::Array3;

    fn labels() -> Volume<u8> {
        let data = Array3::from_shape_fn((4, 3, 2), |(x, y, _)| ((x + y) % 3) as u8);
        Volume::new(data, [1.0; 3], [0.0; 3])
    }

    #[test]
    fn test_cache_covers_every_label() {
        let wrapper = LabelImageWrapper::default();
        assert_eq!(wrapper.intensity_cache().evaluation_range(), (0, 256));
        assert_eq!(wrapper.intensity_cache().evaluate(0), [0, 0, 0, 0]);
        assert_eq!(wrapper.intensity_cache().evaluate(2), [0, 255, 0, 255]);
        assert!(wrapper.intensity_cache().is_computed());
    }

    #[test]
    fn test_display_slice_colours() {
        let mut wrapper = LabelImageWrapper::default();
        wrapper.set_image(labels());
        let slice = wrapper.display_slice(2);
        assert_eq!(slice.dimensions(), (4, 3));
        assert_eq!(slice.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
        assert_eq!(slice.get_pixel(1, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(slice.get_pixel(1, 1), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_table_edit_needs_cache_update() {
        let table = Rc::new(RefCell::new(build_default_palette()));
        let mut wrapper = LabelImageWrapper::new(Rc::clone(&table));
        wrapper.set_image(labels());
        let before = wrapper.display_slice(2).clone();

        table.borrow_mut().get_mut(1).set_visible(false);
        assert_eq!(wrapper.display_slice(2), &before);

        wrapper.update_color_mapping_cache();
        assert_eq!(wrapper.display_slice(2).get_pixel(1, 0), &Rgba([255, 0, 0, 0]));
    }

    #[test]
    fn test_set_label_color_table_recomputes() {
        let mut wrapper = LabelImageWrapper::default();
        let mut table = build_default_palette();
        table.set(1, ColorLabel::new("Bone", [9, 9, 9], 100));
        wrapper.set_label_color_table(Rc::new(RefCell::new(table)));
        assert_eq!(wrapper.intensity_cache().evaluate(1), [9, 9, 9, 100]);
        assert_eq!(wrapper.label_color_table().borrow().get(1).name(), "Bone");
    }

    #[test]
    fn test_painting_refreshes_display() {
        let mut wrapper = LabelImageWrapper::default();
        wrapper.set_image(labels());
        assert_eq!(wrapper.display_slice(2).get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
        wrapper.set_voxel([0, 0, 0], 3);
        assert_eq!(wrapper.display_slice(2).get_pixel(0, 0), &Rgba([0, 0, 255, 255]));
    }
}
