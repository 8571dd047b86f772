//! A grey image paired with its segmentation, sharing one cursor and one label table.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};
use thiserror::Error;

use crate::color_label::{ColorLabel, ColorLabelTable, build_default_palette};
use crate::grey_wrapper::GreyImageWrapper;
use crate::label_wrapper::LabelImageWrapper;
use crate::orientation::ImageGeometry;
use crate::volume::{Sample, Volume};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageDataError {
    #[error("Segmentation of size {label:?} does not match grey image of size {grey:?}")]
    GeometryMismatch { grey: [usize; 3], label: [usize; 3] },
}

#[derive(Debug)]
pub struct ImageData<T: Sample> {
    grey: GreyImageWrapper<T>,
    label: LabelImageWrapper,
    label_table: Rc<RefCell<ColorLabelTable>>,
    geometry: ImageGeometry,
    crosshairs: [usize; 3],
}

impl<T: Sample> Default for ImageData<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Sample> ImageData<T> {
    /// Empty image data with the default label palette.
    pub fn new() -> Self {
        Self::with_label_table(Rc::new(RefCell::new(build_default_palette())))
    }

    pub fn with_label_table(table: Rc<RefCell<ColorLabelTable>>) -> Self {
        Self {
            grey: GreyImageWrapper::new(),
            label: LabelImageWrapper::new(Rc::clone(&table)),
            label_table: table,
            geometry: ImageGeometry::default(),
            crosshairs: [0; 3],
        }
    }

    /// Install the grey image with an empty segmentation of the same extent,
    /// and centre the crosshairs.
    pub fn set_grey_image(&mut self, volume: Volume<T>, geometry: &ImageGeometry) {
        let size = volume.size();
        let segmentation = Volume::zeros(size, volume.spacing(), volume.origin());

        self.geometry = *geometry;
        self.grey.set_image(volume);
        self.grey.set_image_geometry(geometry);
        self.label.set_image(segmentation);
        self.label.set_image_geometry(geometry);
        self.set_crosshairs(size.map(|extent| extent / 2));
        info!("Grey image of size {size:?} installed with orientation {}", geometry.image_code());
    }

    pub fn is_grey_loaded(&self) -> bool {
        self.grey.is_initialized()
    }

    /// Replace the segmentation. It must have the grey image's extent; it
    /// takes on the grey image's spacing and origin.
    pub fn set_segmentation_image(&mut self, volume: Volume<u8>) -> Result<(), ImageDataError> {
        let grey_size = self.grey.size();
        if volume.size() != grey_size {
            return Err(ImageDataError::GeometryMismatch {
                grey: grey_size,
                label: volume.size(),
            });
        }

        let (spacing, origin) = match self.grey.image_wrapper().image() {
            Some(grey) => (grey.spacing(), grey.origin()),
            None => (volume.spacing(), volume.origin()),
        };
        let volume = Volume::new(volume.data, spacing, origin);

        let added = self.label_table.borrow_mut().mark_valid_from_volume(&volume);
        debug!("Segmentation introduced {added} new labels");

        self.label.set_image(volume);
        self.label.set_image_geometry(&self.geometry);
        self.label.set_slice_index(self.crosshairs);
        self.label.update_color_mapping_cache();
        Ok(())
    }

    /// Paint one voxel of the segmentation.
    pub fn set_segmentation_voxel(&mut self, index: [usize; 3], label: u8) {
        self.label.set_voxel(index, label);
        if self.label_table.borrow_mut().mark_valid(label) {
            debug!("Label {label} painted for the first time");
        }
    }

    pub fn segmentation_voxel(&self, index: [usize; 3]) -> u8 {
        self.label.voxel(index)
    }

    /// Move the shared cursor of both wrappers, clamped to the volume.
    pub fn set_crosshairs(&mut self, cursor: [usize; 3]) {
        self.grey.set_slice_index(cursor);
        self.label.set_slice_index(cursor);
        self.crosshairs = self.grey.slice_index();
    }

    pub fn crosshairs(&self) -> [usize; 3] {
        self.crosshairs
    }

    pub fn color_label_table(&self) -> Rc<RefCell<ColorLabelTable>> {
        Rc::clone(&self.label_table)
    }

    /// Replace one label description and refresh the label colours. A label
    /// already in use stays valid.
    pub fn update_label(&mut self, label: u8, mut color_label: ColorLabel) {
        {
            let mut table = self.label_table.borrow_mut();
            color_label.set_valid(color_label.is_valid() || table.get(label).is_valid());
            table.set(label, color_label);
        }
        self.label.update_color_mapping_cache();
    }

    pub fn geometry(&self) -> &ImageGeometry {
        &self.geometry
    }

    pub fn grey(&self) -> &GreyImageWrapper<T> {
        &self.grey
    }

    pub fn grey_mut(&mut self) -> &mut GreyImageWrapper<T> {
        &mut self.grey
    }

    pub fn label(&self) -> &LabelImageWrapper {
        &self.label
    }

    pub fn label_mut(&mut self) -> &mut LabelImageWrapper {
        &mut self.label
    }
}
