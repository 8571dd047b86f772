//! # Volume slicer
//!
//! Orthogonal slice extraction and display caching for 3D medical volumes
//! and their segmentations.
//!
//! A volume is installed in an image wrapper, which owns three slicers (one
//! per display axis) and an intensity cache. Each slicer cuts the volume along
//! its display axis using a [`CoordinateTransform`], a signed permutation from
//! image space to display space. The cut plane is then mapped through the
//! cache into a display-ready image:
//!  - [`GreyImageWrapper`] produces 8-bit grayscale through an intensity curve
//!  - [`LabelImageWrapper`] produces RGBA through a shared [`ColorLabelTable`]
//!
//! Orientation is given as three-letter anatomical codes such as `RAI`,
//! resolved into an [`ImageGeometry`]. [`ImageData`] binds a grey image and
//! its segmentation to one cursor. Everything runs on the calling thread.
//!
//! DICOM series can be loaded with [`VolumeLoader`].
//!
//! # Examples
//!
//! ## Rendering the three views of a DICOM series
//!
//! ```no_run
//! # use volume_slicer::{ImageData, ImageGeometry, Orientation, SortBy, VolumeLoader};
//! let volume = VolumeLoader::load_from_directory("dicom", SortBy::InstanceNumber)
//!     .expect("should have loaded files from directory");
//! let geometry = ImageGeometry::from_codes("RAI", ["RAI", "IAR", "RAI"])
//!     .expect("should be valid orientation codes");
//!
//! let mut data = ImageData::new();
//! data.set_grey_image(volume, &geometry);
//! for orientation in Orientation::ALL {
//!     let image = data.grey_mut().display_slice(orientation.axis());
//!     image.save(format!("{}.png", orientation.name())).expect("should have saved");
//! }
//! ```
//!
//! ## Slicing a volume directly
//!
//! ```
//! # use volume_slicer::{CoordinateTransform, Slicer, Volume};
//! # use ndarray::Array3;
//! let data = Array3::from_shape_fn((4, 4, 4), |(x, y, z)| (x + 4 * y + 16 * z) as u16);
//! let volume = Volume::new(data, [1.0; 3], [0.0; 3]);
//!
//! let mut slicer = Slicer::new(2);
//! slicer.set_input_information(volume.size(), volume.spacing(), volume.origin());
//! slicer.set_image_to_display_transform(CoordinateTransform::new(1, 2, 3));
//! slicer.set_slice_index(2);
//! assert_eq!(slicer.update(&volume)[[3, 1]], volume.voxel([3, 1, 2]));
//! ```

pub mod color_label;
pub mod config;
pub mod enums;
pub mod error;
pub mod grey_wrapper;
pub mod image_data;
pub mod image_wrapper;
pub mod intensity_cache;
pub mod intensity_curve;
pub mod label_wrapper;
pub mod orientation;
pub mod slicer;
pub mod transform;
pub mod volume;
pub mod volume_loader;

pub use color_label::{ColorLabel, ColorLabelTable, build_default_palette};
pub use config::ViewerConfig;
pub use enums::{Orientation, SortBy};
pub use error::{Error, Result};
pub use grey_wrapper::GreyImageWrapper;
pub use image_data::ImageData;
pub use image_wrapper::{DisplaySliceSource, ImageWrapper};
pub use intensity_cache::{CachingFunctor, IntensityCache, UnaryFunctor};
pub use intensity_curve::{IntensityCurve, IntensityMap};
pub use label_wrapper::LabelImageWrapper;
pub use orientation::{ImageGeometry, OrientationCode};
pub use slicer::Slicer;
pub use transform::CoordinateTransform;
pub use volume::{Sample, Volume};
pub use volume_loader::VolumeLoader;
