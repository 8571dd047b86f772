use thiserror::Error;

use crate::color_label::LabelFileError;
use crate::config::ConfigError;
use crate::image_data::ImageDataError;
use crate::orientation::OrientationError;
use crate::volume_loader::VolumeLoaderError;

/// Any recoverable error raised by this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Orientation(#[from] OrientationError),

    #[error(transparent)]
    VolumeLoader(#[from] VolumeLoaderError),

    #[error(transparent)]
    LabelFile(#[from] LabelFileError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ImageData(#[from] ImageDataError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
