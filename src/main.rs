use std::path::{Path, PathBuf};
use std::process::ExitCode;

use volume_slicer::{
    ImageData, IntensityCurve, Orientation, ViewerConfig, VolumeLoader, error::Result,
};

/// Usage: `volume-slicer [DICOM_DIR] [CONFIG_JSON]`
///
/// Writes `axial.png`, `coronal.png` and `sagittal.png` through the centre of the series.
fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let directory = PathBuf::from(args.next().unwrap_or_else(|| "dicom".to_string()));
    let config_path = args.next().map(PathBuf::from);

    let config = match config_path.as_ref().map(|path| ViewerConfig::load(path)).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    match run(&directory, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(directory: &Path, config: &ViewerConfig) -> Result<()> {
    let geometry = config.geometry()?;
    let volume = VolumeLoader::load_from_directory(directory, config.sort_by)?;

    let mut data = ImageData::new();
    data.set_grey_image(volume, &geometry);
    data.grey_mut()
        .set_intensity_map_function(IntensityCurve::new(config.intensity_control_points));

    for orientation in Orientation::ALL {
        let path = format!("{}.png", orientation.name());
        data.grey_mut().display_slice(orientation.axis()).save(&path)?;
        log::info!("Wrote {path}");
    }
    Ok(())
}
