use std::path::Path;

use crate::record::domain::frame_recorder::PersistError;
use crate::shared::frame::Frame;
use crate::shared::stream_info::PixelFormat;

/// Writes a single frame to a PNG file using the `image` crate.
pub fn write_png(path: &Path, frame: &Frame) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| PersistError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let write_err = |source: image::ImageError| PersistError::Write {
        path: path.to_path_buf(),
        source,
    };

    match frame.format() {
        PixelFormat::Rgb24 => {
            let img =
                image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
                    .ok_or(PersistError::BadFrame)?;
            img.save(path).map_err(write_err)
        }
        PixelFormat::Gray8 => {
            let img =
                image::GrayImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
                    .ok_or(PersistError::BadFrame)?;
            img.save(path).map_err(write_err)
        }
    }
}
