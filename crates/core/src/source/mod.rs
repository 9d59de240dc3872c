pub mod domain;
pub mod infrastructure;

use crate::source::domain::frame_source::{FrameSource, SourceError};
use crate::source::infrastructure::ffmpeg_file_source::FfmpegFileSource;
use crate::source::infrastructure::pattern_source::PatternSource;

/// Binds a frame source for a URI.
///
/// `test://` opens the synthetic pattern generator (a live,
/// non-seekable source); anything else is treated as a media file path
/// (with an optional `file://` prefix) and decoded via ffmpeg.
pub fn open_source(uri: &str) -> Result<Box<dyn FrameSource>, SourceError> {
    if let Some(params) = uri.strip_prefix("test://") {
        return Ok(Box::new(PatternSource::open(params)?));
    }

    let path = uri.strip_prefix("file://").unwrap_or(uri);
    Ok(Box::new(FfmpegFileSource::open(std::path::Path::new(
        path,
    ))?))
}
