use std::path::PathBuf;

use thiserror::Error;

use crate::shared::stream_info::StreamInfo;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("failed to create capture directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write image {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("stream pixel data does not form a valid image")]
    BadFrame,
    #[error("no grabbed frame to persist")]
    NoFrame,
}

/// Accepts the stream of grabbed frames and persists a subset of them.
///
/// The playback controller feeds every successful grab through
/// [`FrameRecorder::sink`]; the recorder decides what actually hits
/// disk based on its recording state, the every-Nth throttle and the
/// one-shot flag.
pub trait FrameRecorder: Send {
    /// Begins recording; grabbed frames start flowing to disk.
    fn start(&mut self);

    fn stop(&mut self);

    fn is_recording(&self) -> bool;

    /// Persist only every `every_nth` grabbed frame while recording.
    /// Values below 1 are treated as 1.
    fn set_throttle(&mut self, every_nth: usize);

    /// Arms a one-shot persist: the next sunk grab is written exactly
    /// once, regardless of recording state and throttle.
    fn record_one_frame(&mut self);

    /// Offers one grab (all streams) to the recorder. Returns the
    /// number of images persisted for this grab.
    fn sink(
        &mut self,
        frame_index: i64,
        streams: &[StreamInfo],
        buffer: &[u8],
    ) -> Result<usize, PersistError>;
}
