use thiserror::Error;

use crate::shared::stream_info::StreamInfo;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to open {uri}: {source}")]
    Open {
        uri: String,
        #[source]
        source: ffmpeg_next::Error,
    },
    #[error("source exposes no streams: {0}")]
    NoStreams(String),
    #[error("unsupported source uri: {0}")]
    UnsupportedUri(String),
}

/// Produces sequentially numbered frames from a device or file.
///
/// Implementations decode into the caller-owned grab buffer described
/// by [`StreamInfo`] so the hot path allocates nothing per frame.
pub trait FrameSource: Send {
    /// Layout of the streams this source fills into the grab buffer.
    fn streams(&self) -> &[StreamInfo];

    /// Total byte footprint of one grab across all streams.
    fn size_bytes(&self) -> usize {
        self.streams().iter().map(StreamInfo::size_bytes).sum()
    }

    /// Attempts to retrieve the next frame set into `buffer`.
    ///
    /// `wait` blocks until a frame is available; otherwise a grab with
    /// nothing ready is a miss (`false`). `discard_stale` skips past any
    /// frames older than the newest available one. A miss is not an
    /// error; it means "nothing new this tick".
    fn grab(&mut self, buffer: &mut [u8], wait: bool, discard_stale: bool) -> bool;

    /// Repositions a seekable source so the next grab yields `frame`.
    /// Returns the actual landing index (clamped to the valid range).
    /// Non-seekable sources leave the position unchanged.
    fn seek(&mut self, frame: i64) -> i64;

    fn is_seekable(&self) -> bool;

    /// Frame count for file-backed sources, `None` for live streams.
    fn total_frames(&self) -> Option<i64>;

    /// Nominal frames per second, when the source knows one.
    fn nominal_fps(&self) -> Option<f64> {
        None
    }

    /// Releases decoder/device resources. Further grabs miss.
    fn close(&mut self);
}
