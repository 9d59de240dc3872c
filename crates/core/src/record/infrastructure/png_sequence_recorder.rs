use std::path::PathBuf;

use crate::record::domain::frame_recorder::{FrameRecorder, PersistError};
use crate::record::infrastructure::png_writer::write_png;
use crate::shared::frame::Frame;
use crate::shared::stream_info::StreamInfo;

/// Persists grabbed frames as a PNG sequence under a target directory,
/// one file per stream: `stream{j}_frame{i:06}.png`.
///
/// The every-Nth throttle counts grabs seen while recording, so
/// `every_nth = 3` persists the 1st, 4th, 7th… grab of a recording
/// session. The one-shot flag bypasses both the recording state and
/// the throttle.
pub struct PngSequenceRecorder {
    dir: PathBuf,
    recording: bool,
    every_nth: usize,
    seen: u64,
    one_shot: bool,
}

impl PngSequenceRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            recording: false,
            every_nth: 1,
            seen: 0,
            one_shot: false,
        }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn frame_path(&self, stream: usize, frame_index: i64) -> PathBuf {
        self.dir
            .join(format!("stream{stream}_frame{frame_index:06}.png"))
    }
}

impl FrameRecorder for PngSequenceRecorder {
    fn start(&mut self) {
        self.recording = true;
        self.seen = 0;
    }

    fn stop(&mut self) {
        self.recording = false;
    }

    fn is_recording(&self) -> bool {
        self.recording
    }

    fn set_throttle(&mut self, every_nth: usize) {
        self.every_nth = every_nth.max(1);
    }

    fn record_one_frame(&mut self) {
        self.one_shot = true;
    }

    fn sink(
        &mut self,
        frame_index: i64,
        streams: &[StreamInfo],
        buffer: &[u8],
    ) -> Result<usize, PersistError> {
        let throttled_hit = if self.recording {
            let hit = self.seen % self.every_nth as u64 == 0;
            self.seen += 1;
            hit
        } else {
            false
        };

        let persist = self.one_shot || throttled_hit;
        self.one_shot = false;
        if !persist {
            return Ok(0);
        }

        let mut written = 0;
        for info in streams {
            let frame = Frame::from_stream(info, buffer, frame_index);
            write_png(&self.frame_path(info.index, frame_index), &frame)?;
            written += 1;
        }
        Ok(written)
    }
}
