use std::path::Path;

use crate::shared::stream_info::{PixelFormat, StreamInfo};
use crate::source::domain::frame_source::{FrameSource, SourceError};

/// AV_TIME_BASE: libavformat's container-level timestamp unit.
const AV_TIME_BASE: i32 = 1_000_000;

/// File-backed frame source decoding via ffmpeg-next (libavformat +
/// libavcodec). Every frame is converted to RGB24 into the shared grab
/// buffer; the decoder, scaler and scratch frame are reused across
/// grabs.
///
/// Seekable when the container reports a frame count.
pub struct FfmpegFileSource {
    uri: String,
    streams: Vec<StreamInfo>,
    total_frames: Option<i64>,
    fps: f64,
    inner: Option<Decode>,
}

struct Decode {
    input: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    rgb_frame: ffmpeg_next::util::frame::video::Video,
    video_stream_index: usize,
    flushing: bool,
    done: bool,
}

// Safety: FfmpegFileSource is only used from one thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegFileSource {}

impl FfmpegFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let uri = path.display().to_string();
        let open_err = |source: ffmpeg_next::Error| SourceError::Open {
            uri: path.display().to_string(),
            source,
        };

        ffmpeg_next::init().map_err(open_err)?;

        let input = ffmpeg_next::format::input(path).map_err(open_err)?;

        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| SourceError::NoStreams(uri.clone()))?;

        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(open_err)?;
        let decoder = codec_ctx.decoder().video().map_err(open_err)?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let reported = stream.frames();
        let total_frames = (reported > 0).then_some(reported);

        let width = decoder.width();
        let height = decoder.height();
        let streams = vec![StreamInfo {
            index: 0,
            width,
            height,
            format: PixelFormat::Rgb24,
            pitch: width as usize * 3,
            offset: 0,
        }];

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(open_err)?;

        Ok(Self {
            uri,
            streams,
            total_frames,
            fps,
            inner: Some(Decode {
                input,
                decoder,
                scaler,
                rgb_frame: ffmpeg_next::util::frame::video::Video::empty(),
                video_stream_index,
                flushing: false,
                done: false,
            }),
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl Decode {
    /// Pulls one decoded frame out of the codec, if any is pending, and
    /// copies it into the grab buffer with row padding stripped.
    fn receive_into(&mut self, info: &StreamInfo, buffer: &mut [u8]) -> bool {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return false;
        }
        if self.scaler.run(&decoded, &mut self.rgb_frame).is_err() {
            return false;
        }

        let stride = self.rgb_frame.stride(0);
        let data = self.rgb_frame.data(0);
        let row_bytes = info.width as usize * info.format.bytes_per_pixel();
        let dst = info.view_mut(buffer);
        for row in 0..info.height as usize {
            let src_start = row * stride;
            let dst_start = row * info.pitch;
            dst[dst_start..dst_start + row_bytes]
                .copy_from_slice(&data[src_start..src_start + row_bytes]);
        }
        true
    }
}

impl FrameSource for FfmpegFileSource {
    fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    // File decode is synchronous; `wait` and `discard_stale` have no
    // effect here. A miss means end of stream.
    fn grab(&mut self, buffer: &mut [u8], _wait: bool, _discard_stale: bool) -> bool {
        let Some(dec) = self.inner.as_mut() else {
            return false;
        };
        if dec.done {
            return false;
        }
        let info = &self.streams[0];

        loop {
            if dec.receive_into(info, buffer) {
                return true;
            }
            if dec.flushing {
                dec.done = true;
                return false;
            }
            let Some((stream, packet)) = dec.input.packets().next() else {
                let _ = dec.decoder.send_eof();
                dec.flushing = true;
                continue;
            };
            if stream.index() != dec.video_stream_index {
                continue;
            }
            let _ = dec.decoder.send_packet(&packet);
        }
    }

    fn seek(&mut self, frame: i64) -> i64 {
        let Some(total) = self.total_frames else {
            return frame;
        };
        let target = frame.clamp(0, total - 1);
        let Some(dec) = self.inner.as_mut() else {
            return target;
        };
        if self.fps <= 0.0 {
            return target;
        }

        // Container-level seek lands on the keyframe at or before the
        // request; frame numbering continues from the declared target.
        let ts = (target as f64 / self.fps * f64::from(AV_TIME_BASE)) as i64;
        if dec.input.seek(ts, ..ts).is_ok() {
            dec.decoder.flush();
            dec.flushing = false;
            dec.done = false;
        }
        target
    }

    fn is_seekable(&self) -> bool {
        self.total_frames.is_some()
    }

    fn total_frames(&self) -> Option<i64> {
        self.total_frames
    }

    fn nominal_fps(&self) -> Option<f64> {
        (self.fps > 0.0).then_some(self.fps)
    }

    fn close(&mut self) {
        self.inner = None;
    }
}
