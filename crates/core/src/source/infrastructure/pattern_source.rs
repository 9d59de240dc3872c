use std::time::{Duration, Instant};

use crate::shared::stream_info::{PixelFormat, StreamInfo};
use crate::source::domain::frame_source::{FrameSource, SourceError};

const PATTERN_WIDTH: u32 = 320;
const PATTERN_HEIGHT: u32 = 240;
const DEFAULT_FPS: f64 = 30.0;

/// Synthetic live source: a fixed-fps moving test pattern.
///
/// Non-seekable and unbounded, which makes it the reference
/// implementation for the wait/discard grab flags: `wait` blocks until
/// the next frame is due, a non-waiting grab misses when nothing is
/// due, and `discard_stale` jumps to the newest due frame instead of
/// replaying the backlog.
///
/// URI parameters: `test://?n=3&fps=10` — `n` streams (1-9, stream 0 is
/// RGB, the rest grayscale) at `fps` frames per second (1-240).
pub struct PatternSource {
    streams: Vec<StreamInfo>,
    fps: f64,
    start: Instant,
    next_frame: i64,
    open: bool,
}

impl PatternSource {
    pub fn open(params: &str) -> Result<Self, SourceError> {
        let (stream_count, fps) = parse_params(params)?;

        let mut streams = Vec::with_capacity(stream_count);
        let mut offset = 0;
        for index in 0..stream_count {
            let format = if index == 0 {
                PixelFormat::Rgb24
            } else {
                PixelFormat::Gray8
            };
            let pitch = PATTERN_WIDTH as usize * format.bytes_per_pixel();
            let info = StreamInfo {
                index,
                width: PATTERN_WIDTH,
                height: PATTERN_HEIGHT,
                format,
                pitch,
                offset,
            };
            offset += info.size_bytes();
            streams.push(info);
        }

        Ok(Self {
            streams,
            fps,
            start: Instant::now(),
            next_frame: 0,
            open: true,
        })
    }

    /// Highest frame index due at the current wall-clock time.
    fn due_frame(&self) -> i64 {
        (self.start.elapsed().as_secs_f64() * self.fps) as i64
    }

    fn render(&self, frame: i64, buffer: &mut [u8]) {
        let t = frame as u32;
        for info in &self.streams {
            let (w, h, pitch) = (info.width, info.height, info.pitch);
            let dst = info.view_mut(buffer);
            match info.format {
                PixelFormat::Rgb24 => {
                    for y in 0..h {
                        for x in 0..w {
                            let o = y as usize * pitch + x as usize * 3;
                            dst[o] = (x.wrapping_add(t)) as u8;
                            dst[o + 1] = (y.wrapping_add(t)) as u8;
                            dst[o + 2] = (x ^ y) as u8;
                        }
                    }
                }
                PixelFormat::Gray8 => {
                    let phase = t.wrapping_mul(info.index as u32 + 1);
                    for y in 0..h {
                        for x in 0..w {
                            dst[y as usize * pitch + x as usize] =
                                (x.wrapping_add(phase) ^ y) as u8;
                        }
                    }
                }
            }
        }
    }
}

fn parse_params(params: &str) -> Result<(usize, f64), SourceError> {
    let mut stream_count = 1usize;
    let mut fps = DEFAULT_FPS;

    let query = params.strip_prefix('?').unwrap_or(params);
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let bad = || SourceError::UnsupportedUri(format!("test://{params}"));
        let (key, value) = pair.split_once('=').ok_or_else(bad)?;
        match key {
            "n" => {
                stream_count = value.parse().map_err(|_| bad())?;
                if !(1..=9).contains(&stream_count) {
                    return Err(bad());
                }
            }
            "fps" => {
                let parsed: u32 = value.parse().map_err(|_| bad())?;
                if !(1..=240).contains(&parsed) {
                    return Err(bad());
                }
                fps = f64::from(parsed);
            }
            _ => return Err(bad()),
        }
    }

    Ok((stream_count, fps))
}

impl FrameSource for PatternSource {
    fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    fn grab(&mut self, buffer: &mut [u8], wait: bool, discard_stale: bool) -> bool {
        if !self.open {
            return false;
        }

        let due = self.due_frame();
        if discard_stale && due > self.next_frame {
            self.next_frame = due;
        }
        if self.next_frame > due {
            if !wait {
                return false;
            }
            let target = Duration::from_secs_f64(self.next_frame as f64 / self.fps);
            let elapsed = self.start.elapsed();
            if target > elapsed {
                std::thread::sleep(target - elapsed);
            }
        }

        self.render(self.next_frame, buffer);
        self.next_frame += 1;
        true
    }

    fn seek(&mut self, _frame: i64) -> i64 {
        self.next_frame - 1
    }

    fn is_seekable(&self) -> bool {
        false
    }

    fn total_frames(&self) -> Option<i64> {
        None
    }

    fn nominal_fps(&self) -> Option<f64> {
        Some(self.fps)
    }

    fn close(&mut self) {
        self.open = false;
    }
}
