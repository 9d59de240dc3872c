use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::playback::play_bound::PlayBound;
use crate::record::domain::frame_recorder::{FrameRecorder, PersistError};
use crate::record::infrastructure::png_writer::write_png;
use crate::shared::frame::Frame;
use crate::shared::stream_info::StreamInfo;
use crate::shared::unique_path::unique_path;
use crate::source::domain::frame_source::{FrameSource, SourceError};
use crate::source::open_source;

/// Single authority over when a grab is attempted and what the allowed
/// play range is.
///
/// All state lives behind one exclusive lock; every mutating operation
/// and the whole of [`tick`](PlaybackController::tick) hold it for
/// their full duration, so UI-thread and pump-thread callers never
/// race. Coarse-grained on purpose: grabs are cheap relative to the
/// contention this could ever cause.
pub struct PlaybackController {
    inner: Mutex<ControlState>,
}

struct ControlState {
    source: Option<Box<dyn FrameSource>>,
    recorder: Box<dyn FrameRecorder>,
    /// One grab's worth of bytes across all streams, reused every tick.
    buffer: Vec<u8>,
    current_frame: i64,
    bound: PlayBound,
    wait_for_frames: bool,
    discard_stale: bool,
    record_every_nth: usize,
    /// Slider-driven seek request, consumed by the next tick.
    pending_seek: Option<i64>,
}

impl PlaybackController {
    pub fn new(recorder: Box<dyn FrameRecorder>) -> Self {
        Self {
            inner: Mutex::new(ControlState {
                source: None,
                recorder,
                buffer: Vec::new(),
                current_frame: -1,
                bound: PlayBound::Paused { until: 0 },
                wait_for_frames: true,
                discard_stale: false,
                record_every_nth: 1,
                pending_seek: None,
            }),
        }
    }

    // A panicked tick must not wedge every later caller.
    fn state(&self) -> MutexGuard<'_, ControlState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Binds the frame source for `uri`, replacing any current one.
    ///
    /// A seekable source starts paused at frame 0; a live source has no
    /// meaningful pause point and free-runs. On error the controller is
    /// left idle.
    pub fn open_input(&self, uri: &str) -> Result<(), SourceError> {
        let source = open_source(uri)?;
        self.bind(source)
    }

    fn bind(&self, source: Box<dyn FrameSource>) -> Result<(), SourceError> {
        let mut s = self.state();

        if source.streams().is_empty() {
            log::error!("no video streams from source");
            return Err(SourceError::NoStreams(String::new()));
        }

        for info in source.streams() {
            log::info!(
                "stream {}: {} x {} {} (pitch: {} bytes)",
                info.index,
                info.width,
                info.height,
                info.format,
                info.pitch
            );
        }
        if let Some(total) = source.total_frames() {
            log::info!("video length: {total} frames");
        }

        if let Some(mut old) = s.source.take() {
            old.close();
        }

        s.buffer = vec![0u8; source.size_bytes()];
        s.current_frame = -1;
        s.pending_seek = None;
        s.bound = if source.is_seekable() {
            PlayBound::Paused { until: 0 }
        } else {
            PlayBound::Playing
        };
        s.source = Some(source);
        Ok(())
    }

    /// One render-loop iteration: apply any pending slider seek, then
    /// attempt a grab if the play bound allows one. On success the
    /// recorder sees the grab and `render` is handed the frame index,
    /// stream layout and pixel buffer.
    ///
    /// Returns whether new frames were grabbed. A miss is silent; the
    /// caller simply renders its previous content again.
    pub fn tick<F>(&self, render: F) -> bool
    where
        F: FnOnce(i64, &[StreamInfo], &[u8]),
    {
        let mut s = self.state();
        let s = &mut *s;
        let Some(source) = s.source.as_mut() else {
            return false;
        };

        if let Some(target) = s.pending_seek.take() {
            if source.is_seekable() {
                s.current_frame = source.seek(target) - 1;
                s.bound = PlayBound::SteppingOne {
                    until: s.current_frame + 1,
                };
            }
        }

        if !s.bound.allows(s.current_frame) {
            return false;
        }
        if !source.grab(&mut s.buffer, s.wait_for_frames, s.discard_stale) {
            return false;
        }

        s.current_frame += 1;
        s.bound = s.bound.settled(s.current_frame);

        if let Err(e) = s
            .recorder
            .sink(s.current_frame, source.streams(), &s.buffer)
        {
            log::error!("failed to persist frame {}: {e}", s.current_frame);
        }

        render(s.current_frame, source.streams(), &s.buffer);
        true
    }

    /// Play/pause toggle: pauses free-run at the current position, or
    /// resumes free-run from a pause.
    pub fn toggle_play(&self) {
        let mut s = self.state();
        s.bound = s.bound.toggled(s.current_frame);
    }

    /// Skips `delta` frames. Seekable sources reposition and arm
    /// exactly one grab; live sources can only let `delta` more grabs
    /// through — skipping backward on them is a warned no-op.
    pub fn skip(&self, delta: i64) {
        let mut s = self.state();
        let s = &mut *s;
        let Some(source) = s.source.as_mut() else {
            return;
        };

        if source.is_seekable() {
            s.current_frame = source.seek(s.current_frame + delta) - 1;
            s.bound = PlayBound::SteppingOne {
                until: s.current_frame + 1,
            };
        } else if delta >= 0 {
            s.bound = PlayBound::Paused {
                until: s.current_frame + delta,
            };
        } else {
            log::warn!("unable to skip backward on a non-seekable source");
        }
    }

    /// Starts recording with the configured every-Nth throttle, or
    /// stops an active recording.
    pub fn toggle_record(&self) {
        let mut s = self.state();
        let s = &mut *s;
        if s.recorder.is_recording() {
            s.recorder.stop();
            log::info!("finished recording");
        } else {
            let every_nth = s.record_every_nth;
            s.recorder.set_throttle(every_nth);
            s.recorder.start();
            log::info!("started recording (every {every_nth} frame(s))");
        }
    }

    /// Persists exactly one frame on the next grab, regardless of play
    /// and recording state.
    pub fn record_one_frame(&self) {
        self.state().recorder.record_one_frame();
    }

    pub fn toggle_wait_for_frames(&self) {
        let mut s = self.state();
        s.wait_for_frames = !s.wait_for_frames;
        if s.wait_for_frames {
            log::info!("waiting for frames");
        } else {
            log::info!("not waiting for frames");
        }
    }

    pub fn toggle_discard_stale_frames(&self) {
        let mut s = self.state();
        s.discard_stale = !s.discard_stale;
        if s.discard_stale {
            log::info!("discarding stale frames");
        } else {
            log::info!("not discarding stale frames");
        }
    }

    pub fn set_record_every_nth(&self, every_nth: usize) {
        self.state().record_every_nth = every_nth.max(1);
    }

    /// The slider write path: the requested frame is stored and applied
    /// under the lock at the next tick (re-arming, not stacking, any
    /// previous request).
    pub fn request_seek(&self, frame: i64) {
        self.state().pending_seek = Some(frame);
    }

    /// Writes the named stream of the most recent grab to a
    /// uniquely-named PNG under `dir` and returns the path.
    pub fn snapshot_stream(&self, stream: usize, dir: &Path) -> Result<PathBuf, PersistError> {
        let s = self.state();
        let Some(source) = s.source.as_ref() else {
            return Err(PersistError::NoFrame);
        };
        if s.current_frame < 0 {
            return Err(PersistError::NoFrame);
        }
        let info = source.streams().get(stream).ok_or(PersistError::NoFrame)?;

        let frame = Frame::from_stream(info, &s.buffer, s.current_frame);
        let path = unique_path(dir, "capture.png");
        write_png(&path, &frame)?;
        log::info!("saved {}", path.display());
        Ok(path)
    }

    /// Releases the bound source and the grab buffer.
    pub fn close(&self) {
        let mut s = self.state();
        if let Some(mut source) = s.source.take() {
            source.close();
        }
        s.buffer = Vec::new();
        s.current_frame = -1;
        s.pending_seek = None;
        s.bound = PlayBound::Paused { until: 0 };
    }

    // --- accessors -----------------------------------------------------

    pub fn has_source(&self) -> bool {
        self.state().source.is_some()
    }

    /// Index of the most recently grabbed frame, -1 before the first.
    pub fn position(&self) -> i64 {
        self.state().current_frame
    }

    pub fn play_bound(&self) -> PlayBound {
        self.state().bound
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state().bound, PlayBound::Playing)
    }

    pub fn is_recording(&self) -> bool {
        self.state().recorder.is_recording()
    }

    pub fn is_seekable(&self) -> bool {
        self.state()
            .source
            .as_ref()
            .is_some_and(|s| s.is_seekable())
    }

    pub fn total_frames(&self) -> Option<i64> {
        self.state().source.as_ref().and_then(|s| s.total_frames())
    }

    pub fn nominal_fps(&self) -> Option<f64> {
        self.state().source.as_ref().and_then(|s| s.nominal_fps())
    }

    pub fn stream_info(&self) -> Vec<StreamInfo> {
        self.state()
            .source
            .as_ref()
            .map(|s| s.streams().to_vec())
            .unwrap_or_default()
    }

    pub fn waits_for_frames(&self) -> bool {
        self.state().wait_for_frames
    }

    pub fn discards_stale_frames(&self) -> bool {
        self.state().discard_stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::infrastructure::png_sequence_recorder::PngSequenceRecorder;
    use crate::shared::stream_info::PixelFormat;
    use std::sync::Arc;

    // -- mock source ----------------------------------------------------

    #[derive(Default)]
    struct MockState {
        cursor: i64,
        grabs: u32,
        seeks: Vec<i64>,
    }

    struct MockSource {
        streams: Vec<StreamInfo>,
        total: Option<i64>,
        state: Arc<Mutex<MockState>>,
        closed: bool,
    }

    fn gray_stream() -> StreamInfo {
        StreamInfo {
            index: 0,
            width: 4,
            height: 4,
            format: PixelFormat::Gray8,
            pitch: 4,
            offset: 0,
        }
    }

    impl MockSource {
        fn seekable(total: i64) -> (Self, Arc<Mutex<MockState>>) {
            let state = Arc::new(Mutex::new(MockState::default()));
            (
                Self {
                    streams: vec![gray_stream()],
                    total: Some(total),
                    state: state.clone(),
                    closed: false,
                },
                state,
            )
        }

        fn live() -> (Self, Arc<Mutex<MockState>>) {
            let state = Arc::new(Mutex::new(MockState::default()));
            (
                Self {
                    streams: vec![gray_stream()],
                    total: None,
                    state: state.clone(),
                    closed: false,
                },
                state,
            )
        }

        fn empty() -> Self {
            Self {
                streams: vec![],
                total: None,
                state: Arc::new(Mutex::new(MockState::default())),
                closed: false,
            }
        }
    }

    impl FrameSource for MockSource {
        fn streams(&self) -> &[StreamInfo] {
            &self.streams
        }

        fn grab(&mut self, buffer: &mut [u8], _wait: bool, _discard_stale: bool) -> bool {
            if self.closed {
                return false;
            }
            let mut st = self.state.lock().unwrap();
            if let Some(total) = self.total {
                if st.cursor >= total {
                    return false;
                }
            }
            buffer[0] = st.cursor as u8;
            st.cursor += 1;
            st.grabs += 1;
            true
        }

        fn seek(&mut self, frame: i64) -> i64 {
            let total = self.total.expect("seek on non-seekable mock");
            let landed = frame.clamp(0, total - 1);
            let mut st = self.state.lock().unwrap();
            st.seeks.push(frame);
            st.cursor = landed;
            landed
        }

        fn is_seekable(&self) -> bool {
            self.total.is_some()
        }

        fn total_frames(&self) -> Option<i64> {
            self.total
        }

        fn close(&mut self) {
            self.closed = true;
        }
    }

    // -- mock recorder --------------------------------------------------

    #[derive(Default)]
    struct RecorderState {
        recording: bool,
        throttle: usize,
        sunk: Vec<i64>,
        one_shots: u32,
    }

    struct MockRecorder {
        state: Arc<Mutex<RecorderState>>,
    }

    impl MockRecorder {
        fn new() -> (Self, Arc<Mutex<RecorderState>>) {
            let state = Arc::new(Mutex::new(RecorderState::default()));
            (
                Self {
                    state: state.clone(),
                },
                state,
            )
        }
    }

    impl FrameRecorder for MockRecorder {
        fn start(&mut self) {
            self.state.lock().unwrap().recording = true;
        }

        fn stop(&mut self) {
            self.state.lock().unwrap().recording = false;
        }

        fn is_recording(&self) -> bool {
            self.state.lock().unwrap().recording
        }

        fn set_throttle(&mut self, every_nth: usize) {
            self.state.lock().unwrap().throttle = every_nth;
        }

        fn record_one_frame(&mut self) {
            self.state.lock().unwrap().one_shots += 1;
        }

        fn sink(
            &mut self,
            frame_index: i64,
            _streams: &[StreamInfo],
            _buffer: &[u8],
        ) -> Result<usize, PersistError> {
            self.state.lock().unwrap().sunk.push(frame_index);
            Ok(0)
        }
    }

    fn controller() -> PlaybackController {
        PlaybackController::new(Box::new(MockRecorder::new().0))
    }

    fn tick(c: &PlaybackController) -> bool {
        c.tick(|_, _, _| {})
    }

    // -- tests ----------------------------------------------------------

    #[test]
    fn test_zero_stream_source_leaves_controller_idle() {
        let c = controller();
        let before = c.position();
        assert!(matches!(
            c.bind(Box::new(MockSource::empty())),
            Err(SourceError::NoStreams(_))
        ));
        assert!(!c.has_source());
        assert_eq!(c.position(), before);
        assert!(!tick(&c));
    }

    #[test]
    fn test_seekable_source_opens_paused_at_frame_zero() {
        let c = controller();
        c.bind(Box::new(MockSource::seekable(100).0)).unwrap();
        assert_eq!(c.play_bound(), PlayBound::Paused { until: 0 });

        // one grab is allowed (shows frame 0), then playback holds
        assert!(tick(&c));
        assert_eq!(c.position(), 0);
        assert!(!tick(&c));
        assert_eq!(c.position(), 0);
    }

    #[test]
    fn test_live_source_opens_in_free_run() {
        let c = controller();
        c.bind(Box::new(MockSource::live().0)).unwrap();
        assert_eq!(c.play_bound(), PlayBound::Playing);
        assert!(tick(&c));
        assert!(tick(&c));
        assert_eq!(c.position(), 1);
    }

    #[test]
    fn test_skip_scenario_then_free_run() {
        // 100-frame source: skip(+10), toggle, then three free-run ticks
        let c = controller();
        c.bind(Box::new(MockSource::seekable(100).0)).unwrap();

        c.skip(10);
        assert!(tick(&c));
        assert_eq!(c.position(), 9);
        assert!(!tick(&c)); // single-step spent

        c.toggle_play();
        assert_eq!(c.play_bound(), PlayBound::Playing);
        for expected in [10, 11, 12] {
            assert!(tick(&c));
            assert_eq!(c.position(), expected);
        }
    }

    #[test]
    fn test_skip_clamps_to_valid_range() {
        let c = controller();
        let (source, state) = MockSource::seekable(10);
        c.bind(Box::new(source)).unwrap();

        c.skip(500);
        assert!(tick(&c));
        assert_eq!(c.position(), 9);

        c.skip(-500);
        assert!(tick(&c));
        assert_eq!(c.position(), 0);

        // each skip armed exactly one grab
        assert!(!tick(&c));
        assert_eq!(state.lock().unwrap().seeks, vec![499, -491]);
    }

    #[test]
    fn test_toggle_play_pair_restores_bound() {
        let c = controller();
        c.bind(Box::new(MockSource::seekable(100).0)).unwrap();
        assert!(tick(&c)); // settle at frame 0

        let original = c.play_bound();
        c.toggle_play();
        c.toggle_play();
        assert_eq!(c.play_bound(), original);
        assert!(!tick(&c));
        assert_eq!(c.position(), 0);
    }

    #[test]
    fn test_backward_skip_on_live_source_is_warned_noop() {
        let c = controller();
        let (source, state) = MockSource::live();
        c.bind(Box::new(source)).unwrap();
        assert!(tick(&c));

        let before = c.play_bound();
        c.skip(-1);
        assert_eq!(c.play_bound(), before);
        assert!(state.lock().unwrap().seeks.is_empty());
        assert!(tick(&c)); // still free-running
    }

    #[test]
    fn test_forward_skip_on_live_source_extends_bound() {
        let c = controller();
        c.bind(Box::new(MockSource::live().0)).unwrap();
        assert!(tick(&c));
        assert_eq!(c.position(), 0);

        c.skip(3);
        assert_eq!(c.play_bound(), PlayBound::Paused { until: 3 });
        assert!(tick(&c));
        assert!(tick(&c));
        assert!(tick(&c));
        assert_eq!(c.position(), 3);
        assert!(!tick(&c));
    }

    #[test]
    fn test_slider_seek_is_applied_at_next_tick() {
        let c = controller();
        let (source, state) = MockSource::seekable(100);
        c.bind(Box::new(source)).unwrap();

        c.request_seek(50);
        assert!(tick(&c));
        assert_eq!(c.position(), 50);
        assert!(!tick(&c)); // stepped exactly once
        assert_eq!(state.lock().unwrap().seeks, vec![50]);
    }

    #[test]
    fn test_slider_seek_rearms_instead_of_stacking() {
        let c = controller();
        let (source, state) = MockSource::seekable(100);
        c.bind(Box::new(source)).unwrap();

        c.request_seek(10);
        c.request_seek(30);
        assert!(tick(&c));
        assert_eq!(c.position(), 30);
        assert_eq!(state.lock().unwrap().seeks, vec![30]);
    }

    #[test]
    fn test_slider_seek_ignored_on_live_source() {
        let c = controller();
        let (source, state) = MockSource::live();
        c.bind(Box::new(source)).unwrap();

        c.request_seek(5);
        assert!(tick(&c));
        assert!(state.lock().unwrap().seeks.is_empty());
    }

    #[test]
    fn test_grab_miss_is_silent_and_keeps_position() {
        let c = controller();
        c.bind(Box::new(MockSource::seekable(2).0)).unwrap();
        assert!(tick(&c));
        assert_eq!(c.position(), 0);
        c.toggle_play();
        assert!(tick(&c));
        assert_eq!(c.position(), 1);

        // exhausted: ticks miss quietly, nothing moves
        assert!(!tick(&c));
        assert_eq!(c.position(), 1);
        assert!(c.is_playing());
    }

    #[test]
    fn test_toggle_record_starts_and_stops_with_throttle() {
        let (recorder, rec_state) = MockRecorder::new();
        let c = PlaybackController::new(Box::new(recorder));
        c.set_record_every_nth(4);

        assert!(!c.is_recording());
        c.toggle_record();
        assert!(c.is_recording());
        assert_eq!(rec_state.lock().unwrap().throttle, 4);

        c.toggle_record();
        assert!(!c.is_recording());
    }

    #[test]
    fn test_every_grab_reaches_the_recorder_sink() {
        let (recorder, rec_state) = MockRecorder::new();
        let c = PlaybackController::new(Box::new(recorder));
        c.bind(Box::new(MockSource::live().0)).unwrap();

        assert!(tick(&c));
        assert!(tick(&c));
        assert_eq!(rec_state.lock().unwrap().sunk, vec![0, 1]);
    }

    #[test]
    fn test_record_one_frame_is_independent_of_throttle() {
        let dir = tempfile::tempdir().unwrap();
        let c = PlaybackController::new(Box::new(PngSequenceRecorder::new(dir.path())));
        c.set_record_every_nth(100);
        c.bind(Box::new(MockSource::live().0)).unwrap();
        c.toggle_record();

        assert!(tick(&c)); // frame 0 hits the throttle window
        assert!(tick(&c)); // frame 1 throttled
        c.record_one_frame();
        assert!(tick(&c)); // frame 2 forced through by the one-shot
        assert!(tick(&c)); // frame 3 throttled

        let written: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(written.len(), 2);
        assert!(written.contains(&"stream0_frame000000.png".to_string()));
        assert!(written.contains(&"stream0_frame000002.png".to_string()));
    }

    #[test]
    fn test_render_callback_sees_frame_index_and_pixels() {
        let c = controller();
        c.bind(Box::new(MockSource::seekable(100).0)).unwrap();

        let mut seen = None;
        c.tick(|idx, streams, buffer| {
            seen = Some((idx, streams.len(), buffer[0]));
        });
        assert_eq!(seen, Some((0, 1, 0)));
    }

    #[test]
    fn test_snapshot_without_frame_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let c = controller();
        assert!(matches!(
            c.snapshot_stream(0, dir.path()),
            Err(PersistError::NoFrame)
        ));

        c.bind(Box::new(MockSource::seekable(5).0)).unwrap();
        // bound but nothing grabbed yet
        assert!(matches!(
            c.snapshot_stream(0, dir.path()),
            Err(PersistError::NoFrame)
        ));
    }

    #[test]
    fn test_snapshot_writes_uniquely_named_files() {
        let dir = tempfile::tempdir().unwrap();
        let c = controller();
        c.bind(Box::new(MockSource::seekable(5).0)).unwrap();
        assert!(tick(&c));

        let first = c.snapshot_stream(0, dir.path()).unwrap();
        let second = c.snapshot_stream(0, dir.path()).unwrap();
        assert_eq!(first, dir.path().join("capture.png"));
        assert_eq!(second, dir.path().join("capture_000001.png"));
        assert!(first.exists() && second.exists());
    }

    #[test]
    fn test_snapshot_of_unknown_stream_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let c = controller();
        c.bind(Box::new(MockSource::seekable(5).0)).unwrap();
        assert!(tick(&c));
        assert!(c.snapshot_stream(3, dir.path()).is_err());
    }

    #[test]
    fn test_close_releases_source_and_resets() {
        let c = controller();
        c.bind(Box::new(MockSource::seekable(5).0)).unwrap();
        assert!(tick(&c));

        c.close();
        assert!(!c.has_source());
        assert_eq!(c.position(), -1);
        assert_eq!(c.total_frames(), None);
        assert!(!tick(&c));
    }

    #[test]
    fn test_flag_toggles() {
        let c = controller();
        assert!(c.waits_for_frames());
        c.toggle_wait_for_frames();
        assert!(!c.waits_for_frames());

        assert!(!c.discards_stale_frames());
        c.toggle_discard_stale_frames();
        assert!(c.discards_stale_frames());
    }

    #[test]
    fn test_reopen_resets_playback_state() {
        let c = controller();
        c.bind(Box::new(MockSource::live().0)).unwrap();
        assert!(tick(&c));
        assert!(tick(&c));
        assert_eq!(c.position(), 1);

        c.bind(Box::new(MockSource::seekable(10).0)).unwrap();
        assert_eq!(c.position(), -1);
        assert_eq!(c.play_bound(), PlayBound::Paused { until: 0 });
        assert_eq!(c.total_frames(), Some(10));
    }
}
