use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use crate::playback::controller::PlaybackController;
use crate::shared::frame::Frame;

/// Events emitted by the pump thread towards the display surface.
pub enum PumpEvent {
    /// One successful grab: an owned copy of every stream's pixels.
    Frames(Vec<Frame>),
}

/// Drives [`PlaybackController::tick`] on a dedicated thread at a fixed
/// cadence, forwarding grabbed frames over a bounded channel.
///
/// The channel holds two grabs; if the consumer falls behind, newer
/// frames replace delivery rather than block the pump (a viewer shows
/// the latest picture, it does not backlog). The stop flag is checked
/// once per iteration, between grabs, so shutdown is prompt without
/// interrupting an in-flight grab.
pub struct FramePump {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FramePump {
    pub fn spawn(
        controller: Arc<PlaybackController>,
        tick_interval: Duration,
    ) -> (Self, Receiver<PumpEvent>) {
        let (tx, rx) = crossbeam_channel::bounded(2);
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();

        let handle = thread::spawn(move || {
            while !thread_stop.load(Ordering::Relaxed) {
                let started = Instant::now();

                controller.tick(|index, streams, buffer| {
                    let frames = streams
                        .iter()
                        .map(|info| Frame::from_stream(info, buffer, index))
                        .collect();
                    // full channel means the consumer is behind; drop
                    let _ = tx.try_send(PumpEvent::Frames(frames));
                });

                if let Some(remaining) = tick_interval.checked_sub(started.elapsed()) {
                    thread::sleep(remaining);
                }
            }
        });

        (
            Self {
                stop,
                handle: Some(handle),
            },
            rx,
        )
    }

    /// Requests cooperative shutdown; usable from signal handlers.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Stops the pump and joins its thread. The current tick finishes;
    /// a grab in flight is never interrupted.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FramePump {
    fn drop(&mut self) {
        self.stop();
    }
}
