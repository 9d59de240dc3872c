use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use iced::keyboard::key::{Key, Named};
use iced::widget::{button, column, container, image, row, slider, text, text_input};
use iced::{Element, Length, Subscription, Task};

use framescope_core::playback::controller::PlaybackController;
use framescope_core::playback::keymap::{command_for_key, ViewerCommand};
use framescope_core::playback::pump::{FramePump, PumpEvent};
use framescope_core::record::infrastructure::png_sequence_recorder::PngSequenceRecorder;

use crate::settings::Settings;

/// How often the UI drains the pump channel and refreshes its state.
const POLL_INTERVAL: Duration = Duration::from_millis(33);

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Message {
    SelectInput,
    InputSelected(Option<PathBuf>),
    UriChanged(String),
    OpenUri,
    CloseInput,
    Poll,
    KeyPressed(char),
    SliderMoved(i64),
    OpenCapturesFolder,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    controller: Arc<PlaybackController>,
    pump: Option<FramePump>,
    frames_rx: Option<Receiver<PumpEvent>>,
    handles: Vec<Option<image::Handle>>,
    visible: Vec<bool>,
    slider_pos: i64,
    status: String,
    uri: String,
    settings: Settings,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let settings = Settings::load();

        let recorder = PngSequenceRecorder::new(&settings.capture_dir);
        let controller = Arc::new(PlaybackController::new(Box::new(recorder)));
        controller.set_record_every_nth(settings.record_every_nth);

        let uri = settings.last_input.clone().unwrap_or_default();

        (
            Self {
                controller,
                pump: None,
                frames_rx: None,
                handles: Vec::new(),
                visible: Vec::new(),
                slider_pos: 0,
                status: String::from("open a file or enter a URI (try test://)"),
                uri,
                settings,
            },
            Task::none(),
        )
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SelectInput => {
                return Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .set_title("Open video")
                            .add_filter("Media Files", &["mp4", "avi", "mov", "mkv", "webm"])
                            .pick_file()
                            .await
                            .map(|h| h.path().to_path_buf())
                    },
                    Message::InputSelected,
                );
            }
            Message::InputSelected(Some(path)) => {
                let uri = path.to_string_lossy().to_string();
                self.uri = uri.clone();
                self.open(&uri);
            }
            Message::InputSelected(None) => {}
            Message::UriChanged(uri) => {
                self.uri = uri;
            }
            Message::OpenUri => {
                let uri = self.uri.clone();
                if !uri.is_empty() {
                    self.open(&uri);
                }
            }
            Message::CloseInput => {
                self.close_input();
                self.status = String::from("closed");
            }
            Message::Poll => {
                self.drain_frames();
                self.slider_pos = self.controller.position();
                self.refresh_status();
            }
            Message::KeyPressed(key) => {
                if let Some(command) = command_for_key(key) {
                    self.dispatch(command);
                }
            }
            Message::SliderMoved(frame) => {
                // the slider both reflects and drives the playhead
                self.slider_pos = frame;
                self.controller.request_seek(frame);
            }
            Message::OpenCapturesFolder => {
                let _ = std::fs::create_dir_all(&self.settings.capture_dir);
                let _ = open::that(&self.settings.capture_dir);
            }
        }
        Task::none()
    }

    fn open(&mut self, uri: &str) {
        self.close_input();

        if let Err(e) = self.controller.open_input(uri) {
            log::error!("failed to open {uri}: {e}");
            self.status = format!("failed to open {uri}: {e}");
            return;
        }

        let streams = self.controller.stream_info();
        self.handles = vec![None; streams.len()];
        self.visible = vec![true; streams.len()];
        self.slider_pos = 0;

        let fps = self.controller.nominal_fps().unwrap_or(30.0).clamp(1.0, 240.0);
        let interval = Duration::from_secs_f64(1.0 / fps);
        let (pump, rx) = FramePump::spawn(self.controller.clone(), interval);
        self.pump = Some(pump);
        self.frames_rx = Some(rx);

        self.settings.last_input = Some(uri.to_string());
        self.settings.save();
        self.refresh_status();
    }

    fn close_input(&mut self) {
        if let Some(mut pump) = self.pump.take() {
            pump.stop();
        }
        self.frames_rx = None;
        self.controller.close();
        self.handles.clear();
        self.visible.clear();
        self.slider_pos = 0;
    }

    /// Keeps only the newest delivery; the pump may have outpaced us.
    fn drain_frames(&mut self) {
        let Some(rx) = &self.frames_rx else {
            return;
        };
        let mut latest = None;
        while let Ok(event) = rx.try_recv() {
            latest = Some(event);
        }
        if let Some(PumpEvent::Frames(frames)) = latest {
            for (i, frame) in frames.iter().enumerate() {
                if i < self.handles.len() {
                    self.handles[i] = Some(image::Handle::from_rgba(
                        frame.width(),
                        frame.height(),
                        frame.to_rgba(),
                    ));
                }
            }
        }
    }

    fn dispatch(&mut self, command: ViewerCommand) {
        match command {
            ViewerCommand::TogglePlay => self.controller.toggle_play(),
            ViewerCommand::ToggleRecord => self.controller.toggle_record(),
            ViewerCommand::ToggleWaitForFrames => self.controller.toggle_wait_for_frames(),
            ViewerCommand::ToggleDiscardStaleFrames => {
                self.controller.toggle_discard_stale_frames()
            }
            ViewerCommand::Skip(delta) => self.controller.skip(delta),
            ViewerCommand::RecordOneFrame => {
                self.controller.record_one_frame();
                self.status = String::from("recording next frame");
            }
            ViewerCommand::ToggleStream(i) => {
                if let Some(v) = self.visible.get_mut(i) {
                    *v = !*v;
                }
            }
            ViewerCommand::SnapshotStream(i) => {
                match self
                    .controller
                    .snapshot_stream(i, &self.settings.capture_dir)
                {
                    Ok(path) => self.status = format!("saved {}", path.display()),
                    Err(e) => self.status = format!("snapshot failed: {e}"),
                }
            }
        }
        self.refresh_status();
    }

    fn refresh_status(&mut self) {
        if !self.controller.has_source() {
            return;
        }

        let position = self.controller.position();
        let mut parts = vec![match self.controller.total_frames() {
            Some(total) => format!("frame {position} / {total}"),
            None => format!("frame {position}"),
        }];
        parts.push(String::from(if self.controller.is_playing() {
            "playing"
        } else {
            "paused"
        }));
        if self.controller.is_recording() {
            parts.push(String::from("\u{25cf} REC"));
        }
        if !self.controller.waits_for_frames() {
            parts.push(String::from("no-wait"));
        }
        if self.controller.discards_stale_frames() {
            parts.push(String::from("discarding stale"));
        }
        self.status = parts.join("  |  ");
    }

    pub fn view(&self) -> Element<'_, Message> {
        let toolbar = row![
            button(text("Open File\u{2026}").size(13)).on_press(Message::SelectInput),
            text_input("path or test://?n=2&fps=30", &self.uri)
                .on_input(Message::UriChanged)
                .on_submit(Message::OpenUri)
                .size(13)
                .width(Length::Fill),
            button(text("Open").size(13)).on_press(Message::OpenUri),
            button(text("Close").size(13)).on_press(Message::CloseInput),
            button(text("Captures").size(13)).on_press(Message::OpenCapturesFolder),
        ]
        .spacing(8);

        let streams: Element<'_, Message> = if self.handles.is_empty() {
            container(text("no source open").size(16))
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into()
        } else {
            row(self
                .handles
                .iter()
                .zip(&self.visible)
                .filter(|(_, visible)| **visible)
                .map(|(handle, _)| match handle {
                    Some(handle) => image(handle.clone())
                        .width(Length::Fill)
                        .height(Length::Fill)
                        .into(),
                    None => container(text("waiting for frames").size(13))
                        .width(Length::Fill)
                        .height(Length::Fill)
                        .center_x(Length::Fill)
                        .center_y(Length::Fill)
                        .into(),
                })
                .collect::<Vec<_>>())
            .spacing(4)
            .height(Length::Fill)
            .into()
        };

        let mut content = column![toolbar, streams].spacing(8).padding(12);

        if let Some(total) = self.controller.total_frames() {
            let max = (total - 1).max(0) as f64;
            let playhead = slider(0.0..=max, self.slider_pos.max(0) as f64, |v| {
                Message::SliderMoved(v.round() as i64)
            })
            .step(1.0);
            content = content.push(playhead);
        }

        let help = text(
            "space play/pause   , . step   < > skip 30   r record   0 record one   \
             1-9 show/hide stream   shift+1-9 snapshot   w wait   d discard stale",
        )
        .size(11);

        content = content.push(text(&self.status).size(13)).push(help);

        content.into()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let keys = iced::keyboard::on_key_press(|key, _modifiers| match key {
            Key::Character(c) => c.chars().next().map(Message::KeyPressed),
            Key::Named(Named::Space) => Some(Message::KeyPressed(' ')),
            _ => None,
        });

        if self.pump.is_some() {
            Subscription::batch([
                keys,
                iced::time::every(POLL_INTERVAL).map(|_| Message::Poll),
            ])
        } else {
            keys
        }
    }
}
