use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use framescope_core::playback::controller::PlaybackController;
use framescope_core::record::infrastructure::png_sequence_recorder::PngSequenceRecorder;

/// Headless player/recorder for video sources.
///
/// Opens a source URI (a media file path, or `test://` for a synthetic
/// pattern), pumps frames until the end of the stream, a frame budget
/// or SIGINT/SIGTERM, and optionally persists grabbed frames as a PNG
/// sequence.
#[derive(Parser)]
#[command(name = "framescope")]
struct Cli {
    /// Source URI: a media file path or `test://[?n=K&fps=N]`.
    input: String,

    /// Record grabbed frames as PNGs into this directory.
    #[arg(long)]
    record_dir: Option<PathBuf>,

    /// Persist only every Nth grabbed frame while recording.
    #[arg(long, default_value = "1")]
    every_nth: usize,

    /// Seek to this frame before playback (seekable sources only).
    #[arg(long)]
    start: Option<i64>,

    /// Stop after grabbing this many frames.
    #[arg(long)]
    max_frames: Option<u64>,

    /// Do not block waiting for the next frame; misses are skipped.
    #[arg(long)]
    no_wait: bool,

    /// Skip past buffered frames to the newest available one.
    #[arg(long)]
    discard_stale: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let record_dir = cli
        .record_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("captures"));
    let recorder = PngSequenceRecorder::new(&record_dir);

    let controller = Arc::new(PlaybackController::new(Box::new(recorder)));
    controller.set_record_every_nth(cli.every_nth);
    controller.open_input(&cli.input)?;

    for info in controller.stream_info() {
        println!(
            "stream {}: {} x {} {} (pitch: {} bytes)",
            info.index, info.width, info.height, info.format, info.pitch
        );
    }
    if let Some(total) = controller.total_frames() {
        println!("video length: {total} frames");
    }

    if cli.no_wait {
        controller.toggle_wait_for_frames();
    }
    if cli.discard_stale {
        controller.toggle_discard_stale_frames();
    }
    if cli.record_dir.is_some() {
        println!("recording to {}", record_dir.display());
        controller.toggle_record();
    }

    if let Some(start) = cli.start {
        if controller.is_seekable() {
            controller.request_seek(start);
        } else {
            log::warn!("--start ignored: source is not seekable");
        }
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))?;
    }

    let mut grabbed: u64 = 0;

    // land on frame 0 (or the --start target), then free-run
    if controller.tick(|_, _, _| {}) {
        grabbed += 1;
    }
    if controller.is_seekable() {
        controller.toggle_play();
    }

    while !stop.load(Ordering::SeqCst) {
        if cli.max_frames.is_some_and(|max| grabbed >= max) {
            break;
        }

        if controller.tick(|_, _, _| {}) {
            grabbed += 1;
        } else if controller.is_seekable() {
            // end of a file-backed stream
            break;
        } else {
            // live source has nothing new this tick
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    if controller.is_recording() {
        controller.toggle_record();
    }
    controller.close();

    println!("grabbed {grabbed} frame(s)");
    Ok(())
}
