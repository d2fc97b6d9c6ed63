use std::io;
use std::path::PathBuf;
use std::thread;

use crossbeam_channel::Receiver;
use emuconsole_audio::resampler::FRAME_SIZE;
use emuconsole_audio::{AudioBackend, AudioError, SinkConfig};
use log::{debug, info, warn};

use crate::backends::create_backend;
use crate::commands::{Command, SpeedControl};
use crate::screenshot::{Screen, ScreenshotSession};
use crate::source::SampleSource;

const VIDEO_FPS: u32 = 60;
pub const SCOPE_WIDTH: u32 = 160;
pub const SCOPE_HEIGHT: u32 = 120;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("audio: {0}")]
    Audio(#[from] AudioError),
    #[error("sample source: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct CoreOptions {
    pub backend: String,
    pub sink: SinkConfig,
    pub speed_factor: u32,
    pub frequency: u32,
    pub seconds: Option<u64>,
    pub game_name: String,
    pub screenshot_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_pushed: u64,
    pub stopped: bool,
}

/// Run the emulation loop on its own thread. The audio backend is created
/// there, since device handles may not leave the thread that opened them.
pub fn spawn(
    options: CoreOptions,
    mut source: Box<dyn SampleSource>,
    commands: Receiver<Command>,
) -> io::Result<thread::JoinHandle<Result<RunSummary, CoreError>>> {
    thread::Builder::new()
        .name("emulation".into())
        .spawn(move || {
            let mut backend = create_backend(&options.backend, &options.sink)?;
            run(backend.as_mut(), &options, source.as_mut(), &commands)
        })
}

/// Feed one video frame's worth of samples per iteration until the source
/// runs dry, the time limit passes or a stop command arrives.
pub fn run(
    backend: &mut dyn AudioBackend,
    options: &CoreOptions,
    source: &mut dyn SampleSource,
    commands: &Receiver<Command>,
) -> Result<RunSummary, CoreError> {
    let mut speed = SpeedControl::new(options.speed_factor);
    backend.set_speed_factor(speed.current());
    backend.set_audio_format(options.frequency, 16);

    let chunk_frames = (options.frequency / VIDEO_FPS).max(1) as u64;
    let limit = options
        .seconds
        .map(|s| s.saturating_mul(u64::from(options.frequency)));
    let mut screenshots = ScreenshotSession::new(&options.screenshot_dir, &options.game_name);
    let mut summary = RunSummary::default();
    let mut chunk = Vec::new();

    info!(
        "Emulating '{}' at {}Hz on the {} backend",
        options.game_name, options.frequency, options.backend
    );

    loop {
        for command in commands.try_iter() {
            match command {
                Command::SpeedDelta(delta) => {
                    speed.adjust(delta);
                    backend.set_speed_factor(speed.current());
                    info!("Speed factor {}%", speed.current());
                }
                Command::FastForward => {
                    speed.toggle_fast_forward();
                    backend.set_speed_factor(speed.current());
                    info!(
                        "Fast forward {}",
                        if speed.is_fast_forward() { "on" } else { "off" }
                    );
                }
                Command::Screenshot => {
                    let pixels = render_scope(&chunk, SCOPE_WIDTH, SCOPE_HEIGHT);
                    let screen = Screen {
                        width: SCOPE_WIDTH,
                        height: SCOPE_HEIGHT,
                        pitch: SCOPE_WIDTH as usize * 3,
                        pixels: &pixels,
                    };
                    if let Err(e) = screenshots.take(&screen) {
                        warn!("Failed to save screenshot: {e}");
                    }
                }
                Command::Stop => {
                    summary.stopped = true;
                    return Ok(summary);
                }
            }
        }

        let mut want = chunk_frames;
        if let Some(limit) = limit {
            if summary.frames_pushed >= limit {
                break;
            }
            want = want.min(limit - summary.frames_pushed);
        }

        let got = source.fill(&mut chunk, want as usize)?;
        if got == 0 {
            debug!("sample source exhausted");
            break;
        }
        backend.push_audio_samples(&chunk[..got * FRAME_SIZE]);
        summary.frames_pushed += got as u64;
    }

    Ok(summary)
}

/// Draw the left channel of `chunk` as an oscilloscope trace. Rows are
/// stored bottom row first.
pub fn render_scope(chunk: &[u8], width: u32, height: u32) -> Vec<u8> {
    const BACKGROUND: [u8; 3] = [0x10, 0x10, 0x18];
    const AXIS: [u8; 3] = [0x30, 0x30, 0x40];
    const TRACE: [u8; 3] = [0x40, 0xE0, 0x60];

    let (w, h) = (width as usize, height as usize);
    let mut pixels = BACKGROUND.repeat(w * h);
    if w == 0 || h == 0 {
        return pixels;
    }

    let mut plot = |x: usize, y: usize, color: [u8; 3]| {
        let at = (y * w + x) * 3;
        pixels[at..at + 3].copy_from_slice(&color);
    };

    for x in 0..w {
        plot(x, h / 2, AXIS);
    }

    let frames = chunk.len() / FRAME_SIZE;
    if frames == 0 {
        return pixels;
    }
    for x in 0..w {
        let at = (x * frames / w) * FRAME_SIZE;
        let left = i16::from_ne_bytes([chunk[at], chunk[at + 1]]);
        let y = (i64::from(left) + 32768) * (h as i64 - 1) / 65535;
        plot(x, y as usize, TRACE);
    }
    pixels
}
