mod audio;
mod backends;
mod commands;
mod console_config;
mod core_thread;
mod screenshot;
mod source;

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use clap::Parser;
use crossbeam_channel::Sender;
use emuconsole_audio::registry::names;
use emuconsole_audio::resampler::RESAMPLER_FACTORIES;
use log::{error, info, warn};

use crate::backends::AUDIO_BACKEND_FACTORIES;
use crate::commands::{Command, parse_command};
use crate::console_config::ConsoleConfig;
use crate::core_thread::CoreOptions;
use crate::source::{PcmReader, SampleSource, ToneGenerator};

#[derive(Parser, Debug)]
#[command(version, about = "Headless emulator console with audio output")]
struct Args {
    /// Raw 16-bit little-endian stereo PCM to play instead of a test tone
    input: Option<PathBuf>,

    /// Path to the console configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Audio backend to use
    #[arg(long)]
    backend: Option<String>,

    /// Resampler used by the audio sink
    #[arg(long)]
    resampler: Option<String>,

    /// Playback speed in percent
    #[arg(long)]
    speed: Option<u32>,

    /// Keep the left and right channels in their original order
    #[arg(long)]
    no_swap: bool,

    /// Sample rate the emulated core produces, in Hz
    #[arg(long, default_value_t = 32000)]
    frequency: u32,

    /// Pitch of the test tone, in Hz
    #[arg(long, default_value_t = 440)]
    tone: u32,

    /// Stop after this many seconds of audio
    #[arg(long)]
    seconds: Option<u64>,

    /// Print the available audio backends and resamplers and exit
    #[arg(long)]
    list_backends: bool,
}

impl Args {
    /// Fold command line overrides into the file configuration.
    fn apply(&self, config: &mut ConsoleConfig) {
        if let Some(backend) = &self.backend {
            config.audio.backend = backend.clone();
        }
        if let Some(resampler) = &self.resampler {
            config.audio.resampler = resampler.clone();
        }
        if let Some(speed) = self.speed {
            config.audio.speed_factor = speed;
        }
        if self.no_swap {
            config.audio.swap_channels = false;
        }
    }

    fn game_name(&self) -> String {
        self.input
            .as_deref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "tone".to_string())
    }

    fn open_source(&self) -> std::io::Result<Box<dyn SampleSource>> {
        let source: Box<dyn SampleSource> = match &self.input {
            Some(path) => Box::new(PcmReader::open(path)?),
            None => Box::new(ToneGenerator::new(self.tone, self.frequency)),
        };
        Ok(source)
    }
}

fn spawn_command_reader(tx: Sender<Command>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                None => warn!("Unknown command '{}'", line.trim()),
            }
        }
    });
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.list_backends {
        println!("audio backends: {}", names(AUDIO_BACKEND_FACTORIES).join(", "));
        println!("resamplers: {}", names(RESAMPLER_FACTORIES).join(", "));
        return ExitCode::SUCCESS;
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(console_config::default_config_path);
    let mut config = console_config::load_from_file(&config_path);
    args.apply(&mut config);

    let source = match args.open_source() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open sample input: {e}");
            return ExitCode::FAILURE;
        }
    };

    let options = CoreOptions {
        backend: config.audio.backend.clone(),
        sink: config.audio.sink_config(),
        speed_factor: config.audio.speed_factor,
        frequency: args.frequency,
        seconds: args.seconds,
        game_name: args.game_name(),
        screenshot_dir: config.screenshot_dir(),
    };

    let (tx, rx) = crossbeam_channel::unbounded();
    spawn_command_reader(tx);

    let handle = match core_thread::spawn(options, source, rx) {
        Ok(h) => h,
        Err(e) => {
            error!("Failed to start emulation thread: {e}");
            return ExitCode::FAILURE;
        }
    };

    match handle.join() {
        Ok(Ok(summary)) => {
            info!(
                "Emulation finished after {} frames{}",
                summary.frames_pushed,
                if summary.stopped { " (stopped)" } else { "" }
            );
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            error!("Emulation failed: {e}");
            ExitCode::FAILURE
        }
        Err(_) => {
            error!("Emulation thread panicked");
            ExitCode::FAILURE
        }
    }
}
