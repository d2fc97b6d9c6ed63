use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, error, info, trace, warn};

use crate::config::SinkConfig;
use crate::device::{Clock, DeviceSpec, OutputDevice};
use crate::error::AudioError;
use crate::pacing::{self, PacingAction, PacingInput};
use crate::registry::lookup;
use crate::resampler::{FRAME_SIZE, RESAMPLER_FACTORIES, Resampler};
use crate::ring_buffer::RingBuffer;

pub const DEFAULT_SPEED_FACTOR: u32 = 100;
pub const MIN_SPEED_FACTOR: u32 = 1;
pub const MAX_SPEED_FACTOR: u32 = 1000;

/// Lowest standard device rate that can carry `input_frequency`.
pub fn select_output_frequency(input_frequency: u32) -> u32 {
    if input_frequency <= 11025 {
        11025
    } else if input_frequency <= 22050 {
        22050
    } else {
        44100
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkState {
    /// No format received yet.
    Uninitialized,
    Configured,
    /// The device could not be opened. Pushed samples are discarded until the
    /// sink is dropped and rebuilt.
    Error,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub overflows: u64,
    pub underflows: u64,
    pub buffered_bytes: usize,
}

/// Everything the device callback touches. Guarded by the device lock.
struct Playback {
    buffer: RingBuffer,
    resampler: Box<dyn Resampler>,
    input_frequency: u32,
    output_frequency: u32,
    speed_factor: u32,
    last_callback_ms: Option<u64>,
    overflows: u64,
    underflows: u64,
}

impl Playback {
    /// Device callback body: resample buffered input into `stream`, or emit
    /// silence if there is not enough of it.
    fn fill(&mut self, stream: &mut [u8], now_ms: u64) {
        self.last_callback_ms = Some(now_ms);

        let input = u64::from(self.input_frequency);
        let output = u64::from(self.output_frequency) * 100 / u64::from(self.speed_factor);
        if input == 0 || output == 0 {
            stream.fill(0);
            return;
        }

        let needed = (stream.len() as u64 * input / output) as usize;
        let available = self.buffer.len();
        if available == 0 || available < needed {
            self.underflows += 1;
            debug!("audio buffer underflow: needed {needed} available {available}");
            stream.fill(0);
            return;
        }

        let consumed = self.resampler.resample(
            self.buffer.tail(),
            self.input_frequency,
            stream,
            output as u32,
        );
        self.buffer.consume(consumed.min(available));
    }
}

fn lock(shared: &Mutex<Playback>) -> MutexGuard<'_, Playback> {
    // Poisoning only means a callback panicked; the ring state is still valid.
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Copy `src` into `dst`, exchanging the left and right 16-bit samples of
/// every frame.
fn copy_swap_lr16(dst: &mut [u8], src: &[u8]) {
    let frames = src.len() / FRAME_SIZE * FRAME_SIZE;
    for (d, s) in dst[..frames]
        .chunks_exact_mut(FRAME_SIZE)
        .zip(src[..frames].chunks_exact(FRAME_SIZE))
    {
        d[0] = s[2];
        d[1] = s[3];
        d[2] = s[0];
        d[3] = s[1];
    }
    dst[frames..src.len()].copy_from_slice(&src[frames..]);
}

/// Audio output for the emulation core: buffers pushed samples, feeds the
/// output device from its callback and paces the pushing thread against it.
pub struct AudioSink<D: OutputDevice> {
    device: D,
    clock: Arc<dyn Clock>,
    shared: Arc<Mutex<Playback>>,
    target: usize,
    secondary_buffer_size: usize,
    swap_channels: bool,
    state: SinkState,
    device_open: bool,
    paused: bool,
}

impl<D: OutputDevice> AudioSink<D> {
    pub fn new(device: D, config: &SinkConfig, clock: Arc<dyn Clock>) -> Result<Self, AudioError> {
        let factory = lookup(RESAMPLER_FACTORIES, &config.resampler).ok_or_else(|| {
            error!("Couldn't find resampler factory: {}", config.resampler);
            AudioError::UnknownFactory {
                kind: "resampler",
                name: config.resampler.clone(),
            }
        })?;

        config.validate()?;
        let buffer = RingBuffer::new(config.primary_buffer_size)?;
        let resampler = factory.create(&())?;

        Ok(Self {
            device,
            clock,
            shared: Arc::new(Mutex::new(Playback {
                buffer,
                resampler,
                input_frequency: 0,
                output_frequency: 0,
                speed_factor: DEFAULT_SPEED_FACTOR,
                last_callback_ms: None,
                overflows: 0,
                underflows: 0,
            })),
            target: config.target,
            secondary_buffer_size: config.secondary_buffer_size,
            swap_channels: config.swap_channels,
            state: SinkState::Uninitialized,
            device_open: false,
            paused: true,
        })
    }

    pub fn state(&self) -> SinkState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn input_frequency(&self) -> u32 {
        lock(&self.shared).input_frequency
    }

    pub fn output_frequency(&self) -> u32 {
        lock(&self.shared).output_frequency
    }

    pub fn speed_factor(&self) -> u32 {
        lock(&self.shared).speed_factor
    }

    pub fn stats(&self) -> SinkStats {
        let pb = lock(&self.shared);
        SinkStats {
            overflows: pb.overflows,
            underflows: pb.underflows,
            buffered_bytes: pb.buffer.len(),
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Change the playback speed, in percent of real time.
    pub fn set_speed_factor(&mut self, percent: u32) {
        let percent = percent.clamp(MIN_SPEED_FACTOR, MAX_SPEED_FACTOR);
        let mut pb = lock(&self.shared);
        if pb.speed_factor != percent {
            info!("Audio speed factor {}% -> {percent}%", pb.speed_factor);
            pb.speed_factor = percent;
        }
    }

    /// New input format from the core. Reopens the output device at the
    /// matching standard rate.
    pub fn set_format(&mut self, frequency: u32, bits: u32) -> Result<(), AudioError> {
        if self.state == SinkState::Error {
            warn!("Ignoring audio format change to {frequency}Hz: audio device is in error state");
            return Err(AudioError::Device("audio device is in error state".into()));
        }

        // Samples are treated as 16 bits whatever the core says.
        if bits != 16 {
            warn!("Incoming samples are not 16 bits ({bits})");
        }

        lock(&self.shared).input_frequency = frequency;
        self.open_device(frequency)
    }

    fn open_device(&mut self, input_frequency: u32) -> Result<(), AudioError> {
        self.close_device();

        let desired = DeviceSpec {
            frequency: select_output_frequency(input_frequency),
            channels: 2,
            samples: (self.secondary_buffer_size / FRAME_SIZE) as u32,
        };

        let shared = Arc::clone(&self.shared);
        let clock = Arc::clone(&self.clock);
        let callback = Box::new(move |stream: &mut [u8]| {
            let now = clock.ticks_ms();
            lock(&shared).fill(stream, now);
        });

        let obtained = match self.device.open(&desired, callback) {
            Ok(spec) => spec,
            Err(e) => {
                error!("Failed to open the audio device: {e}");
                self.state = SinkState::Error;
                return Err(e);
            }
        };
        self.device_open = true;
        self.paused = true;

        let now = self.clock.ticks_ms();
        {
            let mut pb = lock(&self.shared);
            pb.output_frequency = obtained.frequency;
            pb.last_callback_ms.get_or_insert(now);
        }
        self.state = SinkState::Configured;

        info!(
            "Audio device initialized: freq={}Hz (input freq={}Hz)",
            obtained.frequency, input_frequency
        );
        Ok(())
    }

    fn close_device(&mut self) {
        if self.device_open {
            self.device.pause(true);
            self.device.close();
            self.device_open = false;
            self.paused = true;
        }
    }

    /// Queue raw 16-bit stereo samples from the core, then pace the calling
    /// thread against the device.
    pub fn push_samples(&mut self, samples: &[u8]) {
        if self.state != SinkState::Configured {
            return;
        }

        {
            let mut pb = lock(&self.shared);
            if pb.input_frequency == 0 || pb.output_frequency == 0 {
                return;
            }

            let swap = self.swap_channels;
            let head = pb.buffer.head();
            let available = head.len();
            if samples.len() > available {
                debug!(
                    "Audio buffer overflow. Requested {} Available {available}",
                    samples.len()
                );
                pb.overflows += 1;
            } else {
                let dst = &mut head[..samples.len()];
                if swap {
                    copy_swap_lr16(dst, samples);
                } else {
                    dst.copy_from_slice(samples);
                }
                pb.buffer.produce(samples.len());
            }
        }

        self.synchronize();
    }

    fn synchronize(&mut self) {
        let input = {
            let pb = lock(&self.shared);
            PacingInput {
                available: pb.buffer.len(),
                input_frequency: pb.input_frequency,
                output_frequency: pb.output_frequency,
                speed_factor: pb.speed_factor,
                secondary_buffer_size: self.secondary_buffer_size,
                last_callback_ms: pb.last_callback_ms.unwrap_or(0),
                now_ms: self.clock.ticks_ms(),
            }
        };

        let expected = pacing::estimate_consumable_size(&input);
        match pacing::decide(
            expected,
            self.target,
            self.secondary_buffer_size,
            input.output_frequency,
        ) {
            PacingAction::Throttle(wait) => {
                trace!("audio ahead by {} bytes, waiting {wait:?}", expected - self.target);
                self.set_paused(false);
                self.clock.delay(wait);
            }
            PacingAction::Pause => {
                trace!("audio behind ({expected} bytes expected), pausing device");
                self.set_paused(true);
            }
            PacingAction::Resume => self.set_paused(false),
        }
    }

    fn set_paused(&mut self, paused: bool) {
        if self.device_open && self.paused != paused {
            self.device.pause(paused);
            self.paused = paused;
        }
    }
}

impl<D: OutputDevice> Drop for AudioSink<D> {
    fn drop(&mut self) {
        self.close_device();
    }
}
