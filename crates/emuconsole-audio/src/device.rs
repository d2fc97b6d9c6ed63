use std::time::{Duration, Instant};

use crate::error::AudioError;

/// Shape of an output stream: signed 16-bit native-endian samples,
/// interleaved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceSpec {
    pub frequency: u32,
    pub channels: u16,
    /// Frames per callback.
    pub samples: u32,
}

/// Called on the device's own thread with the bytes it wants filled.
pub type AudioCallback = Box<dyn FnMut(&mut [u8]) + Send + 'static>;

/// A platform output device driven by a pull callback.
///
/// Implementations report the stream they actually opened, which may differ
/// from the one asked for. A freshly opened device is paused.
pub trait OutputDevice {
    fn open(&mut self, desired: &DeviceSpec, callback: AudioCallback)
    -> Result<DeviceSpec, AudioError>;

    fn pause(&mut self, paused: bool);

    fn close(&mut self);
}

/// Millisecond time source and sleep used by the pacing loop.
pub trait Clock: Send + Sync {
    fn ticks_ms(&self) -> u64;

    fn delay(&self, duration: Duration);
}

/// Wall clock counting from its own creation.
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn ticks_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn delay(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
