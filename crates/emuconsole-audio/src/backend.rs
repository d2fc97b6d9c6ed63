use log::{debug, warn};

use crate::device::OutputDevice;
use crate::sink::AudioSink;

/// What the emulation core sees of the audio output.
///
/// Calls come from the core's thread only. Failures are logged, not returned.
pub trait AudioBackend {
    fn set_audio_format(&mut self, frequency: u32, bits: u32);

    fn push_audio_samples(&mut self, samples: &[u8]);

    fn set_speed_factor(&mut self, percent: u32);
}

/// Backend that accepts and discards everything.
#[derive(Debug, Default)]
pub struct DummyBackend;

impl AudioBackend for DummyBackend {
    fn set_audio_format(&mut self, frequency: u32, bits: u32) {
        debug!("dummy audio backend: format {frequency}Hz {bits} bits");
    }

    fn push_audio_samples(&mut self, _samples: &[u8]) {}

    fn set_speed_factor(&mut self, _percent: u32) {}
}

impl<D: OutputDevice> AudioBackend for AudioSink<D> {
    fn set_audio_format(&mut self, frequency: u32, bits: u32) {
        if let Err(e) = self.set_format(frequency, bits) {
            warn!("audio output disabled: {e}");
        }
    }

    fn push_audio_samples(&mut self, samples: &[u8]) {
        self.push_samples(samples);
    }

    fn set_speed_factor(&mut self, percent: u32) {
        AudioSink::set_speed_factor(self, percent);
    }
}
