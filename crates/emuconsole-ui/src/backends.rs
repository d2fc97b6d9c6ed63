use std::sync::Arc;

use emuconsole_audio::registry::{Factory, lookup};
use emuconsole_audio::{
    AudioBackend, AudioError, AudioSink, DummyBackend, SinkConfig, SystemClock,
};

use crate::audio::CpalDevice;

pub const DEFAULT_BACKEND: &str = "cpal";

fn new_dummy(_: &SinkConfig) -> Result<Box<dyn AudioBackend>, AudioError> {
    Ok(Box::new(DummyBackend))
}

fn new_cpal(config: &SinkConfig) -> Result<Box<dyn AudioBackend>, AudioError> {
    let sink = AudioSink::new(CpalDevice::new(), config, Arc::new(SystemClock::new()))?;
    Ok(Box::new(sink))
}

/// Audio backends selectable with `--backend`, in display order.
pub static AUDIO_BACKEND_FACTORIES: &[Factory<dyn AudioBackend, SinkConfig>] = &[
    Factory {
        name: "dummy",
        init: new_dummy,
    },
    Factory {
        name: "cpal",
        init: new_cpal,
    },
];

pub fn create_backend(name: &str, config: &SinkConfig) -> Result<Box<dyn AudioBackend>, AudioError> {
    let factory = lookup(AUDIO_BACKEND_FACTORIES, name).ok_or_else(|| {
        AudioError::UnknownFactory {
            kind: "audio backend",
            name: name.to_string(),
        }
    })?;
    factory.create(config)
}
