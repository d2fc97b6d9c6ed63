//! Audio output pipeline of the emulator console front-end.
//!
//! The emulation core pushes 16-bit stereo samples at its own rate; an
//! [`AudioSink`](sink::AudioSink) buffers them, resamples them for the output
//! device from the device's callback thread, and paces the core against the
//! device so neither side drifts into overflow or underflow. Platform devices
//! plug in through [`OutputDevice`](device::OutputDevice).

/// Core-facing backend trait and the silent backend.
pub mod backend;

/// Sink buffer sizing.
pub mod config;

/// Output device and clock seams.
pub mod device;

pub mod error;

/// Producer throttling decisions.
pub mod pacing;

/// Name-keyed factory tables.
pub mod registry;

/// Sample-rate conversion.
pub mod resampler;

/// Mirrored byte ring between the core and the device callback.
pub mod ring_buffer;

/// The audio sink proper.
pub mod sink;

pub use backend::{AudioBackend, DummyBackend};
pub use config::SinkConfig;
pub use device::{AudioCallback, Clock, DeviceSpec, OutputDevice, SystemClock};
pub use error::AudioError;
pub use sink::{AudioSink, SinkState, SinkStats};
