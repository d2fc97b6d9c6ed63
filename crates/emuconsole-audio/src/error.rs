use thiserror::Error;

/// Errors that prevent an audio backend from being built or a device from
/// being opened.
///
/// Buffer overflows and underflows are not errors: the sink absorbs them,
/// logs them and counts them in [`SinkStats`](crate::sink::SinkStats).
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("unknown {kind} '{name}'")]
    UnknownFactory { kind: &'static str, name: String },

    #[error("invalid audio configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to allocate {bytes} bytes of audio buffer")]
    Allocation { bytes: usize },

    #[error("audio device error: {0}")]
    Device(String),
}

impl AudioError {
    /// Whether this error comes from a bad name or size in the configuration
    /// rather than from the system.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::UnknownFactory { .. } | Self::InvalidConfig(_))
    }
}
