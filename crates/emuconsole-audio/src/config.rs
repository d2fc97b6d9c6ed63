use crate::error::AudioError;
use crate::resampler::FRAME_SIZE;

/// Buffer sizing and sample handling for an [`AudioSink`](crate::sink::AudioSink).
///
/// All sizes are in bytes of 16-bit stereo input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    /// Ring buffer between the core and the device callback. Power of two.
    pub primary_buffer_size: usize,
    /// Fill level the pacing loop steers towards.
    pub target: usize,
    /// Device-side buffer, one callback's worth.
    pub secondary_buffer_size: usize,
    /// Exchange left and right channels while copying incoming samples.
    pub swap_channels: bool,
    pub resampler: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            primary_buffer_size: 16384 * FRAME_SIZE,
            target: 10240 * FRAME_SIZE,
            secondary_buffer_size: 2048 * FRAME_SIZE,
            swap_channels: true,
            resampler: "trivial".to_string(),
        }
    }
}

impl SinkConfig {
    pub fn validate(&self) -> Result<(), AudioError> {
        if !self.primary_buffer_size.is_power_of_two() {
            return Err(AudioError::InvalidConfig(format!(
                "primary buffer size {} is not a power of two",
                self.primary_buffer_size
            )));
        }
        if self.secondary_buffer_size < FRAME_SIZE {
            return Err(AudioError::InvalidConfig(format!(
                "secondary buffer size {} is smaller than one frame",
                self.secondary_buffer_size
            )));
        }
        if self.secondary_buffer_size / FRAME_SIZE > u32::MAX as usize {
            return Err(AudioError::InvalidConfig(format!(
                "secondary buffer size {} is too large",
                self.secondary_buffer_size
            )));
        }
        if self.target > self.primary_buffer_size {
            return Err(AudioError::InvalidConfig(format!(
                "target {} exceeds primary buffer size {}",
                self.target, self.primary_buffer_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = SinkConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.primary_buffer_size, 65536);
        assert_eq!(cfg.target, 40960);
        assert_eq!(cfg.secondary_buffer_size, 8192);
    }

    #[test]
    fn rejects_bad_sizes() {
        let cfg = SinkConfig {
            primary_buffer_size: 60000,
            ..SinkConfig::default()
        };
        assert!(cfg.validate().unwrap_err().is_configuration());

        let cfg = SinkConfig {
            target: 1 << 20,
            ..SinkConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = SinkConfig {
            secondary_buffer_size: 2,
            ..SinkConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
