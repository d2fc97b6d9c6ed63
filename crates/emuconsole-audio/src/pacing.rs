//! Producer/consumer synchronization between the emulation thread and the
//! device callback.
//!
//! After every push the sink predicts how many output bytes will be ready
//! when the device next asks for data, and either throttles the producer,
//! pauses the device, or lets both run.

use std::time::Duration;

use crate::resampler::FRAME_SIZE;

/// Snapshot of the sink state the estimate is computed from.
#[derive(Clone, Copy, Debug)]
pub struct PacingInput {
    /// Bytes waiting in the ring buffer, at the input rate.
    pub available: usize,
    pub input_frequency: u32,
    pub output_frequency: u32,
    pub speed_factor: u32,
    pub secondary_buffer_size: usize,
    pub last_callback_ms: u64,
    pub now_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacingAction {
    /// Producer is ahead: keep the device running and sleep the producer.
    Throttle(Duration),
    /// Producer is behind: stop consumption until the buffer builds up.
    Pause,
    /// Within tolerance: keep the device running.
    Resume,
}

/// Output-rate bytes expected to be consumable at the next device callback.
pub fn estimate_consumable_size(input: &PacingInput) -> usize {
    let out = u64::from(input.output_frequency);
    let divisor = u64::from(input.input_frequency) * u64::from(input.speed_factor);
    if out == 0 || divisor == 0 {
        return 0;
    }

    let current = input.available as u64 * out * 100 / divisor;

    let period_ms = 1000 * (input.secondary_buffer_size / FRAME_SIZE) as u64 / out;
    let expected_cb_ms = input.last_callback_ms + period_ms;

    let mut expected = current;
    if input.now_ms < expected_cb_ms {
        expected += (expected_cb_ms - input.now_ms) * out * FRAME_SIZE as u64 / 1000;
    }
    expected as usize
}

/// Three-way decision on an estimate from [`estimate_consumable_size`].
pub fn decide(
    expected: usize,
    target: usize,
    secondary_buffer_size: usize,
    output_frequency: u32,
) -> PacingAction {
    let out = output_frequency as usize;
    if expected >= target + out / 100 {
        let wait_ms = if out == 0 {
            0
        } else {
            (expected - target) as u64 * 1000 / (FRAME_SIZE * out) as u64
        };
        PacingAction::Throttle(Duration::from_millis(wait_ms))
    } else if expected < secondary_buffer_size {
        PacingAction::Pause
    } else {
        PacingAction::Resume
    }
}
