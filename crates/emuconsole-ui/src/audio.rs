use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample};
use emuconsole_audio::{AudioCallback, AudioError, DeviceSpec, OutputDevice};
use log::{debug, error, warn};

/// Default host output device, opened through `cpal`.
///
/// The stream only exists while the device is open; dropping it closes the
/// device.
#[derive(Default)]
pub struct CpalDevice {
    stream: Option<cpal::Stream>,
}

impl CpalDevice {
    pub fn new() -> Self {
        Self::default()
    }
}

fn device_error(e: impl std::fmt::Display) -> AudioError {
    AudioError::Device(e.to_string())
}

fn stream_config(supported: &cpal::SupportedStreamConfig, samples: u32) -> cpal::StreamConfig {
    let buffer_size = match supported.buffer_size() {
        cpal::SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&samples) => {
            cpal::BufferSize::Fixed(samples)
        }
        _ => cpal::BufferSize::Default,
    };
    cpal::StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size,
    }
}

/// Pick a config carrying the desired rate and channel count, or fall back to
/// whatever the device prefers.
fn choose_config(
    device: &cpal::Device,
    desired: &DeviceSpec,
) -> Result<(cpal::StreamConfig, SampleFormat), AudioError> {
    let rate = cpal::SampleRate(desired.frequency);
    let ranges: Vec<_> = device
        .supported_output_configs()
        .map_err(device_error)?
        .collect();

    for format in [SampleFormat::I16, SampleFormat::F32, SampleFormat::U16] {
        let found = ranges.iter().find(|r| {
            r.channels() == desired.channels
                && r.sample_format() == format
                && r.min_sample_rate() <= rate
                && rate <= r.max_sample_rate()
        });
        if let Some(range) = found {
            let supported = range.clone().with_sample_rate(rate);
            return Ok((stream_config(&supported, desired.samples), format));
        }
    }

    let supported = device.default_output_config().map_err(device_error)?;
    debug!(
        "no {}Hz stereo output config, using device default {:?}",
        desired.frequency, supported
    );
    Ok((
        stream_config(&supported, desired.samples),
        supported.sample_format(),
    ))
}

/// Output stream that asks `callback` for interleaved stereo i16 and spreads
/// it over the device's real sample type and channel count.
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut callback: AudioCallback,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample + FromSample<i16>,
{
    let channels = config.channels as usize;
    let mut scratch: Vec<i16> = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels;
                scratch.resize(frames * 2, 0);
                callback(bytemuck::cast_slice_mut(&mut scratch));

                for (frame, lr) in data.chunks_mut(channels).zip(scratch.chunks_exact(2)) {
                    if channels == 1 {
                        let mid = ((i32::from(lr[0]) + i32::from(lr[1])) / 2) as i16;
                        frame[0] = T::from_sample(mid);
                        continue;
                    }
                    frame[0] = T::from_sample(lr[0]);
                    frame[1] = T::from_sample(lr[1]);
                    for s in &mut frame[2..] {
                        *s = T::EQUILIBRIUM;
                    }
                }
            },
            |err| error!("cpal stream error: {err}"),
            None,
        )
        .map_err(device_error)
}

impl OutputDevice for CpalDevice {
    fn open(
        &mut self,
        desired: &DeviceSpec,
        callback: AudioCallback,
    ) -> Result<DeviceSpec, AudioError> {
        self.close();

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::Device("no output device available".into()))?;
        let (config, format) = choose_config(&device, desired)?;

        let stream = match format {
            SampleFormat::I16 => build_stream::<i16>(&device, &config, callback)?,
            SampleFormat::F32 => build_stream::<f32>(&device, &config, callback)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, callback)?,
            other => {
                return Err(AudioError::Device(format!(
                    "unsupported sample format {other}"
                )));
            }
        };

        // Streams may start running on creation; the sink resumes it when
        // enough data is queued.
        if let Err(e) = stream.pause() {
            warn!("could not pause new audio stream: {e}");
        }
        self.stream = Some(stream);

        Ok(DeviceSpec {
            frequency: config.sample_rate.0,
            channels: config.channels,
            samples: match config.buffer_size {
                cpal::BufferSize::Fixed(n) => n,
                cpal::BufferSize::Default => desired.samples,
            },
        })
    }

    fn pause(&mut self, paused: bool) {
        let Some(stream) = &self.stream else {
            return;
        };
        let result = if paused {
            stream.pause().map_err(|e| e.to_string())
        } else {
            stream.play().map_err(|e| e.to_string())
        };
        if let Err(e) = result {
            warn!("audio stream {} failed: {e}", if paused { "pause" } else { "play" });
        }
    }

    fn close(&mut self) {
        self.stream = None;
    }
}
