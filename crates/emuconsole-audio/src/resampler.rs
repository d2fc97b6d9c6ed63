use crate::error::AudioError;
use crate::registry::Factory;

/// One stereo frame of signed 16-bit samples.
pub const FRAME_SIZE: usize = 4;

/// Sample-rate converter used by the device callback.
pub trait Resampler: Send {
    /// Fill all of `dst` from `src` and return how many bytes of `src` the
    /// conversion used up.
    ///
    /// The caller retires exactly that many bytes from its buffer, so the next
    /// call starts where this one stopped.
    fn resample(
        &mut self,
        src: &[u8],
        input_frequency: u32,
        dst: &mut [u8],
        output_frequency: u32,
    ) -> usize;
}

/// Sample-and-hold conversion: each output frame is a copy of one input frame.
#[derive(Debug, Default)]
pub struct TrivialResampler;

impl TrivialResampler {
    #[inline]
    fn copy_frame(src: &[u8], src_frames: usize, j: usize, out: &mut [u8]) {
        // Short sources repeat their last frame instead of reading past the end.
        let j = j.min(src_frames - 1) * FRAME_SIZE;
        out.copy_from_slice(&src[j..j + FRAME_SIZE]);
    }
}

impl Resampler for TrivialResampler {
    fn resample(
        &mut self,
        src: &[u8],
        input_frequency: u32,
        dst: &mut [u8],
        output_frequency: u32,
    ) -> usize {
        let src_frames = src.len() / FRAME_SIZE;
        if src_frames == 0 || input_frequency == 0 || output_frequency == 0 {
            dst.fill(0);
            return 0;
        }

        let dst_frames = dst.len() / FRAME_SIZE;
        let out_frames = dst.chunks_exact_mut(FRAME_SIZE);

        let consumed = if output_frequency >= input_frequency {
            // Bresenham: spread the repeated frames evenly over the output.
            let const2 = 2 * i64::from(input_frequency);
            let const1 = const2 - 2 * i64::from(output_frequency);
            let mut criteria = const2 - i64::from(output_frequency);
            let mut j = 0usize;

            for out in out_frames {
                Self::copy_frame(src, src_frames, j, out);
                if criteria >= 0 {
                    j += 1;
                    criteria += const1;
                } else {
                    criteria += const2;
                }
            }
            j
        } else {
            let input = u64::from(input_frequency);
            let output = u64::from(output_frequency);
            for (i, out) in out_frames.enumerate() {
                let j = (i as u64 * input / output) as usize;
                Self::copy_frame(src, src_frames, j, out);
            }
            (dst_frames as u64 * input / output) as usize
        };

        // Trailing partial frame, if the device asked for one.
        let tail = dst_frames * FRAME_SIZE;
        dst[tail..].fill(0);

        consumed.min(src_frames) * FRAME_SIZE
    }
}

fn new_trivial(_: &()) -> Result<Box<dyn Resampler>, AudioError> {
    Ok(Box::new(TrivialResampler))
}

/// Every resampler selectable by name.
pub static RESAMPLER_FACTORIES: &[Factory<dyn Resampler>] = &[Factory {
    name: "trivial",
    init: new_trivial,
}];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::lookup;

    /// Source where frame `j` holds the value `j` in both channels, so an
    /// output frame reveals which source frame was picked.
    fn indexed_source(frames: usize) -> Vec<u8> {
        let mut v = Vec::with_capacity(frames * FRAME_SIZE);
        for j in 0..frames {
            let s = (j as u16).to_le_bytes();
            v.extend_from_slice(&[s[0], s[1], s[0], s[1]]);
        }
        v
    }

    fn picked_indices(dst: &[u8]) -> Vec<usize> {
        dst.chunks_exact(FRAME_SIZE)
            .map(|f| u16::from_le_bytes([f[0], f[1]]) as usize)
            .collect()
    }

    const RATES: &[(u32, u32)] = &[
        (32000, 44100),
        (44100, 44100),
        (22050, 44100),
        (11025, 11025),
        (33600, 44100),
        (48000, 44100),
        (44100, 22050),
        (96000, 11025),
        (22051, 22050),
    ];

    #[test]
    fn constant_input_gives_constant_output() {
        let mut r = TrivialResampler;
        let src: Vec<u8> = [0x34, 0x12, 0x78, 0x56].repeat(4096);
        for &(input, output) in RATES {
            let mut dst = vec![0u8; 1024];
            r.resample(&src, input, &mut dst, output);
            for frame in dst.chunks_exact(FRAME_SIZE) {
                assert_eq!(frame, &[0x34, 0x12, 0x78, 0x56], "{input} -> {output}");
            }
        }
    }

    #[test]
    fn upsampling_never_steps_backwards() {
        let mut r = TrivialResampler;
        let src = indexed_source(4096);
        for &(input, output) in RATES.iter().filter(|(i, o)| o >= i) {
            let mut dst = vec![0u8; 2048 * FRAME_SIZE];
            let consumed = r.resample(&src, input, &mut dst, output);
            let picked = picked_indices(&dst);
            assert_eq!(picked[0], 0);
            for w in picked.windows(2) {
                assert!(w[1] >= w[0], "{input} -> {output}: {w:?}");
                assert!(w[1] - w[0] <= 1, "{input} -> {output}: {w:?}");
            }
            assert!(consumed / FRAME_SIZE >= *picked.last().unwrap());
        }
    }

    #[test]
    fn equal_rates_copy_straight_through() {
        let mut r = TrivialResampler;
        let src = indexed_source(256);
        let mut dst = vec![0u8; 256 * FRAME_SIZE];
        let consumed = r.resample(&src, 44100, &mut dst, 44100);
        assert_eq!(dst, src);
        assert_eq!(consumed, src.len());
    }

    #[test]
    fn upsampling_consumes_input_at_the_rate_ratio() {
        let mut r = TrivialResampler;
        let src = indexed_source(4096);
        let mut dst = vec![0u8; 44100 / 10 * FRAME_SIZE];
        let consumed = r.resample(&src, 22050, &mut dst, 44100);
        assert_eq!(consumed / FRAME_SIZE, 2205);
    }

    #[test]
    fn downsampling_picks_floor_of_scaled_index() {
        let mut r = TrivialResampler;
        let src = indexed_source(8192);
        for &(input, output) in RATES.iter().filter(|(i, o)| o < i) {
            let mut dst = vec![0u8; 512 * FRAME_SIZE];
            let consumed = r.resample(&src, input, &mut dst, output);
            for (i, j) in picked_indices(&dst).into_iter().enumerate() {
                assert_eq!(j as u64, i as u64 * input as u64 / output as u64);
            }
            assert_eq!(
                consumed / FRAME_SIZE,
                (512 * input as u64 / output as u64) as usize
            );
        }
    }

    #[test]
    fn empty_source_yields_silence() {
        let mut r = TrivialResampler;
        let mut dst = vec![0xFFu8; 64];
        assert_eq!(r.resample(&[], 32000, &mut dst, 44100), 0);
        assert!(dst.iter().all(|&b| b == 0));
    }

    #[test]
    fn short_source_repeats_last_frame() {
        let mut r = TrivialResampler;
        let src = indexed_source(2);
        let mut dst = vec![0u8; 8 * FRAME_SIZE];
        let consumed = r.resample(&src, 44100, &mut dst, 44100);
        assert_eq!(picked_indices(&dst), vec![0, 1, 1, 1, 1, 1, 1, 1]);
        assert_eq!(consumed, src.len());
    }

    #[test]
    fn trivial_is_registered() {
        let f = lookup(RESAMPLER_FACTORIES, "trivial").expect("trivial resampler");
        assert!(f.create(&()).is_ok());
        assert!(lookup(RESAMPLER_FACTORIES, "sinc").is_none());
    }
}
