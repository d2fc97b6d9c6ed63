use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read};
use std::path::Path;

use emuconsole_audio::resampler::FRAME_SIZE;

/// Something that produces interleaved 16-bit stereo frames in native byte
/// order, standing in for an emulation core's sound unit.
pub trait SampleSource: Send {
    /// Fill up to `frames` frames into `buf` and return how many were written.
    /// Zero means the source has ended.
    fn fill(&mut self, buf: &mut Vec<u8>, frames: usize) -> io::Result<usize>;
}

/// Square wave at a fixed pitch and amplitude.
pub struct ToneGenerator {
    frequency: u32,
    sample_rate: u32,
    amplitude: i16,
    phase: u64,
}

impl ToneGenerator {
    pub fn new(frequency: u32, sample_rate: u32) -> Self {
        Self {
            frequency: frequency.max(1),
            sample_rate: sample_rate.max(1),
            amplitude: i16::MAX / 8,
            phase: 0,
        }
    }
}

impl SampleSource for ToneGenerator {
    fn fill(&mut self, buf: &mut Vec<u8>, frames: usize) -> io::Result<usize> {
        buf.clear();
        buf.reserve(frames * FRAME_SIZE);
        let period = u64::from(self.sample_rate);
        for _ in 0..frames {
            // Position within the current cycle, scaled so a full cycle is `period`.
            let pos = (self.phase * u64::from(self.frequency)) % period;
            let s = if pos < period / 2 {
                self.amplitude
            } else {
                -self.amplitude
            };
            buf.extend_from_slice(&s.to_ne_bytes());
            buf.extend_from_slice(&s.to_ne_bytes());
            self.phase = (self.phase + 1) % period;
        }
        Ok(frames)
    }
}

/// Raw little-endian 16-bit stereo PCM, as written by `sox -t raw` and most
/// emulators' sound dumps.
pub struct PcmReader<R> {
    inner: R,
    raw: Vec<u8>,
}

impl PcmReader<BufReader<File>> {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: Read> PcmReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            raw: Vec::new(),
        }
    }
}

impl<R: Read + Send> SampleSource for PcmReader<R> {
    fn fill(&mut self, buf: &mut Vec<u8>, frames: usize) -> io::Result<usize> {
        self.raw.resize(frames * FRAME_SIZE, 0);
        let mut filled = 0;
        while filled < self.raw.len() {
            match self.inner.read(&mut self.raw[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }

        // A trailing partial frame is dropped.
        let frames = filled / FRAME_SIZE;
        buf.clear();
        buf.reserve(frames * FRAME_SIZE);
        for pair in self.raw[..frames * FRAME_SIZE].chunks_exact(2) {
            let s = i16::from_le_bytes([pair[0], pair[1]]);
            buf.extend_from_slice(&s.to_ne_bytes());
        }
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn samples(buf: &[u8]) -> Vec<i16> {
        buf.chunks_exact(2)
            .map(|b| i16::from_ne_bytes([b[0], b[1]]))
            .collect()
    }

    #[test]
    fn tone_alternates_halves_of_each_cycle() {
        // 1 kHz at 8 kHz: four frames high, four frames low.
        let mut tone = ToneGenerator::new(1000, 8000);
        let mut buf = Vec::new();
        assert_eq!(tone.fill(&mut buf, 16).unwrap(), 16);
        assert_eq!(buf.len(), 64);

        let s = samples(&buf);
        let amp = i16::MAX / 8;
        let left: Vec<i16> = s.iter().step_by(2).copied().collect();
        assert_eq!(&left[..8], &[amp, amp, amp, amp, -amp, -amp, -amp, -amp]);
        assert_eq!(&left[8..], &left[..8]);
        assert!(s.chunks_exact(2).all(|f| f[0] == f[1]));
    }

    #[test]
    fn tone_never_ends() {
        let mut tone = ToneGenerator::new(440, 44100);
        let mut buf = Vec::new();
        for _ in 0..100 {
            assert_eq!(tone.fill(&mut buf, 735).unwrap(), 735);
        }
    }

    #[test]
    fn pcm_reader_converts_little_endian_and_drops_partial_frame() {
        let mut data = Vec::new();
        for s in [1i16, -2, 300, -400] {
            data.extend_from_slice(&s.to_le_bytes());
        }
        data.extend_from_slice(&[0xAB, 0xCD, 0xEF]);

        let mut reader = PcmReader::new(Cursor::new(data));
        let mut buf = Vec::new();
        assert_eq!(reader.fill(&mut buf, 10).unwrap(), 2);
        assert_eq!(samples(&buf), vec![1, -2, 300, -400]);

        assert_eq!(reader.fill(&mut buf, 10).unwrap(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn pcm_reader_splits_into_requested_chunks() {
        let data: Vec<u8> = (0..40u8).collect();
        let mut reader = PcmReader::new(Cursor::new(data));
        let mut buf = Vec::new();
        assert_eq!(reader.fill(&mut buf, 4).unwrap(), 4);
        assert_eq!(reader.fill(&mut buf, 4).unwrap(), 4);
        assert_eq!(reader.fill(&mut buf, 4).unwrap(), 2);
    }
}
