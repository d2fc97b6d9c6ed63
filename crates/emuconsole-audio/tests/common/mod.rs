#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use emuconsole_audio::{AudioCallback, AudioError, Clock, DeviceSpec, OutputDevice};

#[derive(Default)]
pub struct DeviceLog {
    pub opened: Vec<DeviceSpec>,
    pub pauses: Vec<bool>,
    pub closes: usize,
}

/// Output device whose callback is driven by the test instead of a driver.
#[derive(Clone)]
pub struct ScriptedDevice {
    log: Arc<Mutex<DeviceLog>>,
    callback: Arc<Mutex<Option<AudioCallback>>>,
    negotiated_frequency: Option<u32>,
    fail_open: bool,
}

impl ScriptedDevice {
    pub fn new() -> Self {
        Self {
            log: Arc::default(),
            callback: Arc::new(Mutex::new(None)),
            negotiated_frequency: None,
            fail_open: false,
        }
    }

    pub fn negotiating(frequency: u32) -> Self {
        Self {
            negotiated_frequency: Some(frequency),
            ..Self::new()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::new()
        }
    }

    /// Ask for `len` bytes as the device thread would.
    pub fn pull(&self, len: usize) -> Vec<u8> {
        let mut out = vec![0xEE; len];
        let mut cb = self.callback.lock().unwrap();
        let cb = cb.as_mut().expect("device is not open");
        cb(out.as_mut_slice());
        out
    }

    pub fn opened(&self) -> Vec<DeviceSpec> {
        self.log.lock().unwrap().opened.clone()
    }

    pub fn pauses(&self) -> Vec<bool> {
        self.log.lock().unwrap().pauses.clone()
    }

    pub fn closes(&self) -> usize {
        self.log.lock().unwrap().closes
    }
}

impl OutputDevice for ScriptedDevice {
    fn open(
        &mut self,
        desired: &DeviceSpec,
        callback: AudioCallback,
    ) -> Result<DeviceSpec, AudioError> {
        if self.fail_open {
            return Err(AudioError::Device("no audio hardware".into()));
        }
        let obtained = DeviceSpec {
            frequency: self.negotiated_frequency.unwrap_or(desired.frequency),
            ..*desired
        };
        self.log.lock().unwrap().opened.push(obtained);
        *self.callback.lock().unwrap() = Some(callback);
        Ok(obtained)
    }

    fn pause(&mut self, paused: bool) {
        self.log.lock().unwrap().pauses.push(paused);
    }

    fn close(&mut self) {
        self.log.lock().unwrap().closes += 1;
        *self.callback.lock().unwrap() = None;
    }
}

/// Clock that only moves when told to, or when the sink sleeps on it.
#[derive(Default)]
pub struct ManualClock {
    now: AtomicU64,
    delays: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

impl Clock for ManualClock {
    fn ticks_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn delay(&self, duration: Duration) {
        self.now
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
        self.delays.lock().unwrap().push(duration);
    }
}

/// `frames` stereo frames with left = `l`, right = `r`.
pub fn frames(frames: usize, l: i16, r: i16) -> Vec<u8> {
    let mut v = Vec::with_capacity(frames * 4);
    for _ in 0..frames {
        v.extend_from_slice(&l.to_ne_bytes());
        v.extend_from_slice(&r.to_ne_bytes());
    }
    v
}
