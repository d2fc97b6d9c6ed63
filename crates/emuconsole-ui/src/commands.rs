use emuconsole_audio::sink::{DEFAULT_SPEED_FACTOR, MAX_SPEED_FACTOR, MIN_SPEED_FACTOR};

pub const SPEED_STEP: i32 = 5;
pub const FAST_FORWARD_SPEED: u32 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SpeedDelta(i32),
    FastForward,
    Screenshot,
    Stop,
}

/// One command per input line. Blank lines and anything unknown give `None`.
pub fn parse_command(line: &str) -> Option<Command> {
    match line.trim() {
        "+" => Some(Command::SpeedDelta(SPEED_STEP)),
        "-" => Some(Command::SpeedDelta(-SPEED_STEP)),
        "f" => Some(Command::FastForward),
        "s" => Some(Command::Screenshot),
        "q" => Some(Command::Stop),
        _ => None,
    }
}

/// Playback speed as the user sees it: a base percentage plus a
/// fast-forward toggle that overrides it while held.
#[derive(Debug, Clone, Copy)]
pub struct SpeedControl {
    base: u32,
    fast_forward: bool,
}

impl SpeedControl {
    pub fn new(base: u32) -> Self {
        Self {
            base: base.clamp(MIN_SPEED_FACTOR, MAX_SPEED_FACTOR),
            fast_forward: false,
        }
    }

    pub fn adjust(&mut self, delta: i32) {
        let next = i64::from(self.base) + i64::from(delta);
        self.base = next.clamp(i64::from(MIN_SPEED_FACTOR), i64::from(MAX_SPEED_FACTOR)) as u32;
    }

    pub fn toggle_fast_forward(&mut self) {
        self.fast_forward = !self.fast_forward;
    }

    pub fn is_fast_forward(&self) -> bool {
        self.fast_forward
    }

    pub fn current(&self) -> u32 {
        if self.fast_forward {
            FAST_FORWARD_SPEED
        } else {
            self.base
        }
    }
}

impl Default for SpeedControl {
    fn default() -> Self {
        Self::new(DEFAULT_SPEED_FACTOR)
    }
}
