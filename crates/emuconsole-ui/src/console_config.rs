use emuconsole_audio::SinkConfig;
use emuconsole_audio::sink::DEFAULT_SPEED_FACTOR;
use log::warn;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::backends::DEFAULT_BACKEND;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AudioSection {
    pub backend: String,
    pub resampler: String,
    pub primary_buffer_size: usize,
    pub target: usize,
    pub secondary_buffer_size: usize,
    pub swap_channels: bool,
    pub speed_factor: u32,
}

impl Default for AudioSection {
    fn default() -> Self {
        let sink = SinkConfig::default();
        Self {
            backend: DEFAULT_BACKEND.to_string(),
            resampler: sink.resampler,
            primary_buffer_size: sink.primary_buffer_size,
            target: sink.target,
            secondary_buffer_size: sink.secondary_buffer_size,
            swap_channels: sink.swap_channels,
            speed_factor: DEFAULT_SPEED_FACTOR,
        }
    }
}

impl AudioSection {
    pub fn sink_config(&self) -> SinkConfig {
        SinkConfig {
            primary_buffer_size: self.primary_buffer_size,
            target: self.target,
            secondary_buffer_size: self.secondary_buffer_size,
            swap_channels: self.swap_channels,
            resampler: self.resampler.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default)]
pub struct ConsoleConfig {
    pub audio: AudioSection,
    pub screenshot_dir: Option<PathBuf>,
}

impl ConsoleConfig {
    pub fn screenshot_dir(&self) -> PathBuf {
        self.screenshot_dir
            .clone()
            .unwrap_or_else(default_screenshot_dir)
    }
}

fn app_dir(xdg_var: &str, home_fallback: &[&str]) -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return Some(PathBuf::from(appdata).join("emuconsole"));
        }
    }

    if let Some(xdg) = std::env::var_os(xdg_var) {
        return Some(PathBuf::from(xdg).join("emuconsole"));
    }

    std::env::var_os("HOME").map(|home| {
        let mut path = PathBuf::from(home);
        path.extend(home_fallback);
        path.join("emuconsole")
    })
}

pub fn default_config_path() -> PathBuf {
    app_dir("XDG_CONFIG_HOME", &[".config"])
        .map(|dir| dir.join("console.toml"))
        .unwrap_or_else(|| PathBuf::from("console.toml"))
}

pub fn default_screenshot_dir() -> PathBuf {
    app_dir("XDG_DATA_HOME", &[".local", "share"])
        .map(|dir| dir.join("screenshot"))
        .unwrap_or_else(|| PathBuf::from("screenshot"))
}

pub fn parse(text: &str) -> Result<ConsoleConfig, toml::de::Error> {
    toml::from_str::<ConsoleConfig>(text)
}

/// Read the console configuration. A missing file means defaults; a broken
/// one is reported and replaced by defaults.
pub fn load_from_file(path: &Path) -> ConsoleConfig {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return ConsoleConfig::default(),
    };

    match parse(&text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(
                "Failed to parse console config {}: {e}; using defaults",
                path.display()
            );
            ConsoleConfig::default()
        }
    }
}
