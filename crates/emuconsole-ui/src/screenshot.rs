use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use log::{info, warn};

pub const MAX_SHOTS: u32 = 1000;
const MAX_NAME_LEN: usize = 20;

/// RGB image whose rows are stored bottom row first, `pitch` bytes apart.
pub struct Screen<'a> {
    pub width: u32,
    pub height: u32,
    pub pitch: usize,
    pub pixels: &'a [u8],
}

/// Lowercase the game name, turn spaces into underscores and cut it to the
/// length used in file names.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c == ' ' { '_' } else { c.to_ascii_lowercase() })
        .take(MAX_NAME_LEN)
        .collect()
}

pub fn save_rgb_png(path: &Path, screen: &Screen<'_>) -> io::Result<()> {
    let row_len = screen.width as usize * 3;
    let height = screen.height as usize;
    if screen.pitch < row_len
        || (height > 0 && screen.pixels.len() < (height - 1) * screen.pitch + row_len)
    {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "screen buffer is smaller than its dimensions",
        ));
    }

    let mut data = Vec::with_capacity(row_len * height);
    for row in (0..height).rev() {
        let start = row * screen.pitch;
        data.extend_from_slice(&screen.pixels[start..start + row_len]);
    }

    let file = BufWriter::new(File::create(path)?);
    let mut encoder = png::Encoder::new(file, screen.width, screen.height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().map_err(io::Error::other)?;
    writer.write_image_data(&data).map_err(io::Error::other)?;
    writer.finish().map_err(io::Error::other)
}

/// Screenshot numbering for one loaded game. A new session starts counting
/// from zero again.
pub struct ScreenshotSession {
    dir: PathBuf,
    name: String,
    index: u32,
}

impl ScreenshotSession {
    pub fn new(dir: impl Into<PathBuf>, game_name: &str) -> Self {
        Self {
            dir: dir.into(),
            name: sanitize_name(game_name),
            index: 0,
        }
    }

    /// First `<name>-NNN.png` in the directory that does not exist yet.
    pub fn next_file_name(&mut self) -> Option<PathBuf> {
        while self.index < MAX_SHOTS {
            let path = self
                .dir
                .join(format!("{}-{:03}.png", self.name, self.index));
            if !path.exists() {
                return Some(path);
            }
            self.index += 1;
        }
        None
    }

    pub fn take(&mut self, screen: &Screen<'_>) -> io::Result<Option<PathBuf>> {
        fs::create_dir_all(&self.dir)?;
        let Some(path) = self.next_file_name() else {
            warn!(
                "Can't save screenshot; {} already holds {MAX_SHOTS} screenshots for {}",
                self.dir.display(),
                self.name
            );
            return Ok(None);
        };
        save_rgb_png(&path, screen)?;
        info!("Captured screenshot {}", path.display());
        Ok(Some(path))
    }
}
