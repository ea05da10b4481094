use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::editor::DEFAULT_UNDO_LIMIT;
use crate::error::Result;

pub const CONFIG_FILE: &str = "ascii_paint.toml";

/// Startup settings, read from `ascii_paint.toml` in the working directory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Size in cells of a new document.
    pub width: usize,
    pub height: usize,
    pub undo_limit: usize,
    /// 16x16 glyph sprite sheet.
    pub font_path: PathBuf,
    pub glyph_width: u32,
    pub glyph_height: u32,
    pub zoom: f32,
    pub import_threshold: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 80,
            height: 60,
            undo_limit: DEFAULT_UNDO_LIMIT,
            font_path: PathBuf::from("assets/cp437_9x16.png"),
            glyph_width: 9,
            glyph_height: 16,
            zoom: 1.0,
            import_threshold: 128,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Like [`Config::load`] but never fails: a missing file is silently
    /// replaced by the defaults, a broken one is logged first.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("no {}, using default settings", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("ignoring {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn to_toml(&self) -> String {
        // Every field is a plain value, serialization cannot fail.
        toml::to_string(self).unwrap_or_default()
    }
}
