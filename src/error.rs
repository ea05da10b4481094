use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the raster core and its loaders.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("position ({x}, {y}) is outside the {width}x{height} raster")]
    OutOfBounds { x: i32, y: i32, width: usize, height: usize },

    #[error("invalid raster file (line {line}): {message}")]
    Format { line: usize, message: String },

    #[error("failed to load glyph atlas '{path}': {message}")]
    ResourceLoad { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, RasterError>;

impl RasterError {
    pub fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format { line, message: message.into() }
    }

    pub fn resource_load(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::ResourceLoad {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
