mod app;
mod brush;
mod config;
mod controller;
mod editor;
mod error;
mod font;
mod importer;
mod painter;
mod raster;
mod raster_io;
mod render;
mod tool;

use anyhow::{Context, Result};
use app::PaintApp;
use config::{Config, CONFIG_FILE};
use controller::Controller;
use flexi_logger::{Logger, LoggerHandle};
use font::GlyphAtlas;

/// The logger stops when the returned handle is dropped.
fn start_logger() -> Option<LoggerHandle> {
    let started = Logger::try_with_env_or_str("info, eframe=warn, egui_glow=warn, wgpu_core=error, wgpu_hal=error")
        .and_then(|logger| logger.start());
    match started {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("Failed to start logger: {err}");
            None
        }
    }
}

fn main() -> Result<()> {
    let _logger = start_logger();
    log::info!("Starting ASCII Paint {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load_or_default(CONFIG_FILE);
    let atlas = GlyphAtlas::load(&config.font_path, config.glyph_width, config.glyph_height)
        .context("cannot start without a font")?;
    let (controller, events) = Controller::new(config, atlas);

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "ASCII Paint",
        native_options,
        Box::new(|cc| Ok(Box::new(PaintApp::new(cc, controller, events)))),
    )
    .map_err(|err| anyhow::anyhow!("{err}"))?;
    Ok(())
}
