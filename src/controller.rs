use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

use anyhow::{bail, Context, Result};
use eframe::egui::Color32;
use glam::IVec2;

use crate::config::Config;
use crate::editor::{EditorEvent, EditorState};
use crate::font::GlyphAtlas;
use crate::importer::ImageConverter;
use crate::raster::{Raster, MAX_CELLS};
use crate::raster_io;
use crate::tool::{Tool, ToolKind};

/// Requests from the view.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    NewImage { width: usize, height: usize },
    Load(PathBuf),
    Save(PathBuf),
    Import { path: PathBuf, options: ImageConverter },
    Undo,
    Redo,
    SelectTool(ToolKind),
    SelectCharacter(char),
    SelectForeground(Color32),
    SelectBackground(Color32),
    /// Puts the characters of the document on the clipboard.
    CopyText,
}

/// Everything the editor window works on: the document, the active tool
/// gesture, the font and the settings.
pub struct Controller {
    state: EditorState,
    tool: Tool,
    atlas: GlyphAtlas,
    config: Config,
    document: Option<PathBuf>,
}

impl Controller {
    pub fn new(config: Config, atlas: GlyphAtlas) -> (Self, Receiver<EditorEvent>) {
        let (state, events) = EditorState::new(Raster::new(config.width, config.height), config.undo_limit);
        let controller = Self {
            state,
            tool: Tool::new(),
            atlas,
            config,
            document: None,
        };
        (controller, events)
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Where the document was last loaded from or saved to.
    pub fn document_path(&self) -> Option<&Path> {
        self.document.as_deref()
    }

    pub fn press(&mut self, pos: IVec2) {
        self.tool.press(&mut self.state, pos);
    }

    pub fn drag(&mut self, pos: IVec2) {
        self.tool.drag(&mut self.state, pos);
    }

    pub fn release(&mut self, pos: IVec2) {
        self.tool.release(&mut self.state, pos);
    }

    /// Runs a command. On error the document is left as it was.
    pub fn execute(&mut self, command: Command) -> Result<()> {
        if matches!(
            command,
            Command::NewImage { .. } | Command::Load(_) | Command::Import { .. } | Command::Undo | Command::Redo
        ) {
            self.tool.finish();
        }
        match command {
            Command::NewImage { width, height } => {
                let cells = width.checked_mul(height).unwrap_or(usize::MAX);
                if cells == 0 || cells > MAX_CELLS {
                    bail!("cannot create a {width}x{height} image");
                }
                self.state.replace_raster(Raster::new(width, height));
                self.state.begin_paint().clear();
                self.state.reset_undo_redo_stack();
                self.document = None;
                log::info!("new {width}x{height} image");
            }
            Command::Load(path) => {
                let raster = raster_io::load(&path)
                    .with_context(|| format!("failed to open {}", path.display()))?;
                self.state.replace_raster(raster);
                self.state.reset_undo_redo_stack();
                log::info!("opened {}", path.display());
                self.document = Some(path);
            }
            Command::Save(path) => {
                raster_io::save(&path, self.state.raster())
                    .with_context(|| format!("failed to save {}", path.display()))?;
                log::info!("saved {}", path.display());
                self.document = Some(path);
            }
            Command::Import { path, options } => {
                let image = image::open(&path).with_context(|| format!("failed to import {}", path.display()))?;
                let mut painter = self.state.begin_undoable_paint();
                painter.clear();
                options.convert_to(painter.surface_mut(), &image, &self.atlas);
                self.state.end_paint();
                log::info!("imported {}", path.display());
            }
            Command::Undo => {
                self.state.undo();
            }
            Command::Redo => {
                self.state.redo();
            }
            Command::SelectTool(tool) => self.state.set_active_tool(tool),
            Command::SelectCharacter(ch) => self.state.set_active_character(ch),
            Command::SelectForeground(color) => self.state.set_active_foreground(color),
            Command::SelectBackground(color) => self.state.set_active_background(color),
            Command::CopyText => {
                let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
                clipboard
                    .set_text(self.state.raster().to_text())
                    .context("failed to copy to the clipboard")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::font::striped_atlas;
    use crate::raster::Cell;

    fn controller() -> (Controller, Receiver<EditorEvent>) {
        let config = Config {
            width: 8,
            height: 4,
            ..Config::default()
        };
        Controller::new(config, striped_atlas(4, 4))
    }

    #[test]
    fn starts_with_a_blank_document_of_the_configured_size() {
        let (controller, _events) = controller();
        assert_eq!(controller.state().raster(), &Raster::new(8, 4));
        assert!(!controller.state().can_undo());
        assert_eq!(controller.document_path(), None);
    }

    #[test]
    fn new_image_uses_the_background_and_forgets_history() {
        let (mut controller, events) = controller();
        controller.execute(Command::SelectBackground(Color32::BLUE)).unwrap();
        controller.press(IVec2::new(1, 1));
        controller.release(IVec2::new(1, 1));
        assert!(controller.state().can_undo());

        controller.execute(Command::NewImage { width: 3, height: 2 }).unwrap();
        let blank = Raster::filled(3, 2, Cell::new(' ', Color32::WHITE, Color32::BLUE));
        assert_eq!(controller.state().raster(), &blank);
        assert!(!controller.state().can_undo());
        assert!(events.try_iter().any(|e| e == EditorEvent::RasterReplaced));

        assert!(controller.execute(Command::NewImage { width: 0, height: 2 }).is_err());
        assert_eq!(controller.state().raster(), &blank);
    }

    #[test]
    fn undo_mid_stroke_ends_the_stroke() {
        let (mut controller, _events) = controller();
        controller.execute(Command::NewImage { width: 4, height: 1 }).unwrap();
        controller.execute(Command::SelectCharacter('x')).unwrap();
        controller.press(IVec2::new(0, 0));
        controller.drag(IVec2::new(1, 0));
        controller.execute(Command::Undo).unwrap();
        assert_eq!(controller.state().raster(), &Raster::new(4, 1));
        assert!(controller.state().can_redo());

        controller.drag(IVec2::new(3, 0));
        controller.release(IVec2::new(3, 0));
        assert_eq!(controller.state().raster(), &Raster::new(4, 1));
        assert!(controller.state().can_redo());

        controller.execute(Command::Redo).unwrap();
        assert_eq!(controller.state().raster().to_text(), "xx  \n");
    }

    #[test]
    fn new_image_mid_rectangle_is_not_painted_over() {
        let (mut controller, _events) = controller();
        controller.execute(Command::SelectTool(ToolKind::DrawRect)).unwrap();
        controller.execute(Command::SelectCharacter('+')).unwrap();
        controller.press(IVec2::new(0, 0));
        controller.drag(IVec2::new(5, 3));
        controller.execute(Command::NewImage { width: 3, height: 2 }).unwrap();

        controller.drag(IVec2::new(2, 1));
        controller.release(IVec2::new(2, 1));
        assert_eq!(controller.state().raster(), &Raster::new(3, 2));
        assert!(!controller.state().can_undo());

        controller.press(IVec2::new(0, 0));
        controller.release(IVec2::new(2, 1));
        assert_eq!(controller.state().raster().to_text(), "+++\n+++\n");
    }

    #[test]
    fn new_image_rejects_oversized_documents() {
        let (mut controller, _events) = controller();
        for (width, height) in [(usize::MAX, 2), (MAX_CELLS, 2), (5000, 5000)] {
            assert!(controller.execute(Command::NewImage { width, height }).is_err());
        }
        assert_eq!(controller.state().raster(), &Raster::new(8, 4));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("art.txt");
        let (mut controller, _events) = controller();
        controller.execute(Command::SelectCharacter('@')).unwrap();
        controller.press(IVec2::new(0, 0));
        controller.drag(IVec2::new(7, 3));
        controller.release(IVec2::new(7, 3));
        let drawn = controller.state().raster().clone();
        controller.execute(Command::Save(path.clone())).unwrap();
        assert_eq!(controller.document_path(), Some(path.as_path()));

        controller.execute(Command::NewImage { width: 2, height: 2 }).unwrap();
        controller.execute(Command::Load(path.clone())).unwrap();
        assert_eq!(controller.state().raster(), &drawn);
        assert!(!controller.state().can_undo());
    }

    #[test]
    fn failed_load_keeps_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.txt");
        std::fs::write(&path, "3\n3\n65\t0\n").unwrap();
        let (mut controller, _events) = controller();
        let before = controller.state().raster().clone();
        let err = controller.execute(Command::Load(path)).unwrap_err();
        assert!(err.to_string().starts_with("failed to open"));
        assert_eq!(controller.state().raster(), &before);
        assert!(controller.execute(Command::Load(dir.path().join("missing.txt"))).is_err());
        assert_eq!(controller.document_path(), None);
    }

    #[test]
    fn import_is_undoable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("picture.png");
        RgbaImage::from_pixel(16, 8, Rgba([255, 255, 255, 255])).save(&path).unwrap();

        let (mut controller, _events) = controller();
        let before = controller.state().raster().clone();
        controller
            .execute(Command::Import { path, options: ImageConverter::default() })
            .unwrap();
        for (_, cell) in controller.state().raster().cells() {
            assert_eq!(controller.atlas().density(cell.ch), 1.0);
            assert_eq!(cell.fore, Color32::WHITE);
        }
        controller.execute(Command::Undo).unwrap();
        assert_eq!(controller.state().raster(), &before);
        controller.execute(Command::Redo).unwrap();
        assert_ne!(controller.state().raster(), &before);
    }

    #[test]
    fn failed_import_keeps_history_untouched() {
        let (mut controller, _events) = controller();
        let result = controller.execute(Command::Import {
            path: PathBuf::from("no/such/picture.png"),
            options: ImageConverter::default(),
        });
        assert!(result.is_err());
        assert!(!controller.state().can_undo());
    }

    #[test]
    fn selections_are_forwarded() {
        let (mut controller, events) = controller();
        controller.execute(Command::SelectTool(ToolKind::Fill)).unwrap();
        controller.execute(Command::SelectForeground(Color32::RED)).unwrap();
        assert_eq!(controller.state().active_tool(), ToolKind::Fill);
        assert_eq!(controller.state().active_foreground(), Color32::RED);
        assert_eq!(
            events.try_iter().collect::<Vec<_>>(),
            vec![
                EditorEvent::ToolSelected(ToolKind::Fill),
                EditorEvent::ForegroundSelected(Color32::RED),
            ]
        );
    }
}
