use std::path::PathBuf;
use std::sync::mpsc::Receiver;

use eframe::egui;
use eframe::egui::*;
use eframe::App;
use glam::IVec2;

use crate::controller::{Command, Controller};
use crate::editor::EditorEvent;
use crate::importer::ImageConverter;
use crate::render::{charset, render, CHARSET_COLUMNS};
use crate::tool::ToolKind;

const RASTER_EXTENSIONS: &[&str] = &["txt"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

pub struct PaintApp {
    controller: Controller,
    events: Receiver<EditorEvent>,
    canvas_texture: TextureHandle,
    charset_texture: TextureHandle,
    canvas_dirty: bool,
    charset_dirty: bool,
    can_undo: bool,
    can_redo: bool,
    /// Cell under the pointer while a mouse button is held on the canvas.
    pressed_cell: Option<IVec2>,
    zoom: f32,
    new_size: [usize; 2],
    converter: ImageConverter,
    status: String,
}

impl PaintApp {
    pub fn new(cc: &eframe::CreationContext<'_>, controller: Controller, events: Receiver<EditorEvent>) -> Self {
        let state = controller.state();
        let canvas = render(state.raster(), controller.atlas());
        let picker = render(
            &charset(state.active_foreground(), state.active_background()),
            controller.atlas(),
        );
        let config = controller.config();
        let converter = ImageConverter {
            threshold: config.import_threshold,
            ..Default::default()
        };
        Self {
            canvas_texture: cc.egui_ctx.load_texture("canvas", canvas, TextureOptions::NEAREST),
            charset_texture: cc.egui_ctx.load_texture("charset", picker, TextureOptions::NEAREST),
            canvas_dirty: false,
            charset_dirty: false,
            can_undo: false,
            can_redo: false,
            pressed_cell: None,
            zoom: config.zoom,
            new_size: [config.width, config.height],
            converter,
            status: String::new(),
            controller,
            events,
        }
    }

    fn run(&mut self, command: Command) {
        if let Err(err) = self.controller.execute(command) {
            log::warn!("{err:#}");
            self.status = format!("{err:#}");
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                EditorEvent::RasterChanged | EditorEvent::RasterReplaced => self.canvas_dirty = true,
                EditorEvent::ForegroundSelected(_) | EditorEvent::BackgroundSelected(_) => {
                    self.charset_dirty = true
                }
                EditorEvent::UndoRedoChanged { can_undo, can_redo } => {
                    self.can_undo = can_undo;
                    self.can_redo = can_redo;
                }
                EditorEvent::ToolSelected(_) | EditorEvent::CharacterSelected(_) => {}
            }
        }
        let state = self.controller.state();
        if self.canvas_dirty {
            let image = render(state.raster(), self.controller.atlas());
            self.canvas_texture.set(image, TextureOptions::NEAREST);
            self.canvas_dirty = false;
        }
        if self.charset_dirty {
            let picker = charset(state.active_foreground(), state.active_background());
            self.charset_texture
                .set(render(&picker, self.controller.atlas()), TextureOptions::NEAREST);
            self.charset_dirty = false;
        }
    }

    fn shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.input_mut(|i| i.consume_key(Modifiers::COMMAND, Key::Z)) {
            self.run(Command::Undo);
        }
        if ctx.input_mut(|i| i.consume_key(Modifiers::COMMAND, Key::Y)) {
            self.run(Command::Redo);
        }
    }

    fn dialog(&self) -> rfd::FileDialog {
        let dialog = rfd::FileDialog::new();
        match self.controller.document_path().and_then(|path| path.parent()) {
            Some(dir) => dialog.set_directory(dir),
            None => dialog,
        }
    }

    fn save_as(&mut self) {
        if let Some(path) = self.dialog().add_filter("ASCII art", RASTER_EXTENSIONS).save_file() {
            self.run(Command::Save(path));
        }
    }

    pub fn ui_file(&mut self, ui: &mut Ui) -> egui::Response {
        ui.horizontal(|ui| {
            ui.add(DragValue::new(&mut self.new_size[0]).range(1..=1000).prefix("w "));
            ui.add(DragValue::new(&mut self.new_size[1]).range(1..=1000).prefix("h "));
            if ui.button("New").clicked() {
                let [width, height] = self.new_size;
                self.run(Command::NewImage { width, height });
            }
            if ui.button("Open…").clicked() {
                if let Some(path) = self.dialog().add_filter("ASCII art", RASTER_EXTENSIONS).pick_file() {
                    self.run(Command::Load(path));
                }
            }
            if ui.button("Save").clicked() {
                match self.controller.document_path().map(PathBuf::from) {
                    Some(path) => self.run(Command::Save(path)),
                    None => self.save_as(),
                }
            }
            if ui.button("Save as…").clicked() {
                self.save_as();
            }
            ui.separator();
            if ui.button("Import…").clicked() {
                if let Some(path) = self.dialog().add_filter("Images", IMAGE_EXTENSIONS).pick_file() {
                    let options = self.converter.clone();
                    self.run(Command::Import { path, options });
                }
            }
            ui.add(Slider::new(&mut self.converter.threshold, 0..=255).text("threshold"));
            ui.checkbox(&mut self.converter.all_colors, "All colors");
            ui.separator();
            if ui.button("Copy text").clicked() {
                self.run(Command::CopyText);
            }
        })
        .response
    }

    pub fn ui_control(&mut self, ui: &mut Ui) -> egui::Response {
        ui.horizontal(|ui| {
            if ui.add_enabled(self.can_undo, Button::new("Undo")).clicked() {
                self.run(Command::Undo);
            }
            if ui.add_enabled(self.can_redo, Button::new("Redo")).clicked() {
                self.run(Command::Redo);
            }
            ui.separator();
            let state = self.controller.state();
            let mut tool = state.active_tool();
            for kind in ToolKind::ALL {
                ui.selectable_value(&mut tool, kind, kind.label());
            }
            let mut fore = state.active_foreground();
            let mut back = state.active_background();
            ui.separator();
            ui.label("Fore:");
            let fore_changed = color_picker::color_edit_button_srgba(ui, &mut fore, color_picker::Alpha::Opaque).changed();
            ui.label("Back:");
            let back_changed = color_picker::color_edit_button_srgba(ui, &mut back, color_picker::Alpha::Opaque).changed();
            ui.separator();
            ui.add(Slider::new(&mut self.zoom, 0.5..=4.0).logarithmic(true).text("zoom"));

            if tool != self.controller.state().active_tool() {
                self.run(Command::SelectTool(tool));
            }
            if fore_changed {
                self.run(Command::SelectForeground(fore));
            }
            if back_changed {
                self.run(Command::SelectBackground(back));
            }
        })
        .response
    }

    pub fn ui_charset(&mut self, ui: &mut Ui) -> egui::Response {
        let active = self.controller.state().active_character();
        ui.label(format!("Character: {} ({})", active, active as u32));
        let size = self.charset_texture.size_vec2() * 1.5;
        let (rect, response) = ui.allocate_exact_size(size, Sense::click());
        Image::from_texture((self.charset_texture.id(), size)).paint_at(ui, rect);

        let cell = rect.size() / CHARSET_COLUMNS as f32;
        let code = active as u32;
        if code < 256 {
            let min = rect.min + vec2((code % 16) as f32 * cell.x, (code / 16) as f32 * cell.y);
            ui.painter().rect_stroke(
                Rect::from_min_size(min, cell),
                0.0,
                Stroke::new(1.0, Color32::YELLOW),
                StrokeKind::Inside,
            );
        }
        if let Some(pos) = response.interact_pointer_pos().filter(|_| response.clicked()) {
            let local = pos - rect.min;
            let column = ((local.x / cell.x) as usize).min(CHARSET_COLUMNS - 1);
            let row = ((local.y / cell.y) as usize).min(CHARSET_COLUMNS - 1);
            self.run(Command::SelectCharacter(char::from((row * CHARSET_COLUMNS + column) as u8)));
        }
        response
    }

    fn cell_at(&self, rect: Rect, pos: Pos2) -> IVec2 {
        let atlas = self.controller.atlas();
        let local = (pos - rect.min) / self.zoom;
        IVec2::new(
            (local.x / atlas.glyph_width() as f32).floor() as i32,
            (local.y / atlas.glyph_height() as f32).floor() as i32,
        )
    }

    pub fn ui_content(&mut self, ui: &mut Ui) -> egui::Response {
        let size = self.canvas_texture.size_vec2() * self.zoom;
        let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());
        let response = response.on_hover_cursor(match self.controller.state().active_tool() {
            ToolKind::Fill => CursorIcon::Cell,
            ToolKind::Pick => CursorIcon::Alias,
            _ => CursorIcon::Crosshair,
        });
        Image::from_texture((self.canvas_texture.id(), size)).paint_at(ui, rect);

        if let Some(pointer) = response.interact_pointer_pos() {
            let cell = self.cell_at(rect, pointer);
            match self.pressed_cell {
                None => self.controller.press(cell),
                Some(last) if last != cell => self.controller.drag(cell),
                Some(_) => {}
            }
            self.pressed_cell = Some(cell);
        }
        if let Some(last) = self.pressed_cell {
            if !ui.input(|i| i.pointer.primary_down()) {
                let cell = ui
                    .input(|i| i.pointer.latest_pos())
                    .map_or(last, |pos| self.cell_at(rect, pos));
                self.controller.release(cell);
                self.pressed_cell = None;
            }
        }
        response
    }

    fn ui_status(&self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            let raster = self.controller.state().raster();
            let document = self
                .controller
                .document_path()
                .map_or_else(|| "untitled".to_owned(), |path| path.display().to_string());
            ui.label(format!("{document}  {}x{}", raster.width(), raster.height()));
            if !self.status.is_empty() {
                ui.separator();
                ui.colored_label(Color32::LIGHT_RED, self.status.as_str());
            }
        });
    }
}

impl App for PaintApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.shortcuts(ctx);
        TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.ui_file(ui);
            self.ui_control(ui);
        });
        TopBottomPanel::bottom("status").show(ctx, |ui| self.ui_status(ui));
        SidePanel::right("charset").resizable(false).show(ctx, |ui| {
            self.ui_charset(ui);
        });
        CentralPanel::default().show(ctx, |ui| {
            ScrollArea::both().auto_shrink(false).show(ui, |ui| {
                self.ui_content(ui);
            });
        });
        self.drain_events();
    }
}
