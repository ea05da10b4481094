use std::collections::VecDeque;
use std::mem;
use std::sync::mpsc::{channel, Receiver, Sender};

use eframe::egui::Color32;

use crate::painter::Painter;
use crate::raster::Raster;
use crate::tool::ToolKind;

/// Default number of undo snapshots kept.
pub const DEFAULT_UNDO_LIMIT: usize = 20;

/// Notifications from the editor to whoever draws it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorEvent {
    ToolSelected(ToolKind),
    CharacterSelected(char),
    ForegroundSelected(Color32),
    BackgroundSelected(Color32),
    /// Cells of the live raster changed.
    RasterChanged,
    /// The live raster was swapped for a new document, possibly of another size.
    RasterReplaced,
    UndoRedoChanged { can_undo: bool, can_redo: bool },
}

/// The document being edited and the selections applied to it.
///
/// Undo works on whole snapshots: an undoable paint pushes a copy of the
/// raster before it is touched, undo and redo swap the live raster with the
/// top of the other stack.
pub struct EditorState {
    raster: Raster,
    tool: ToolKind,
    character: char,
    fore: Color32,
    back: Color32,
    undo: VecDeque<Raster>,
    redo: VecDeque<Raster>,
    undo_limit: usize,
    events: Sender<EditorEvent>,
}

impl EditorState {
    pub fn new(raster: Raster, undo_limit: usize) -> (Self, Receiver<EditorEvent>) {
        let (events, receiver) = channel();
        let state = Self {
            raster,
            tool: ToolKind::Paint,
            character: '#',
            fore: Color32::WHITE,
            back: Color32::BLACK,
            undo: VecDeque::with_capacity(undo_limit),
            redo: VecDeque::new(),
            undo_limit,
            events,
        };
        (state, receiver)
    }

    fn emit(&self, event: EditorEvent) {
        // Nobody listening is fine, e.g. in headless use.
        let _ = self.events.send(event);
    }

    fn emit_history(&self) {
        self.emit(EditorEvent::UndoRedoChanged {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        });
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn active_tool(&self) -> ToolKind {
        self.tool
    }

    pub fn active_character(&self) -> char {
        self.character
    }

    pub fn active_foreground(&self) -> Color32 {
        self.fore
    }

    pub fn active_background(&self) -> Color32 {
        self.back
    }

    pub fn undo_limit(&self) -> usize {
        self.undo_limit
    }

    pub fn set_active_tool(&mut self, tool: ToolKind) {
        if self.tool != tool {
            self.tool = tool;
            self.emit(EditorEvent::ToolSelected(tool));
        }
    }

    pub fn set_active_character(&mut self, character: char) {
        if self.character != character {
            self.character = character;
            self.emit(EditorEvent::CharacterSelected(character));
        }
    }

    pub fn set_active_foreground(&mut self, color: Color32) {
        if self.fore != color {
            self.fore = color;
            self.emit(EditorEvent::ForegroundSelected(color));
        }
    }

    pub fn set_active_background(&mut self, color: Color32) {
        if self.back != color {
            self.back = color;
            self.emit(EditorEvent::BackgroundSelected(color));
        }
    }

    /// A painter over the live raster, loaded with the active colors. Nothing is recorded.
    pub fn begin_paint(&mut self) -> Painter<'_> {
        let (fore, back) = (self.fore, self.back);
        let mut painter = Painter::new(&mut self.raster);
        painter.foreground(fore).background(back);
        painter
    }

    /// Snapshots the live raster for undo, forgets the redo history and
    /// returns a painter like [`EditorState::begin_paint`].
    pub fn begin_undoable_paint(&mut self) -> Painter<'_> {
        let snapshot = self.raster.clone();
        self.push_undo(snapshot);
        self.redo.clear();
        self.emit_history();
        self.begin_paint()
    }

    /// Announces that the raster was painted on.
    pub fn end_paint(&mut self) {
        self.emit(EditorEvent::RasterChanged);
    }

    fn push_undo(&mut self, snapshot: Raster) {
        if self.undo_limit == 0 {
            return;
        }
        if self.undo.len() == self.undo_limit {
            self.undo.pop_back();
        }
        self.undo.push_front(snapshot);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Returns false when there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo.pop_front() else {
            return false;
        };
        let current = mem::replace(&mut self.raster, previous);
        self.redo.push_front(current);
        log::debug!("undo, {} left", self.undo.len());
        self.emit(EditorEvent::RasterChanged);
        self.emit_history();
        true
    }

    /// Returns false when there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo.pop_front() else {
            return false;
        };
        let current = mem::replace(&mut self.raster, next);
        self.push_undo(current);
        log::debug!("redo, {} left", self.redo.len());
        self.emit(EditorEvent::RasterChanged);
        self.emit_history();
        true
    }

    pub fn reset_undo_redo_stack(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.emit_history();
    }

    /// Makes `raster` the live document. History is kept; callers opening a
    /// new document reset it themselves.
    pub fn replace_raster(&mut self, raster: Raster) {
        self.raster = raster;
        self.emit(EditorEvent::RasterReplaced);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::raster::Cell;

    fn drain(events: &Receiver<EditorEvent>) -> Vec<EditorEvent> {
        events.try_iter().collect()
    }

    fn paint(state: &mut EditorState, ch: char) {
        state.begin_undoable_paint().move_to(0, 0).write(ch);
        state.end_paint();
    }

    #[test]
    fn painter_uses_active_colors() {
        let (mut state, _events) = EditorState::new(Raster::new(2, 1), 5);
        state.set_active_foreground(Color32::RED);
        state.set_active_background(Color32::BLUE);
        state.begin_paint().write('x');
        assert_eq!(state.raster().cell(0, 0).unwrap(), Cell::new('x', Color32::RED, Color32::BLUE));
        assert!(!state.can_undo());
    }

    #[test]
    fn undo_and_redo_swap_snapshots() {
        let (mut state, _events) = EditorState::new(Raster::new(1, 1), 5);
        paint(&mut state, 'a');
        paint(&mut state, 'b');
        assert_eq!(state.raster().char_at(0, 0).unwrap(), 'b');

        assert!(state.undo());
        assert_eq!(state.raster().char_at(0, 0).unwrap(), 'a');
        assert!(state.undo());
        assert_eq!(state.raster().char_at(0, 0).unwrap(), ' ');
        assert!(!state.undo());

        assert!(state.redo());
        assert!(state.redo());
        assert_eq!(state.raster().char_at(0, 0).unwrap(), 'b');
        assert!(!state.redo());
    }

    #[test]
    fn new_gesture_clears_redo() {
        let (mut state, _events) = EditorState::new(Raster::new(1, 1), 5);
        paint(&mut state, 'a');
        state.undo();
        assert!(state.can_redo());
        paint(&mut state, 'c');
        assert!(!state.can_redo());
        assert!(!state.redo());
    }

    #[test]
    fn undo_history_is_capped() {
        let (mut state, _events) = EditorState::new(Raster::new(1, 1), 3);
        for ch in ['1', '2', '3', '4', '5'] {
            paint(&mut state, ch);
        }
        let mut undone = 0;
        while state.undo() {
            undone += 1;
        }
        assert_eq!(undone, 3);
        assert_eq!(state.raster().char_at(0, 0).unwrap(), '2');
    }

    #[test]
    fn zero_limit_keeps_no_history() {
        let (mut state, _events) = EditorState::new(Raster::new(1, 1), 0);
        paint(&mut state, 'a');
        assert!(!state.can_undo());
    }

    #[test]
    fn setters_only_notify_changes() {
        let (mut state, events) = EditorState::new(Raster::new(1, 1), 5);
        state.set_active_tool(ToolKind::Paint);
        state.set_active_character('#');
        state.set_active_foreground(Color32::WHITE);
        assert!(drain(&events).is_empty());

        state.set_active_tool(ToolKind::Fill);
        state.set_active_character('@');
        state.set_active_background(Color32::RED);
        assert_eq!(
            drain(&events),
            vec![
                EditorEvent::ToolSelected(ToolKind::Fill),
                EditorEvent::CharacterSelected('@'),
                EditorEvent::BackgroundSelected(Color32::RED),
            ]
        );
    }

    #[test]
    fn paint_and_history_events() {
        let (mut state, events) = EditorState::new(Raster::new(1, 1), 5);
        paint(&mut state, 'a');
        state.undo();
        state.reset_undo_redo_stack();
        state.replace_raster(Raster::new(3, 3));
        assert_eq!(
            drain(&events),
            vec![
                EditorEvent::UndoRedoChanged { can_undo: true, can_redo: false },
                EditorEvent::RasterChanged,
                EditorEvent::RasterChanged,
                EditorEvent::UndoRedoChanged { can_undo: false, can_redo: true },
                EditorEvent::UndoRedoChanged { can_undo: false, can_redo: false },
                EditorEvent::RasterReplaced,
            ]
        );
        assert_eq!(state.raster().width(), 3);
    }

    #[test]
    fn dropped_receiver_does_not_panic() {
        let (mut state, events) = EditorState::new(Raster::new(1, 1), 5);
        drop(events);
        paint(&mut state, 'a');
        state.undo();
    }
}
