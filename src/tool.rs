use glam::IVec2;

use crate::brush::Brush;
use crate::editor::EditorState;
use crate::raster::Raster;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ToolKind {
    #[default]
    Paint,
    DrawRect,
    FillRect,
    Erase,
    Fill,
    Pick,
}

impl ToolKind {
    /// Toolbar order.
    pub const ALL: [ToolKind; 6] = [
        ToolKind::Paint,
        ToolKind::DrawRect,
        ToolKind::FillRect,
        ToolKind::Erase,
        ToolKind::Fill,
        ToolKind::Pick,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ToolKind::Paint => "Paint",
            ToolKind::DrawRect => "Rectangle",
            ToolKind::FillRect => "Filled rectangle",
            ToolKind::Erase => "Erase",
            ToolKind::Fill => "Fill",
            ToolKind::Pick => "Pick",
        }
    }
}

enum Gesture {
    Idle,
    Dragging {
        anchor: IVec2,
        last: IVec2,
        /// Raster before the gesture, rectangles are redrawn over it.
        baseline: Option<Raster>,
    },
}

/// Turns pointer presses, drags and releases on cells into edits.
pub struct Tool {
    kind: ToolKind,
    gesture: Gesture,
}

impl Default for Tool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool {
    pub fn new() -> Self {
        Self {
            kind: ToolKind::default(),
            gesture: Gesture::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. })
    }

    pub fn press(&mut self, state: &mut EditorState, pos: IVec2) {
        if self.is_dragging() {
            return;
        }
        self.kind = state.active_tool();
        log::debug!("{:?} pressed at {pos}", self.kind);
        let ch = state.active_character();
        match self.kind {
            ToolKind::Paint | ToolKind::Erase => {
                let brush = self.brush(ch);
                state.begin_undoable_paint().brush(brush).move_to(pos.x, pos.y).draw_dot();
                state.end_paint();
                self.gesture = Gesture::Dragging {
                    anchor: pos,
                    last: pos,
                    baseline: None,
                };
            }
            ToolKind::DrawRect | ToolKind::FillRect => {
                let baseline = state.raster().clone();
                state.begin_undoable_paint();
                self.draw_rect(state, &baseline, pos, pos);
                self.gesture = Gesture::Dragging {
                    anchor: pos,
                    last: pos,
                    baseline: Some(baseline),
                };
            }
            ToolKind::Fill => {
                state.begin_undoable_paint().move_to(pos.x, pos.y).fill(ch);
                state.end_paint();
            }
            ToolKind::Pick => {
                let Ok(cell) = state.raster().cell(pos.x, pos.y) else {
                    return;
                };
                state.set_active_character(cell.ch);
                state.set_active_foreground(cell.fore);
                state.set_active_background(cell.back);
                state.set_active_tool(ToolKind::Paint);
            }
        }
    }

    pub fn drag(&mut self, state: &mut EditorState, pos: IVec2) {
        let Gesture::Dragging { anchor, last, baseline } = &mut self.gesture else {
            return;
        };
        if *last == pos {
            return;
        }
        let from = *last;
        *last = pos;
        match (self.kind, baseline) {
            (ToolKind::DrawRect | ToolKind::FillRect, Some(baseline)) => {
                let (kind, anchor) = (self.kind, *anchor);
                Self::draw_rect_with(kind, state, baseline, anchor, pos);
            }
            (kind, _) => {
                let brush = Self::brush_for(kind, state.active_character());
                state
                    .begin_paint()
                    .brush(brush)
                    .move_to(from.x, from.y)
                    .draw_line_to(pos.x, pos.y);
                state.end_paint();
            }
        }
    }

    /// Finishes the gesture, wherever the pointer is.
    pub fn release(&mut self, state: &mut EditorState, pos: IVec2) {
        if !self.is_dragging() {
            return;
        }
        self.drag(state, pos);
        self.gesture = Gesture::Idle;
        log::debug!("{:?} released at {pos}", self.kind);
    }

    /// Ends a gesture where it last drew. Commands that swap the raster call
    /// this first so later drags cannot paint over the new contents.
    pub fn finish(&mut self) {
        if let Gesture::Dragging { last, .. } = self.gesture {
            log::debug!("{:?} finished at {last}", self.kind);
            self.gesture = Gesture::Idle;
        }
    }

    fn brush(&self, ch: char) -> Brush {
        Self::brush_for(self.kind, ch)
    }

    fn brush_for(kind: ToolKind, ch: char) -> Brush {
        match kind {
            ToolKind::Erase => Brush::Eraser,
            _ => Brush::CharacterStamp(ch),
        }
    }

    fn draw_rect(&self, state: &mut EditorState, baseline: &Raster, anchor: IVec2, to: IVec2) {
        Self::draw_rect_with(self.kind, state, baseline, anchor, to);
    }

    /// Restores the baseline then draws the rectangle from `anchor` to `to`.
    fn draw_rect_with(kind: ToolKind, state: &mut EditorState, baseline: &Raster, anchor: IVec2, to: IVec2) {
        let ch = state.active_character();
        let mut painter = state.begin_paint();
        painter.move_to(0, 0).draw_raster(baseline, false, false);
        painter.move_to(anchor.x, anchor.y);
        if kind == ToolKind::FillRect {
            painter.fill_rect_to(ch, to.x, to.y);
        } else {
            painter
                .brush(Brush::CharacterStamp(ch))
                .draw_line_to(to.x, anchor.y)
                .draw_line_to(to.x, to.y)
                .draw_line_to(anchor.x, to.y)
                .draw_line_to(anchor.x, anchor.y);
        }
        state.end_paint();
    }
}
