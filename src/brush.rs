use eframe::egui::Color32;
use glam::IVec2;

use crate::painter::Painter;
use crate::raster::{Cell, Raster};

/// Cells of the Bresenham line from `from` to `to`, both ends included.
///
/// Consecutive points never differ by more than one in either axis, so the
/// path has no gaps whatever the slope.
pub struct Linear {
    pos: IVec2,
    to: IVec2,
    delta: IVec2,
    step: IVec2,
    err: i32,
    done: bool,
}

impl Linear {
    pub fn new(from: IVec2, to: IVec2) -> Self {
        let delta = IVec2::new((to.x - from.x).abs(), -(to.y - from.y).abs());
        let step = IVec2::new(
            if from.x < to.x { 1 } else { -1 },
            if from.y < to.y { 1 } else { -1 },
        );
        Self {
            pos: from,
            to,
            delta,
            step,
            err: delta.x + delta.y,
            done: false,
        }
    }
}

impl Iterator for Linear {
    type Item = IVec2;

    fn next(&mut self) -> Option<IVec2> {
        if self.done {
            return None;
        }
        let current = self.pos;
        if current == self.to {
            self.done = true;
            return Some(current);
        }
        let e2 = 2 * self.err;
        if e2 >= self.delta.y {
            self.err += self.delta.y;
            self.pos.x += self.step.x;
        }
        if e2 <= self.delta.x {
            self.err += self.delta.x;
            self.pos.y += self.step.y;
        }
        Some(current)
    }
}

/// What a stroke leaves behind on each cell of its path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Brush {
    /// Writes the character with the painter's colors.
    CharacterStamp(char),
    /// Blanks the character, colors stay.
    Eraser,
}

impl Default for Brush {
    fn default() -> Self {
        Brush::CharacterStamp(' ')
    }
}

impl Brush {
    pub fn dot(self, raster: &mut Raster, pos: IVec2, fore: Color32, back: Color32) {
        let Some(cell) = raster.get_mut(pos) else {
            return;
        };
        match self {
            Brush::CharacterStamp(ch) => *cell = Cell::new(ch, fore, back),
            Brush::Eraser => cell.ch = ' ',
        }
    }

    /// Applies the brush along the line from `from` to `to`.
    pub fn stroke(self, painter: &mut Painter<'_>, from: IVec2, to: IVec2) {
        let fore = painter.foreground_color();
        let back = painter.background_color();
        let surface = painter.surface_mut();
        for pos in Linear::new(from, to) {
            self.dot(surface, pos, fore, back);
        }
    }
}
