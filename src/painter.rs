use eframe::egui::Color32;
use glam::{DVec2, IVec2};
use grid::Grid;

use crate::brush::Brush;
use crate::raster::{Cell, Raster};

/// A pen over a borrowed raster.
///
/// The pen has a position, a foreground and background color and a brush.
/// Drawing happens at the pen position with the pen colors; every method
/// returns `&mut Self` so calls can be chained. The pen may wander outside
/// the raster, anything drawn there is clipped.
pub struct Painter<'a> {
    surface: &'a mut Raster,
    pen: IVec2,
    fore: Color32,
    back: Color32,
    brush: Brush,
}

impl<'a> Painter<'a> {
    pub fn new(surface: &'a mut Raster) -> Self {
        Self {
            surface,
            pen: IVec2::ZERO,
            fore: Color32::WHITE,
            back: Color32::BLACK,
            brush: Brush::default(),
        }
    }

    pub fn surface(&self) -> &Raster {
        &*self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Raster {
        &mut *self.surface
    }

    pub fn pen(&self) -> IVec2 {
        self.pen
    }

    pub fn foreground_color(&self) -> Color32 {
        self.fore
    }

    pub fn background_color(&self) -> Color32 {
        self.back
    }

    pub fn active_brush(&self) -> Brush {
        self.brush
    }

    pub fn move_to(&mut self, x: i32, y: i32) -> &mut Self {
        self.pen = IVec2::new(x, y);
        self
    }

    pub fn move_by(&mut self, dx: i32, dy: i32) -> &mut Self {
        self.pen += IVec2::new(dx, dy);
        self
    }

    pub fn foreground(&mut self, color: Color32) -> &mut Self {
        self.fore = color;
        self
    }

    pub fn background(&mut self, color: Color32) -> &mut Self {
        self.back = color;
        self
    }

    pub fn brush(&mut self, brush: Brush) -> &mut Self {
        self.brush = brush;
        self
    }

    fn ink(&self, ch: char) -> Cell {
        Cell::new(ch, self.fore, self.back)
    }

    pub fn clear(&mut self) -> &mut Self {
        self.clear_with(' ')
    }

    /// Overwrites the whole surface with `ch` in the pen colors. The pen stays put.
    pub fn clear_with(&mut self, ch: char) -> &mut Self {
        let cell = self.ink(ch);
        self.surface.fill(cell);
        self
    }

    /// Fills the box spanned by the pen and `(x, y)`, both corners included,
    /// then moves the pen to `(x, y)`.
    pub fn fill_rect_to(&mut self, ch: char, x: i32, y: i32) -> &mut Self {
        let target = IVec2::new(x, y);
        let cell = self.ink(ch);
        let min = self.pen.min(target).max(IVec2::ZERO);
        let max = self.pen.max(target).min(self.surface.size() - IVec2::ONE);
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                if let Some(slot) = self.surface.get_mut(IVec2::new(x, y)) {
                    *slot = cell;
                }
            }
        }
        self.pen = target;
        self
    }

    pub fn fill_rect(&mut self, ch: char, dx: i32, dy: i32) -> &mut Self {
        let target = self.pen + IVec2::new(dx, dy);
        self.fill_rect_to(ch, target.x, target.y)
    }

    /// Writes one character at the pen and advances it by one column.
    pub fn write(&mut self, ch: char) -> &mut Self {
        let cell = self.ink(ch);
        if let Some(slot) = self.surface.get_mut(self.pen) {
            *slot = cell;
        }
        self.move_by(1, 0)
    }

    /// Writes a string, wrapping to column 0 of the next row at the right edge
    /// and on `'\n'`.
    pub fn write_str(&mut self, text: &str) -> &mut Self {
        let width = self.surface.size().x;
        for ch in text.chars() {
            if ch == '\n' {
                self.pen = IVec2::new(0, self.pen.y + 1);
                continue;
            }
            if self.pen.x >= width {
                self.pen = IVec2::new(0, self.pen.y + 1);
            }
            self.write(ch);
        }
        self
    }

    /// Writes a string horizontally centered on the pen row.
    pub fn write_center(&mut self, text: &str) -> &mut Self {
        let len = text.chars().count() as i32;
        self.pen.x = (self.surface.size().x - len) / 2;
        self.write_str(text)
    }

    /// Flood fills the 4-connected area that shares the (char, fore, back) of the
    /// cell under the pen. A pen outside the surface starts from the nearest cell.
    pub fn fill(&mut self, ch: char) -> &mut Self {
        let size = self.surface.size();
        if size.x <= 0 || size.y <= 0 {
            return self;
        }
        let start = self.pen.clamp(IVec2::ZERO, size - IVec2::ONE);
        let Some(&target) = self.surface.get(start) else {
            return self;
        };
        let replacement = self.ink(ch);
        if target == replacement {
            return self;
        }

        let mut visited = Grid::init(size.y as usize, size.x as usize, false);
        visited[(start.y as usize, start.x as usize)] = true;
        let mut worklist = vec![start];
        while let Some(pos) = worklist.pop() {
            match self.surface.get_mut(pos) {
                Some(cell) if *cell == target => *cell = replacement,
                _ => continue,
            }
            for next in [pos - IVec2::X, pos + IVec2::X, pos - IVec2::Y, pos + IVec2::Y] {
                if !self.surface.contains(next) {
                    continue;
                }
                let seen = &mut visited[(next.y as usize, next.x as usize)];
                if !*seen {
                    *seen = true;
                    worklist.push(next);
                }
            }
        }
        self
    }

    fn raster_origin(&self, raster: &Raster, center: bool) -> IVec2 {
        if center {
            self.pen - raster.size() / 2
        } else {
            self.pen
        }
    }

    /// Copies `raster` to the pen position (or centered on it). With
    /// `transparent`, cells holding `'\0'` are left alone.
    pub fn draw_raster(&mut self, raster: &Raster, transparent: bool, center: bool) -> &mut Self {
        let origin = self.raster_origin(raster, center);
        if !transparent {
            self.surface.blit(raster, origin);
            return self;
        }
        for (offset, cell) in raster.cells() {
            if cell.ch == '\0' {
                continue;
            }
            if let Some(slot) = self.surface.get_mut(origin + offset) {
                *slot = *cell;
            }
        }
        self
    }

    /// Like [`Painter::draw_raster`] but only takes the characters; colors come from the pen.
    pub fn draw_raster_chars(&mut self, raster: &Raster, transparent: bool, center: bool) -> &mut Self {
        let origin = self.raster_origin(raster, center);
        for (offset, cell) in raster.cells() {
            if transparent && cell.ch == '\0' {
                continue;
            }
            let ink = self.ink(cell.ch);
            if let Some(slot) = self.surface.get_mut(origin + offset) {
                *slot = ink;
            }
        }
        self
    }

    pub fn draw_dot(&mut self) -> &mut Self {
        if self.surface.contains(self.pen) {
            let brush = self.brush;
            let pen = self.pen;
            brush.stroke(self, pen, pen);
        }
        self
    }

    /// Strokes the active brush from the pen to `(x, y)` and moves the pen there.
    /// Only the part of the line inside the surface reaches the brush.
    pub fn draw_line_to(&mut self, x: i32, y: i32) -> &mut Self {
        let target = IVec2::new(x, y);
        if let Some((from, to)) = self.clip_segment(self.pen, target) {
            let brush = self.brush;
            brush.stroke(self, from, to);
        }
        self.pen = target;
        self
    }

    pub fn draw_line(&mut self, dx: i32, dy: i32) -> &mut Self {
        let target = self.pen + IVec2::new(dx, dy);
        self.draw_line_to(target.x, target.y)
    }

    /// Liang-Barsky clipping of a segment against the cell area of the surface.
    fn clip_segment(&self, from: IVec2, to: IVec2) -> Option<(IVec2, IVec2)> {
        let size = self.surface.size();
        if size.x <= 0 || size.y <= 0 {
            return None;
        }
        let start = from.as_dvec2();
        let delta = to.as_dvec2() - start;
        let min = DVec2::splat(-0.5);
        let max = size.as_dvec2() - DVec2::splat(0.5);

        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;
        for (p, q) in [
            (-delta.x, start.x - min.x),
            (delta.x, max.x - start.x),
            (-delta.y, start.y - min.y),
            (delta.y, max.y - start.y),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }

        let last = size - IVec2::ONE;
        let clip = |t: f64| (start + delta * t).round().as_ivec2().clamp(IVec2::ZERO, last);
        Some((clip(t0), clip(t1)))
    }
}
