use eframe::egui::Color32;
use glam::IVec2;
use grid::Grid;

use crate::error::{RasterError, Result};

/// One character cell: a glyph code and its two colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    pub ch: char,
    pub fore: Color32,
    pub back: Color32,
}

impl Cell {
    pub const fn new(ch: char, fore: Color32, back: Color32) -> Self {
        Self { ch, fore, back }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new(' ', Color32::WHITE, Color32::BLACK)
    }
}

/// Largest document accepted from files or the new image command, in cells.
pub const MAX_CELLS: usize = 4_000_000;

/// The document: a fixed size grid of cells, stored row-major as `(y, x)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster(Grid<Cell>);

impl Raster {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, Cell::default())
    }

    pub fn filled(width: usize, height: usize, cell: Cell) -> Self {
        Self(Grid::init(height, width, cell))
    }

    pub fn width(&self) -> usize {
        self.0.cols()
    }

    pub fn height(&self) -> usize {
        self.0.rows()
    }

    pub fn size(&self) -> IVec2 {
        IVec2::new(self.width() as i32, self.height() as i32)
    }

    pub fn contains(&self, pos: IVec2) -> bool {
        !pos.cmplt(IVec2::ZERO).any() && pos.cmplt(self.size()).all()
    }

    pub fn get(&self, pos: IVec2) -> Option<&Cell> {
        if !self.contains(pos) {
            return None;
        }
        self.0.get(pos.y as usize, pos.x as usize)
    }

    pub fn get_mut(&mut self, pos: IVec2) -> Option<&mut Cell> {
        if !self.contains(pos) {
            return None;
        }
        self.0.get_mut(pos.y as usize, pos.x as usize)
    }

    /// Reads a cell, failing with [`RasterError::OutOfBounds`] outside the grid.
    pub fn cell(&self, x: i32, y: i32) -> Result<Cell> {
        self.get(IVec2::new(x, y)).copied().ok_or_else(|| self.out_of_bounds(x, y))
    }

    /// Writes a cell, failing with [`RasterError::OutOfBounds`] outside the grid.
    pub fn set_cell(&mut self, x: i32, y: i32, cell: Cell) -> Result<()> {
        let err = self.out_of_bounds(x, y);
        let slot = self.get_mut(IVec2::new(x, y)).ok_or(err)?;
        *slot = cell;
        Ok(())
    }

    pub fn char_at(&self, x: i32, y: i32) -> Result<char> {
        self.cell(x, y).map(|c| c.ch)
    }

    pub fn fore_at(&self, x: i32, y: i32) -> Result<Color32> {
        self.cell(x, y).map(|c| c.fore)
    }

    pub fn back_at(&self, x: i32, y: i32) -> Result<Color32> {
        self.cell(x, y).map(|c| c.back)
    }

    /// Iterates cells with their `(x, y)` position, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (IVec2, &Cell)> {
        self.0
            .indexed_iter()
            .map(|((y, x), cell)| (IVec2::new(x as i32, y as i32), cell))
    }

    pub fn fill(&mut self, cell: Cell) {
        self.0.fill(cell);
    }

    /// Copies `other` with its top-left corner at `pos`, skipping whatever falls outside.
    pub fn blit(&mut self, other: &Raster, pos: IVec2) {
        for (offset, cell) in other.cells() {
            if let Some(slot) = self.get_mut(pos + offset) {
                *slot = *cell;
            }
        }
    }

    /// Characters only, one line per row.
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity((self.width() + 1) * self.height());
        for y in 0..self.height() {
            text.extend(self.0.iter_row(y).map(|cell| cell.ch));
            text.push('\n');
        }
        text
    }

    fn out_of_bounds(&self, x: i32, y: i32) -> RasterError {
        RasterError::OutOfBounds {
            x,
            y,
            width: self.width(),
            height: self.height(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::Rng;

    use super::*;

    fn random_raster(width: usize, height: usize) -> Raster {
        let mut rng = rand::rng();
        let mut raster = Raster::new(width, height);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let cell = Cell::new(
                    char::from(rng.random_range(32u8..127)),
                    Color32::from_rgb(rng.random(), rng.random(), rng.random()),
                    Color32::from_rgb(rng.random(), rng.random(), rng.random()),
                );
                raster.set_cell(x, y, cell).unwrap();
            }
        }
        raster
    }

    #[test]
    fn new_raster_is_blank() {
        let raster = Raster::new(4, 3);
        assert_eq!(raster.width(), 4);
        assert_eq!(raster.height(), 3);
        assert!(raster.cells().all(|(_, c)| *c == Cell::default()));
        assert_eq!(raster.cells().count(), 12);
    }

    #[test]
    fn out_of_bounds_access_is_reported() {
        let mut raster = Raster::new(4, 3);
        assert!(matches!(raster.cell(4, 0), Err(RasterError::OutOfBounds { x: 4, y: 0, .. })));
        assert!(matches!(raster.cell(0, -1), Err(RasterError::OutOfBounds { .. })));
        assert!(raster.set_cell(-1, 2, Cell::default()).is_err());
        assert!(raster.set_cell(3, 2, Cell::default()).is_ok());
    }

    #[test]
    fn clone_is_independent() {
        let original = random_raster(16, 9);
        let snapshot = original.clone();
        let mut copy = original.clone();
        copy.set_cell(3, 4, Cell::new('#', Color32::RED, Color32::BLUE)).unwrap();
        copy.fill(Cell::new('x', Color32::GREEN, Color32::GREEN));
        assert_eq!(original, snapshot);
        assert_ne!(original, copy);
    }

    #[test]
    fn blit_clips_to_bounds() {
        let mut raster = Raster::new(3, 3);
        let stamp = Raster::filled(2, 2, Cell::new('o', Color32::RED, Color32::BLACK));
        raster.blit(&stamp, IVec2::new(2, -1));
        assert_eq!(raster.char_at(2, 0).unwrap(), 'o');
        assert_eq!(raster.char_at(1, 0).unwrap(), ' ');
        assert_eq!(raster.char_at(2, 1).unwrap(), ' ');
    }

    #[test]
    fn to_text_emits_rows() {
        let mut raster = Raster::new(3, 2);
        raster.set_cell(0, 0, Cell::new('a', Color32::WHITE, Color32::BLACK)).unwrap();
        raster.set_cell(2, 1, Cell::new('z', Color32::WHITE, Color32::BLACK)).unwrap();
        assert_eq!(raster.to_text(), "a  \n  z\n");
    }
}
