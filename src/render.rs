use eframe::egui::{Color32, ColorImage};

use crate::font::{GlyphAtlas, GLYPH_COUNT};
use crate::raster::{Cell, Raster};

/// Cells per row of the character picker.
pub const CHARSET_COLUMNS: usize = 16;

/// Rasterizes every cell with its glyph: coverage blends from the back color
/// to the fore color.
pub fn render(raster: &Raster, atlas: &GlyphAtlas) -> ColorImage {
    let (glyph_width, glyph_height) = (atlas.glyph_width(), atlas.glyph_height());
    let mut image = ColorImage::filled(
        [raster.width() * glyph_width, raster.height() * glyph_height],
        Color32::BLACK,
    );
    for (pos, cell) in raster.cells() {
        let left = pos.x as usize * glyph_width;
        let top = pos.y as usize * glyph_height;
        for ((y, x), &coverage) in atlas.glyph(cell.ch).indexed_iter() {
            image[(left + x, top + y)] = cell.back.lerp_to_gamma(cell.fore, coverage as f32 / 255.0);
        }
    }
    image
}

/// All 256 glyphs laid out 16 per row, for picking a character.
pub fn charset(fore: Color32, back: Color32) -> Raster {
    let mut raster = Raster::new(CHARSET_COLUMNS, GLYPH_COUNT / CHARSET_COLUMNS);
    for code in 0..GLYPH_COUNT {
        let cell = Cell::new(char::from(code as u8), fore, back);
        // The raster is exactly 16x16, every code has a slot.
        let _ = raster.set_cell((code % CHARSET_COLUMNS) as i32, (code / CHARSET_COLUMNS) as i32, cell);
    }
    raster
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::striped_atlas;

    #[test]
    fn glyph_coverage_picks_fore_or_back() {
        let atlas = striped_atlas(2, 4);
        let mut raster = Raster::new(2, 1);
        // two inked rows out of four
        raster.set_cell(1, 0, Cell::new(char::from(2u8), Color32::RED, Color32::BLUE)).unwrap();
        let image = render(&raster, &atlas);
        assert_eq!(image.size, [4, 4]);
        assert_eq!(image[(2, 0)], Color32::RED);
        assert_eq!(image[(3, 1)], Color32::RED);
        assert_eq!(image[(2, 2)], Color32::BLUE);
        // bottom row of the default space cell is paper
        assert_eq!(image[(0, 3)], Color32::BLACK);
    }

    #[test]
    fn charset_lists_every_code() {
        let raster = charset(Color32::WHITE, Color32::BLACK);
        assert_eq!(raster.width(), 16);
        assert_eq!(raster.height(), 16);
        assert_eq!(raster.char_at(1, 4).unwrap(), 'A');
        assert_eq!(raster.char_at(15, 15).unwrap(), char::from(255u8));
    }
}
