use std::path::{Path, PathBuf};

use grid::Grid;
use image::RgbaImage;

use crate::error::{RasterError, Result};

/// Glyphs in a sprite sheet: a 16x16 grid indexed by character code.
pub const GLYPH_COUNT: usize = 256;
const SHEET_COLUMNS: u32 = 16;
const INK_COVERAGE: u8 = 128;
const FALLBACK_GLYPH: usize = b'?' as usize;

/// The bitmap font used to render and to import: one coverage bitmap per code.
pub struct GlyphAtlas {
    glyph_width: usize,
    glyph_height: usize,
    glyphs: Vec<Grid<u8>>,
    densities: Vec<f32>,
}

impl GlyphAtlas {
    /// Loads a sprite sheet from disk. Any failure is a [`RasterError::ResourceLoad`].
    pub fn load(path: impl AsRef<Path>, glyph_width: u32, glyph_height: u32) -> Result<Self> {
        let path = path.as_ref();
        let sheet = image::open(path).map_err(|err| RasterError::resource_load(path, err))?;
        Self::from_sprite(&sheet.to_rgba8(), glyph_width, glyph_height).map_err(|err| match err {
            RasterError::ResourceLoad { message, .. } => RasterError::resource_load(path, message),
            other => other,
        })
    }

    /// Cuts a sheet of 16x16 glyphs of `glyph_width` x `glyph_height` pixels.
    /// Coverage of a pixel is its brightest channel scaled by alpha, so both
    /// light-on-dark and transparent sheets work.
    pub fn from_sprite(sheet: &RgbaImage, glyph_width: u32, glyph_height: u32) -> Result<Self> {
        if glyph_width == 0 || glyph_height == 0 {
            return Err(RasterError::resource_load(
                PathBuf::from("<sprite sheet>"),
                "glyph size must not be zero",
            ));
        }
        if sheet.width() < glyph_width * SHEET_COLUMNS || sheet.height() < glyph_height * SHEET_COLUMNS {
            return Err(RasterError::resource_load(
                PathBuf::from("<sprite sheet>"),
                format!(
                    "sheet is {}x{}, too small for 16x16 glyphs of {glyph_width}x{glyph_height}",
                    sheet.width(),
                    sheet.height()
                ),
            ));
        }

        let (width, height) = (glyph_width as usize, glyph_height as usize);
        let mut glyphs = Vec::with_capacity(GLYPH_COUNT);
        let mut densities = Vec::with_capacity(GLYPH_COUNT);
        for code in 0..GLYPH_COUNT as u32 {
            let left = (code % SHEET_COLUMNS) * glyph_width;
            let top = (code / SHEET_COLUMNS) * glyph_height;
            let mut glyph = Grid::new(height, width);
            let mut ink = 0usize;
            for ((y, x), coverage) in glyph.indexed_iter_mut() {
                let [r, g, b, a] = sheet.get_pixel(left + x as u32, top + y as u32).0;
                *coverage = (r.max(g).max(b) as u32 * a as u32 / u8::MAX as u32) as u8;
                if *coverage >= INK_COVERAGE {
                    ink += 1;
                }
            }
            densities.push(ink as f32 / (width * height) as f32);
            glyphs.push(glyph);
        }
        log::debug!("cut {GLYPH_COUNT} glyphs of {width}x{height} from sprite sheet");

        Ok(Self {
            glyph_width: width,
            glyph_height: height,
            glyphs,
            densities,
        })
    }

    pub fn glyph_width(&self) -> usize {
        self.glyph_width
    }

    pub fn glyph_height(&self) -> usize {
        self.glyph_height
    }

    fn index(ch: char) -> usize {
        let code = ch as usize;
        if code < GLYPH_COUNT {
            code
        } else {
            FALLBACK_GLYPH
        }
    }

    /// Coverage bitmap of `ch`; codes past 255 render as `'?'`.
    pub fn glyph(&self, ch: char) -> &Grid<u8> {
        &self.glyphs[Self::index(ch)]
    }

    /// Ratio of ink pixels in the glyph, from 0 (blank) to 1 (solid).
    pub fn density(&self, ch: char) -> f32 {
        self.densities[Self::index(ch)]
    }

    /// For every ink level `0..=255` the character whose density is nearest
    /// to `level / 255`. Code 0 is never picked; on ties the lowest code wins.
    pub fn density_ramp(&self) -> [char; GLYPH_COUNT] {
        let mut ramp = [' '; GLYPH_COUNT];
        for (level, slot) in ramp.iter_mut().enumerate() {
            let wanted = level as f32 / u8::MAX as f32;
            let mut best = (f32::MAX, ' ');
            for (code, density) in self.densities.iter().enumerate().skip(1) {
                let distance = (density - wanted).abs();
                if distance < best.0 {
                    best = (distance, char::from(code as u8));
                }
            }
            *slot = best.1;
        }
        ramp
    }
}

/// A sheet where glyph `code` has its top `code % (height + 1)` rows inked.
#[cfg(test)]
pub(crate) fn striped_sheet(glyph_width: u32, glyph_height: u32) -> RgbaImage {
    RgbaImage::from_fn(glyph_width * SHEET_COLUMNS, glyph_height * SHEET_COLUMNS, |x, y| {
        let code = (y / glyph_height) * SHEET_COLUMNS + x / glyph_width;
        let rows = code % (glyph_height + 1);
        if y % glyph_height < rows {
            image::Rgba([255, 255, 255, 255])
        } else {
            image::Rgba([0, 0, 0, 255])
        }
    })
}

#[cfg(test)]
pub(crate) fn striped_atlas(glyph_width: u32, glyph_height: u32) -> GlyphAtlas {
    GlyphAtlas::from_sprite(&striped_sheet(glyph_width, glyph_height), glyph_width, glyph_height).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyphs_are_cut_from_the_sheet() {
        let atlas = striped_atlas(4, 4);
        assert_eq!(atlas.glyph_width(), 4);
        assert_eq!(atlas.glyph_height(), 4);
        // code 2 -> two inked rows
        let glyph = atlas.glyph(char::from(2u8));
        assert_eq!(glyph.size(), (4, 4));
        assert_eq!(glyph[(1, 3)], 255);
        assert_eq!(glyph[(2, 0)], 0);
        assert_eq!(atlas.density(char::from(2u8)), 0.5);
        assert_eq!(atlas.density(char::from(4u8)), 1.0);
        assert_eq!(atlas.density(char::from(5u8)), 0.0);
    }

    #[test]
    fn codes_outside_the_sheet_fall_back() {
        let atlas = striped_atlas(4, 4);
        assert_eq!(atlas.glyph('€'), atlas.glyph('?'));
    }

    #[test]
    fn density_ramp_prefers_lowest_code() {
        let atlas = striped_atlas(4, 4);
        let ramp = atlas.density_ramp();
        // code 0 is skipped, code 5 is the first blank glyph after it
        assert_eq!(ramp[0], char::from(5u8));
        assert_eq!(ramp[255], char::from(4u8));
        assert_eq!(ramp[128], char::from(2u8));
    }

    #[test]
    fn undersized_sheet_is_rejected() {
        let sheet = RgbaImage::new(15 * 8, 16 * 8);
        assert!(matches!(
            GlyphAtlas::from_sprite(&sheet, 8, 8),
            Err(RasterError::ResourceLoad { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_resource_error() {
        let err = GlyphAtlas::load("does/not/exist.png", 8, 8).err().unwrap();
        match err {
            RasterError::ResourceLoad { path, .. } => assert_eq!(path, PathBuf::from("does/not/exist.png")),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn sheet_round_trips_through_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("font.png");
        striped_sheet(3, 5).save(&path).unwrap();
        let atlas = GlyphAtlas::load(&path, 3, 5).unwrap();
        assert_eq!(atlas.density(char::from(5u8)), 1.0);
    }
}
