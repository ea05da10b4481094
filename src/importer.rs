use eframe::egui::Color32;
use glam::IVec2;
use image::{DynamicImage, GenericImageView, Rgba};

use crate::font::GlyphAtlas;
use crate::raster::{Cell, Raster};

/// The 16 color VGA palette.
pub const VGA_PALETTE: [Color32; 16] = [
    Color32::from_rgb(0x00, 0x00, 0x00),
    Color32::from_rgb(0x80, 0x00, 0x00),
    Color32::from_rgb(0x00, 0x80, 0x00),
    Color32::from_rgb(0x80, 0x80, 0x00),
    Color32::from_rgb(0x00, 0x00, 0x80),
    Color32::from_rgb(0x80, 0x00, 0x80),
    Color32::from_rgb(0x00, 0x80, 0x80),
    Color32::from_rgb(0x80, 0x80, 0x80),
    Color32::from_rgb(0xC0, 0xC0, 0xC0),
    Color32::from_rgb(0xFF, 0x00, 0x00),
    Color32::from_rgb(0x00, 0xFF, 0x00),
    Color32::from_rgb(0xFF, 0xFF, 0x00),
    Color32::from_rgb(0x00, 0x00, 0xFF),
    Color32::from_rgb(0xFF, 0x00, 0xFF),
    Color32::from_rgb(0x00, 0xFF, 0xFF),
    Color32::from_rgb(0xFF, 0xFF, 0xFF),
];

/// Turns a bitmap into characters: every cell covers a block of pixels, the
/// block is split into ink and paper by luminance and the glyph whose density
/// matches the ink ratio is picked.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageConverter {
    /// Pixels at least this bright are ink.
    pub threshold: u8,
    /// Keep the averaged colors instead of snapping them to `palette`.
    pub all_colors: bool,
    pub palette: Vec<Color32>,
    /// Translucent pixels are blended over this color.
    pub background: Color32,
}

impl Default for ImageConverter {
    fn default() -> Self {
        Self {
            threshold: 128,
            all_colors: false,
            palette: VGA_PALETTE.to_vec(),
            background: Color32::BLACK,
        }
    }
}

#[derive(Default)]
struct ColorSum {
    rgb: [u32; 3],
    count: u32,
}

impl ColorSum {
    fn add(&mut self, rgb: [u8; 3]) {
        for (sum, channel) in self.rgb.iter_mut().zip(rgb) {
            *sum += channel as u32;
        }
        self.count += 1;
    }

    fn mean(&self) -> Option<Color32> {
        if self.count == 0 {
            return None;
        }
        let [r, g, b] = self.rgb.map(|sum| ((sum + self.count / 2) / self.count) as u8);
        Some(Color32::from_rgb(r, g, b))
    }
}

fn luminance([r, g, b]: [u8; 3]) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}

impl ImageConverter {
    fn composite(&self, Rgba([r, g, b, a]): Rgba<u8>) -> [u8; 3] {
        let bg = [self.background.r(), self.background.g(), self.background.b()];
        let a = a as u32;
        let blend = |fg: u8, bg: u8| ((fg as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8;
        [blend(r, bg[0]), blend(g, bg[1]), blend(b, bg[2])]
    }

    fn quantize(&self, color: Color32) -> Color32 {
        if self.all_colors {
            return color;
        }
        let distance = |other: &Color32| {
            let d = |a: u8, b: u8| (a as i32 - b as i32).pow(2);
            d(color.r(), other.r()) + d(color.g(), other.g()) + d(color.b(), other.b())
        };
        self.palette.iter().copied().min_by_key(distance).unwrap_or(color)
    }

    /// Overwrites every cell of `raster` with the matching block of `image`.
    pub fn convert_to(&self, raster: &mut Raster, image: &DynamicImage, atlas: &GlyphAtlas) {
        let (image_width, image_height) = image.dimensions();
        let (width, height) = (raster.width() as u64, raster.height() as u64);
        if image_width == 0 || image_height == 0 || width == 0 || height == 0 {
            return;
        }
        let pixels = image.to_rgba8();
        let ramp = atlas.density_ramp();
        let span = |cell: u64, cells: u64, size: u32| {
            let start = (cell * size as u64 / cells) as u32;
            let end = (((cell + 1) * size as u64 / cells) as u32).max(start + 1);
            start..end
        };

        for cy in 0..height {
            let rows = span(cy, height, image_height);
            for cx in 0..width {
                let columns = span(cx, width, image_width);
                let mut ink = ColorSum::default();
                let mut paper = ColorSum::default();
                for y in rows.clone() {
                    for x in columns.clone() {
                        let rgb = self.composite(*pixels.get_pixel(x, y));
                        if luminance(rgb) >= self.threshold {
                            ink.add(rgb);
                        } else {
                            paper.add(rgb);
                        }
                    }
                }
                let total = ink.count + paper.count;
                let level = ((ink.count * 255 + total / 2) / total) as usize;
                let (fore, back) = match (ink.mean(), paper.mean()) {
                    (Some(fore), Some(back)) => (fore, back),
                    (Some(only), None) | (None, Some(only)) => (only, only),
                    (None, None) => (self.background, self.background),
                };
                let cell = Cell::new(ramp[level], self.quantize(fore), self.quantize(back));
                if let Some(slot) = raster.get_mut(IVec2::new(cx as i32, cy as i32)) {
                    *slot = cell;
                }
            }
        }
        log::info!(
            "converted {image_width}x{image_height} image into {width}x{height} cells"
        );
    }
}
