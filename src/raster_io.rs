use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;

use eframe::egui::Color32;
use glam::IVec2;

use crate::error::{RasterError, Result};
use crate::raster::{Cell, Raster, MAX_CELLS};

/// Parses the plain-text raster format: width and height on their own lines,
/// then one `code\tfore\tback` line per cell, column by column.
pub struct RasterReader<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R: BufRead> RasterReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        let Some(line) = self.lines.next() else {
            return Ok(None);
        };
        self.line += 1;
        Ok(Some(line?))
    }

    fn header(&mut self, name: &str) -> Result<usize> {
        let line = self
            .next_line()?
            .ok_or_else(|| RasterError::format(self.line + 1, format!("missing {name}")))?;
        let value: usize = line
            .trim()
            .parse()
            .map_err(|_| RasterError::format(self.line, format!("invalid {name} '{}'", line.trim())))?;
        if value == 0 {
            return Err(RasterError::format(self.line, format!("{name} must be positive")));
        }
        if value > i32::MAX as usize {
            return Err(RasterError::format(self.line, format!("{name} {value} is too large")));
        }
        Ok(value)
    }

    pub fn read(&mut self) -> Result<Raster> {
        let width = self.header("width")?;
        let height = self.header("height")?;
        let cells = width
            .checked_mul(height)
            .filter(|&cells| cells <= MAX_CELLS)
            .ok_or_else(|| {
                RasterError::format(self.line, format!("{width}x{height} exceeds {MAX_CELLS} cells"))
            })?;
        let mut raster = Raster::new(width, height);

        for x in 0..width as i32 {
            for y in 0..height as i32 {
                let line = self.next_line()?.ok_or_else(|| {
                    RasterError::format(self.line + 1, format!("expected {cells} cells"))
                })?;
                let cell = parse_cell(&line).map_err(|message| RasterError::format(self.line, message))?;
                raster.set_cell(x, y, cell)?;
            }
        }

        while let Some(line) = self.next_line()? {
            if !line.trim().is_empty() {
                return Err(RasterError::format(self.line, "unexpected data after the last cell"));
            }
        }
        Ok(raster)
    }
}

fn parse_cell(line: &str) -> std::result::Result<Cell, String> {
    let fields: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
    let [code, fore, back] = fields.as_slice() else {
        return Err(format!("expected 3 tab separated fields, found {}", fields.len()));
    };
    let code: u32 = code
        .trim()
        .parse()
        .map_err(|_| format!("invalid character code '{code}'"))?;
    let ch = char::from_u32(code).ok_or_else(|| format!("invalid character code {code}"))?;
    Ok(Cell::new(ch, parse_color(fore)?, parse_color(back)?))
}

/// Accepts `0xAARRGGBB` as signed or unsigned decimal; alpha is dropped.
fn parse_color(field: &str) -> std::result::Result<Color32, String> {
    let value: i64 = field
        .trim()
        .parse()
        .map_err(|_| format!("invalid color '{field}'"))?;
    if !(i32::MIN as i64..=u32::MAX as i64).contains(&value) {
        return Err(format!("color {value} does not fit in 32 bits"));
    }
    let [_, r, g, b] = (value as u32).to_be_bytes();
    Ok(Color32::from_rgb(r, g, b))
}

fn format_color(color: Color32) -> i32 {
    i32::from_be_bytes([0xFF, color.r(), color.g(), color.b()])
}

/// The text form of a raster, shared by the writer and [`to_string`].
struct RasterText<'a>(&'a Raster);

impl fmt::Display for RasterText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raster = self.0;
        writeln!(f, "{}", raster.width())?;
        writeln!(f, "{}", raster.height())?;
        for x in 0..raster.width() as i32 {
            for y in 0..raster.height() as i32 {
                let Some(cell) = raster.get(IVec2::new(x, y)) else {
                    continue;
                };
                writeln!(
                    f,
                    "{}\t{}\t{}",
                    cell.ch as u32,
                    format_color(cell.fore),
                    format_color(cell.back)
                )?;
            }
        }
        Ok(())
    }
}

pub struct RasterWriter<W> {
    writer: W,
}

impl<W: Write> RasterWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write(&mut self, raster: &Raster) -> Result<()> {
        write!(self.writer, "{}", RasterText(raster))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

pub fn load(path: impl AsRef<Path>) -> Result<Raster> {
    let file = File::open(path)?;
    RasterReader::new(BufReader::new(file)).read()
}

pub fn save(path: impl AsRef<Path>, raster: &Raster) -> Result<()> {
    let mut writer = RasterWriter::new(BufWriter::new(File::create(path)?));
    writer.write(raster)?;
    writer.flush()
}

pub fn from_str(text: &str) -> Result<Raster> {
    RasterReader::new(text.as_bytes()).read()
}

pub fn to_string(raster: &Raster) -> String {
    RasterText(raster).to_string()
}
