//! Bitmap text masks built from the 8x8 console font.
//!
//! Text is rasterized into a coverage mask first so that the halo can be
//! computed as a dilation of the glyph pixels and painted underneath.

use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};

use crate::chart::layout::Weight;

pub const GLYPH_PX: u32 = 8;

/// Pixel coverage of a block of text, origin at the top-left corner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMask {
    pub width: u32,
    pub height: u32,
    bits: Vec<bool>,
}

impl TextMask {
    fn blank(width: u32, height: u32) -> Self {
        let len = (width as usize).saturating_mul(height as usize);
        Self {
            width,
            height,
            bits: vec![false; len],
        }
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.index(x, y)
            .and_then(|i| self.bits.get(i).copied())
            .unwrap_or(false)
    }

    fn set(&mut self, x: u32, y: u32) {
        if let Some(bit) = self.index(x, y).and_then(|i| self.bits.get_mut(i)) {
            *bit = true;
        }
    }

    /// Lit pixels as `(x, y)` offsets
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).filter_map(move |x| self.get(x, y).then_some((x, y)))
        })
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// Grow the mask by `radius` pixels in every direction (round brush).
    /// The result is `2 * radius` larger on each axis; the original content
    /// sits at offset `(radius, radius)`.
    pub fn dilate(&self, radius: u32) -> TextMask {
        let r = radius as i64;
        let mut out = TextMask::blank(
            self.width.saturating_add(2 * radius),
            self.height.saturating_add(2 * radius),
        );
        let brush: Vec<(i64, i64)> = (-r..=r)
            .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
            .filter(|(dx, dy)| dx * dx + dy * dy <= r * r)
            .collect();
        for (x, y) in self.pixels() {
            for (dx, dy) in &brush {
                let nx = x as i64 + r + dx;
                let ny = y as i64 + r + dy;
                out.set(nx as u32, ny as u32);
            }
        }
        out
    }
}

/// Look up a glyph, substituting '?' for characters the font lacks
fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

pub fn line_height(scale: u32) -> u32 {
    GLYPH_PX * scale
}

pub fn line_gap(scale: u32) -> u32 {
    2 * scale
}

/// Width of one rendered line in pixels, saturating for absurd lengths
pub fn line_width(line: &str, scale: u32, weight: Weight) -> u32 {
    let chars = u32::try_from(line.chars().count()).unwrap_or(u32::MAX);
    if chars == 0 {
        return 0;
    }
    chars
        .saturating_mul(GLYPH_PX * scale)
        .saturating_add(bold_extra(scale, weight))
}

/// Pixel extent of a block of lines
pub fn block_size(lines: &[String], scale: u32, weight: Weight) -> (u32, u32) {
    let width = lines
        .iter()
        .map(|l| line_width(l, scale, weight))
        .max()
        .unwrap_or(0);
    let rows = u32::try_from(lines.len()).unwrap_or(u32::MAX);
    let height = if rows == 0 {
        0
    } else {
        rows.saturating_mul(line_height(scale))
            .saturating_add((rows - 1).saturating_mul(line_gap(scale)))
    };
    (width, height)
}

/// Drop the rows and characters that cannot fit in a `room` x `room` box
pub fn fit_lines(lines: &[String], scale: u32, weight: Weight, room: u32) -> Vec<String> {
    let scale = scale.max(1);
    let cell = GLYPH_PX * scale;
    let max_chars = (room.saturating_sub(bold_extra(scale, weight)) / cell) as usize;
    let max_rows = (room.saturating_add(line_gap(scale)) / (cell + line_gap(scale))) as usize;
    lines
        .iter()
        .take(max_rows)
        .map(|l| l.chars().take(max_chars).collect())
        .collect()
}

fn bold_extra(scale: u32, weight: Weight) -> u32 {
    match weight {
        Weight::Bold => scale.div_ceil(2),
        Weight::Regular => 0,
    }
}

/// Rasterize centered lines of text into a single mask.
/// Callers clip with [`fit_lines`] first; the mask grows with the text.
pub fn render_lines(lines: &[String], scale: u32, weight: Weight) -> TextMask {
    let scale = scale.max(1);
    let (width, height) = block_size(lines, scale, weight);
    let mut mask = TextMask::blank(width, height);
    let smear = bold_extra(scale, weight);

    for (row, line) in lines.iter().enumerate() {
        let top = (row as u32).saturating_mul(line_height(scale) + line_gap(scale));
        let left = (width - line_width(line, scale, weight)) / 2;
        for (col, c) in line.chars().enumerate() {
            let cell_x = left.saturating_add((col as u32).saturating_mul(GLYPH_PX * scale));
            for (gy, bits) in glyph(c).iter().enumerate() {
                for gx in 0..GLYPH_PX {
                    if (*bits >> gx) & 1 == 0 {
                        continue;
                    }
                    let px = cell_x.saturating_add(gx * scale);
                    let py = top.saturating_add(gy as u32 * scale);
                    for sy in 0..scale {
                        for sx in 0..scale + smear {
                            mask.set(px.saturating_add(sx), py.saturating_add(sy));
                        }
                    }
                }
            }
        }
    }
    mask
}
