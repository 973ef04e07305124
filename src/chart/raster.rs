//! Paints a [`ChartScene`] into an RGB buffer with the plotters bitmap backend

use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use plotters::prelude::*;

use crate::chart::glyphs::{self, TextMask};
use crate::chart::layout::{ChartScene, TextBlock, Viewport};
use crate::chart::palette::Rgb;
use crate::error::{IkigaiError, Result};

/// Minimum distance kept between text and the canvas edge
const EDGE_MARGIN_PX: i32 = 4;

/// Decoded chart pixels, 3 bytes per pixel, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RasterFrame {
    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        let i = ((y * self.width + x) * 3) as usize;
        Rgb(self.pixels[i], self.pixels[i + 1], self.pixels[i + 2])
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out).write_image(
            &self.pixels,
            self.width,
            self.height,
            image::ExtendedColorType::Rgb8,
        )?;
        Ok(out)
    }
}

/// Where a text block lands on the canvas, with the lines that fit there
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBox {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    pub scale: u32,
    pub lines: Vec<String>,
}

/// Clip the block to the canvas, center it on its anchor, then keep it
/// (and its halo) inside the margins
pub fn text_box(viewport: &Viewport, block: &TextBlock) -> TextBox {
    let scale = block.size.glyph_scale(viewport.size_px);
    let margin = EDGE_MARGIN_PX + block.halo.map(|h| h.width_px as i32).unwrap_or(0);
    let size = viewport.size_px.min(i32::MAX as u32) as i32;
    let room = (size - 2 * margin).max(0) as u32;

    let lines = glyphs::fit_lines(&block.lines, scale, block.weight, room);
    let (width, height) = glyphs::block_size(&lines, scale, block.weight);

    let (ax, ay) = viewport.to_px(block.anchor);
    let clamp = |start: i32, extent: u32| start.min(size - margin - extent as i32).max(margin);

    TextBox {
        left: clamp(ax - width as i32 / 2, width),
        top: clamp(ay - height as i32 / 2, height),
        width,
        height,
        scale,
        lines,
    }
}

pub fn rasterize(scene: &ChartScene) -> Result<RasterFrame> {
    let size = scene.viewport.size_px;
    if size == 0 {
        return Err(IkigaiError::Render {
            message: "canvas size must be positive".into(),
        });
    }
    let mut pixels = vec![0u8; (size as usize) * (size as usize) * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (size, size)).into_drawing_area();
        root.fill(&RGBColor::from(scene.background))?;

        for circle in &scene.circles {
            let center = scene.viewport.to_px(circle.center);
            let radius = scene.viewport.length_px(circle.radius);
            let style = RGBColor::from(circle.fill).mix(circle.opacity).filled();
            root.draw(&Circle::new(center, radius, style))?;
        }

        for block in scene.texts.iter().chain(scene.title.iter()) {
            paint_text(&root, &scene.viewport, block)?;
        }

        root.present()?;
    }
    Ok(RasterFrame {
        width: size,
        height: size,
        pixels,
    })
}

fn paint_text<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    viewport: &Viewport,
    block: &TextBlock,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let placed = text_box(viewport, block);
    let mask = glyphs::render_lines(&placed.lines, placed.scale, block.weight);

    if let Some(halo) = block.halo {
        let outline = mask.dilate(halo.width_px);
        let offset = halo.width_px as i32;
        paint_mask(
            root,
            &outline,
            placed.left - offset,
            placed.top - offset,
            &RGBColor::from(halo.color),
        )?;
    }
    paint_mask(root, &mask, placed.left, placed.top, &RGBColor::from(block.color))
}

fn paint_mask<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    mask: &TextMask,
    left: i32,
    top: i32,
    color: &RGBColor,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    for (x, y) in mask.pixels() {
        root.draw_pixel((left + x as i32, top + y as i32), color)?;
    }
    Ok(())
}
