//! Vector rendition of a [`ChartScene`] via the plotters SVG backend

use plotters::prelude::*;
use plotters::style::FontStyle;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::chart::glyphs;
use crate::chart::layout::{ChartScene, TextBlock, Viewport, Weight};
use crate::chart::raster::text_box;
use crate::error::Result;

pub fn render_svg(scene: &ChartScene) -> Result<String> {
    let size = scene.viewport.size_px;
    let mut buffer = String::new();
    {
        let root = SVGBackend::with_string(&mut buffer, (size, size)).into_drawing_area();
        root.fill(&RGBColor::from(scene.background))?;

        for circle in &scene.circles {
            let center = scene.viewport.to_px(circle.center);
            let radius = scene.viewport.length_px(circle.radius);
            let style = RGBColor::from(circle.fill).mix(circle.opacity).filled();
            root.draw(&Circle::new(center, radius, style))?;
        }

        for block in scene.texts.iter().chain(scene.title.iter()) {
            draw_block(&root, &scene.viewport, block)?;
        }

        root.present()?;
    }
    Ok(buffer)
}

fn draw_block<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    viewport: &Viewport,
    block: &TextBlock,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let placed = text_box(viewport, block);
    let line_height = glyphs::line_height(placed.scale) as i32;
    let step = line_height + glyphs::line_gap(placed.scale) as i32;
    let center_x = placed.left + placed.width as i32 / 2;

    let mut font = ("monospace", line_height as f64).into_font();
    if block.weight == Weight::Bold {
        font = font.style(FontStyle::Bold);
    }
    let anchor = Pos::new(HPos::Center, VPos::Center);
    let ink = font.color(&RGBColor::from(block.color)).pos(anchor);

    for (row, line) in placed.lines.iter().enumerate() {
        let y = placed.top + row as i32 * step + line_height / 2;
        // Halo: the same text in the background color, shifted around the anchor
        if let Some(halo) = block.halo {
            let w = halo.width_px as i32;
            let outline = font.color(&RGBColor::from(halo.color)).pos(anchor);
            for (dx, dy) in [(-w, 0), (w, 0), (0, -w), (0, w), (-w, -w), (w, w), (-w, w), (w, -w)] {
                root.draw(&Text::new(line.clone(), (center_x + dx, y + dy), outline.clone()))?;
            }
        }
        root.draw(&Text::new(line.clone(), (center_x, y), ink.clone()))?;
    }
    Ok(())
}
