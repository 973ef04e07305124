//! Fixed geometric layout of the four-circle diagram.
//!
//! Layout works in plot units on a square extent of `[-EXTENT, EXTENT]` with
//! the y axis pointing up. The result is a [`ChartScene`]: every circle and
//! text block the backends will draw, with colors already resolved.

use crate::chart::palette::{ResolvedPalette, Rgb};
use crate::pillar::{Pillar, PillarResponses};

pub const EXTENT: f64 = 1.2;
pub const CIRCLE_OFFSET: f64 = 0.3;
pub const CIRCLE_RADIUS: f64 = 0.7;
pub const CIRCLE_OPACITY: f64 = 0.6;
pub const MAX_SHOWN_RESPONSES: usize = 3;

pub const TITLE: &str = "Your Ikigai Pathway";
pub const PLACEHOLDER_TITLE: &str = "Your Ikigai Preview";

const OUTER_LABEL_X: f64 = 0.85;
const OUTER_LABEL_Y: f64 = 0.95;
const TITLE_Y: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Conceptual overlap named on the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intersection {
    Passion,
    Mission,
    Vocation,
    Profession,
    Ikigai,
}

impl Intersection {
    pub const ALL: [Intersection; 5] = [
        Intersection::Passion,
        Intersection::Mission,
        Intersection::Vocation,
        Intersection::Profession,
        Intersection::Ikigai,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Intersection::Passion => "PASSION",
            Intersection::Mission => "MISSION",
            Intersection::Vocation => "VOCATION",
            Intersection::Profession => "PROFESSION",
            Intersection::Ikigai => "IKIGAI",
        }
    }

    pub fn anchor(self) -> Point {
        match self {
            Intersection::Passion => Point::new(0.0, 0.5),
            Intersection::Mission => Point::new(-0.5, 0.0),
            Intersection::Vocation => Point::new(0.5, 0.0),
            Intersection::Profession => Point::new(0.0, -0.5),
            Intersection::Ikigai => Point::new(0.0, 0.0),
        }
    }

    /// Pillars whose circles meet at this label
    pub fn pillars(self) -> &'static [Pillar] {
        match self {
            Intersection::Passion => &[Pillar::Love, Pillar::GoodAt],
            Intersection::Mission => &[Pillar::Love, Pillar::WorldNeeds],
            Intersection::Vocation => &[Pillar::GoodAt, Pillar::PaidFor],
            Intersection::Profession => &[Pillar::WorldNeeds, Pillar::PaidFor],
            Intersection::Ikigai => &Pillar::ALL,
        }
    }
}

pub fn circle_center(pillar: Pillar) -> Point {
    let d = CIRCLE_OFFSET;
    match pillar {
        Pillar::Love => Point::new(-d, d),
        Pillar::GoodAt => Point::new(d, d),
        Pillar::WorldNeeds => Point::new(-d, -d),
        Pillar::PaidFor => Point::new(d, -d),
    }
}

pub fn outer_label_anchor(pillar: Pillar) -> Point {
    let (x, y) = (OUTER_LABEL_X, OUTER_LABEL_Y);
    match pillar {
        Pillar::Love => Point::new(-x, y),
        Pillar::GoodAt => Point::new(x, y),
        Pillar::WorldNeeds => Point::new(-x, -y),
        Pillar::PaidFor => Point::new(x, -y),
    }
}

/// Text height as a fraction of the canvas side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Title,
    Label,
    Intersection,
    Center,
    Response,
}

impl TextSize {
    fn canvas_fraction(self) -> f64 {
        match self {
            TextSize::Title => 0.032,
            TextSize::Label => 0.020,
            TextSize::Intersection => 0.018,
            TextSize::Center => 0.024,
            TextSize::Response => 0.014,
        }
    }

    /// Integer magnification of the 8px bitmap font
    pub fn glyph_scale(self, canvas_px: u32) -> u32 {
        let px = canvas_px as f64 * self.canvas_fraction();
        (px / 8.0).round().max(1.0) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

/// Outline drawn around glyphs so text stays legible over fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Halo {
    pub color: Rgb,
    pub width_px: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Title,
    PillarLabel(Pillar),
    Intersection(Intersection),
    Responses(Pillar),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub role: TextRole,
    pub lines: Vec<String>,
    pub anchor: Point,
    pub size: TextSize,
    pub weight: Weight,
    pub color: Rgb,
    pub halo: Option<Halo>,
}

impl TextBlock {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleShape {
    pub pillar: Pillar,
    pub center: Point,
    pub radius: f64,
    pub fill: Rgb,
    pub opacity: f64,
}

/// Maps plot units to pixel coordinates on a square canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub size_px: u32,
}

impl Viewport {
    pub fn px_per_unit(&self) -> f64 {
        self.size_px as f64 / (2.0 * EXTENT)
    }

    pub fn to_px(&self, p: Point) -> (i32, i32) {
        let scale = self.px_per_unit();
        let x = (p.x + EXTENT) * scale;
        let y = (EXTENT - p.y) * scale;
        (x.round() as i32, y.round() as i32)
    }

    pub fn length_px(&self, units: f64) -> u32 {
        (units * self.px_per_unit()).round().max(1.0) as u32
    }
}

/// Everything a backend needs to paint one chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartScene {
    pub viewport: Viewport,
    pub background: Rgb,
    pub circles: Vec<CircleShape>,
    pub texts: Vec<TextBlock>,
    pub title: Option<TextBlock>,
}

impl ChartScene {
    /// Recorded response text for one pillar, if any was drawn
    pub fn response_text(&self, pillar: Pillar) -> Option<String> {
        self.texts
            .iter()
            .find(|t| t.role == TextRole::Responses(pillar))
            .map(TextBlock::text)
    }

    pub fn without_title(mut self) -> Self {
        self.title = None;
        self
    }
}

/// Compose the scene for a set of responses
pub fn compose(
    responses: &PillarResponses,
    palette: &ResolvedPalette,
    size_px: u32,
    title: &str,
) -> ChartScene {
    let halo = |width_px: u32| {
        Some(Halo {
            color: palette.background,
            width_px: width_px.max(1) * (size_px / 900).max(1),
        })
    };

    let circles = Pillar::ALL
        .into_iter()
        .map(|pillar| CircleShape {
            pillar,
            center: circle_center(pillar),
            radius: CIRCLE_RADIUS,
            fill: palette.pillar(pillar),
            opacity: CIRCLE_OPACITY,
        })
        .collect();

    let mut texts = Vec::with_capacity(13);

    for pillar in Pillar::ALL {
        texts.push(TextBlock {
            role: TextRole::PillarLabel(pillar),
            lines: split_lines(pillar.chart_label()),
            anchor: outer_label_anchor(pillar),
            size: TextSize::Label,
            weight: Weight::Bold,
            color: palette.text,
            halo: halo(3),
        });
    }

    for intersection in Intersection::ALL {
        let size = if intersection == Intersection::Ikigai {
            TextSize::Center
        } else {
            TextSize::Intersection
        };
        texts.push(TextBlock {
            role: TextRole::Intersection(intersection),
            lines: vec![intersection.label().to_string()],
            anchor: intersection.anchor(),
            size,
            weight: Weight::Regular,
            color: palette.text,
            halo: halo(3),
        });
    }

    for pillar in Pillar::ALL {
        let shown: Vec<String> = responses
            .get(pillar)
            .iter()
            .take(MAX_SHOWN_RESPONSES)
            .cloned()
            .collect();
        if shown.is_empty() {
            continue;
        }
        texts.push(TextBlock {
            role: TextRole::Responses(pillar),
            lines: split_lines(&shown.join("\n")),
            anchor: circle_center(pillar),
            size: TextSize::Response,
            weight: Weight::Regular,
            color: palette.text,
            halo: halo(2),
        });
    }

    let title = TextBlock {
        role: TextRole::Title,
        lines: vec![title.to_string()],
        anchor: Point::new(0.0, TITLE_Y),
        size: TextSize::Title,
        weight: Weight::Bold,
        color: palette.text,
        halo: None,
    };

    ChartScene {
        viewport: Viewport { size_px },
        background: palette.background,
        circles,
        texts,
        title: Some(title),
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_string).collect()
}
