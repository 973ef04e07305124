//! Ikigai chart generation.
//!
//! Rendering is a pure function of the responses and the color scheme:
//! compose a [`layout::ChartScene`], paint it with a plotters backend and
//! encode the result. Nothing is cached between calls.

pub mod glyphs;
pub mod layout;
pub mod palette;
pub mod raster;
pub mod svg;

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IkigaiError, Result};
use crate::pillar::PillarResponses;

pub use layout::ChartScene;
pub use palette::ColorScheme;
pub use raster::RasterFrame;

pub const DEFAULT_SIZE_PX: u32 = 900;
pub const MIN_SIZE_PX: u32 = 300;
pub const MAX_SIZE_PX: u32 = 4000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    #[default]
    Png,
    Svg,
}

impl ChartFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ChartFormat::Png => "image/png",
            ChartFormat::Svg => "image/svg+xml",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ChartFormat::Png => "png",
            ChartFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for ChartFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ChartFormat {
    type Err = IkigaiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ChartFormat::Png),
            "svg" => Ok(ChartFormat::Svg),
            other => Err(IkigaiError::validation(format!(
                "unsupported chart format '{}'",
                other
            ))),
        }
    }
}

/// Encoded chart, produced fresh on every render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: ChartFormat,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.bytes)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.to_base64())
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub size_px: u32,
    pub format: ChartFormat,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            size_px: DEFAULT_SIZE_PX,
            format: ChartFormat::Png,
        }
    }
}

/// Renders ikigai charts with fixed canvas options
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartRenderer {
    options: ChartOptions,
}

impl ChartRenderer {
    pub fn new(options: ChartOptions) -> Result<Self> {
        if !(MIN_SIZE_PX..=MAX_SIZE_PX).contains(&options.size_px) {
            return Err(IkigaiError::validation(format!(
                "chart size must be between {} and {} pixels, got {}",
                MIN_SIZE_PX, MAX_SIZE_PX, options.size_px
            )));
        }
        Ok(Self { options })
    }

    pub fn options(&self) -> ChartOptions {
        self.options
    }

    /// Build the scene without painting it
    pub fn scene(
        &self,
        responses: &PillarResponses,
        color_scheme: Option<&ColorScheme>,
    ) -> Result<ChartScene> {
        let default_scheme = ColorScheme::default();
        let palette = color_scheme.unwrap_or(&default_scheme).resolve()?;
        Ok(layout::compose(
            responses,
            &palette,
            self.options.size_px,
            layout::TITLE,
        ))
    }

    /// Same layout as [`Self::scene`] with no responses, the default palette
    /// and the preview title
    pub fn placeholder_scene(&self) -> Result<ChartScene> {
        let palette = ColorScheme::default().resolve()?;
        Ok(layout::compose(
            &PillarResponses::new(),
            &palette,
            self.options.size_px,
            layout::PLACEHOLDER_TITLE,
        ))
    }

    pub fn render(
        &self,
        responses: &PillarResponses,
        color_scheme: Option<&ColorScheme>,
    ) -> Result<EncodedImage> {
        let scene = self.scene(responses, color_scheme)?;
        debug!(
            size_px = self.options.size_px,
            format = %self.options.format,
            answered = responses.answered().len(),
            "Rendering ikigai chart"
        );
        self.encode(&scene)
    }

    pub fn render_placeholder(&self) -> Result<EncodedImage> {
        let scene = self.placeholder_scene()?;
        self.encode(&scene)
    }

    pub fn encode(&self, scene: &ChartScene) -> Result<EncodedImage> {
        let bytes = match self.options.format {
            ChartFormat::Png => raster::rasterize(scene)?.encode_png()?,
            ChartFormat::Svg => svg::render_svg(scene)?.into_bytes(),
        };
        Ok(EncodedImage {
            format: self.options.format,
            bytes,
        })
    }
}

/// Render the chart as PNG at the default size
pub fn render_chart(
    responses: &PillarResponses,
    color_scheme: Option<&ColorScheme>,
) -> Result<EncodedImage> {
    ChartRenderer::default().render(responses, color_scheme)
}

/// Render the empty preview chart as PNG at the default size
pub fn render_placeholder_chart() -> Result<EncodedImage> {
    ChartRenderer::default().render_placeholder()
}
