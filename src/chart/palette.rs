//! Color scheme for the ikigai chart

use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

use crate::error::{IkigaiError, Result};
use crate::pillar::Pillar;

pub const SAKURA_PINK: &str = "#F6CECE";
pub const BAMBOO_GREEN: &str = "#7BA17D";
pub const INDIGO_BLUE: &str = "#3F4B83";
pub const GOLD: &str = "#D4AF37";
pub const SOFT_WHITE: &str = "#F9F5F0";
pub const SUMI_INK: &str = "#2A2A2A";

/// Six-entry palette; missing fields fall back to the default palette
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScheme {
    pub love: String,
    pub good_at: String,
    pub world_needs: String,
    pub paid_for: String,
    pub background: String,
    pub text: String,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            love: SAKURA_PINK.to_string(),
            good_at: BAMBOO_GREEN.to_string(),
            world_needs: INDIGO_BLUE.to_string(),
            paid_for: GOLD.to_string(),
            background: SOFT_WHITE.to_string(),
            text: SUMI_INK.to_string(),
        }
    }
}

impl ColorScheme {
    pub fn pillar(&self, pillar: Pillar) -> &str {
        match pillar {
            Pillar::Love => &self.love,
            Pillar::GoodAt => &self.good_at,
            Pillar::WorldNeeds => &self.world_needs,
            Pillar::PaidFor => &self.paid_for,
        }
    }

    /// Parse every entry up front so a bad value fails before any drawing
    pub fn resolve(&self) -> Result<ResolvedPalette> {
        let field = |name: &str, value: &str| parse_color(value).ok_or_else(|| IkigaiError::InvalidColor {
            field: name.to_string(),
            value: value.to_string(),
        });
        Ok(ResolvedPalette {
            pillars: [
                field("love", &self.love)?,
                field("good_at", &self.good_at)?,
                field("world_needs", &self.world_needs)?,
                field("paid_for", &self.paid_for)?,
            ],
            background: field("background", &self.background)?,
            text: field("text", &self.text)?,
        })
    }
}

/// 8-bit sRGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl From<Rgb> for RGBColor {
    fn from(c: Rgb) -> Self {
        RGBColor(c.0, c.1, c.2)
    }
}

/// Palette with every color parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPalette {
    pillars: [Rgb; 4],
    pub background: Rgb,
    pub text: Rgb,
}

impl ResolvedPalette {
    pub fn pillar(&self, pillar: Pillar) -> Rgb {
        let idx = Pillar::ALL
            .iter()
            .position(|p| *p == pillar)
            .unwrap_or_default();
        self.pillars[idx]
    }
}

const NAMED: &[(&str, Rgb)] = &[
    ("black", Rgb(0, 0, 0)),
    ("white", Rgb(255, 255, 255)),
    ("red", Rgb(255, 0, 0)),
    ("green", Rgb(0, 128, 0)),
    ("blue", Rgb(0, 0, 255)),
    ("yellow", Rgb(255, 255, 0)),
    ("orange", Rgb(255, 165, 0)),
    ("purple", Rgb(128, 0, 128)),
    ("pink", Rgb(255, 192, 203)),
    ("gray", Rgb(128, 128, 128)),
    ("grey", Rgb(128, 128, 128)),
    ("navy", Rgb(0, 0, 128)),
    ("gold", Rgb(255, 215, 0)),
];

/// Accepts `#RGB`, `#RRGGBB` (leading `#` optional) and a few CSS names
pub fn parse_color(value: &str) -> Option<Rgb> {
    let v = value.trim();
    if let Some((_, rgb)) = NAMED.iter().find(|(name, _)| name.eq_ignore_ascii_case(v)) {
        return Some(*rgb);
    }
    let hex = v.strip_prefix('#').unwrap_or(v);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut digits = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
            Some(Rgb(digits.next()??, digits.next()??, digits.next()??))
        }
        6 => {
            let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(Rgb(byte(0)?, byte(2)?, byte(4)?))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_love_is_sakura_pink() {
        let scheme = ColorScheme::default();
        assert_eq!(scheme.love, "#F6CECE");
        let resolved = scheme.resolve().unwrap();
        assert_eq!(resolved.pillar(Pillar::Love), Rgb(0xF6, 0xCE, 0xCE));
        assert_eq!(resolved.background, Rgb(0xF9, 0xF5, 0xF0));
    }

    #[test]
    fn parses_short_hex_and_names() {
        assert_eq!(parse_color("#fff"), Some(Rgb(255, 255, 255)));
        assert_eq!(parse_color("3F4B83"), Some(Rgb(0x3F, 0x4B, 0x83)));
        assert_eq!(parse_color("Navy"), Some(Rgb(0, 0, 128)));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#gg0000"), None);
    }

    #[test]
    fn partial_scheme_fills_defaults() {
        let scheme: ColorScheme = serde_json::from_str(r##"{"love": "#000000"}"##).unwrap();
        assert_eq!(scheme.love, "#000000");
        assert_eq!(scheme.paid_for, GOLD);
    }

    #[test]
    fn resolve_reports_offending_field() {
        let scheme = ColorScheme {
            text: "not-a-color".into(),
            ..ColorScheme::default()
        };
        match scheme.resolve() {
            Err(IkigaiError::InvalidColor { field, .. }) => assert_eq!(field, "text"),
            other => panic!("expected invalid color, got {:?}", other),
        }
    }
}
