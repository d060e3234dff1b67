//! RGB colors accepted as names or `#rrggbb`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ClockError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

const NAMED: &[(&str, Color)] = &[
    ("black", Color::rgb(0, 0, 0)),
    ("white", Color::rgb(255, 255, 255)),
    ("grey", Color::rgb(190, 190, 190)),
    ("gray", Color::rgb(190, 190, 190)),
    ("darkgrey", Color::rgb(169, 169, 169)),
    ("darkgray", Color::rgb(169, 169, 169)),
    ("red", Color::rgb(255, 0, 0)),
    ("green", Color::rgb(0, 255, 0)),
    ("blue", Color::rgb(0, 0, 255)),
    ("yellow", Color::rgb(255, 255, 0)),
    ("cyan", Color::rgb(0, 255, 255)),
    ("magenta", Color::rgb(255, 0, 255)),
    ("orange", Color::rgb(255, 165, 0)),
    ("purple", Color::rgb(160, 32, 240)),
    ("navy", Color::rgb(0, 0, 128)),
];

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLUE: Color = Color::rgb(0, 0, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Per-channel saturating difference, used to derive a readable status
    /// color from the background.
    pub fn saturating_sub(self, other: Color) -> Color {
        Color::rgb(
            self.r.saturating_sub(other.r),
            self.g.saturating_sub(other.g),
            self.b.saturating_sub(other.b),
        )
    }

    /// Linear blend towards `other`; `t` is clamped to `0.0..=1.0`.
    pub fn blend(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color::rgb(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl FromStr for Color {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if let Some(hex) = name.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(ClockError::InvalidColor(s.to_string()));
            }
            let channel = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16)
                    .map_err(|_| ClockError::InvalidColor(s.to_string()))
            };
            return Ok(Color::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?));
        }
        NAMED
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, color)| *color)
            .ok_or_else(|| ClockError::InvalidColor(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = ClockError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
