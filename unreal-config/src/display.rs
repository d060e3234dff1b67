//! How the time is drawn and where.

use serde::{Deserialize, Serialize};
use validator::Validate;

use unreal_core::format::{FormatOptions, MAX_SUBSECONDS};
use unreal_core::layout::{ColonOffset, LayoutRequest};
use unreal_core::Color;

/// Display options, fixed at startup.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct DisplayOptions {
    /// 12-hour clock.
    #[serde(default)]
    pub halfday: bool,

    #[serde(default = "default_subseconds")]
    #[validate(range(max = MAX_SUBSECONDS))]
    pub subseconds: u8,

    #[serde(default)]
    pub zero_padded: bool,

    #[serde(default)]
    pub antialias: bool,

    #[serde(default = "default_color")]
    pub color: Color,

    #[serde(default = "default_background")]
    pub background: Color,

    #[serde(default)]
    #[validate(nested)]
    pub font: FontSelection,

    #[serde(default)]
    pub colon_offset: ColonOffset,
}

fn default_subseconds() -> u8 {
    3
}

fn default_color() -> Color {
    Color::BLUE
}

fn default_background() -> Color {
    Color::BLACK
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            halfday: false,
            subseconds: default_subseconds(),
            zero_padded: false,
            antialias: false,
            color: default_color(),
            background: default_background(),
            font: FontSelection::default(),
            colon_offset: ColonOffset::default(),
        }
    }
}

impl DisplayOptions {
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            halfday: self.halfday,
            subseconds: self.subseconds,
            zero_padded: self.zero_padded,
        }
    }

    pub fn layout_request(&self) -> LayoutRequest {
        LayoutRequest {
            subseconds: self.subseconds,
            colon_offset: self.colon_offset,
        }
    }
}

/// Font by file path or built-in name, plus synthesized styles.
#[derive(Debug, Default, Serialize, Deserialize, Validate, Clone, PartialEq, Eq)]
pub struct FontSelection {
    /// A path to a font file, or the name of a built-in font. `None` is the default font.
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct WindowConfig {
    #[serde(default = "default_true")]
    pub fullscreen: bool,

    /// Index of the display to open on.
    #[serde(default)]
    pub display: u32,

    /// Frame rate cap; the loop sleeps in the event poll for the rest of a frame.
    #[serde(default = "default_max_fps")]
    #[validate(range(min = 1, max = 1000))]
    pub max_fps: u32,
}

fn default_true() -> bool {
    true
}

fn default_max_fps() -> u32 {
    60
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            fullscreen: default_true(),
            display: 0,
            max_fps: default_max_fps(),
        }
    }
}
