//! ## unreal-render::font
//! **Scalable bitmap fonts**
//!
//! A font is a set of glyph bitmaps on a design grid of `height + line_gap`
//! rows, the em. At point size `p` one em maps to `p` pixels, so a glyph with
//! an advance of `a` design columns is `ceil(a * p / em)` pixels wide. Widths
//! therefore never shrink as the point size grows, which the layout search
//! relies on.
//!
//! Styles are synthesized once when the font is built:
//! - bold widens every stroke by one design column
//! - italic shears rows to the right, one column per three rows of height
//! - underline and strikethrough add a full-advance row of ink
//!
//! Font files are YAML:
//! ```yaml
//! name: mono
//! height: 5
//! line_gap: 1
//! spacing: 1
//! glyphs:
//!   "0": ["###", "# #", "# #", "# #", "###"]
//! ```
//! `#` is ink, anything else is blank. Digits, `:` and `.` are required; a
//! missing space is synthesized with the width of `0`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use unreal_config::FontSelection;
use unreal_core::layout::GlyphMetrics;

use crate::FontError;

pub const DEFAULT_FONT: &str = "block";

/// Largest design grid a font file may use.
pub const MAX_DESIGN_HEIGHT: u32 = 64;
pub const MAX_DESIGN_WIDTH: usize = 256;

const ITALIC_SLANT: usize = 3;

const REQUIRED_GLYPHS: [char; 12] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', '.'];

type Bitmap = Vec<Vec<bool>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
}

impl From<&FontSelection> for FontStyle {
    fn from(selection: &FontSelection) -> Self {
        Self {
            bold: selection.bold,
            italic: selection.italic,
            underline: selection.underline,
            strikethrough: selection.strikethrough,
        }
    }
}

/// One glyph on the full em grid, spacing and decorations included.
#[derive(Debug, Clone)]
struct Glyph {
    advance: usize,
    rows: Bitmap,
}

impl Glyph {
    fn ink(&self, x: usize, y: usize) -> bool {
        self.rows
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct BitmapFont {
    name: String,
    em: u32,
    glyphs: HashMap<char, Glyph>,
}

#[derive(Debug, Deserialize)]
struct FontFile {
    #[serde(default)]
    name: Option<String>,
    height: u32,
    #[serde(default)]
    line_gap: u32,
    #[serde(default = "default_spacing")]
    spacing: u32,
    glyphs: BTreeMap<String, Vec<String>>,
}

fn default_spacing() -> u32 {
    1
}

impl BitmapFont {
    /// Picks a font for `selection`: an existing file path, then a built-in
    /// name, then the default font. Failures are logged, never fatal.
    pub fn resolve(selection: &FontSelection) -> Self {
        let style = FontStyle::from(selection);
        let Some(name) = selection.name.as_deref() else {
            info!("Using default font {}", DEFAULT_FONT);
            return Self::block(style);
        };

        let path = Path::new(name);
        if path.is_file() {
            return match Self::load(path, style) {
                Ok(font) => {
                    info!(path = %path.display(), "Using custom font {}", font.name());
                    font
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Cannot use font file, using default font {}", DEFAULT_FONT);
                    Self::block(style)
                }
            };
        }

        match Self::builtin(name, style) {
            Some(font) => {
                info!("Using built-in font {}", font.name());
                font
            }
            None => {
                warn!(requested = name, "Font not found, using default font {}", DEFAULT_FONT);
                Self::block(style)
            }
        }
    }

    pub fn builtin(name: &str, style: FontStyle) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "block" => Some(Self::block(style)),
            "slim" => Some(Self::slim(style)),
            "segment" | "7segment" => Some(Self::segment(style)),
            _ => None,
        }
    }

    pub fn load(path: &Path, style: FontStyle) -> Result<Self, FontError> {
        let text = std::fs::read_to_string(path).map_err(|source| FontError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text, style)
    }

    pub fn from_yaml_str(text: &str, style: FontStyle) -> Result<Self, FontError> {
        let file: FontFile = serde_yaml::from_str(text)?;
        if file.height == 0 || file.height > MAX_DESIGN_HEIGHT {
            return Err(FontError::InvalidHeight {
                height: file.height,
                max: MAX_DESIGN_HEIGHT,
            });
        }
        for (field, value, max) in [
            ("line_gap", file.line_gap, MAX_DESIGN_HEIGHT),
            ("spacing", file.spacing, MAX_DESIGN_WIDTH as u32),
        ] {
            if value > max {
                return Err(FontError::OutOfRange { field, value, max });
            }
        }

        let mut glyphs = Vec::with_capacity(file.glyphs.len());
        for (key, rows) in &file.glyphs {
            let mut chars = key.chars();
            let (Some(c), None) = (chars.next(), chars.next()) else {
                return Err(FontError::InvalidKey(key.clone()));
            };
            glyphs.push((c, parse_file_glyph(c, rows, file.height as usize)?));
        }
        if let Some(missing) = REQUIRED_GLYPHS
            .iter()
            .find(|c| !glyphs.iter().any(|(g, _)| g == *c))
        {
            return Err(FontError::MissingGlyph(*missing));
        }

        Ok(Self::assemble(
            file.name.unwrap_or_else(|| "custom".into()),
            file.height as usize,
            file.line_gap as usize,
            file.spacing as usize,
            glyphs,
            style,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Design rows per em.
    pub fn em(&self) -> u32 {
        self.em
    }

    pub fn has_glyph(&self, c: char) -> bool {
        self.glyphs.contains_key(&c)
    }

    /// Rasterizes `c` at `point_size`, calling `plot(x, y, coverage)` for every
    /// pixel of the glyph cell with ink. Coverage is 1.0 without antialiasing
    /// and a multiple of 0.25 from 2x2 supersampling with it.
    pub fn render<F>(&self, c: char, point_size: u32, antialias: bool, mut plot: F)
    where
        F: FnMut(u32, u32, f32),
    {
        let Some(glyph) = self.glyphs.get(&c) else {
            return;
        };
        let width = self.scaled(glyph.advance, point_size);
        let em = u64::from(self.em);
        let size = u64::from(point_size);
        let sample = |pixel: u32, offset: u64, steps: u64| {
            ((steps * u64::from(pixel) + offset) * em / (steps * size)) as usize
        };

        for y in 0..point_size {
            for x in 0..width {
                let coverage = if antialias {
                    let hits = [(1, 1), (3, 1), (1, 3), (3, 3)]
                        .iter()
                        .filter(|&&(sx, sy)| glyph.ink(sample(x, sx, 4), sample(y, sy, 4)))
                        .count();
                    hits as f32 / 4.0
                } else if glyph.ink(sample(x, 1, 2), sample(y, 1, 2)) {
                    1.0
                } else {
                    0.0
                };
                if coverage > 0.0 {
                    plot(x, y, coverage);
                }
            }
        }
    }

    fn scaled(&self, design: usize, point_size: u32) -> u32 {
        let pixels = (design as u64 * u64::from(point_size)).div_ceil(u64::from(self.em));
        u32::try_from(pixels).unwrap_or(u32::MAX)
    }

    /// Builds a font from raw glyph bitmaps. Ragged rows are padded with
    /// blanks, so this never fails; file fonts are checked before they get here.
    fn assemble(
        name: String,
        height: usize,
        line_gap: usize,
        spacing: usize,
        mut bitmaps: Vec<(char, Bitmap)>,
        style: FontStyle,
    ) -> Self {
        if !bitmaps.iter().any(|(c, _)| *c == ' ') {
            let zero_width = bitmaps
                .iter()
                .find(|(c, _)| *c == '0')
                .map(|(_, rows)| bitmap_width(rows))
                .unwrap_or(0);
            bitmaps.push((' ', vec![vec![false; zero_width]; height]));
        }

        let em = height + line_gap;
        let glyphs = bitmaps
            .into_iter()
            .map(|(c, rows)| (c, styled_glyph(rows, height, em, spacing, style)))
            .collect();

        Self {
            name,
            em: em as u32,
            glyphs,
        }
    }

    fn from_table(name: &str, height: usize, table: &[(char, [&str; 7])], style: FontStyle) -> Self {
        let bitmaps = table
            .iter()
            .map(|(c, rows)| (*c, rows[..height].iter().map(|row| parse_row(row)).collect()))
            .collect();
        Self::assemble(name.into(), height, 1, 1, bitmaps, style)
    }

    fn block(style: FontStyle) -> Self {
        Self::from_table("block", 7, BLOCK_GLYPHS, style)
    }

    fn slim(style: FontStyle) -> Self {
        Self::from_table("slim", 5, SLIM_GLYPHS, style)
    }

    /// Seven-segment digits drawn from segment masks on a 4x7 grid.
    fn segment(style: FontStyle) -> Self {
        const HEIGHT: usize = 7;
        const WIDTH: usize = 4;
        // Segments a-g as (row span, column span).
        const SEGMENTS: [((usize, usize), (usize, usize)); 7] = [
            ((0, 0), (1, 2)),
            ((1, 2), (3, 3)),
            ((4, 5), (3, 3)),
            ((6, 6), (1, 2)),
            ((4, 5), (0, 0)),
            ((1, 2), (0, 0)),
            ((3, 3), (1, 2)),
        ];
        const DIGIT_MASKS: [u8; 10] = [
            0b0111111, 0b0000110, 0b1011011, 0b1001111, 0b1100110, 0b1101101, 0b1111101,
            0b0000111, 0b1111111, 0b1101111,
        ];

        let mut bitmaps: Vec<(char, Bitmap)> = DIGIT_MASKS
            .iter()
            .enumerate()
            .map(|(digit, mask)| {
                let mut rows = vec![vec![false; WIDTH]; HEIGHT];
                for (bit, ((top, bottom), (left, right))) in SEGMENTS.iter().enumerate() {
                    if mask & (1 << bit) == 0 {
                        continue;
                    }
                    for row in &mut rows[*top..=*bottom] {
                        row[*left..=*right].fill(true);
                    }
                }
                (char::from(b'0' + digit as u8), rows)
            })
            .collect();

        let column = |inked: &[usize]| -> Bitmap { (0..HEIGHT).map(|r| vec![inked.contains(&r)]).collect() };
        bitmaps.push((':', column(&[2, 4])));
        bitmaps.push(('.', column(&[6])));

        Self::assemble("segment".into(), HEIGHT, 1, 1, bitmaps, style)
    }
}

impl GlyphMetrics for BitmapFont {
    fn glyph_width(&self, c: char, point_size: u32) -> u32 {
        self.glyphs
            .get(&c)
            .map(|glyph| self.scaled(glyph.advance, point_size))
            .unwrap_or(0)
    }

    fn line_height(&self, point_size: u32) -> u32 {
        point_size
    }
}

fn parse_row(row: &str) -> Vec<bool> {
    row.chars().map(|c| c == '#').collect()
}

fn bitmap_width(rows: &Bitmap) -> usize {
    rows.iter().map(Vec::len).max().unwrap_or(0)
}

fn parse_file_glyph(c: char, rows: &[String], height: usize) -> Result<Bitmap, FontError> {
    let invalid = |reason: String| FontError::InvalidGlyph { glyph: c, reason };
    if rows.len() != height {
        return Err(invalid(format!("{} rows, font height is {height}", rows.len())));
    }
    let width = rows.first().map(|row| row.chars().count()).unwrap_or(0);
    if rows.iter().any(|row| row.chars().count() != width) {
        return Err(invalid("rows differ in width".into()));
    }
    if width > MAX_DESIGN_WIDTH {
        return Err(invalid(format!("{width} columns is too wide")));
    }
    Ok(rows.iter().map(|row| parse_row(row)).collect())
}

/// Applies style and places the glyph on its em grid.
fn styled_glyph(rows: Bitmap, height: usize, em: usize, spacing: usize, style: FontStyle) -> Glyph {
    let mut ink = rows;
    ink.resize(height, Vec::new());
    let mut width = bitmap_width(&ink);
    for row in &mut ink {
        row.resize(width, false);
    }

    if style.bold {
        ink = ink
            .iter()
            .map(|row| {
                (0..=width)
                    .map(|x| row.get(x).copied().unwrap_or(false) || (x > 0 && row[x - 1]))
                    .collect()
            })
            .collect();
        width += 1;
    }

    if style.italic {
        let lean = height.saturating_sub(1) / ITALIC_SLANT;
        ink = ink
            .iter()
            .enumerate()
            .map(|(y, row)| {
                let shift = (height - 1 - y) / ITALIC_SLANT;
                let mut sheared = vec![false; shift];
                sheared.extend_from_slice(row);
                sheared.resize(width + lean, false);
                sheared
            })
            .collect();
        width += lean;
    }

    let advance = width + spacing;
    let mut cell = vec![vec![false; advance]; em];
    for (cell_row, ink_row) in cell.iter_mut().zip(&ink) {
        cell_row[..width].copy_from_slice(ink_row);
    }
    if style.underline {
        let row = if em > height { height } else { height - 1 };
        cell[row].fill(true);
    }
    if style.strikethrough {
        cell[height / 2].fill(true);
    }

    Glyph {
        advance,
        rows: cell,
    }
}

const BLOCK_GLYPHS: &[(char, [&str; 7])] = &[
    ('0', [" ### ", "#   #", "#  ##", "# # #", "##  #", "#   #", " ### "]),
    ('1', ["  #  ", " ##  ", "  #  ", "  #  ", "  #  ", "  #  ", " ### "]),
    ('2', [" ### ", "#   #", "    #", "   # ", "  #  ", " #   ", "#####"]),
    ('3', ["#####", "   # ", "  #  ", "   # ", "    #", "#   #", " ### "]),
    ('4', ["   # ", "  ## ", " # # ", "#  # ", "#####", "   # ", "   # "]),
    ('5', ["#####", "#    ", "#### ", "    #", "    #", "#   #", " ### "]),
    ('6', ["  ## ", " #   ", "#    ", "#### ", "#   #", "#   #", " ### "]),
    ('7', ["#####", "    #", "   # ", "  #  ", " #   ", " #   ", " #   "]),
    ('8', [" ### ", "#   #", "#   #", " ### ", "#   #", "#   #", " ### "]),
    ('9', [" ### ", "#   #", "#   #", " ####", "    #", "   # ", " ##  "]),
    (':', [" ", " ", "#", " ", "#", " ", " "]),
    ('.', [" ", " ", " ", " ", " ", " ", "#"]),
];

// Five rows used; the array shape is shared with the block table.
const SLIM_GLYPHS: &[(char, [&str; 7])] = &[
    ('0', ["###", "# #", "# #", "# #", "###", "", ""]),
    ('1', [" # ", "## ", " # ", " # ", "###", "", ""]),
    ('2', ["###", "  #", "###", "#  ", "###", "", ""]),
    ('3', ["###", "  #", " ##", "  #", "###", "", ""]),
    ('4', ["# #", "# #", "###", "  #", "  #", "", ""]),
    ('5', ["###", "#  ", "###", "  #", "###", "", ""]),
    ('6', ["###", "#  ", "###", "# #", "###", "", ""]),
    ('7', ["###", "  #", "  #", "  #", "  #", "", ""]),
    ('8', ["###", "# #", "###", "# #", "###", "", ""]),
    ('9', ["###", "# #", "###", "  #", "###", "", ""]),
    (':', [" ", "#", " ", "#", " ", "", ""]),
    ('.', [" ", " ", " ", " ", "#", "", ""]),
];
