//! In-memory pixel surface.
//!
//! [`CanvasSurface`] does all drawing into a [`Canvas`]; backends only decide
//! how to put the finished pixels on screen.

use unreal_core::layout::{Footprint, GlyphMetrics};
use unreal_core::Color;

use crate::font::BitmapFont;
use crate::surface::{Point, Surface};
use crate::RenderError;

#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl Canvas {
    pub fn new(size: Footprint, fill: Color) -> Self {
        Self {
            width: size.width,
            height: size.height,
            pixels: vec![fill; size.width as usize * size.height as usize],
        }
    }

    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.width, self.height)
    }

    /// Resizes and clears to `fill`.
    pub fn resize(&mut self, size: Footprint, fill: Color) {
        *self = Self::new(size, fill);
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        self.index(x as i64, y as i64).map(|i| self.pixels[i])
    }

    /// Mixes `color` into the pixel by `coverage`; off-canvas writes are dropped.
    pub fn blend(&mut self, x: i64, y: i64, color: Color, coverage: f32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = self.pixels[i].blend(color, coverage);
        }
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

/// Font-backed drawing on a [`Canvas`], plus a status line kept as text.
#[derive(Debug, Clone)]
pub struct CanvasSurface {
    canvas: Canvas,
    font: BitmapFont,
    antialias: bool,
    background: Color,
    status: Option<(String, Color)>,
    frames: u64,
}

impl CanvasSurface {
    pub fn new(size: Footprint, font: BitmapFont, antialias: bool) -> Self {
        Self {
            canvas: Canvas::new(size, Color::BLACK),
            font,
            antialias,
            background: Color::BLACK,
            status: None,
            frames: 0,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn font(&self) -> &BitmapFont {
        &self.font
    }

    /// Color of the last [`Surface::clear`].
    pub fn background(&self) -> Color {
        self.background
    }

    pub fn status(&self) -> Option<(&str, Color)> {
        self.status.as_ref().map(|(text, color)| (text.as_str(), *color))
    }

    /// Number of completed [`Surface::present`] calls.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn resize(&mut self, size: Footprint) {
        self.canvas.resize(size, self.background);
    }
}

impl GlyphMetrics for CanvasSurface {
    fn glyph_width(&self, c: char, point_size: u32) -> u32 {
        self.font.glyph_width(c, point_size)
    }

    fn text_width(&self, text: &str, point_size: u32) -> u32 {
        self.font.text_width(text, point_size)
    }

    fn line_height(&self, point_size: u32) -> u32 {
        self.font.line_height(point_size)
    }
}

impl Surface for CanvasSurface {
    fn footprint(&self) -> Footprint {
        self.canvas.footprint()
    }

    fn clear(&mut self, background: Color) {
        self.background = background;
        self.canvas.fill(background);
        self.status = None;
    }

    fn draw_glyph(&mut self, c: char, at: Point, point_size: u32, color: Color) {
        let canvas = &mut self.canvas;
        self.font
            .render(c, point_size, self.antialias, |x, y, coverage| {
                canvas.blend(
                    i64::from(at.x) + i64::from(x),
                    i64::from(at.y) + i64::from(y),
                    color,
                    coverage,
                );
            });
    }

    fn draw_status(&mut self, text: &str, color: Color) {
        self.status = Some((text.to_string(), color));
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.frames += 1;
        Ok(())
    }
}
