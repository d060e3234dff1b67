//! The rendering boundary the frame loop draws through.

use std::time::Duration;

use unreal_core::layout::{Footprint, GlyphMetrics};
use unreal_core::Color;

use crate::RenderError;

/// Pixel position of a glyph cell's top-left corner; may lie off-surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    Fullscreen,
    Windowed,
}

/// Input already translated from backend-specific events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Quit,
    /// Release a paused or held simulation.
    Start,
    TogglePause,
    /// Signed number of speed steps.
    SpeedStep(i32),
    /// The drawable pixel area changed.
    Resize(Footprint),
}

/// Something glyphs can be drawn on and measured against.
pub trait Surface: GlyphMetrics {
    fn footprint(&self) -> Footprint;

    fn clear(&mut self, background: Color);

    fn draw_glyph(&mut self, c: char, at: Point, point_size: u32, color: Color);

    /// One line of status text outside the pixel area.
    fn draw_status(&mut self, text: &str, color: Color);

    fn present(&mut self) -> Result<(), RenderError>;
}

/// A surface that also produces input.
pub trait Backend: Surface {
    /// Waits at most `timeout` for one event. `Ok(None)` is the common no-event case.
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<InputEvent>, RenderError>;
}
