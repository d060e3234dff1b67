//! ## unreal-render::terminal
//! **crossterm backend**
//!
//! Every terminal cell shows two vertically stacked pixels: the upper half
//! block `▀` in the top pixel's color over a background of the bottom pixel's
//! color. The last row holds the status line, so a `cols x rows` terminal
//! offers a `cols x 2*(rows-1)` pixel area.
//!
//! The terminal is restored on drop and, for panics, from a panic hook.

use std::collections::VecDeque;
use std::io::{self, Stdout, Write};
use std::sync::OnceLock;
use std::time::Duration;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEventKind,
};
use crossterm::style::{Color as TermColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue};
use tracing::{info, warn};

use unreal_core::layout::{Footprint, GlyphMetrics};
use unreal_core::Color;

use crate::canvas::CanvasSurface;
use crate::font::BitmapFont;
use crate::surface::{Backend, InputEvent, Point, Surface, WindowMode};
use crate::RenderError;

const HALF_BLOCK: char = '▀';

/// Pixel area of a terminal with `cols x rows` cells.
pub fn pixel_footprint(cols: u16, rows: u16) -> Footprint {
    Footprint::new(u32::from(cols), 2 * u32::from(rows.saturating_sub(1)))
}

/// Translates a terminal event. Resizes need the new size and are handled by the caller.
pub fn map_event(event: &Event) -> Option<InputEvent> {
    match event {
        Event::Key(key) => map_key(key),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => Some(InputEvent::SpeedStep(1)),
            MouseEventKind::ScrollDown => Some(InputEvent::SpeedStep(-1)),
            _ => None,
        },
        Event::Resize(cols, rows) => Some(InputEvent::Resize(pixel_footprint(*cols, *rows))),
        _ => None,
    }
}

fn map_key(key: &KeyEvent) -> Option<InputEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Some(InputEvent::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(InputEvent::Quit)
        }
        KeyCode::Char(' ') => Some(InputEvent::Start),
        KeyCode::Char('p') => Some(InputEvent::TogglePause),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(InputEvent::SpeedStep(1)),
        KeyCode::Char('-') => Some(InputEvent::SpeedStep(-1)),
        _ => None,
    }
}

/// Only the controlling terminal can be drawn on; any other index is reported once.
fn check_display(display_index: u32) -> bool {
    if display_index == 0 {
        return true;
    }
    warn!(
        display_index,
        "Display selection is not supported on a terminal, using the current one"
    );
    false
}

fn term_color(color: Color) -> TermColor {
    TermColor::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

pub struct TerminalBackend {
    surface: CanvasSurface,
    stdout: Stdout,
    pending: VecDeque<InputEvent>,
    cols: u16,
    rows: u16,
    alternate_screen: bool,
}

impl TerminalBackend {
    /// Takes over the terminal. A synthetic resize is queued so the first
    /// poll reports the initial size.
    pub fn open(
        mode: WindowMode,
        display_index: u32,
        font: BitmapFont,
        antialias: bool,
    ) -> Result<Self, RenderError> {
        check_display(display_index);

        install_panic_hook();
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        let footprint = pixel_footprint(cols, rows);
        let mut backend = Self {
            surface: CanvasSurface::new(footprint, font, antialias),
            stdout: io::stdout(),
            pending: VecDeque::from([InputEvent::Resize(footprint)]),
            cols,
            rows,
            alternate_screen: false,
        };

        if mode == WindowMode::Fullscreen {
            execute!(backend.stdout, EnterAlternateScreen)?;
            backend.alternate_screen = true;
        }
        execute!(
            backend.stdout,
            cursor::Hide,
            EnableMouseCapture,
            Clear(ClearType::All)
        )?;

        info!(cols, rows, ?mode, "Terminal opened");
        Ok(backend)
    }

    fn handle_resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.surface.resize(pixel_footprint(cols, rows));
    }

    fn write_frame(&mut self) -> io::Result<()> {
        let canvas = self.surface.canvas();
        let footprint = canvas.footprint();
        let background = self.surface.background();

        for row in 0..footprint.height / 2 {
            queue!(self.stdout, cursor::MoveTo(0, row as u16))?;
            let mut last: Option<(Color, Color)> = None;
            for x in 0..footprint.width {
                let top = canvas.get(x, 2 * row).unwrap_or(background);
                let bottom = canvas.get(x, 2 * row + 1).unwrap_or(background);
                if last != Some((top, bottom)) {
                    queue!(
                        self.stdout,
                        SetForegroundColor(term_color(top)),
                        SetBackgroundColor(term_color(bottom))
                    )?;
                    last = Some((top, bottom));
                }
                queue!(self.stdout, Print(HALF_BLOCK))?;
            }
        }

        if self.rows > 0 {
            let status_row = self.rows - 1;
            queue!(
                self.stdout,
                cursor::MoveTo(0, status_row),
                SetBackgroundColor(term_color(background)),
                Clear(ClearType::CurrentLine)
            )?;
            if let Some((text, color)) = self.surface.status() {
                let width = text.chars().count().min(usize::from(self.cols));
                let column = usize::from(self.cols) - width;
                let shown: String = text.chars().take(width).collect();
                queue!(
                    self.stdout,
                    cursor::MoveTo(column as u16, status_row),
                    SetForegroundColor(term_color(color)),
                    Print(shown)
                )?;
            }
        }

        queue!(self.stdout, ResetColor)?;
        self.stdout.flush()
    }

    fn cleanup(&mut self) {
        let _ = execute!(self.stdout, ResetColor, DisableMouseCapture, cursor::Show);
        if self.alternate_screen {
            let _ = execute!(self.stdout, LeaveAlternateScreen);
            self.alternate_screen = false;
        }
        let _ = terminal::disable_raw_mode();
        let _ = self.stdout.flush();
    }
}

impl GlyphMetrics for TerminalBackend {
    fn glyph_width(&self, c: char, point_size: u32) -> u32 {
        self.surface.glyph_width(c, point_size)
    }

    fn text_width(&self, text: &str, point_size: u32) -> u32 {
        self.surface.text_width(text, point_size)
    }

    fn line_height(&self, point_size: u32) -> u32 {
        self.surface.line_height(point_size)
    }
}

impl Surface for TerminalBackend {
    fn footprint(&self) -> Footprint {
        self.surface.footprint()
    }

    fn clear(&mut self, background: Color) {
        self.surface.clear(background);
    }

    fn draw_glyph(&mut self, c: char, at: Point, point_size: u32, color: Color) {
        self.surface.draw_glyph(c, at, point_size, color);
    }

    fn draw_status(&mut self, text: &str, color: Color) {
        self.surface.draw_status(text, color);
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.write_frame()?;
        self.surface.present()
    }
}

impl Backend for TerminalBackend {
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<InputEvent>, RenderError> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }
        if !event::poll(timeout)? {
            return Ok(None);
        }
        let event = event::read()?;
        if let Event::Resize(cols, rows) = event {
            self.handle_resize(cols, rows);
        }
        Ok(map_event(&event))
    }
}

impl Drop for TerminalBackend {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup();
            previous(info);
        }));
    });
}

fn best_effort_cleanup() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, ResetColor, DisableMouseCapture, cursor::Show, LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = stdout.flush();
}
