//! ## unreal-engine::controller
//! **Per-frame state machine**
//!
//! [`FrameController`] owns the simulator and the current [`LayoutMetrics`].
//! Every tick it drains queued control commands, handles at most one input
//! event and then, once the first resize has produced a redraw, draws both
//! time lines and the status line.

use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{debug, info, instrument, warn};

use unreal_config::DisplayOptions;
use unreal_core::color::Color;
use unreal_core::command::{CommandQueue, ControlCommand};
use unreal_core::format::{format_time, FormatOptions};
use unreal_core::layout::{Footprint, GlyphMetrics, LayoutFitter, LayoutMetrics};
use unreal_core::simulator::TimeSimulator;
use unreal_core::snapshot::{ClockSnapshot, SnapshotCell};
use unreal_core::time::real_now;
use unreal_core::ClockError;
use unreal_render::{Backend, InputEvent, Point, Surface};
use unreal_telemetry::MetricsRecorder;

use crate::frame_clock::FrameClock;
use crate::EngineError;

/// Whether a layout exists for the current surface size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutState {
    /// No resize seen yet, or nothing fits the surface.
    Idle,
    Ready(LayoutMetrics),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct FrameController {
    simulator: TimeSimulator,
    display: DisplayOptions,
    format: FormatOptions,
    speed_ratio: f64,
    layout: LayoutState,
    redraw: bool,
    frame_clock: FrameClock,
    commands: CommandQueue,
    snapshots: SnapshotCell,
    metrics: MetricsRecorder,
}

impl FrameController {
    pub fn new(
        simulator: TimeSimulator,
        display: DisplayOptions,
        speed_ratio: f64,
        commands: CommandQueue,
        snapshots: SnapshotCell,
        metrics: MetricsRecorder,
    ) -> Self {
        metrics.set_speed(simulator.speed());
        Self {
            format: display.format_options(),
            simulator,
            display,
            speed_ratio,
            layout: LayoutState::Idle,
            redraw: false,
            frame_clock: FrameClock::new(),
            commands,
            snapshots,
            metrics,
        }
    }

    pub fn simulator(&self) -> &TimeSimulator {
        &self.simulator
    }

    pub fn layout(&self) -> &LayoutState {
        &self.layout
    }

    /// One loop iteration: commands, one event, then a frame if a redraw is due.
    pub fn tick<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        timeout: Duration,
    ) -> Result<Flow, EngineError> {
        self.drain_commands();

        if let Some(event) = backend.poll_event(timeout)? {
            if self.handle_event(event, &*backend) == Flow::Quit {
                return Ok(Flow::Quit);
            }
        }

        if self.redraw {
            let elapsed = self.frame_clock.tick();
            self.render_frame(backend, elapsed, real_now())?;
        }
        Ok(Flow::Continue)
    }

    /// Applies every queued control command in arrival order.
    pub fn drain_commands(&mut self) {
        let commands = self.commands.clone();
        for command in commands.drain() {
            self.apply_command(command);
        }
    }

    pub fn apply_command(&mut self, command: ControlCommand) {
        debug!(?command, "Applying control command");
        let result = match command {
            ControlCommand::Start => {
                self.start();
                Ok(())
            }
            ControlCommand::TogglePause => {
                self.simulator.toggle_running();
                Ok(())
            }
            ControlCommand::SetSpeed(speed) => self.simulator.set_speed(speed),
            ControlCommand::SpeedStep(steps) => self.simulator.step_speed(steps, self.speed_ratio),
            ControlCommand::AddStopTime(time) => {
                let stop = time.on(self.simulator.current_time().date());
                info!(%stop, "Stop time added");
                self.simulator.add_stop_time(stop);
                Ok(())
            }
        };
        self.after_speed_change(result);
        self.metrics.record_command();
    }

    pub fn handle_event<M: GlyphMetrics + ?Sized>(&mut self, event: InputEvent, metrics: &M) -> Flow {
        match event {
            InputEvent::Quit => {
                info!("Quit requested");
                return Flow::Quit;
            }
            InputEvent::Start => self.start(),
            InputEvent::TogglePause => {
                self.simulator.toggle_running();
            }
            InputEvent::SpeedStep(steps) => {
                let result = self.simulator.step_speed(steps, self.speed_ratio);
                self.after_speed_change(result);
            }
            InputEvent::Resize(footprint) => self.relayout(footprint, metrics),
        }
        Flow::Continue
    }

    fn start(&mut self) {
        self.simulator.start();
        self.redraw = true;
    }

    fn after_speed_change(&self, result: Result<(), ClockError>) {
        match result {
            Ok(()) => self.metrics.set_speed(self.simulator.speed()),
            Err(err) => warn!(%err, "Speed change ignored"),
        }
    }

    /// Fits a new layout for a surface of `footprint` pixels.
    #[instrument(level = "debug", skip(self, metrics))]
    pub fn relayout<M: GlyphMetrics + ?Sized>(&mut self, footprint: Footprint, metrics: &M) {
        let ceiling = Footprint::new(footprint.width, footprint.height / 2);
        self.layout = match LayoutFitter::fit(metrics, ceiling, &self.display.layout_request()) {
            Ok(layout) => {
                info!(
                    point_size = layout.point_size,
                    width = footprint.width,
                    height = footprint.height,
                    "Layout ready"
                );
                LayoutState::Ready(layout)
            }
            Err(err) => {
                warn!(%err, "Display too small for the clock");
                LayoutState::Idle
            }
        };
        self.metrics.record_layout_fit();
        self.redraw = true;
    }

    /// Advances the simulator by `elapsed` and draws one frame.
    pub fn render_frame<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        elapsed: Duration,
        real: NaiveDateTime,
    ) -> Result<(), EngineError> {
        let simulated = self.simulator.advance(elapsed);
        let background = self.display.background;

        surface.clear(background);
        if let LayoutState::Ready(layout) = self.layout {
            let color = self.display.color;
            let upper = format_time(&simulated, &self.format);
            let lower = format_time(&real, &self.format);
            draw_line(surface, upper.as_str(), 0, &layout, color);
            draw_line(surface, lower.as_str(), layout.digit_cell_height as i32, &layout, color);
        }

        let fps = self.frame_clock.fps();
        let speed = self.simulator.speed();
        surface.draw_status(
            &format!("speed {speed:13.9}; {fps:.1} FPS"),
            Color::WHITE.saturating_sub(background),
        );
        surface.present()?;

        self.metrics.record_frame(elapsed);
        self.snapshots.publish(ClockSnapshot {
            simulated,
            real,
            speed,
            running: self.simulator.is_running(),
            fps,
            point_size: match self.layout {
                LayoutState::Ready(layout) => Some(layout.point_size),
                LayoutState::Idle => None,
            },
        });
        Ok(())
    }
}

/// Lays `text` out left to right from the surface edge. Glyphs are centered
/// in their cells; colons are nudged by the configured offset.
fn draw_line<S: Surface + ?Sized>(
    surface: &mut S,
    text: &str,
    top: i32,
    layout: &LayoutMetrics,
    color: Color,
) {
    let (colon_dx, colon_dy) = layout.colon_offset_pixels();
    let size = layout.point_size;
    let mut x = 0i32;
    for c in text.chars() {
        let advance = layout.advance_of(c);
        if c != ' ' {
            let inset = (advance.saturating_sub(surface.glyph_width(c, size)) / 2) as i32;
            let (dx, dy) = if c == ':' { (colon_dx, colon_dy) } else { (0, 0) };
            surface.draw_glyph(c, Point::new(x + inset + dx, top + dy), size, color);
        }
        x += advance as i32;
    }
}
