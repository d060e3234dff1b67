//! The main loop driving a [`FrameController`] against a [`Backend`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use unreal_render::Backend;

use crate::controller::{Flow, FrameController};
use crate::EngineError;

/// Poll deadlines one frame budget apart, independent of whether a frame was
/// drawn, so an idle controller still waits between polls.
#[derive(Debug)]
struct Pacer {
    budget: Duration,
    deadline: Instant,
}

impl Pacer {
    fn new(budget: Duration, start: Instant) -> Self {
        Self {
            budget,
            deadline: start + budget,
        }
    }

    fn timeout(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }

    /// Moves to the next budget once the current deadline has passed.
    fn after_tick(&mut self, now: Instant) {
        if now >= self.deadline {
            self.deadline = now + self.budget;
        }
    }
}

/// Runs frames until the user quits or `shutdown` is raised.
///
/// Pacing is advisory: each poll waits at most until the end of the current
/// `max_fps` frame budget, and an early event simply produces an early frame.
#[instrument(level = "info", name = "run_clock", skip(backend, controller, shutdown))]
pub fn run_clock<B: Backend + ?Sized>(
    backend: &mut B,
    controller: &mut FrameController,
    shutdown: &AtomicBool,
    max_fps: u32,
) -> Result<(), EngineError> {
    let budget = Duration::from_secs_f64(1.0 / f64::from(max_fps.max(1)));
    info!(?budget, "Clock loop started");
    let mut pacer = Pacer::new(budget, Instant::now());

    loop {
        if shutdown.load(Ordering::SeqCst) {
            info!("Shutdown signal received");
            break;
        }
        let timeout = pacer.timeout(Instant::now());
        if controller.tick(backend, timeout)? == Flow::Quit {
            break;
        }
        pacer.after_tick(Instant::now());
    }

    info!("Clock loop stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use chrono::{NaiveDate, NaiveTime};
    use unreal_config::DisplayOptions;
    use unreal_core::color::Color;
    use unreal_core::command::{CommandQueue, ControlCommand};
    use unreal_core::layout::{Footprint, GlyphMetrics};
    use unreal_core::simulator::TimeSimulator;
    use unreal_core::snapshot::SnapshotCell;
    use unreal_render::{
        BitmapFont, CanvasSurface, FontStyle, InputEvent, Point, RenderError, Surface,
    };
    use unreal_telemetry::MetricsRecorder;

    /// Canvas-backed backend replaying a fixed list of events.
    struct Scripted {
        surface: CanvasSurface,
        events: VecDeque<InputEvent>,
        timeouts: Vec<Duration>,
    }

    impl Scripted {
        fn new(events: impl IntoIterator<Item = InputEvent>) -> Self {
            let font = BitmapFont::builtin("block", FontStyle::default()).unwrap();
            Self {
                surface: CanvasSurface::new(Footprint::new(120, 40), font, false),
                events: events.into_iter().collect(),
                timeouts: Vec::new(),
            }
        }
    }

    impl GlyphMetrics for Scripted {
        fn glyph_width(&self, c: char, point_size: u32) -> u32 {
            self.surface.glyph_width(c, point_size)
        }

        fn line_height(&self, point_size: u32) -> u32 {
            self.surface.line_height(point_size)
        }
    }

    impl Surface for Scripted {
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
            self.surface.present()
        }
    }

    impl Backend for Scripted {
        fn poll_event(&mut self, timeout: Duration) -> Result<Option<InputEvent>, RenderError> {
            self.timeouts.push(timeout);
            Ok(self.events.pop_front())
        }
    }

    fn controller(queue: CommandQueue, snapshots: SnapshotCell) -> FrameController {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        FrameController::new(
            TimeSimulator::new(start),
            DisplayOptions::default(),
            1.1,
            queue,
            snapshots,
            MetricsRecorder::new().unwrap(),
        )
    }

    #[test]
    fn runs_until_quit() {
        let snapshots = SnapshotCell::new();
        let mut controller = controller(CommandQueue::default(), snapshots.clone());
        let mut backend = Scripted::new([
            InputEvent::Resize(Footprint::new(120, 40)),
            InputEvent::SpeedStep(1),
            InputEvent::Quit,
        ]);

        run_clock(&mut backend, &mut controller, &AtomicBool::new(false), 1000).unwrap();

        assert_eq!(backend.surface.frames(), 2);
        assert!(backend.surface.status().is_some());
        let snapshot = snapshots.latest().unwrap();
        assert!((snapshot.speed - 1.1).abs() < 1e-12);
        assert!(snapshot.point_size.is_some());
    }

    #[test]
    fn nothing_is_drawn_before_the_first_resize() {
        let mut controller = controller(CommandQueue::default(), SnapshotCell::new());
        let mut backend = Scripted::new([InputEvent::TogglePause, InputEvent::Quit]);
        run_clock(&mut backend, &mut controller, &AtomicBool::new(false), 60).unwrap();
        assert_eq!(backend.surface.frames(), 0);
    }

    #[test]
    fn queued_commands_apply_before_input() {
        let queue = CommandQueue::default();
        queue.push(ControlCommand::SetSpeed(4.0)).unwrap();
        let mut controller = controller(queue.clone(), SnapshotCell::new());
        let mut backend = Scripted::new([InputEvent::SpeedStep(-1), InputEvent::Quit]);

        run_clock(&mut backend, &mut controller, &AtomicBool::new(false), 60).unwrap();
        assert!((controller.simulator().speed() - 4.0 / 1.1).abs() < 1e-12);
    }

    #[test]
    fn raised_shutdown_flag_stops_the_loop() {
        let mut controller = controller(CommandQueue::default(), SnapshotCell::new());
        let mut backend = Scripted::new([InputEvent::Resize(Footprint::new(120, 40))]);
        run_clock(&mut backend, &mut controller, &AtomicBool::new(true), 60).unwrap();
        assert_eq!(backend.surface.frames(), 0);
    }

    #[test]
    fn pacer_waits_out_the_budget_between_polls() {
        let start = Instant::now();
        let budget = Duration::from_millis(20);
        let mut pacer = Pacer::new(budget, start);
        assert_eq!(pacer.timeout(start), budget);

        // An early event leaves the deadline in place.
        let early = start + Duration::from_millis(5);
        pacer.after_tick(early);
        assert_eq!(pacer.timeout(early), Duration::from_millis(15));

        // A poll that ran out the budget starts a fresh one.
        let late = start + Duration::from_millis(21);
        assert_eq!(pacer.timeout(late), Duration::ZERO);
        pacer.after_tick(late);
        assert_eq!(pacer.timeout(late), budget);
    }

    #[test]
    fn idle_loop_never_polls_without_a_timeout() {
        let mut controller = controller(CommandQueue::default(), SnapshotCell::new());
        let mut backend = Scripted::new([InputEvent::TogglePause, InputEvent::Quit]);
        run_clock(&mut backend, &mut controller, &AtomicBool::new(false), 1).unwrap();

        assert_eq!(backend.timeouts.len(), 2);
        assert!(backend.timeouts.iter().all(|t| *t > Duration::from_millis(500)));
    }
}
