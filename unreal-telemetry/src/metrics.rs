//! ## unreal-telemetry::metrics
//! **Prometheus frame and control metrics**
//!
//! Each recorder owns its registry, so tests and multiple clocks in one
//! process never collide on metric names.

use std::time::Duration;

use prometheus::{Encoder, Gauge, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

use crate::TelemetryError;

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub frames: IntCounter,
    pub frame_seconds: Histogram,
    pub layout_fits: IntCounter,
    pub control_commands: IntCounter,
    pub speed: Gauge,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new();

        let frames = IntCounter::new("unreal_frames_total", "Frames drawn")?;
        let frame_seconds = Histogram::with_opts(
            HistogramOpts::new("unreal_frame_seconds", "Real time between consecutive frames")
                .buckets(vec![0.001, 0.004, 0.008, 0.016, 0.033, 0.066, 0.25, 1.0]),
        )?;
        let layout_fits = IntCounter::new(
            "unreal_layout_fits_total",
            "Layout recomputations triggered by resizes",
        )?;
        let control_commands = IntCounter::new(
            "unreal_control_commands_total",
            "Control commands applied to the simulator",
        )?;
        let speed = Gauge::new("unreal_speed_multiplier", "Current simulation speed")?;

        registry.register(Box::new(frames.clone()))?;
        registry.register(Box::new(frame_seconds.clone()))?;
        registry.register(Box::new(layout_fits.clone()))?;
        registry.register(Box::new(control_commands.clone()))?;
        registry.register(Box::new(speed.clone()))?;

        Ok(Self {
            registry,
            frames,
            frame_seconds,
            layout_fits,
            control_commands,
            speed,
        })
    }

    pub fn record_frame(&self, elapsed: Duration) {
        self.frames.inc();
        self.frame_seconds.observe(elapsed.as_secs_f64());
    }

    pub fn record_layout_fit(&self) {
        self.layout_fits.inc();
    }

    pub fn record_command(&self) {
        self.control_commands.inc();
    }

    pub fn set_speed(&self, speed: f64) {
        self.speed.set(speed);
    }

    /// Text exposition format of every registered metric.
    pub fn gather_metrics(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
