//! # Unreal Telemetry
//!
//! Logging setup and Prometheus frame metrics for the clock.

pub mod logging;
pub mod metrics;

pub use logging::{ClockLogger, LogSink};
pub use metrics::MetricsRecorder;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Metrics registry error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("Metrics exposition is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("Cannot open log file: {0}")]
    Io(#[from] std::io::Error),
}
