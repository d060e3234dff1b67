//! ## unreal-telemetry::logging
//! **`tracing` subscriber setup**
//!
//! The clock draws on the terminal it runs in, so log lines go to a file
//! when one is configured. Stderr is only used when it has been redirected
//! away from that terminal; otherwise logs are dropped.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::debug;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, EnvFilter};

use unreal_config::LoggingConfig;

use crate::TelemetryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    File(PathBuf),
    Stderr,
    Discard,
}

impl LogSink {
    /// Destination while the clock owns the terminal.
    pub fn for_terminal(config: &LoggingConfig, stderr_is_terminal: bool) -> Self {
        match &config.file {
            Some(path) => Self::File(path.clone()),
            None if stderr_is_terminal => Self::Discard,
            None => Self::Stderr,
        }
    }
}

#[derive(Clone)]
pub struct ClockLogger;

impl ClockLogger {
    /// Installs the global subscriber. `RUST_LOG` wins over the configured level.
    ///
    /// A second call leaves the first subscriber in place.
    pub fn init(config: &LoggingConfig, sink: &LogSink) -> Result<(), TelemetryError> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&config.level)?,
        };

        let (writer, ansi) = match sink {
            LogSink::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                (BoxMakeWriter::new(Mutex::new(file)), false)
            }
            LogSink::Stderr => (BoxMakeWriter::new(std::io::stderr), true),
            LogSink::Discard => (BoxMakeWriter::new(std::io::sink), false),
        };

        let installed = fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_ansi(ansi)
            .with_writer(writer)
            .try_init();
        if installed.is_err() {
            debug!("Global subscriber already installed");
        }
        Ok(())
    }
}
