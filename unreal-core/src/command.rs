//! Thread-safe hand-off of control commands into the frame loop.
//!
//! Producers (the control channel's connection tasks) push into a bounded
//! lock-free queue; the frame loop drains it at the top of every frame. Push
//! never blocks, so a stalled frame loop can only cost dropped commands.

use std::sync::Arc;

use crossbeam::queue::ArrayQueue;
use tracing::warn;

use crate::time::ClockTime;
use crate::ClockError;

/// A state change requested from outside the frame loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    Start,
    TogglePause,
    SetSpeed(f64),
    SpeedStep(i32),
    AddStopTime(ClockTime),
}

impl ControlCommand {
    /// Interprets a POST to `path` with a plain-text `body`.
    ///
    /// Returns `Ok(None)` for paths outside the command vocabulary and an
    /// error when a known command carries a malformed argument.
    pub fn parse(path: &str, body: &str) -> Result<Option<Self>, ClockError> {
        let body = body.trim();
        let command = match path.trim_end_matches('/') {
            "/start" => ControlCommand::Start,
            "/pause" => ControlCommand::TogglePause,
            "/faster" => ControlCommand::SpeedStep(parse_steps(body)?),
            "/slower" => ControlCommand::SpeedStep(-parse_steps(body)?),
            "/speed" => {
                let speed: f64 = body
                    .parse()
                    .map_err(|_| ClockError::InvalidCommand(format!("speed '{body}'")))?;
                if !speed.is_finite() {
                    return Err(ClockError::InvalidSpeed(speed));
                }
                ControlCommand::SetSpeed(speed)
            }
            "/stop" => ControlCommand::AddStopTime(body.parse()?),
            _ => return Ok(None),
        };
        Ok(Some(command))
    }
}

/// An empty body means one step.
fn parse_steps(body: &str) -> Result<i32, ClockError> {
    if body.is_empty() {
        return Ok(1);
    }
    body.parse::<u16>()
        .map(i32::from)
        .map_err(|_| ClockError::InvalidCommand(format!("step count '{body}'")))
}

/// Bounded multi-producer queue of [`ControlCommand`]s.
#[derive(Debug, Clone)]
pub struct CommandQueue {
    inner: Arc<ArrayQueue<ControlCommand>>,
}

impl CommandQueue {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(ArrayQueue::new(capacity.max(1))),
        }
    }

    pub fn push(&self, command: ControlCommand) -> Result<(), ClockError> {
        self.inner.push(command).map_err(|dropped| {
            warn!(command = ?dropped, "Control queue full, dropping command");
            ClockError::QueueFull
        })
    }

    pub fn pop(&self) -> Option<ControlCommand> {
        self.inner.pop()
    }

    /// Removes every queued command in arrival order.
    pub fn drain(&self) -> impl Iterator<Item = ControlCommand> + '_ {
        std::iter::from_fn(move || self.inner.pop())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new(256)
    }
}
