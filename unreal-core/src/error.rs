use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClockError {
    #[error("Speed multiplier must be a finite number, got {0}")]
    InvalidSpeed(f64),

    #[error("Invalid time value: {0}")]
    InvalidTime(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid colon offset: {0}")]
    InvalidOffset(String),

    #[error("Invalid control command: {0}")]
    InvalidCommand(String),

    #[error("Control queue capacity exceeded")]
    QueueFull,
}
