//! Latest published clock state, readable from outside the frame loop.

use std::sync::Arc;

use chrono::NaiveDateTime;
use parking_lot::RwLock;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClockSnapshot {
    pub simulated: NaiveDateTime,
    pub real: NaiveDateTime,
    pub speed: f64,
    pub running: bool,
    pub fps: f64,
    /// `None` while no layout fits the display.
    pub point_size: Option<u32>,
}

/// Single-writer cell holding the most recent [`ClockSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct SnapshotCell {
    inner: Arc<RwLock<Option<ClockSnapshot>>>,
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: ClockSnapshot) {
        *self.inner.write() = Some(snapshot);
    }

    /// `None` until the first frame has been published.
    pub fn latest(&self) -> Option<ClockSnapshot> {
        self.inner.read().clone()
    }
}
