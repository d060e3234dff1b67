//! Real elapsed time between frames and a short moving FPS average.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

const FPS_WINDOW: usize = 10;

#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    recent: VecDeque<Duration>,
}

impl FrameClock {
    /// Starts measuring from now.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            last: start,
            recent: VecDeque::with_capacity(FPS_WINDOW),
        }
    }

    /// Marks a frame and returns the real time since the previous one.
    pub fn tick(&mut self) -> Duration {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> Duration {
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        if self.recent.len() == FPS_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(elapsed);
        elapsed
    }

    /// Average frame rate over the last ten frames; zero until time has passed.
    pub fn fps(&self) -> f64 {
        let total: Duration = self.recent.iter().sum();
        if total.is_zero() {
            0.0
        } else {
            self.recent.len() as f64 / total.as_secs_f64()
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
