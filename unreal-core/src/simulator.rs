//! ## unreal-core::simulator
//! **Simulated clock advanced by scaled real time**
//!
//! The simulated time is only ever written by [`TimeSimulator::advance`].
//! Speed, running state and stop times are plain state changes that take
//! effect on the next advance.
//!
//! ### Stop times
//! A stop time `t` is reached during a frame when `current < t <= candidate`.
//! The scan follows list order, so with several stop times crossed in one
//! frame the first listed one wins, not the earliest. A stop time equal to
//! the current time counts as already reached and never fires again on its own.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ClockError;

/// What happens when the simulated time lands on a stop time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopBehavior {
    /// Snap to the stop time and pause until started again.
    #[default]
    Hold,
    /// Snap to the stop time for one frame and keep running.
    PassThrough,
}

#[derive(Debug, Clone)]
pub struct TimeSimulator {
    current: NaiveDateTime,
    speed: f64,
    stop_times: Vec<NaiveDateTime>,
    running: bool,
    stop_behavior: StopBehavior,
}

impl TimeSimulator {
    /// Creates a running simulator at `start` with a speed of 1.
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            current: start,
            speed: 1.0,
            stop_times: Vec::new(),
            running: true,
            stop_behavior: StopBehavior::default(),
        }
    }

    pub fn with_stop_times(mut self, stop_times: impl IntoIterator<Item = NaiveDateTime>) -> Self {
        self.stop_times.extend(stop_times);
        self
    }

    pub fn with_stop_behavior(mut self, behavior: StopBehavior) -> Self {
        self.stop_behavior = behavior;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Result<Self, ClockError> {
        self.set_speed(speed)?;
        Ok(self)
    }

    /// Starts the simulator paused; the first [`start`](Self::start) releases it.
    pub fn paused(mut self) -> Self {
        self.running = false;
        self
    }

    #[inline]
    pub fn current_time(&self) -> NaiveDateTime {
        self.current
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop_times(&self) -> &[NaiveDateTime] {
        &self.stop_times
    }

    pub fn stop_behavior(&self) -> StopBehavior {
        self.stop_behavior
    }

    /// Advances simulated time by `elapsed × speed`, snapping to the first
    /// listed stop time crossed on the way.
    ///
    /// While paused the elapsed time is dropped and the current time returned.
    pub fn advance(&mut self, elapsed: Duration) -> NaiveDateTime {
        if !self.running {
            return self.current;
        }

        let delta = scale(elapsed, self.speed);
        let candidate = self.current.checked_add_signed(delta).unwrap_or(
            if delta >= ChronoDuration::zero() {
                NaiveDateTime::MAX
            } else {
                NaiveDateTime::MIN
            },
        );

        let current = self.current;
        match self
            .stop_times
            .iter()
            .copied()
            .find(|&stop| current < stop && stop <= candidate)
        {
            Some(stop) => {
                self.current = stop;
                if self.stop_behavior == StopBehavior::Hold {
                    self.running = false;
                }
                info!(stop = %stop, behavior = ?self.stop_behavior, "Reached stop time");
            }
            None => self.current = candidate,
        }
        self.current
    }

    /// Sets the speed multiplier. Zero freezes the clock; any finite value is accepted.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), ClockError> {
        if !speed.is_finite() {
            return Err(ClockError::InvalidSpeed(speed));
        }
        self.speed = speed;
        debug!(speed, "Speed multiplier set");
        Ok(())
    }

    /// Applies `steps` speed increments: each positive step multiplies by
    /// `ratio`, each negative step divides by it, so opposite steps cancel.
    pub fn step_speed(&mut self, steps: i32, ratio: f64) -> Result<(), ClockError> {
        let factor = ratio.powi(steps.unsigned_abs() as i32);
        let speed = if steps >= 0 {
            self.speed * factor
        } else {
            self.speed / factor
        };
        self.set_speed(speed)
    }

    /// Resumes a paused simulator. Returns whether the state changed.
    pub fn start(&mut self) -> bool {
        let changed = !self.running;
        self.running = true;
        if changed {
            info!(at = %self.current, "Simulation started");
        }
        changed
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn toggle_running(&mut self) -> bool {
        self.running = !self.running;
        debug!(running = self.running, "Simulation toggled");
        self.running
    }

    pub fn add_stop_time(&mut self, stop: NaiveDateTime) {
        self.stop_times.push(stop);
    }
}

/// Scales a real duration by a speed multiplier, saturating at the range of
/// [`chrono::Duration`] in nanoseconds.
fn scale(elapsed: Duration, speed: f64) -> ChronoDuration {
    let nanos = elapsed.as_nanos() as f64 * speed;
    ChronoDuration::nanoseconds(nanos.clamp(i64::MIN as f64, i64::MAX as f64) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn advances_by_scaled_delta() {
        let mut sim = TimeSimulator::new(at(10, 0, 0)).with_speed(2.5).unwrap();
        sim.advance(Duration::from_secs(4));
        assert_eq!(sim.current_time(), at(10, 0, 10));
    }

    #[test]
    fn snaps_to_stop_time_instead_of_overshooting() {
        let mut sim = TimeSimulator::new(at(12, 59, 57))
            .with_speed(1000.0)
            .unwrap()
            .with_stop_times([at(12, 59, 59)]);
        let now = sim.advance(Duration::from_millis(2));
        assert_eq!(now, at(12, 59, 59));

        let mut fast = TimeSimulator::new(at(12, 59, 57))
            .with_speed(1000.0)
            .unwrap()
            .with_stop_times([at(12, 59, 59)]);
        fast.advance(Duration::from_millis(500));
        assert_eq!(fast.current_time(), at(12, 59, 59));
    }

    #[test]
    fn hold_pauses_until_started() {
        let mut sim = TimeSimulator::new(at(12, 59, 57))
            .with_stop_times([at(12, 59, 59)]);
        sim.advance(Duration::from_secs(5));
        assert_eq!(sim.current_time(), at(12, 59, 59));
        assert!(!sim.is_running());

        sim.advance(Duration::from_secs(5));
        assert_eq!(sim.current_time(), at(12, 59, 59));

        assert!(sim.start());
        sim.advance(Duration::from_secs(1));
        assert_eq!(sim.current_time(), at(13, 0, 0));
    }

    #[test]
    fn pass_through_keeps_running_after_snap() {
        let mut sim = TimeSimulator::new(at(12, 59, 57))
            .with_stop_times([at(12, 59, 59)])
            .with_stop_behavior(StopBehavior::PassThrough);
        sim.advance(Duration::from_secs(5));
        assert_eq!(sim.current_time(), at(12, 59, 59));
        assert!(sim.is_running());

        // The stop time equals the current time now and does not fire again.
        sim.advance(Duration::from_secs(1));
        assert_eq!(sim.current_time(), at(13, 0, 0));
    }

    #[test]
    fn first_listed_stop_time_wins() {
        let mut sim = TimeSimulator::new(at(8, 0, 0))
            .with_stop_times([at(8, 0, 30), at(8, 0, 10)])
            .with_stop_behavior(StopBehavior::PassThrough);
        sim.advance(Duration::from_secs(60));
        assert_eq!(sim.current_time(), at(8, 0, 30));
    }

    #[test]
    fn stop_time_at_current_time_is_already_reached() {
        let mut sim = TimeSimulator::new(at(9, 0, 0)).with_stop_times([at(9, 0, 0)]);
        sim.advance(Duration::from_secs(1));
        assert_eq!(sim.current_time(), at(9, 0, 1));
        assert!(sim.is_running());
    }

    #[test]
    fn stop_time_exactly_at_candidate_is_reached() {
        let mut sim = TimeSimulator::new(at(9, 0, 0)).with_stop_times([at(9, 0, 2)]);
        sim.advance(Duration::from_secs(2));
        assert_eq!(sim.current_time(), at(9, 0, 2));
        assert!(!sim.is_running());
    }

    #[test]
    fn paused_simulator_drops_elapsed_time() {
        let mut sim = TimeSimulator::new(at(9, 0, 0)).paused();
        sim.advance(Duration::from_secs(30));
        assert_eq!(sim.current_time(), at(9, 0, 0));
        assert!(sim.start());
        assert!(!sim.start());
        sim.advance(Duration::from_secs(30));
        assert_eq!(sim.current_time(), at(9, 0, 30));
    }

    #[test]
    fn zero_speed_freezes() {
        let mut sim = TimeSimulator::new(at(9, 0, 0)).with_speed(0.0).unwrap();
        sim.advance(Duration::from_secs(3600));
        assert_eq!(sim.current_time(), at(9, 0, 0));
    }

    #[test]
    fn rejects_non_finite_speed() {
        let mut sim = TimeSimulator::new(at(9, 0, 0));
        assert_eq!(
            sim.set_speed(f64::NAN).unwrap_err().to_string(),
            "Speed multiplier must be a finite number, got NaN"
        );
        assert!(sim.set_speed(f64::INFINITY).is_err());
        assert_eq!(sim.speed(), 1.0);
    }

    #[test]
    fn toggle_flips_running_state() {
        let mut sim = TimeSimulator::new(at(9, 0, 0));
        assert!(!sim.toggle_running());
        assert!(sim.toggle_running());
    }

    #[test]
    fn huge_speed_saturates_instead_of_panicking() {
        let mut sim = TimeSimulator::new(at(9, 0, 0)).with_speed(1e300).unwrap();
        let now = sim.advance(Duration::from_secs(1));
        assert!(now > at(9, 0, 0));
    }

    proptest! {
        #[test]
        fn opposite_speed_steps_cancel(
            speed in 1e-6f64..1e6,
            steps in 1i32..20,
            ratio in 1.01f64..4.0,
        ) {
            let mut sim = TimeSimulator::new(at(0, 0, 0)).with_speed(speed).unwrap();
            sim.step_speed(steps, ratio).unwrap();
            sim.step_speed(-steps, ratio).unwrap();
            prop_assert!((sim.speed() - speed).abs() <= speed * 1e-9);
        }

        #[test]
        fn never_passes_a_stop_time(offset in 1u32..3600, elapsed_ms in 0u64..10_000_000) {
            let start = at(0, 0, 0);
            let stop = start + ChronoDuration::seconds(offset as i64);
            let mut sim = TimeSimulator::new(start).with_stop_times([stop]);
            let now = sim.advance(Duration::from_millis(elapsed_ms));
            prop_assert!(now <= stop);
        }
    }
}
