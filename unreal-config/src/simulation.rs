//! Startup state of the simulated clock.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use unreal_core::simulator::{StopBehavior, TimeSimulator};
use unreal_core::{ClockError, ClockTime};

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Simulated start time; `None` starts at the wall-clock time.
    #[serde(default)]
    pub start: Option<ClockTime>,

    #[serde(default)]
    pub stop_times: Vec<ClockTime>,

    #[serde(default = "default_speed")]
    #[validate(custom(function = validation::validate_finite))]
    pub speed: f64,

    /// Factor applied per speed step; must exceed 1 so steps are invertible.
    #[serde(default = "default_speed_ratio")]
    #[validate(range(exclusive_min = 1.0, max = 1000.0))]
    pub speed_ratio: f64,

    #[serde(default)]
    pub start_paused: bool,

    #[serde(default)]
    pub stop_behavior: StopBehavior,
}

fn default_speed() -> f64 {
    1.0
}

fn default_speed_ratio() -> f64 {
    1.1
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start: None,
            stop_times: Vec::new(),
            speed: default_speed(),
            speed_ratio: default_speed_ratio(),
            start_paused: false,
            stop_behavior: StopBehavior::default(),
        }
    }
}

impl SimulationConfig {
    /// Builds the simulator, pinning times of day to the date of `now`.
    pub fn simulator(&self, now: NaiveDateTime) -> Result<TimeSimulator, ClockError> {
        let date = now.date();
        let start = self.start.map(|t| t.on(date)).unwrap_or(now);
        let simulator = TimeSimulator::new(start)
            .with_speed(self.speed)?
            .with_stop_times(self.stop_times.iter().map(|t| t.on(date)))
            .with_stop_behavior(self.stop_behavior);
        Ok(if self.start_paused {
            simulator.paused()
        } else {
            simulator
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 17)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    #[test]
    fn pins_times_of_day_to_today() {
        let config = SimulationConfig {
            start: Some("12:59:57".parse().unwrap()),
            stop_times: vec![
                "12:59:59".parse().unwrap(),
                "2030-01-01T00:00:00".parse().unwrap(),
            ],
            ..Default::default()
        };
        let sim = config.simulator(now()).unwrap();
        let day = now().date();
        assert_eq!(sim.current_time(), day.and_hms_opt(12, 59, 57).unwrap());
        assert_eq!(sim.stop_times()[0], day.and_hms_opt(12, 59, 59).unwrap());
        assert_eq!(
            sim.stop_times()[1],
            NaiveDate::from_ymd_opt(2030, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert!(sim.is_running());
    }

    #[test]
    fn missing_start_uses_now() {
        let config = SimulationConfig {
            start_paused: true,
            ..Default::default()
        };
        let sim = config.simulator(now()).unwrap();
        assert_eq!(sim.current_time(), now());
        assert!(!sim.is_running());
    }

    #[test]
    fn speed_ratio_must_exceed_one() {
        let config = SimulationConfig {
            speed_ratio: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        SimulationConfig::default().validate().unwrap();
    }
}
