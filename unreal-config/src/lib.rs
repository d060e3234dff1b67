//! # Unreal Configuration System
//!
//! Startup options for the unreal-time clock, loaded in layers and validated
//! before the terminal is touched. Only options live here; the clock state
//! itself (simulated time, speed) is never written back to disk.
//!
//! ## Layers (lowest to highest)
//! 1. Built-in defaults
//! 2. `config/unreal.yaml`
//! 3. `config/<UNREAL_ENV>.yaml`
//! 4. `UNREAL_*` environment variables, `__` separating sections
//! 5. Command-line flags, applied by the binary on top of the loaded value

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

mod control;
mod display;
mod error;
mod logging;
mod simulation;
mod validation;

pub use control::{AssetRoute, ControlConfig, TlsConfig, RESERVED_ROUTES};
pub use display::{DisplayOptions, FontSelection, WindowConfig};
pub use error::ConfigError;
pub use logging::LoggingConfig;
pub use simulation::SimulationConfig;

const BASE_FILE: &str = "config/unreal.yaml";
const ENV_PREFIX: &str = "UNREAL_";

/// Top-level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone, PartialEq)]
pub struct ClockConfig {
    #[serde(default)]
    #[validate(nested)]
    pub display: DisplayOptions,

    #[serde(default)]
    #[validate(nested)]
    pub window: WindowConfig,

    #[serde(default)]
    #[validate(nested)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    #[validate(nested)]
    pub control: ControlConfig,

    #[serde(default)]
    #[validate(nested)]
    pub logging: LoggingConfig,
}

impl ClockConfig {
    /// Load configuration from the default files and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(ClockConfig::default()));

        if Path::new(BASE_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_FILE));
        } else {
            debug!("{BASE_FILE} not found, using default configuration");
        }

        let env = std::env::var("UNREAL_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{env}.yaml");
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::extract(figment)
    }

    /// Load configuration from one explicit file, still honoring the environment.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        let figment =
            Figment::from(Serialized::defaults(ClockConfig::default())).merge(Yaml::file(path));
        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["env"]).split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use unreal_core::layout::AxisOffset;
    use unreal_core::simulator::StopBehavior;
    use unreal_core::Color;

    #[test]
    fn full_config_validation() {
        let config = ClockConfig::default();
        config.validate().expect("Default config should validate");
    }

    #[test]
    fn layers_files_then_environment() {
        Jail::expect_with(|jail| {
            std::fs::create_dir_all("config").map_err(|e| e.to_string())?;
            jail.create_file(
                "config/unreal.yaml",
                r#"
display:
  subseconds: 2
  color: grey
  colon_offset:
    x: 3
    y: 0.25
simulation:
  start: "12:59:57"
  stop_times: ["12:59:59"]
  stop_behavior: pass_through
control:
  assets:
    - path: ""
      file: control.html
"#,
            )?;
            jail.create_file("config/staging.yaml", "window:\n  max_fps: 30\n")?;
            jail.set_env("UNREAL_ENV", "staging");
            jail.set_env("UNREAL_DISPLAY__HALFDAY", "true");

            let config = ClockConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.display.subseconds, 2);
            assert!(config.display.halfday);
            assert_eq!(config.display.color, Color::rgb(190, 190, 190));
            assert_eq!(config.display.colon_offset.x, AxisOffset::Absolute(3));
            assert_eq!(config.display.colon_offset.y, AxisOffset::Relative(0.25));
            assert_eq!(config.window.max_fps, 30);
            assert_eq!(config.simulation.stop_times.len(), 1);
            assert_eq!(config.simulation.stop_behavior, StopBehavior::PassThrough);
            assert_eq!(config.control.assets[0].route_path(), "/");
            Ok(())
        });
    }

    #[test]
    fn environment_override() {
        Jail::expect_with(|jail| {
            jail.set_env("UNREAL_CONTROL__QUEUE_CAPACITY", "8192");
            let config = ClockConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.control.queue_capacity, 8192);
            Ok(())
        });
    }

    #[test]
    fn invalid_values_fail_validation() {
        Jail::expect_with(|jail| {
            jail.create_file("clock.yaml", "display:\n  subseconds: 9\n")?;
            let err = ClockConfig::load_from_path("clock.yaml").unwrap_err();
            assert!(matches!(err, ConfigError::Validation(_)));
            assert!(err.to_string().contains("display.subseconds"));
            Ok(())
        });
    }

    #[test]
    fn malformed_time_is_a_parse_error() {
        Jail::expect_with(|jail| {
            jail.create_file("clock.yaml", "simulation:\n  start: noon\n")?;
            let err = ClockConfig::load_from_path("clock.yaml").unwrap_err();
            assert!(matches!(err, ConfigError::Parsing(_)));
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_file_is_reported() {
        let err = ClockConfig::load_from_path("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
