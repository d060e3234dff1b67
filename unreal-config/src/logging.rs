use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

/// Log destination and verbosity. `RUST_LOG` overrides `level` when set.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    #[validate(custom(function = validation::validate_level))]
    pub level: String,

    /// The terminal is drawn on, so logs go here when set. Without a file they
    /// go to stderr only when it is not that terminal.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}
