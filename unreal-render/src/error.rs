use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum FontError {
    #[error("Cannot read font file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed font file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Font height must be between 1 and {max}, got {height}")]
    InvalidHeight { height: u32, max: u32 },

    #[error("Font {field} must be at most {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },

    #[error("Glyph key '{0}' is not a single character")]
    InvalidKey(String),

    #[error("Glyph '{glyph}' is malformed: {reason}")]
    InvalidGlyph { glyph: char, reason: String },

    #[error("Font lacks required glyph '{0}'")]
    MissingGlyph(char),
}
