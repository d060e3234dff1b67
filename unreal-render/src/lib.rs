//! # unreal-render
//!
//! The rendering boundary between the frame loop and a display.
//!
//! ### Key Submodules:
//! - `surface`: `Surface`/`Backend` traits and translated `InputEvent`s
//! - `font`: scalable `BitmapFont`s, built-in or loaded from YAML
//! - `canvas`: pixel buffer drawing shared by every backend
//! - `terminal`: crossterm backend drawing half-block pixels

pub mod canvas;
pub mod error;
pub mod font;
pub mod surface;
pub mod terminal;

pub use canvas::{Canvas, CanvasSurface};
pub use error::{FontError, RenderError};
pub use font::{BitmapFont, FontStyle};
pub use surface::{Backend, InputEvent, Point, Surface, WindowMode};
pub use terminal::TerminalBackend;
