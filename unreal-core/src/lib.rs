//! # unreal-core
//!
//! Foundation layer of the unreal-time clock: the simulated clock state
//! machine, the fixed-alphabet time formatter and the glyph layout fitter.
//! Nothing in here touches a terminal, a socket or the wall clock except
//! through [`time::real_now`].
//!
//! ### Key Submodules:
//! - `simulator`: `TimeSimulator` advancing simulated time by scaled real deltas
//! - `format`: `format_time` producing the `0-9 : . ' '` character sequence
//! - `layout`: `LayoutFitter` bisecting the largest point size that fits
//! - `command`: thread-safe hand-off of control commands into the frame loop
//! - `snapshot`: latest published clock state for out-of-loop readers

pub mod color;
pub mod command;
pub mod error;
pub mod format;
pub mod layout;
pub mod simulator;
pub mod snapshot;
pub mod time;

pub mod prelude {
    pub use crate::color::Color;
    pub use crate::command::{CommandQueue, ControlCommand};
    pub use crate::error::ClockError;
    pub use crate::format::{format_time, FormatOptions, FormattedTime};
    pub use crate::layout::{
        AxisOffset, ColonOffset, Footprint, GlyphMetrics, LayoutError, LayoutFitter,
        LayoutMetrics, LayoutRequest,
    };
    pub use crate::simulator::{StopBehavior, TimeSimulator};
    pub use crate::snapshot::{ClockSnapshot, SnapshotCell};
    pub use crate::time::{real_now, ClockTime};
}

pub use color::Color;
pub use error::ClockError;
pub use simulator::{StopBehavior, TimeSimulator};
pub use time::ClockTime;
