//! # unreal-engine
//!
//! Single-threaded frame loop of the unreal-time clock.
//!
//! ### Key Submodules:
//! - `controller`: `FrameController` applying commands, input and layout per frame
//! - `frame_clock`: real frame deltas and the FPS average
//! - `runtime`: `run_clock`, the paced loop with shutdown handling

pub mod controller;
pub mod error;
pub mod frame_clock;
pub mod runtime;

pub use controller::{Flow, FrameController, LayoutState};
pub use error::EngineError;
pub use frame_clock::FrameClock;
pub use runtime::run_clock;
