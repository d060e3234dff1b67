//! # unreal-control
//!
//! Optional HTTP control channel. It serves static assets, the latest clock
//! snapshot and Prometheus metrics, and turns POST requests into
//! [`ControlCommand`](unreal_core::command::ControlCommand)s for the frame
//! loop. It never touches simulator state directly.
//!
//! ### Key Submodules:
//! - `router`: axum routes and the shared `ControlState`
//! - `handlers`: request handlers, including the 404 page
//! - `server`: `ControlServer` with run/stop lifecycle on a background thread
//! - `tls`: rustls configuration from PEM files

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod tls;

pub use error::ControlError;
pub use router::{control_router, ControlState};
pub use server::ControlServer;
