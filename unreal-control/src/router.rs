use std::sync::Arc;

use axum::{
    routing::{get, get_service},
    Router,
};
use tower_http::{services::ServeFile, trace::TraceLayer};
use tracing::debug;

use unreal_config::ControlConfig;
use unreal_core::command::CommandQueue;
use unreal_core::snapshot::SnapshotCell;
use unreal_telemetry::MetricsRecorder;

use crate::handlers;

/// What request handlers share with the frame loop.
pub struct ControlState {
    pub title: String,
    pub commands: CommandQueue,
    pub snapshots: SnapshotCell,
    pub metrics: MetricsRecorder,
}

impl ControlState {
    pub fn new(
        title: impl Into<String>,
        commands: CommandQueue,
        snapshots: SnapshotCell,
        metrics: MetricsRecorder,
    ) -> Self {
        ControlState {
            title: title.into(),
            commands,
            snapshots,
            metrics,
        }
    }
}

/// Create the control channel router
///
/// Asset paths must be unique and must not shadow `/state` or `/metrics`;
/// a validated [`ControlConfig`] guarantees both.
pub fn control_router(config: &ControlConfig, state: Arc<ControlState>) -> Router {
    let mut router = Router::new()
        .route(
            "/state",
            get(handlers::state)
                .post(handlers::post_command)
                .fallback(handlers::not_implemented),
        )
        .route(
            "/metrics",
            get(handlers::metrics)
                .post(handlers::post_command)
                .fallback(handlers::not_implemented),
        );

    for asset in &config.assets {
        debug!(%asset, "Serving asset");
        router = router.route(
            &asset.route_path(),
            get_service(ServeFile::new(&asset.file))
                .post(handlers::post_command)
                .fallback(handlers::not_implemented),
        );
    }

    router
        .fallback(handlers::fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
