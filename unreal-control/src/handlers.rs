use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Json,
};
use tracing::{debug, error, info, warn};

use unreal_core::command::ControlCommand;
use unreal_core::snapshot::ClockSnapshot;

use crate::router::ControlState;

/// GET /state
pub async fn state(
    State(state): State<Arc<ControlState>>,
) -> Result<Json<ClockSnapshot>, StatusCode> {
    state
        .snapshots
        .latest()
        .map(Json)
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)
}

/// GET /metrics
pub async fn metrics(State(state): State<Arc<ControlState>>) -> Response {
    match state.metrics.gather_metrics() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            error!(%err, "Failed to gather metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// POST to any path
pub async fn post_command(
    State(state): State<Arc<ControlState>>,
    uri: Uri,
    body: Bytes,
) -> StatusCode {
    accept_command(&state, uri.path(), &body)
}

/// Anything no route matched.
pub async fn fallback(
    State(state): State<Arc<ControlState>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    match method {
        Method::POST => accept_command(&state, uri.path(), &body).into_response(),
        Method::GET | Method::HEAD => not_found(&state.title, uri.path()).into_response(),
        _ => not_implemented(method, uri).await.into_response(),
    }
}

/// Methods a known route does not serve.
pub async fn not_implemented(method: Method, uri: Uri) -> StatusCode {
    debug!(%method, path = uri.path(), "Unsupported method");
    StatusCode::NOT_IMPLEMENTED
}

/// Logs the request and queues the command it names, if any. The reply is
/// always 204 so clients never depend on the clock's state.
fn accept_command(state: &ControlState, path: &str, body: &[u8]) -> StatusCode {
    let text = String::from_utf8_lossy(body);
    info!("POST \"{path}\" [{}] \"{text}\"", body.len());

    match ControlCommand::parse(path, &text) {
        Ok(Some(command)) => {
            if state.commands.push(command).is_ok() {
                debug!(path, "Control command queued");
            }
        }
        Ok(None) => debug!(path, "No command at this path"),
        Err(err) => warn!(%err, path, "Malformed control command"),
    }
    StatusCode::NO_CONTENT
}

fn not_found(title: &str, path: &str) -> (StatusCode, Html<String>) {
    let page = format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body>\n\
         <h1>404 Not Found</h1>\n\
         <p>This is not the page You are looking for.</p>\n\
         <p>\"{path}\"</p>\n\
         </body>\n\
         </html>\n",
        title = escape_html(title),
        path = escape_html(path),
    );
    (StatusCode::NOT_FOUND, Html(page))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
