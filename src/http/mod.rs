//! HTTP status mirror.
//!
//! Collaborators that poll synchronously (editors, dashboards, test
//! harnesses) read the same [`StatusStore`] the MCP tools read, over plain
//! GET endpoints. A status body served here is byte-identical to the text
//! payload of the corresponding status tool at the same instant because
//! both serialise the same snapshot type through the same function.
//!
//! Every response, including 404s, carries permissive CORS headers so
//! browser-hosted dashboards can poll directly.

use std::io;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use crate::config::OperationConfig;
use crate::editor::coordinator::{OperationCoordinator, OperationReply};
use crate::editor::ops::{FilterCombine, TestMode, TestRunSpec};
use crate::editor::status::StatusStore;
use crate::mcp::truncate::TruncationSettings;

/// Shared state for the mirror handlers.
#[derive(Clone)]
pub struct MirrorState {
    status: Arc<StatusStore>,
    coordinator: Arc<OperationCoordinator>,
    settings: TruncationSettings,
    operation: OperationConfig,
    combine: FilterCombine,
}

impl MirrorState {
    /// Creates mirror state over the given coordinator.
    #[must_use]
    pub fn new(
        coordinator: Arc<OperationCoordinator>,
        settings: TruncationSettings,
        operation: OperationConfig,
        combine: FilterCombine,
    ) -> Self {
        Self {
            status: Arc::clone(coordinator.status()),
            coordinator,
            settings,
            operation,
            combine,
        }
    }
}

/// Builds the mirror router.
#[must_use]
pub fn router(state: MirrorState) -> Router {
    Router::new()
        .route("/compile-status", get(compile_status))
        .route("/test-status", get(test_status))
        .route("/editor-status", get(editor_status))
        .route("/mcp-settings", get(mcp_settings))
        .route("/compile-and-wait", get(compile_and_wait))
        .route("/run-tests", get(run_tests))
        .fallback(not_found)
        .with_state(state)
}

/// Binds and serves the mirror until the process exits.
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server fails.
pub async fn serve(state: MirrorState, port: u16) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tracing::info!(port, "HTTP status mirror listening");
    axum::serve(listener, router(state)).await
}

/// Wraps a JSON body with the fixed content-type and CORS headers.
fn json_response(status: StatusCode, body: String) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
        body,
    )
        .into_response()
}

async fn compile_status(State(state): State<MirrorState>) -> Response {
    json_response(StatusCode::OK, state.status.compile_snapshot().to_json_text())
}

async fn test_status(State(state): State<MirrorState>) -> Response {
    json_response(StatusCode::OK, state.status.test_snapshot().to_json_text())
}

async fn editor_status(State(state): State<MirrorState>) -> Response {
    json_response(StatusCode::OK, state.status.editor_snapshot().to_json_text())
}

async fn mcp_settings(State(state): State<MirrorState>) -> Response {
    // TruncationSettings serialisation cannot fail (strings and numbers).
    json_response(
        StatusCode::OK,
        serde_json::to_string(&state.settings).unwrap(),
    )
}

/// Drives a compile through the coordinator and waits for the outcome.
async fn compile_and_wait(State(state): State<MirrorState>) -> Response {
    let timeout = state.operation.default_compile_timeout_secs;
    match state.coordinator.compile_and_wait(timeout).await {
        OperationReply::Completed(outcome) => json_response(
            StatusCode::OK,
            json!({
                "success": outcome.success,
                "errors": outcome.errors,
            })
            .to_string(),
        ),
        OperationReply::Warned(message) => json_response(
            StatusCode::OK,
            json!({ "status": "warning", "message": message }).to_string(),
        ),
        OperationReply::TimedOut(message) => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": message }).to_string(),
        ),
        OperationReply::Failed(e) => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": e.to_string() }).to_string(),
        ),
    }
}

#[derive(Debug, Deserialize)]
struct RunTestsQuery {
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    filter: Option<String>,
    #[serde(default, rename = "filterRegex")]
    filter_regex: Option<String>,
}

/// Starts a test run in the background; callers poll `/test-status`.
async fn run_tests(
    State(state): State<MirrorState>,
    Query(query): Query<RunTestsQuery>,
) -> Response {
    let spec = TestRunSpec {
        mode: TestMode::parse_lenient(query.mode.as_deref().unwrap_or("")),
        filter: query.filter.unwrap_or_default(),
        filter_regex: query.filter_regex.unwrap_or_default(),
        combine: state.combine,
    };

    match state.coordinator.start_tests(spec) {
        Ok(run_id) => json_response(
            StatusCode::OK,
            json!({ "status": "started", "testRunId": run_id }).to_string(),
        ),
        Err(warning) => json_response(
            StatusCode::OK,
            json!({ "status": "warning", "message": warning }).to_string(),
        ),
    }
}

async fn not_found() -> Response {
    json_response(
        StatusCode::NOT_FOUND,
        json!({ "error": "not found" }).to_string(),
    )
}
