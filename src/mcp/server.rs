//! MCP server implementation for editor automation.
//!
//! Two layers live here:
//!
//! 1. [`ToolDispatcher`] — transport-free request handling: the fixed tool
//!    catalog, argument validation, operation dispatch and result
//!    formatting. Integration tests drive it in-process.
//! 2. [`McpServer`] — the stdio loop: reads one frame per line, spawns one
//!    task per request so status tools answer while a long operation is in
//!    flight, and shuts down on EOF or a termination signal.
//!
//! # Lifecycle
//!
//! `initialize` is idempotent and nothing is gated on the
//! `notifications/initialized` notification: observed clients initialise
//! more than once per session and never send the notification, so a
//! strict lifecycle would reject every one of them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::{Config, OperationConfig};
use crate::editor::coordinator::{OperationCoordinator, OperationReply};
use crate::editor::ops::{CompileOutcome, FilterCombine, TestMode, TestRunOutcome, TestRunSpec};
use crate::editor::status::StatusStore;
use crate::mcp::protocol::{
    parse_message, IncomingMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION,
};
use crate::mcp::transport::{FrameReader, MessageWriter};
use crate::mcp::truncate::ResponseTruncator;

/// A tool definition for the tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires fn(&T) -> bool
const fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }
}

/// Outcome of a tool invocation before it is wrapped in a JSON-RPC frame.
enum ToolReply {
    /// A content-block result (success, domain failure or warning).
    Result(ToolCallResult),
    /// A protocol-level failure (timeout, host error).
    InternalError(String),
}

/// Transport-free MCP request handling.
#[derive(Clone)]
pub struct ToolDispatcher {
    status: Arc<StatusStore>,
    coordinator: Arc<OperationCoordinator>,
    truncator: ResponseTruncator,
    operation: OperationConfig,
    combine: FilterCombine,
}

impl ToolDispatcher {
    /// Creates a dispatcher over the given coordinator.
    #[must_use]
    pub fn new(coordinator: Arc<OperationCoordinator>, config: &Config) -> Self {
        Self {
            status: Arc::clone(coordinator.status()),
            coordinator,
            truncator: ResponseTruncator::new(&config.response),
            operation: config.operation.clone(),
            combine: FilterCombine::parse(&config.filters.combine),
        }
    }

    /// The truncator in effect (its settings are mirrored over HTTP).
    #[must_use]
    pub fn truncator(&self) -> &ResponseTruncator {
        &self.truncator
    }

    /// Handles one request and produces exactly one response frame.
    pub async fn dispatch(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let method = req.method.clone();
        match method.as_str() {
            "initialize" => Self::handle_initialize(&req),
            "tools/list" => Self::handle_tools_list(&req),
            "tools/call" => self.handle_tools_call(req).await,
            "ping" => JsonRpcResponse::success(req.id, json!({})),
            _ => JsonRpcResponse::method_not_found(req.id, &method),
        }
    }

    /// Handles an incoming notification. Nothing is gated on lifecycle
    /// notifications; they are only logged.
    pub fn handle_notification(notif: &JsonRpcNotification) {
        tracing::debug!(method = %notif.method, "notification received");
    }

    fn handle_initialize(req: &JsonRpcRequest) -> JsonRpcResponse {
        let has_protocol_version = req
            .params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .is_some_and(|v| !v.is_null());

        if !has_protocol_version {
            return JsonRpcResponse::invalid_params(req.id.clone(), "protocolVersion is required");
        }

        tracing::info!("client initialised");

        JsonRpcResponse::success(
            req.id.clone(),
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": tool_names(),
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": SERVER_VERSION,
                },
            }),
        )
    }

    fn handle_tools_list(req: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(
            req.id.clone(),
            json!({
                "tools": tool_definitions(),
            }),
        )
    }

    async fn handle_tools_call(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let params: ToolCallParams = match req
            .params
            .as_ref()
            .map(|p| serde_json::from_value(p.clone()))
            .transpose()
        {
            Ok(Some(params)) => params,
            Ok(None) => {
                return JsonRpcResponse::invalid_params(req.id, "Missing tool call params");
            }
            Err(e) => {
                return JsonRpcResponse::invalid_params(
                    req.id,
                    format!("Invalid tool call params: {e}"),
                );
            }
        };

        let args = &params.arguments;
        let reply = match params.name.as_str() {
            "compile_and_wait" => self.call_compile_and_wait(args).await,
            "run_tests" => self.call_run_tests(args).await,
            "refresh_assets" => self.call_refresh_assets(args).await,
            "editor_status" => ToolReply::Result(ToolCallResult::text(
                self.status.editor_snapshot().to_json_text(),
            )),
            "compile_status" => ToolReply::Result(ToolCallResult::text(
                self.status.compile_snapshot().to_json_text(),
            )),
            "test_status" => ToolReply::Result(ToolCallResult::text(
                self.status.test_snapshot().to_json_text(),
            )),
            "tests_cancel" => self.call_tests_cancel(args).await,
            _ => ToolReply::Result(ToolCallResult::error(format!(
                "Unknown tool: {}",
                params.name
            ))),
        };

        match reply {
            ToolReply::Result(result) => {
                // Serialisation of a text-only content block cannot fail.
                JsonRpcResponse::success(req.id, serde_json::to_value(&result).unwrap())
            }
            ToolReply::InternalError(message) => {
                JsonRpcResponse::internal_error(req.id, message)
            }
        }
    }

    async fn call_compile_and_wait(&self, args: &Value) -> ToolReply {
        let timeout = args
            .get("timeout")
            .and_then(Value::as_i64)
            .unwrap_or(self.operation.default_compile_timeout_secs);

        match self.coordinator.compile_and_wait(timeout).await {
            OperationReply::Completed(outcome) => ToolReply::Result(ToolCallResult::text(
                self.truncator.apply(format_compile_result(&outcome)),
            )),
            OperationReply::Warned(message) => ToolReply::Result(ToolCallResult::text(message)),
            OperationReply::TimedOut(message) => ToolReply::InternalError(message),
            OperationReply::Failed(e) => ToolReply::InternalError(e.to_string()),
        }
    }

    async fn call_run_tests(&self, args: &Value) -> ToolReply {
        let mode = TestMode::parse_lenient(
            args.get("test_mode").and_then(Value::as_str).unwrap_or(""),
        );
        let filter = args
            .get("test_filter")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let filter_regex = args
            .get("test_filter_regex")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let timeout = args
            .get("timeout")
            .and_then(Value::as_i64)
            .unwrap_or(self.operation.default_test_timeout_secs);

        if !filter_regex.is_empty() {
            if let Err(e) = regex::Regex::new(&filter_regex) {
                return ToolReply::Result(ToolCallResult::error(format!(
                    "Invalid test_filter_regex: {e}"
                )));
            }
        }

        let spec = TestRunSpec {
            mode,
            filter,
            filter_regex,
            combine: self.combine,
        };

        match self.coordinator.run_tests(spec, timeout).await {
            OperationReply::Completed(outcome) => ToolReply::Result(ToolCallResult::text(
                self.truncator.apply(format_test_results(&outcome)),
            )),
            OperationReply::Warned(message) => ToolReply::Result(ToolCallResult::text(message)),
            OperationReply::TimedOut(message) => ToolReply::InternalError(message),
            OperationReply::Failed(e) => ToolReply::InternalError(e.to_string()),
        }
    }

    async fn call_refresh_assets(&self, args: &Value) -> ToolReply {
        let force = args.get("force").and_then(Value::as_bool).unwrap_or(false);

        match self
            .coordinator
            .refresh_assets(force, self.operation.refresh_timeout_secs)
            .await
        {
            OperationReply::Completed(text) => {
                ToolReply::Result(ToolCallResult::text(self.truncator.apply(text)))
            }
            OperationReply::Warned(message) => ToolReply::Result(ToolCallResult::text(message)),
            OperationReply::TimedOut(message) => ToolReply::InternalError(message),
            OperationReply::Failed(e) => ToolReply::InternalError(e.to_string()),
        }
    }

    async fn call_tests_cancel(&self, args: &Value) -> ToolReply {
        let guid = args.get("test_run_guid").and_then(Value::as_str);

        let reply = self.coordinator.cancel_tests(guid).await;
        let body = json!({
            "status": reply.status,
            "message": reply.message,
        });
        ToolReply::Result(ToolCallResult::text(body.to_string()))
    }
}

/// Renders a compile outcome in the fixed caller-visible format.
fn format_compile_result(outcome: &CompileOutcome) -> String {
    if outcome.success {
        return "Compilation completed successfully with no errors.".to_string();
    }

    let mut text = String::from("Compilation completed with errors:");
    for error in &outcome.errors {
        text.push('\n');
        text.push_str(&format!("{}:{}: {}", error.file, error.line, error.message));
    }
    text
}

/// Renders a test run outcome in the fixed caller-visible format.
///
/// The header and summary counts always come first so they survive
/// response truncation.
fn format_test_results(outcome: &TestRunOutcome) -> String {
    let mut text = format!(
        "Test Results:\nTotal: {}\nPassed: {}\nFailed: {}\nSkipped: {}\nDuration: {:.2}s",
        outcome.total, outcome.passed, outcome.failed, outcome.skipped, outcome.duration_seconds
    );

    let failures: Vec<_> = outcome.failures().collect();
    if !failures.is_empty() {
        text.push_str("\n\nFailed Tests:");
        for failure in failures {
            text.push_str(&format!("\n  {}: {}", failure.full_name, failure.message));
        }
    }

    text
}

/// Names of all tools, in catalog order (used by initialize capabilities).
#[must_use]
pub fn tool_names() -> Vec<&'static str> {
    tool_definitions().iter().map(|t| t.name).collect()
}

/// Returns the fixed tool catalog.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "compile_and_wait",
            description: "Trigger a script compilation in the Unity editor and wait for it to \
                          finish. Returns compiler errors when the compilation fails.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "timeout": {
                        "type": "integer",
                        "description": "Maximum seconds to wait for compilation to finish (default: 30)"
                    }
                },
                "required": []
            }),
        },
        ToolDefinition {
            name: "run_tests",
            description: "Run Unity tests and wait for the results. Supports EditMode and \
                          PlayMode tests with optional name and regex filtering.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "test_mode": {
                        "type": "string",
                        "enum": ["EditMode", "PlayMode"],
                        "description": "Test mode to run (default: PlayMode)"
                    },
                    "test_filter": {
                        "type": "string",
                        "description": "Fully qualified test or fixture names; separate alternatives with '|'"
                    },
                    "test_filter_regex": {
                        "type": "string",
                        "description": "Regular expression over fully qualified test names"
                    },
                    "timeout": {
                        "type": "integer",
                        "description": "Maximum seconds to wait for the test run to finish (default: 60)"
                    }
                },
                "required": []
            }),
        },
        ToolDefinition {
            name: "refresh_assets",
            description: "Refresh the Unity asset database, importing changed assets and \
                          recompiling scripts when needed. Set force to use \
                          ImportAssetOptions.ForceUpdate, recommended after file deletions.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "force": {
                        "type": "boolean",
                        "description": "Force a full reimport (default: false)"
                    }
                },
                "required": []
            }),
        },
        ToolDefinition {
            name: "editor_status",
            description: "Get the Unity editor status: compilation, test execution and play mode.",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolDefinition {
            name: "compile_status",
            description: "Get the current compilation status without triggering compilation.",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolDefinition {
            name: "test_status",
            description: "Get the current test execution status without running tests.",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolDefinition {
            name: "tests_cancel",
            description: "Request cancellation of the test run in progress via \
                          TestRunnerApi.CancelTestRun. Cancellation is cooperative: EditMode \
                          runs cannot be reliably interrupted mid-flight, only PlayMode runs \
                          can. Callers should poll test_status to observe completion.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "test_run_guid": {
                        "type": "string",
                        "description": "GUID of the run to cancel; empty cancels the current run"
                    }
                },
                "required": []
            }),
        },
    ]
}

/// The stdio MCP server loop.
pub struct McpServer {
    reader: FrameReader,
    writer: MessageWriter,
    dispatcher: ToolDispatcher,
}

impl McpServer {
    /// Creates a server over process stdio.
    #[must_use]
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        let (writer, _drain_task) = MessageWriter::stdout();
        Self {
            reader: FrameReader::new(),
            writer,
            dispatcher,
        }
    }

    /// Runs the MCP server main loop with graceful shutdown handling.
    ///
    /// Returns when stdin reaches EOF or a termination signal arrives.
    /// In-flight operations are detached; process exit tears them down.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> std::io::Result<()> {
        self.run_with_shutdown().await
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(unix)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(std::io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(std::io::Error::other)?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    return Ok(());
                }

                line_result = self.reader.read_line() => {
                    if self.handle_transport_result(line_result)? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(windows)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                    return Ok(());
                }

                line_result = self.reader.read_line() => {
                    if self.handle_transport_result(line_result)? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    fn handle_transport_result(
        &self,
        line_result: std::io::Result<Option<String>>,
    ) -> std::io::Result<bool> {
        let Some(line) = line_result? else {
            tracing::info!("stdin closed, shutting down");
            return Ok(true);
        };

        if line.trim().is_empty() {
            return Ok(false);
        }

        self.handle_line(&line)?;
        Ok(false)
    }

    /// Parses one line and dispatches it on its own task.
    fn handle_line(&self, line: &str) -> std::io::Result<()> {
        match parse_message(line) {
            Ok(IncomingMessage::Request(req)) => {
                let dispatcher = self.dispatcher.clone();
                let writer = self.writer.clone();
                tokio::spawn(async move {
                    let response = dispatcher.dispatch(req).await;
                    if let Err(e) = writer.write_response(&response) {
                        tracing::error!(error = %e, "failed to queue response frame");
                    }
                });
                Ok(())
            }
            Ok(IncomingMessage::Notification(notif)) => {
                ToolDispatcher::handle_notification(&notif);
                Ok(())
            }
            Err(error_frame) => self.writer.write_response(&error_frame),
        }
    }
}
