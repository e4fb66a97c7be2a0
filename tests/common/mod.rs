//! Shared test fixtures: a scripted stand-in for the editor host.
#![allow(dead_code)] // each test binary uses a different subset

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use yamu_mcp::config::Config;
use yamu_mcp::editor::coordinator::OperationCoordinator;
use yamu_mcp::editor::executor::EditorExecutor;
use yamu_mcp::editor::ops::{
    CompileOutcome, FilterCombine, TestCaseResult, TestRunOutcome, TestRunSpec,
};
use yamu_mcp::editor::status::StatusStore;
use yamu_mcp::error::EditorError;
use yamu_mcp::mcp::protocol::{JsonRpcRequest, JsonRpcResponse, RequestId};
use yamu_mcp::mcp::server::ToolDispatcher;

/// One test the scripted host "knows about".
#[derive(Debug, Clone)]
pub struct ScriptedTest {
    pub full_name: String,
    pub passes: bool,
    pub message: String,
}

impl ScriptedTest {
    pub fn passing(full_name: &str) -> Self {
        Self {
            full_name: full_name.to_string(),
            passes: true,
            message: String::new(),
        }
    }

    pub fn failing(full_name: &str, message: &str) -> Self {
        Self {
            full_name: full_name.to_string(),
            passes: false,
            message: message.to_string(),
        }
    }
}

/// Scripted editor host: every operation sleeps `op_delay` then returns
/// the configured outcome. Test selection implements the same exact-name
/// (`|`-separated) and regex filter semantics the real runner applies.
pub struct ScriptedEditor {
    pub op_delay: Duration,
    pub refresh_text: String,
    pub compile_outcome: Mutex<CompileOutcome>,
    pub catalog: Vec<ScriptedTest>,
    pub playing: AtomicBool,
    pub cancel_requests: Mutex<Vec<String>>,
}

impl Default for ScriptedEditor {
    fn default() -> Self {
        Self {
            op_delay: Duration::from_millis(20),
            refresh_text: "Asset database refreshed.".to_string(),
            compile_outcome: Mutex::new(CompileOutcome {
                success: true,
                errors: Vec::new(),
            }),
            catalog: default_catalog(),
            playing: AtomicBool::new(false),
            cancel_requests: Mutex::new(Vec::new()),
        }
    }
}

/// The test suite of the sample project the scripted host emulates.
pub fn default_catalog() -> Vec<ScriptedTest> {
    vec![
        ScriptedTest::passing("YamuTests.PassingTest1"),
        ScriptedTest::passing("YamuTests.PassingTest2"),
        ScriptedTest::passing("YamuTests.PassingTest3"),
        ScriptedTest::failing("YamuTests.FailingTest1", "Expected: True  But was: False"),
        ScriptedTest::failing("YamuTests.FailingTest2", "Expected: 1  But was: 2"),
        ScriptedTest::passing("Yamu.Tests.YamuPlayModeTests.SimplePlayModeTest"),
    ]
}

impl ScriptedEditor {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            op_delay: delay,
            ..Self::default()
        }
    }

    pub fn with_compile_outcome(outcome: CompileOutcome) -> Self {
        Self {
            compile_outcome: Mutex::new(outcome),
            ..Self::default()
        }
    }

    fn selected(&self, spec: &TestRunSpec) -> Vec<&ScriptedTest> {
        let by_name = |test: &ScriptedTest| {
            spec.filter
                .split('|')
                .any(|candidate| candidate == test.full_name)
        };
        let regex = regex::Regex::new(&spec.filter_regex).ok();
        let by_regex =
            |test: &ScriptedTest| regex.as_ref().is_some_and(|re| re.is_match(&test.full_name));

        self.catalog
            .iter()
            .filter(|test| match (spec.filter.is_empty(), spec.filter_regex.is_empty()) {
                (true, true) => true,
                (false, true) => by_name(test),
                (true, false) => by_regex(test),
                (false, false) => match spec.combine {
                    FilterCombine::Intersection => by_name(test) && by_regex(test),
                    FilterCombine::Union => by_name(test) || by_regex(test),
                },
            })
            .collect()
    }
}

#[async_trait]
impl EditorExecutor for ScriptedEditor {
    async fn refresh_assets(&self, _force: bool) -> Result<String, EditorError> {
        tokio::time::sleep(self.op_delay).await;
        Ok(self.refresh_text.clone())
    }

    async fn compile(&self) -> Result<CompileOutcome, EditorError> {
        tokio::time::sleep(self.op_delay).await;
        Ok(self.compile_outcome.lock().unwrap().clone())
    }

    async fn run_tests(
        &self,
        spec: &TestRunSpec,
        _cancel: CancellationToken,
    ) -> Result<TestRunOutcome, EditorError> {
        tokio::time::sleep(self.op_delay).await;

        let selected = self.selected(spec);
        let results: Vec<TestCaseResult> = selected
            .iter()
            .map(|test| TestCaseResult {
                full_name: test.full_name.clone(),
                passed: test.passes,
                skipped: false,
                duration_seconds: 0.01,
                message: test.message.clone(),
            })
            .collect();

        let passed = results.iter().filter(|r| r.passed).count() as u32;
        let failed = results.len() as u32 - passed;

        Ok(TestRunOutcome {
            total: results.len() as u32,
            passed,
            failed,
            skipped: 0,
            duration_seconds: 0.1,
            results,
        })
    }

    async fn request_cancel(&self, run_id: &str) -> Result<(), EditorError> {
        self.cancel_requests.lock().unwrap().push(run_id.to_string());
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }
}

/// Builds a coordinator over a scripted editor.
pub fn coordinator_with(editor: ScriptedEditor) -> Arc<OperationCoordinator> {
    let status = Arc::new(StatusStore::new());
    Arc::new(OperationCoordinator::new(status, Arc::new(editor)))
}

/// Builds a dispatcher (default config) over a scripted editor.
pub fn dispatcher_with(editor: ScriptedEditor) -> ToolDispatcher {
    ToolDispatcher::new(coordinator_with(editor), &Config::default())
}

/// Sends a request through the dispatcher.
pub async fn request(
    dispatcher: &ToolDispatcher,
    method: &str,
    params: serde_json::Value,
) -> JsonRpcResponse {
    dispatcher
        .dispatch(JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: RequestId::Number(1),
            method: method.to_string(),
            params: Some(params),
        })
        .await
}

/// Calls a tool through the dispatcher.
pub async fn call_tool(
    dispatcher: &ToolDispatcher,
    name: &str,
    arguments: serde_json::Value,
) -> JsonRpcResponse {
    request(
        dispatcher,
        "tools/call",
        serde_json::json!({ "name": name, "arguments": arguments }),
    )
    .await
}

/// Extracts the text payload of a content-block result.
pub fn content_text(response: &JsonRpcResponse) -> String {
    response
        .result
        .as_ref()
        .expect("expected a result frame")["content"][0]["text"]
        .as_str()
        .expect("expected text content")
        .to_string()
}
