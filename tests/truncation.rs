//! Integration tests for response truncation on oversized tool payloads.

mod common;

use serde_json::json;

use common::{call_tool, content_text, dispatcher_with, ScriptedEditor, ScriptedTest};

/// A failing test whose message is ~50,000 characters of numbered error
/// entries, with a marker that only appears past the truncation limit.
fn large_error_editor() -> ScriptedEditor {
    let mut message = String::new();
    let mut n = 0;
    while message.len() < 50_000 {
        n += 1;
        message.push_str(&format!(
            "[Error {n:04}] Complex nested template instantiation error: \
             the quick brown fox jumped over the lazy dog while expanding \
             generic arguments at depth {n}.\n"
        ));
    }
    message.push_str("END_OF_ERRORS_MARKER");

    ScriptedEditor {
        catalog: vec![ScriptedTest::failing(
            "YamuTests.LargeErrorMessageTest",
            &message,
        )],
        ..ScriptedEditor::default()
    }
}

async fn run_large_error_test(dispatcher: &yamu_mcp::mcp::server::ToolDispatcher) -> String {
    let response = call_tool(
        dispatcher,
        "run_tests",
        json!({
            "test_mode": "EditMode",
            "test_filter": "YamuTests.LargeErrorMessageTest",
            "timeout": 60
        }),
    )
    .await;
    content_text(&response)
}

#[tokio::test]
async fn oversized_failure_payload_is_truncated() {
    let dispatcher = dispatcher_with(large_error_editor());
    let text = run_large_error_test(&dispatcher).await;

    let length = text.chars().count();
    assert!(length < 30_000, "response too long: {length} characters");
    assert!(length > 20_000, "response too short: {length} characters");

    // Header and summary survive the cut.
    assert!(text.starts_with("Test Results:"));
    assert!(text.contains("Total: 1"));
    assert!(text.contains("Failed: 1"));
    assert!(text.contains("YamuTests.LargeErrorMessageTest"));

    // The beginning of the detail section is present...
    assert!(text.contains("[Error 0001]"));
    assert!(text.contains("Complex nested template instantiation error"));

    // ...and content past the limit is gone.
    assert!(!text.contains("END_OF_ERRORS_MARKER"));
    assert!(!text.contains("[Error 0300]"));

    let shown = text.matches("[Error ").count();
    assert!(shown > 10, "too few error entries shown: {shown}");
    assert!(shown < 300, "truncation did not cut the tail: {shown}");
}

#[tokio::test]
async fn normal_payload_is_not_touched() {
    let dispatcher = dispatcher_with(ScriptedEditor::default());
    let response = call_tool(
        &dispatcher,
        "run_tests",
        json!({
            "test_mode": "EditMode",
            "test_filter": "YamuTests.PassingTest1",
            "timeout": 60
        }),
    )
    .await;

    let text = content_text(&response);
    assert!(text.chars().count() < 5_000);
    assert!(!text.to_lowercase().contains("truncated"));
    assert!(text.contains("Test Results:"));
    assert!(text.contains("Total: 1"));
    assert!(text.contains("Passed: 1"));
}

#[tokio::test]
async fn truncated_payload_still_travels_in_a_valid_frame() {
    let dispatcher = dispatcher_with(large_error_editor());
    let response = call_tool(
        &dispatcher,
        "run_tests",
        json!({
            "test_mode": "EditMode",
            "test_filter": "YamuTests.LargeErrorMessageTest",
            "timeout": 60
        }),
    )
    .await;

    // The envelope survives a round trip through the wire encoding.
    let frame = serde_json::to_string(&response).unwrap();
    let reparsed: serde_json::Value = serde_json::from_str(&frame).unwrap();

    let text = reparsed["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Test Results:"));
}
