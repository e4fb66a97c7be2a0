//! Integration tests for operation coordination: start-or-warn contention,
//! cross-kind mutual exclusion, caller timeouts and cooperative cancel.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{coordinator_with, ScriptedEditor};
use yamu_mcp::editor::coordinator::OperationReply;
use yamu_mcp::editor::ops::{OperationKind, TestMode, TestRunSpec};

fn edit_mode_spec() -> TestRunSpec {
    TestRunSpec {
        mode: TestMode::EditMode,
        ..TestRunSpec::default()
    }
}

#[tokio::test]
async fn refresh_storm_has_exactly_one_winner() {
    let coordinator = coordinator_with(ScriptedEditor::with_delay(Duration::from_millis(200)));

    let mut handles = Vec::new();
    for _ in 0..3 {
        let coordinator = Arc::clone(&coordinator);
        handles.push(tokio::spawn(async move {
            coordinator.refresh_assets(false, 30).await
        }));
        // Let the previous contender reach the slot first.
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let mut completed = 0;
    let mut warned = 0;
    for handle in handles {
        match handle.await.unwrap() {
            OperationReply::Completed(text) => {
                assert_eq!(text, "Asset database refreshed.");
                completed += 1;
            }
            OperationReply::Warned(message) => {
                assert_eq!(
                    message,
                    "Asset refresh already in progress. Please wait for current refresh to complete."
                );
                warned += 1;
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    // No lost requests: every call observed either the win or the warning.
    assert_eq!(completed, 1);
    assert_eq!(warned, 2);
}

#[tokio::test]
async fn kinds_exclude_each_other() {
    let coordinator = coordinator_with(ScriptedEditor::with_delay(Duration::from_millis(300)));

    let background = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.compile_and_wait(30).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    // A compile holds the one slot, so a test run warns with its own kind's sentence.
    match coordinator.run_tests(edit_mode_spec(), 30).await {
        OperationReply::Warned(message) => {
            assert_eq!(message, OperationKind::RunTests.in_progress_warning());
        }
        other => panic!("expected warning, got {other:?}"),
    }

    // And a refresh warns with the refresh sentence.
    match coordinator.refresh_assets(false, 30).await {
        OperationReply::Warned(message) => {
            assert_eq!(message, OperationKind::RefreshAssets.in_progress_warning());
        }
        other => panic!("expected warning, got {other:?}"),
    }

    assert!(matches!(
        background.await.unwrap(),
        OperationReply::Completed(_)
    ));
}

#[tokio::test]
async fn slot_frees_after_completion() {
    let coordinator = coordinator_with(ScriptedEditor::default());

    for _ in 0..3 {
        match coordinator.compile_and_wait(30).await {
            OperationReply::Completed(outcome) => assert!(outcome.success),
            other => panic!("sequential compiles must not contend: {other:?}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn timeout_leaves_operation_running_until_host_finishes() {
    let coordinator = coordinator_with(ScriptedEditor::with_delay(Duration::from_secs(10)));

    // The caller gives up after 1 second...
    match coordinator.compile_and_wait(1).await {
        OperationReply::TimedOut(message) => {
            assert_eq!(message, "Compilation timeout after 1 seconds");
        }
        other => panic!("expected timeout, got {other:?}"),
    }

    // ...but the editor-side compile still holds the slot.
    assert!(matches!(
        coordinator.refresh_assets(false, 30).await,
        OperationReply::Warned(_)
    ));

    // Once the host finishes, the slot frees without any caller waiting.
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert!(matches!(
        coordinator.compile_and_wait(30).await,
        OperationReply::Completed(_)
    ));
}

#[tokio::test]
async fn status_reflects_in_flight_test_run() {
    let coordinator = coordinator_with(ScriptedEditor::with_delay(Duration::from_millis(200)));

    let run_id = coordinator
        .start_tests(edit_mode_spec())
        .expect("idle coordinator must start the run");

    let during = coordinator.status().test_snapshot();
    assert_eq!(during.status, "running");
    assert!(during.is_running);
    assert_eq!(during.test_run_id.as_deref(), Some(run_id.as_str()));
    assert!(coordinator.status().editor_snapshot().is_running_tests);

    tokio::time::sleep(Duration::from_millis(400)).await;

    let after = coordinator.status().test_snapshot();
    assert_eq!(after.status, "idle");
    assert!(!after.is_running);
    assert_eq!(after.test_run_id.as_deref(), Some(run_id.as_str()));
    assert!(after.test_results.is_some());
}

#[tokio::test]
async fn cancel_reaches_the_executor_with_the_run_id() {
    let editor = Arc::new(ScriptedEditor::with_delay(Duration::from_millis(300)));
    let status = Arc::new(yamu_mcp::editor::status::StatusStore::new());
    let coordinator = Arc::new(yamu_mcp::editor::coordinator::OperationCoordinator::new(
        status,
        Arc::clone(&editor) as Arc<dyn yamu_mcp::editor::executor::EditorExecutor>,
    ));

    let run_id = coordinator.start_tests(edit_mode_spec()).unwrap();

    let reply = coordinator.cancel_tests(None).await;
    assert_eq!(reply.status, "ok");
    assert!(reply.message.contains(&run_id));
    assert!(reply.message.contains("EditMode"));

    assert_eq!(
        editor.cancel_requests.lock().unwrap().as_slice(),
        &[run_id.clone()]
    );

    // Addressing the same run by GUID is also accepted while in flight.
    let addressed = coordinator.cancel_tests(Some(&run_id)).await;
    assert_eq!(addressed.status, "ok");
}

#[tokio::test]
async fn cancel_with_mismatched_guid_names_both_runs() {
    let coordinator = coordinator_with(ScriptedEditor::with_delay(Duration::from_millis(300)));

    let run_id = coordinator.start_tests(edit_mode_spec()).unwrap();
    let reply = coordinator.cancel_tests(Some("not-the-run")).await;

    assert_eq!(reply.status, "error");
    assert!(reply.message.contains("not-the-run"));
    assert!(reply.message.contains(&run_id));
}

#[tokio::test]
async fn cancel_when_idle_warns_or_errors_by_addressing() {
    let coordinator = coordinator_with(ScriptedEditor::default());

    let bare = coordinator.cancel_tests(None).await;
    assert_eq!(bare.status, "warning");
    assert_eq!(bare.message, "No test run is currently in progress.");

    let addressed = coordinator.cancel_tests(Some("ghost-run")).await;
    assert_eq!(addressed.status, "error");
    assert!(addressed.message.contains("ghost-run"));
}
