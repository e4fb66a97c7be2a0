//! Process-wide editor status.
//!
//! One [`StatusStore`] exists per process. The operation coordinator is
//! its only writer; everything else (the status tools, the HTTP mirror)
//! reads snapshots. Both read paths serialise the same snapshot structs
//! through [`serde_json::to_string`], which is what makes the JSON-RPC
//! text payload and the HTTP body byte-identical at the same instant.

use std::sync::RwLock;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::editor::ops::{CompileMessage, CompileOutcome, TestCaseResult, TestRunOutcome};

/// Read-only view over the compile state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileStatusSnapshot {
    /// `"idle"` or `"compiling"`.
    pub status: &'static str,
    /// Always equals `status == "compiling"`.
    pub is_compiling: bool,
    /// ISO-8601 time of the last compile start.
    pub last_compile_time: String,
    /// Diagnostics from the last completed compile.
    pub errors: Vec<CompileMessage>,
}

/// Aggregated results block inside [`TestStatusSnapshot`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultsSummary {
    /// Number of tests selected.
    pub total_tests: u32,
    /// Number that passed.
    pub passed_tests: u32,
    /// Number that failed.
    pub failed_tests: u32,
    /// Number that were skipped.
    pub skipped_tests: u32,
    /// Wall-clock duration in seconds.
    pub duration: f64,
    /// Per-test results.
    pub results: Vec<TestCaseResult>,
}

impl TestResultsSummary {
    fn from_outcome(outcome: &TestRunOutcome) -> Self {
        Self {
            total_tests: outcome.total,
            passed_tests: outcome.passed,
            failed_tests: outcome.failed,
            skipped_tests: outcome.skipped,
            duration: outcome.duration_seconds,
            results: outcome.results.clone(),
        }
    }
}

/// Read-only view over the test-run state.
///
/// `testResults` and `testRunId` are always present as keys (null before
/// any run) because collaborators index them unconditionally.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStatusSnapshot {
    /// `"idle"` or `"running"`.
    pub status: &'static str,
    /// Always equals `status == "running"`.
    pub is_running: bool,
    /// ISO-8601 time of the last run start.
    pub last_test_time: String,
    /// Results of the last completed run, `null` before any run.
    pub test_results: Option<TestResultsSummary>,
    /// GUID of the current or most recent run.
    pub test_run_id: Option<String>,
    /// True while the last terminal failure has not been superseded by a
    /// successful run.
    pub has_error: bool,
    /// Message of the last terminal failure.
    pub error_message: Option<String>,
}

/// Read-only view over the whole editor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorStatusSnapshot {
    /// True while a compile is in progress.
    pub is_compiling: bool,
    /// True while a test run is in progress.
    pub is_running_tests: bool,
    /// Editor play-mode flag; owned by the host, mirrored here.
    pub is_playing: bool,
}

macro_rules! json_text {
    ($($ty:ty),+) => {$(
        impl $ty {
            /// Serialises this snapshot to the exact JSON text served on
            /// both the JSON-RPC and HTTP views.
            #[must_use]
            pub fn to_json_text(&self) -> String {
                serde_json::to_string(self).unwrap()
            }
        }
    )+};
}

json_text!(CompileStatusSnapshot, TestStatusSnapshot, EditorStatusSnapshot);

#[derive(Debug)]
struct StatusInner {
    compiling: bool,
    last_compile_time: DateTime<Utc>,
    compile_errors: Vec<CompileMessage>,

    running_tests: bool,
    last_test_time: DateTime<Utc>,
    test_results: Option<TestResultsSummary>,
    test_run_id: Option<String>,
    test_error: Option<String>,

    playing: bool,
}

impl Default for StatusInner {
    fn default() -> Self {
        Self {
            compiling: false,
            last_compile_time: DateTime::UNIX_EPOCH,
            compile_errors: Vec::new(),
            running_tests: false,
            last_test_time: DateTime::UNIX_EPOCH,
            test_results: None,
            test_run_id: None,
            test_error: None,
            playing: false,
        }
    }
}

/// Synchronised single-writer status state.
///
/// Initialised all-idle with empty errors; lives for the whole process,
/// never torn down.
#[derive(Debug, Default)]
pub struct StatusStore {
    inner: RwLock<StatusInner>,
}

impl StatusStore {
    /// Creates an all-idle store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Writer side. Called by the operation coordinator only.

    /// Records a compile start.
    pub fn mark_compile_started(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.compiling = true;
        inner.last_compile_time = Utc::now();
    }

    /// Records a compile completion with its diagnostics.
    pub fn mark_compile_finished(&self, outcome: &CompileOutcome) {
        let mut inner = self.inner.write().unwrap();
        inner.compiling = false;
        inner.compile_errors = outcome.errors.clone();
    }

    /// Records a compile that never produced an outcome (host failure).
    pub fn mark_compile_aborted(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.compiling = false;
    }

    /// Records a test-run start under the given run GUID.
    pub fn mark_tests_started(&self, run_id: &str) {
        let mut inner = self.inner.write().unwrap();
        inner.running_tests = true;
        inner.last_test_time = Utc::now();
        inner.test_run_id = Some(run_id.to_string());
    }

    /// Records a completed test run. Clears any prior terminal failure.
    ///
    /// The run id is retained until the next run starts so that late
    /// polls can still correlate results with the run that produced them.
    pub fn mark_tests_finished(&self, outcome: &TestRunOutcome) {
        let mut inner = self.inner.write().unwrap();
        inner.running_tests = false;
        inner.test_results = Some(TestResultsSummary::from_outcome(outcome));
        inner.test_error = None;
    }

    /// Records a test run that ended in a terminal failure.
    pub fn mark_tests_failed(&self, message: &str) {
        let mut inner = self.inner.write().unwrap();
        inner.running_tests = false;
        inner.test_error = Some(message.to_string());
    }

    /// Updates the host play-mode flag.
    pub fn set_playing(&self, playing: bool) {
        self.inner.write().unwrap().playing = playing;
    }

    // Reader side.

    /// Snapshot of the compile state.
    #[must_use]
    pub fn compile_snapshot(&self) -> CompileStatusSnapshot {
        let inner = self.inner.read().unwrap();
        CompileStatusSnapshot {
            status: if inner.compiling { "compiling" } else { "idle" },
            is_compiling: inner.compiling,
            last_compile_time: format_time(inner.last_compile_time),
            errors: inner.compile_errors.clone(),
        }
    }

    /// Snapshot of the test-run state.
    #[must_use]
    pub fn test_snapshot(&self) -> TestStatusSnapshot {
        let inner = self.inner.read().unwrap();
        TestStatusSnapshot {
            status: if inner.running_tests { "running" } else { "idle" },
            is_running: inner.running_tests,
            last_test_time: format_time(inner.last_test_time),
            test_results: inner.test_results.clone(),
            test_run_id: inner.test_run_id.clone(),
            has_error: inner.test_error.is_some(),
            error_message: inner.test_error.clone(),
        }
    }

    /// Snapshot of the whole editor, derived from the same state as the
    /// per-operation snapshots so the consistency invariants hold by
    /// construction.
    #[must_use]
    pub fn editor_snapshot(&self) -> EditorStatusSnapshot {
        let inner = self.inner.read().unwrap();
        EditorStatusSnapshot {
            is_compiling: inner.compiling,
            is_running_tests: inner.running_tests,
            is_playing: inner.playing,
        }
    }

    /// GUID of the in-flight or most recent test run.
    #[must_use]
    pub fn current_test_run_id(&self) -> Option<String> {
        self.inner.read().unwrap().test_run_id.clone()
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
