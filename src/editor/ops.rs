//! Operation vocabulary shared by the coordinator, executor and dispatcher.
//!
//! The editor performs exactly three long-running operations (asset
//! refresh, script compilation and test execution) and they are mutually
//! exclusive because the editor itself is single-threaded. Everything in
//! this module is plain data: no I/O, no locking.

use serde::Serialize;

/// The three long-running editor operations.
///
/// All three share one execution slot: a compile blocks a refresh, which
/// blocks a test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Asset database refresh (optionally forced).
    RefreshAssets,
    /// Script compilation.
    Compile,
    /// Test execution (EditMode or PlayMode).
    RunTests,
}

impl OperationKind {
    /// The fixed warning sentence returned when this operation is
    /// requested while already in progress. Callers receive it as a
    /// successful result, never as a protocol error.
    #[must_use]
    pub const fn in_progress_warning(self) -> &'static str {
        match self {
            Self::RefreshAssets => {
                "Asset refresh already in progress. Please wait for current refresh to complete."
            }
            Self::Compile => {
                "Compilation already in progress. Please wait for current compilation to complete."
            }
            Self::RunTests => {
                "Tests are already running. Please wait for current test run to complete."
            }
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RefreshAssets => "refresh_assets",
            Self::Compile => "compile",
            Self::RunTests => "run_tests",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Test execution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestMode {
    /// Tests that run inside the editor process.
    EditMode,
    /// Tests that run in a player loop.
    #[default]
    PlayMode,
}

impl TestMode {
    /// Parses a mode string leniently: unknown values fall back to the
    /// default mode so a sloppy caller still gets a result frame instead
    /// of a protocol error.
    #[must_use]
    pub fn parse_lenient(value: &str) -> Self {
        match value {
            "EditMode" => Self::EditMode,
            _ => Self::default(),
        }
    }

    /// Whether the host's test runner can reliably interrupt a run in
    /// this mode. EditMode runs cannot be cancelled mid-flight via the
    /// underlying TestRunnerApi; only PlayMode runs can.
    #[must_use]
    pub const fn supports_cancellation(self) -> bool {
        matches!(self, Self::PlayMode)
    }

    /// Wire name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EditMode => "EditMode",
            Self::PlayMode => "PlayMode",
        }
    }
}

/// How `test_filter` and `test_filter_regex` combine when both are given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterCombine {
    /// A test must match both filters.
    #[default]
    Intersection,
    /// A test may match either filter.
    Union,
}

impl FilterCombine {
    /// Parses the config value; defaults to intersection.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "union" => Self::Union,
            _ => Self::Intersection,
        }
    }

    /// Wire name forwarded to the executor.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intersection => "intersection",
            Self::Union => "union",
        }
    }
}

/// A fully-resolved test run request.
#[derive(Debug, Clone, Default)]
pub struct TestRunSpec {
    /// Execution mode.
    pub mode: TestMode,
    /// Exact-name filter; `|`-separated alternatives; empty means all.
    pub filter: String,
    /// Regex filter over fully-qualified test names; empty means all.
    pub filter_regex: String,
    /// How the two filters combine when both are non-empty.
    pub combine: FilterCombine,
}

/// One compiler diagnostic.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CompileMessage {
    /// Source file the diagnostic points at.
    pub file: String,
    /// 1-based line number.
    pub line: u32,
    /// Diagnostic text.
    pub message: String,
}

/// Outcome of a compile operation. Compile errors are data, not `Err`.
#[derive(Debug, Clone, Default)]
pub struct CompileOutcome {
    /// True when compilation produced no errors.
    pub success: bool,
    /// Errors, empty on success.
    pub errors: Vec<CompileMessage>,
}

/// Result of one executed test.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    /// Fully-qualified test name.
    pub full_name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Whether the test was skipped.
    pub skipped: bool,
    /// Wall-clock duration in seconds.
    pub duration_seconds: f64,
    /// Failure message, empty when passed.
    pub message: String,
}

/// Aggregated outcome of a test run.
#[derive(Debug, Clone, Default)]
pub struct TestRunOutcome {
    /// Number of tests selected by the filters.
    pub total: u32,
    /// Number that passed.
    pub passed: u32,
    /// Number that failed.
    pub failed: u32,
    /// Number that were skipped.
    pub skipped: u32,
    /// Wall-clock duration of the whole run in seconds.
    pub duration_seconds: f64,
    /// Per-test results.
    pub results: Vec<TestCaseResult>,
}

impl TestRunOutcome {
    /// The failed subset of [`Self::results`].
    pub fn failures(&self) -> impl Iterator<Item = &TestCaseResult> {
        self.results.iter().filter(|r| !r.passed && !r.skipped)
    }
}
