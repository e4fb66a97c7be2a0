//! Operation coordination against the single-threaded editor host.
//!
//! One execution slot exists for the whole process, shared by all three
//! operation kinds: a compile blocks a refresh, which blocks a test run.
//! Acquisition is start-or-warn, a mutex-guarded check-and-set in which
//! exactly one contender wins and every loser immediately receives the
//! fixed per-kind warning sentence. There is no queue.
//!
//! Long operations run on detached tasks that update the [`StatusStore`]
//! and free the slot when the host finishes. The *caller's* wait is
//! bounded separately: when a caller-supplied timeout expires, the wait is
//! abandoned and a timeout failure returned, but the editor-side work is
//! left running. Cancellation is not guaranteed, so aborting would lie
//! about the host's state.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::editor::executor::EditorExecutor;
use crate::editor::ops::{CompileOutcome, OperationKind, TestRunOutcome, TestRunSpec};
use crate::editor::status::StatusStore;
use crate::error::EditorError;

/// Outcome of a start-or-warn operation request.
#[derive(Debug)]
pub enum OperationReply<T> {
    /// The caller won the slot and the operation completed within its
    /// timeout.
    Completed(T),
    /// Another operation held the slot; the fixed warning sentence for
    /// the *requested* kind.
    Warned(&'static str),
    /// The caller's timeout expired while the operation was still
    /// running. The editor-side work continues; the message embeds the
    /// elapsed bound.
    TimedOut(String),
    /// The host failed the operation.
    Failed(EditorError),
}

/// Result of a cancellation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelReply {
    /// `"ok"`, `"warning"` or `"error"`.
    pub status: &'static str,
    /// Human-readable detail.
    pub message: String,
}

impl CancelReply {
    fn ok(message: String) -> Self {
        Self { status: "ok", message }
    }

    fn warning(message: &str) -> Self {
        Self {
            status: "warning",
            message: message.to_string(),
        }
    }

    fn error(message: String) -> Self {
        Self {
            status: "error",
            message,
        }
    }
}

/// The operation currently holding the execution slot.
#[derive(Debug)]
struct ActiveOperation {
    kind: OperationKind,
    run_id: Option<String>,
    cancel: CancellationToken,
}

type Slot = Arc<Mutex<Option<ActiveOperation>>>;

/// Serialises access to the editor's single execution slot.
pub struct OperationCoordinator {
    slot: Slot,
    status: Arc<StatusStore>,
    executor: Arc<dyn EditorExecutor>,
}

impl OperationCoordinator {
    /// Creates a coordinator over the given store and executor.
    #[must_use]
    pub fn new(status: Arc<StatusStore>, executor: Arc<dyn EditorExecutor>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            status,
            executor,
        }
    }

    /// The status store this coordinator writes to.
    #[must_use]
    pub fn status(&self) -> &Arc<StatusStore> {
        &self.status
    }

    /// Refreshes the asset database, waiting up to `timeout_secs`.
    pub async fn refresh_assets(&self, force: bool, timeout_secs: i64) -> OperationReply<String> {
        let Some(_cancel) = self.try_begin(OperationKind::RefreshAssets, None) else {
            return OperationReply::Warned(OperationKind::RefreshAssets.in_progress_warning());
        };

        let executor = Arc::clone(&self.executor);
        let slot = Arc::clone(&self.slot);
        let status = Arc::clone(&self.status);
        let handle = tokio::spawn(async move {
            let result = executor.refresh_assets(force).await;
            status.set_playing(executor.is_playing());
            release(&slot);
            result
        });

        Self::await_bounded(handle, timeout_secs, || {
            format!("Asset refresh timeout after {timeout_secs} seconds")
        })
        .await
    }

    /// Compiles scripts, waiting up to `timeout_secs`.
    ///
    /// A non-positive timeout fails immediately with the same message
    /// shape; the compile itself still runs to completion in the
    /// background and frees the slot when done.
    pub async fn compile_and_wait(&self, timeout_secs: i64) -> OperationReply<CompileOutcome> {
        let Some(_cancel) = self.try_begin(OperationKind::Compile, None) else {
            return OperationReply::Warned(OperationKind::Compile.in_progress_warning());
        };

        self.status.mark_compile_started();

        let executor = Arc::clone(&self.executor);
        let slot = Arc::clone(&self.slot);
        let status = Arc::clone(&self.status);
        let handle = tokio::spawn(async move {
            let result = executor.compile().await;
            match &result {
                Ok(outcome) => status.mark_compile_finished(outcome),
                Err(_) => status.mark_compile_aborted(),
            }
            status.set_playing(executor.is_playing());
            release(&slot);
            result
        });

        Self::await_bounded(handle, timeout_secs, || {
            format!("Compilation timeout after {timeout_secs} seconds")
        })
        .await
    }

    /// Runs tests matching `spec`, waiting up to `timeout_secs`.
    pub async fn run_tests(
        &self,
        spec: TestRunSpec,
        timeout_secs: i64,
    ) -> OperationReply<TestRunOutcome> {
        match self.begin_tests(spec) {
            Err(warning) => OperationReply::Warned(warning),
            Ok((_run_id, handle)) => {
                Self::await_bounded(handle, timeout_secs, || {
                    format!("Test execution timeout after {timeout_secs} seconds")
                })
                .await
            }
        }
    }

    /// Starts a test run without waiting for it; callers observe progress
    /// and results through the status store.
    ///
    /// # Errors
    ///
    /// Returns the fixed warning sentence when the slot is busy.
    pub fn start_tests(&self, spec: TestRunSpec) -> Result<String, &'static str> {
        self.begin_tests(spec).map(|(run_id, _handle)| run_id)
    }

    /// Acquires the slot and spawns the run task.
    ///
    /// A fresh run GUID is generated per run and recorded in the status
    /// store before the run starts, so polls observe it immediately.
    fn begin_tests(
        &self,
        spec: TestRunSpec,
    ) -> Result<(String, JoinHandle<Result<TestRunOutcome, EditorError>>), &'static str> {
        let run_id = Uuid::new_v4().to_string();
        let Some(cancel) = self.try_begin(OperationKind::RunTests, Some(run_id.clone())) else {
            return Err(OperationKind::RunTests.in_progress_warning());
        };

        self.status.mark_tests_started(&run_id);

        let executor = Arc::clone(&self.executor);
        let slot = Arc::clone(&self.slot);
        let status = Arc::clone(&self.status);
        let handle = tokio::spawn(async move {
            let result = executor.run_tests(&spec, cancel).await;
            match &result {
                Ok(outcome) => status.mark_tests_finished(outcome),
                Err(e) => status.mark_tests_failed(&e.to_string()),
            }
            status.set_playing(executor.is_playing());
            release(&slot);
            result
        });

        Ok((run_id, handle))
    }

    /// Requests cooperative cancellation of the in-flight test run.
    ///
    /// `requested` addresses a specific run GUID; empty or absent matches
    /// whatever run is in flight. This is a request, not a guarantee:
    /// EditMode runs may ignore it entirely.
    pub async fn cancel_tests(&self, requested: Option<&str>) -> CancelReply {
        let requested = requested.unwrap_or("").trim();

        // Inspect the slot without holding the lock across an await.
        let in_flight = {
            let slot = self.slot.lock().unwrap();
            slot.as_ref()
                .filter(|active| active.kind == OperationKind::RunTests)
                .map(|active| {
                    (
                        active.run_id.clone().unwrap_or_default(),
                        active.cancel.clone(),
                    )
                })
        };

        if !requested.is_empty() {
            match &in_flight {
                Some((active_id, _)) if active_id == requested => {}
                Some((active_id, _)) => {
                    return CancelReply::error(format!(
                        "Failed to cancel: test run {requested} not found. Current test run is {active_id}."
                    ));
                }
                None => {
                    return CancelReply::error(format!(
                        "Failed to cancel: test run {requested} not found."
                    ));
                }
            }
        }

        let Some((active_id, cancel)) = in_flight else {
            return CancelReply::warning("No test run is currently in progress.");
        };

        cancel.cancel();
        match self.executor.request_cancel(&active_id).await {
            Ok(()) => CancelReply::ok(format!(
                "Cancellation requested for test run {active_id}. \
                 EditMode tests may not stop until the current test finishes."
            )),
            Err(e) => CancelReply::error(format!("Failed to cancel test run {active_id}: {e}")),
        }
    }

    /// Check-and-set acquisition of the execution slot.
    ///
    /// Returns the new operation's cancellation token on success, `None`
    /// when any operation (of any kind) already holds the slot.
    fn try_begin(&self, kind: OperationKind, run_id: Option<String>) -> Option<CancellationToken> {
        let mut slot = self.slot.lock().unwrap();
        if let Some(active) = slot.as_ref() {
            tracing::debug!(
                requested = %kind,
                active = %active.kind,
                "operation slot busy, returning warning"
            );
            return None;
        }

        let cancel = CancellationToken::new();
        *slot = Some(ActiveOperation {
            kind,
            run_id,
            cancel: cancel.clone(),
        });
        self.status.set_playing(self.executor.is_playing());
        tracing::debug!(kind = %kind, "operation slot acquired");
        Some(cancel)
    }

    /// Bounds the caller's wait on a detached operation task.
    ///
    /// Non-positive timeouts fail deterministically without waiting at
    /// all. Expiry drops the join handle, which detaches the operation
    /// task without aborting it.
    async fn await_bounded<T>(
        handle: JoinHandle<Result<T, EditorError>>,
        timeout_secs: i64,
        timeout_message: impl FnOnce() -> String,
    ) -> OperationReply<T> {
        if timeout_secs <= 0 {
            return OperationReply::TimedOut(timeout_message());
        }

        #[allow(clippy::cast_sign_loss)] // non-positive handled above
        let deadline = Duration::from_secs(timeout_secs as u64);
        match tokio::time::timeout(deadline, handle).await {
            Ok(Ok(Ok(value))) => OperationReply::Completed(value),
            Ok(Ok(Err(e))) => OperationReply::Failed(e),
            Ok(Err(join_error)) => OperationReply::Failed(EditorError::Operation(format!(
                "Tool execution failed: operation worker stopped: {join_error}"
            ))),
            Err(_) => OperationReply::TimedOut(timeout_message()),
        }
    }
}

/// Frees the execution slot.
fn release(slot: &Slot) {
    let mut slot = slot.lock().unwrap();
    if let Some(active) = slot.take() {
        tracing::debug!(kind = %active.kind, "operation slot released");
    }
}
