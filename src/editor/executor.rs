//! The executor boundary: the contract to the editor host.
//!
//! The editor is an opaque, strictly single-threaded host: it performs one
//! of the three primitive operations at a time and nothing here may assume
//! otherwise. The coordinator owns mutual exclusion; implementations of
//! [`EditorExecutor`] own the wire to the editor and nothing else.
//!
//! Every call must be treated as potentially slow and, when cancellation
//! is unsupported for the mode in use, potentially never returning.
//! Callers bound their own waits; the executor never does it for them.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::editor::ops::{CompileOutcome, TestRunOutcome, TestRunSpec};
use crate::error::EditorError;

/// Blocking-but-cancellable primitive operations on the editor host.
#[async_trait]
pub trait EditorExecutor: Send + Sync {
    /// Refreshes the asset database, recompiling scripts if needed.
    ///
    /// Returns the host's human-readable outcome text
    /// (`Asset database refreshed.` on the reference host).
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejects or fails the refresh.
    async fn refresh_assets(&self, force: bool) -> Result<String, EditorError>;

    /// Compiles scripts and reports diagnostics.
    ///
    /// A compile that produces errors is an `Ok` outcome with
    /// `success == false`; `Err` means the host could not run the compile
    /// at all.
    ///
    /// # Errors
    ///
    /// Returns an error if the host could not be reached or refused the
    /// operation.
    async fn compile(&self) -> Result<CompileOutcome, EditorError>;

    /// Runs tests matching `spec`.
    ///
    /// `cancel` is a request, not a guarantee: EditMode runs cannot be
    /// interrupted mid-flight by the underlying test runner, so the
    /// implementation may keep running to completion after the token
    /// fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the run never started or was torn down by the
    /// host.
    async fn run_tests(
        &self,
        spec: &TestRunSpec,
        cancel: CancellationToken,
    ) -> Result<TestRunOutcome, EditorError>;

    /// Asks the host to cancel the test run identified by `run_id`.
    ///
    /// Best-effort by contract; completion is observed through status
    /// polling, not through this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the cancellation request could not be
    /// delivered.
    async fn request_cancel(&self, run_id: &str) -> Result<(), EditorError>;

    /// Current play-mode flag of the editor. Outside this crate's
    /// control; surfaced verbatim in the editor status snapshot.
    fn is_playing(&self) -> bool;
}
