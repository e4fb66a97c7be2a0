//! Default [`EditorExecutor`] over the editor's HTTP control surface.
//!
//! The editor package embeds a small control server; this bridge maps the
//! three primitive operations onto its endpoints. The control surface
//! restarts whenever the editor reloads script assemblies, so transport
//! failures here are routinely transient and are reported with the
//! `HTTP request failed` phrasing that callers recognise as retryable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::config::EditorConfig;
use crate::editor::executor::EditorExecutor;
use crate::editor::ops::{
    CompileMessage, CompileOutcome, TestCaseResult, TestRunOutcome, TestRunSpec,
};
use crate::error::EditorError;

/// HTTP bridge to the editor-side control endpoints.
pub struct UnityEditorBridge {
    client: reqwest::Client,
    base_url: String,
    playing: AtomicBool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompileDto {
    success: bool,
    #[serde(default)]
    errors: Vec<CompileMessageDto>,
}

#[derive(Debug, Deserialize)]
struct CompileMessageDto {
    file: String,
    line: u32,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestRunDto {
    total: u32,
    passed: u32,
    failed: u32,
    skipped: u32,
    duration: f64,
    #[serde(default)]
    results: Vec<TestCaseDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestCaseDto {
    full_name: String,
    passed: bool,
    #[serde(default)]
    skipped: bool,
    #[serde(default)]
    duration_seconds: f64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HostStateDto {
    #[serde(default)]
    is_playing: bool,
}

impl UnityEditorBridge {
    /// Creates a bridge from editor configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &EditorConfig) -> Result<Self, EditorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| EditorError::Operation(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            playing: AtomicBool::new(false),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Performs a GET against the control surface, mapping transport
    /// failures to the transient phrasing.
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<reqwest::Response, EditorError> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| EditorError::Transient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EditorError::Transient(format!(
                "Tool execution failed: editor returned HTTP {status}: {body}"
            )));
        }

        Ok(response)
    }

    /// Refreshes the cached play-mode flag, best effort.
    async fn refresh_play_state(&self) {
        if let Ok(response) = self.get("status", &[]).await {
            if let Ok(state) = response.json::<HostStateDto>().await {
                self.playing.store(state.is_playing, Ordering::Relaxed);
            }
        }
    }
}

#[async_trait]
impl EditorExecutor for UnityEditorBridge {
    async fn refresh_assets(&self, force: bool) -> Result<String, EditorError> {
        let force_value = if force { "true" } else { "false" };
        let response = self.get("refresh", &[("force", force_value)]).await?;
        let text = response
            .text()
            .await
            .map_err(|e| EditorError::Transient(format!("HTTP request failed: {e}")))?;

        self.refresh_play_state().await;

        if text.trim().is_empty() {
            Ok("Asset database refreshed.".to_string())
        } else {
            Ok(text.trim().to_string())
        }
    }

    async fn compile(&self) -> Result<CompileOutcome, EditorError> {
        let response = self.get("compile-and-wait", &[]).await?;
        let dto: CompileDto = response
            .json()
            .await
            .map_err(|e| EditorError::Transient(format!("HTTP request failed: {e}")))?;

        self.refresh_play_state().await;

        Ok(CompileOutcome {
            success: dto.success,
            errors: dto
                .errors
                .into_iter()
                .map(|e| CompileMessage {
                    file: e.file,
                    line: e.line,
                    message: e.message,
                })
                .collect(),
        })
    }

    async fn run_tests(
        &self,
        spec: &TestRunSpec,
        cancel: CancellationToken,
    ) -> Result<TestRunOutcome, EditorError> {
        let query = [
            ("mode", spec.mode.as_str()),
            ("filter", spec.filter.as_str()),
            ("filterRegex", spec.filter_regex.as_str()),
            ("combine", spec.combine.as_str()),
        ];
        let request = self.get("run-tests", &query);
        tokio::pin!(request);

        // Cancellation is a request: the host concludes the run (possibly
        // early for PlayMode, possibly not at all for EditMode) and this
        // call keeps waiting for whatever outcome it reports.
        let response = tokio::select! {
            response = &mut request => response,
            () = cancel.cancelled() => {
                tracing::debug!("cancellation requested, waiting for host to conclude the run");
                request.await
            }
        };

        let dto: TestRunDto = match response {
            Ok(response) => response.json().await.map_err(|e| {
                EditorError::Transient(format!("HTTP request failed: {e}"))
            })?,
            Err(EditorError::Transient(msg)) if msg.contains("editor returned HTTP 503") => {
                // The runner rejects work until its first domain reload
                // completes; reported with the recognised retry phrasing.
                return Err(EditorError::Transient(format!(
                    "Test execution failed to start: {msg}"
                )));
            }
            Err(e) => return Err(e),
        };

        self.refresh_play_state().await;

        Ok(TestRunOutcome {
            total: dto.total,
            passed: dto.passed,
            failed: dto.failed,
            skipped: dto.skipped,
            duration_seconds: dto.duration,
            results: dto
                .results
                .into_iter()
                .map(|r| TestCaseResult {
                    full_name: r.full_name,
                    passed: r.passed,
                    skipped: r.skipped,
                    duration_seconds: r.duration_seconds,
                    message: r.message,
                })
                .collect(),
        })
    }

    async fn request_cancel(&self, run_id: &str) -> Result<(), EditorError> {
        self.get("cancel-tests", &[("runId", run_id)]).await?;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }
}
