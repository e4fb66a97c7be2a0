//! Error types for yamu-mcp.
//!
//! Two families live here: [`ConfigError`] for configuration loading and
//! [`EditorError`] for failures reported by the Editor-side executor.
//! Domain outcomes (a compile that produced errors, a test run with
//! failures) are *not* errors; they travel as ordinary result values.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Failures reported by the Editor-side executor.
///
/// The `Display` form of every variant passes the underlying message
/// through unchanged so that callers (and the retry classifier below) can
/// match on the host's error text.
#[derive(Error, Debug)]
pub enum EditorError {
    /// The editor's control surface failed in a way that is expected to
    /// heal itself, typically its HTTP front door restarting during a
    /// compile or domain reload.
    #[error("{0}")]
    Transient(String),

    /// The operation reached the editor and failed there.
    #[error("{0}")]
    Operation(String),

    /// The operation was cancelled before completion.
    #[error("operation cancelled")]
    Cancelled,
}

impl EditorError {
    /// True when this failure is safe for a caller to retry with backoff.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient(msg) => is_transient_host_error(msg),
            Self::Operation(_) | Self::Cancelled => false,
        }
    }
}

/// Known transient phrases produced when the editor's control surface
/// bounces mid-operation. Kept as an explicit list so the set can grow
/// without touching call sites.
const TRANSIENT_PHRASES: [&str; 3] = [
    "HTTP request failed",
    "Test execution failed to start",
    "Tool execution failed",
];

/// Classifies an error message as a transient host failure.
///
/// Transient failures are safe for callers to retry with a fixed delay and
/// a bounded attempt count. Timeout failures are never transient, no
/// matter what else the message contains: retrying a timed-out operation
/// just doubles the wait.
#[must_use]
pub fn is_transient_host_error(message: &str) -> bool {
    if message.to_lowercase().contains("timeout") {
        return false;
    }
    TRANSIENT_PHRASES
        .iter()
        .any(|phrase| message.contains(phrase))
}
