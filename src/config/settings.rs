//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use serde::Deserialize;

use crate::error::ConfigError;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
/// Every section is optional; a missing file yields all defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// HTTP status mirror settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Editor control endpoint settings.
    #[serde(default)]
    pub editor: EditorConfig,

    /// Response formatting settings.
    #[serde(default)]
    pub response: ResponseConfig,

    /// Operation timeout settings.
    #[serde(default)]
    pub operation: OperationConfig,

    /// Test filter settings.
    #[serde(default)]
    pub filters: FilterConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::ValidationError {
                message: "http.port must be non-zero".to_string(),
            });
        }
        if self.response.character_limit == 0 {
            return Err(ConfigError::ValidationError {
                message: "response.character_limit must be non-zero".to_string(),
            });
        }
        let valid_combine = ["intersection", "union"];
        if !valid_combine.contains(&self.filters.combine.as_str()) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid filter combine mode '{}'. Must be one of: intersection, union",
                    self.filters.combine
                ),
            });
        }
        Ok(())
    }
}

/// HTTP status mirror configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Port the status mirror listens on.
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
        }
    }
}

const fn default_http_port() -> u16 {
    17932
}

/// Editor control endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditorConfig {
    /// Base URL of the editor-side control endpoints.
    #[serde(default = "default_editor_base_url")]
    pub base_url: String,

    /// Per-request timeout for control calls, in seconds. Long editor
    /// operations hold the connection open for their whole duration, so
    /// this bounds a single hung socket, not the operation itself.
    #[serde(default = "default_editor_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            base_url: default_editor_base_url(),
            request_timeout_secs: default_editor_request_timeout(),
        }
    }
}

fn default_editor_base_url() -> String {
    "http://127.0.0.1:17931".to_string()
}

const fn default_editor_request_timeout() -> u64 {
    600
}

/// Response formatting configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseConfig {
    /// Maximum number of characters in a tool response text payload.
    #[serde(default = "default_character_limit")]
    pub character_limit: usize,

    /// Whether oversized payloads are truncated at all.
    #[serde(default = "default_true")]
    pub enable_truncation: bool,

    /// Marker appended to a truncated payload.
    #[serde(default = "default_truncation_message")]
    pub truncation_message: String,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            character_limit: default_character_limit(),
            enable_truncation: default_true(),
            truncation_message: default_truncation_message(),
        }
    }
}

const fn default_character_limit() -> usize {
    25000
}

const fn default_true() -> bool {
    true
}

fn default_truncation_message() -> String {
    "\n\n[Response truncated. Narrow the test filter or fix earlier errors to see the rest.]"
        .to_string()
}

/// Operation timeout configuration.
///
/// Tool callers supply their own timeouts; these cover the paths that have
/// no caller-supplied value (asset refresh, the HTTP action endpoints).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationConfig {
    /// Timeout for asset refresh operations, in seconds.
    #[serde(default = "default_refresh_timeout")]
    pub refresh_timeout_secs: i64,

    /// Default compile timeout when the caller supplies none, in seconds.
    #[serde(default = "default_compile_timeout")]
    pub default_compile_timeout_secs: i64,

    /// Default test-run timeout when the caller supplies none, in seconds.
    #[serde(default = "default_test_timeout")]
    pub default_test_timeout_secs: i64,
}

impl Default for OperationConfig {
    fn default() -> Self {
        Self {
            refresh_timeout_secs: default_refresh_timeout(),
            default_compile_timeout_secs: default_compile_timeout(),
            default_test_timeout_secs: default_test_timeout(),
        }
    }
}

const fn default_refresh_timeout() -> i64 {
    300
}

const fn default_compile_timeout() -> i64 {
    30
}

const fn default_test_timeout() -> i64 {
    60
}

/// Test filter configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// How `test_filter` and `test_filter_regex` combine when both are
    /// supplied: "intersection" or "union". The host's test runner applies
    /// the combination; this setting is forwarded alongside the filters.
    #[serde(default = "default_combine")]
    pub combine: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            combine: default_combine(),
        }
    }
}

fn default_combine() -> String {
    "intersection".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
