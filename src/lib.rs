//! yamu-mcp: MCP server and editor-state coordinator for Unity Editor automation
//!
//! This library fronts a single Unity Editor instance with a JSON-RPC 2.0
//! server over stdio, proxying the editor's three long-running operations
//! (asset refresh, script compilation and test execution) to a host that
//! can only perform one of them at a time.
//!
//! # Architecture
//!
//! - **Start-or-warn**: concurrent requests for editor operations never
//!   queue; exactly one caller drives the host while the rest receive an
//!   immediate warning result.
//! - **Always-responsive status**: compile/test/editor status snapshots
//!   are served from an in-process store on both the JSON-RPC channel and
//!   a plain HTTP mirror, byte-identically.
//! - **Bounded waits**: callers supply timeouts; expiry fails the caller
//!   without aborting the editor-side work, because cancellation is not
//!   guaranteed by the host.
//!
//! # Modules
//!
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Error types and the transient-failure classifier
//! - [`editor`] — Status store, operation coordinator, executor boundary
//! - [`http`] — HTTP status mirror
//! - [`mcp`] — MCP protocol implementation

pub mod config;
pub mod editor;
pub mod error;
pub mod http;
pub mod mcp;
