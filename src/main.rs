//! yamu-mcp: MCP server and editor-state coordinator for Unity Editor automation
//!
//! Speaks JSON-RPC 2.0 over stdio to MCP clients and mirrors editor status
//! over a local HTTP endpoint for synchronous polling.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use yamu_mcp::config;
use yamu_mcp::editor::coordinator::OperationCoordinator;
use yamu_mcp::editor::ops::FilterCombine;
use yamu_mcp::editor::status::StatusStore;
use yamu_mcp::editor::UnityEditorBridge;
use yamu_mcp::http;
use yamu_mcp::mcp::server::{McpServer, ToolDispatcher};

/// MCP server and editor-state coordinator for Unity Editor automation.
///
/// Proxies asset refresh, script compilation and test execution to a
/// running Unity Editor and serves status over JSON-RPC and HTTP.
#[derive(Parser, Debug)]
#[command(name = "yamu-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
///
/// Logs go to stderr: stdout carries protocol frames and nothing else.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point for the yamu-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration (a missing file yields defaults)
    let cfg = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting yamu-mcp server"
    );

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to create Tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(async {
        // Wire the editor bridge, status store and coordinator
        let bridge = UnityEditorBridge::new(&cfg.editor)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let status = Arc::new(StatusStore::new());
        let coordinator = Arc::new(OperationCoordinator::new(status, Arc::new(bridge)));
        let dispatcher = ToolDispatcher::new(Arc::clone(&coordinator), &cfg);

        // The HTTP mirror runs for the life of the process
        let mirror = http::MirrorState::new(
            coordinator,
            dispatcher.truncator().settings(),
            cfg.operation.clone(),
            FilterCombine::parse(&cfg.filters.combine),
        );
        let port = cfg.http.port;
        tokio::spawn(async move {
            if let Err(e) = http::serve(mirror, port).await {
                error!(error = %e, port, "HTTP status mirror failed");
            }
        });

        info!(editor = %cfg.editor.base_url, "MCP server ready, waiting for client connection...");

        let mut server = McpServer::new(dispatcher);
        server.run().await
    });

    match result {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
