//! Model Context Protocol (MCP) server implementation.
//!
//! This module implements the MCP surface for driving long-running editor
//! operations as tools. The server communicates over stdio transport
//! using JSON-RPC 2.0 messages, one frame per line.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          MCP Server                          │
//! │                                                              │
//! │   ┌─────────────┐    ┌──────────────┐    ┌───────────────┐   │
//! │   │  Transport  │───▶│  Dispatcher  │───▶│  Coordinator  │   │
//! │   │   (stdio)   │    │ (tool calls) │    │  (one slot)   │   │
//! │   └─────────────┘    └──────────────┘    └───────────────┘   │
//! │          │                  │                                │
//! │          ▼                  ▼                                │
//! │   ┌──────────────────────────────────┐   ┌───────────────┐   │
//! │   │        JSON-RPC Messages         │   │   Truncator   │   │
//! │   └──────────────────────────────────┘   └───────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each inbound request runs on its own task: a status query answers
//! immediately even while a compile or test run holds the execution slot.
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod protocol;
pub mod server;
pub mod transport;
pub mod truncate;

pub use protocol::{JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION};
pub use server::{McpServer, ToolDispatcher};
pub use transport::{FrameReader, MessageWriter};
pub use truncate::ResponseTruncator;
