//! stdio transport for the MCP server.
//!
//! This module implements the stdio transport as specified by MCP:
//!
//! - Messages are UTF-8 encoded JSON-RPC
//! - Messages are delimited by newlines
//! - Messages must not contain embedded newlines
//! - stdin: receives messages from client
//! - stdout: sends messages to client
//! - stderr: may be used for logging (not MCP messages)
//!
//! # Concurrency
//!
//! Requests are dispatched on their own tasks so that status queries stay
//! responsive while a long editor operation is in flight. The write side
//! is therefore a cloneable [`MessageWriter`] backed by an mpsc channel
//! and drained by a single writer task: frames are written whole, in the
//! order their handlers complete, and flushed per line.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::mcp::protocol::JsonRpcResponse;

/// Reads newline-delimited frames from stdin.
pub struct FrameReader {
    reader: BufReader<tokio::io::Stdin>,
}

impl FrameReader {
    /// Creates a frame reader over the process stdin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
        }
    }

    /// Reads the next message line from stdin.
    ///
    /// Returns `None` if stdin is closed (EOF).
    ///
    /// # Errors
    ///
    /// Returns an error if reading from stdin fails.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let bytes_read = self.reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            // EOF - stdin closed
            return Ok(None);
        }

        // Remove the trailing newline
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }

        Ok(Some(line))
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable handle for writing response frames to stdout.
///
/// Every clone feeds the same writer task; a frame is serialised by the
/// sender and written atomically by the drain loop, so concurrent handlers
/// can never interleave bytes within a line.
#[derive(Clone)]
pub struct MessageWriter {
    tx: mpsc::UnboundedSender<String>,
}

impl MessageWriter {
    /// Creates a writer handle plus the drain task that owns stdout.
    ///
    /// The drain task ends when every [`MessageWriter`] clone has been
    /// dropped and the channel is empty.
    #[must_use]
    pub fn stdout() -> (Self, JoinHandle<io::Result<()>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(drain(rx, tokio::io::stdout()));
        (Self { tx }, handle)
    }

    /// Queues a JSON-RPC response frame for writing.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails or the writer task is gone.
    pub fn write_response(&self, response: &JsonRpcResponse) -> io::Result<()> {
        let json = serde_json::to_string(response)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        // MCP spec: messages must not contain embedded newlines
        debug_assert!(
            !json.contains('\n'),
            "JSON message must not contain embedded newlines"
        );

        self.tx
            .send(json)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "writer task closed"))
    }
}

/// Writes queued frames to the output, newline-terminated and flushed.
async fn drain<W>(mut rx: mpsc::UnboundedReceiver<String>, mut writer: W) -> io::Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    while let Some(json) = rx.recv().await {
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::RequestId;

    #[tokio::test]
    async fn serialise_response_no_newlines() {
        // Verify our JSON serialisation doesn't produce embedded newlines
        let response = JsonRpcResponse::success(
            RequestId::Number(1),
            serde_json::json!({
                "message": "hello world",
                "nested": {"key": "value"}
            }),
        );

        let json = serde_json::to_string(&response).unwrap();
        assert!(
            !json.contains('\n'),
            "Serialised JSON should not contain newlines"
        );
    }

    #[tokio::test]
    async fn drain_writes_whole_frames_in_order() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut out = std::io::Cursor::new(Vec::new());

        tx.send(r#"{"id":1}"#.to_string()).unwrap();
        tx.send(r#"{"id":2}"#.to_string()).unwrap();
        drop(tx);

        drain(rx, &mut out).await.unwrap();

        let written = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(written, "{\"id\":1}\n{\"id\":2}\n");
    }

    #[tokio::test]
    async fn writer_accepts_frames_from_clones() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let writer = MessageWriter { tx };
        let clone = writer.clone();

        clone
            .write_response(&JsonRpcResponse::success(
                RequestId::Number(7),
                serde_json::json!({}),
            ))
            .unwrap();

        let frame = rx.recv().await.unwrap();
        assert!(frame.contains(r#""id":7"#));
    }
}
