//! Newline-delimited JSON-RPC framing.
//!
//! One message per line, UTF-8, `\n` terminated. The same framing is used by
//! the server (over stdio by default) and by [`crate::mcp::client::McpClient`].

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, Stdin, Stdout};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, error, trace};

use crate::error::{Error, Result};
use crate::mcp::protocol::{
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION,
};

/// Capacity of the inbound and outbound message queues.
const CHANNEL_CAPACITY: usize = 100;

/// A message that can be sent or received.
#[derive(Debug, Clone)]
pub enum Message {
    Request(JsonRpcRequest),
    Response(JsonRpcResponse),
    Notification(JsonRpcNotification),
    /// An inbound line that is not a JSON-RPC 2.0 message.
    Malformed { reason: String },
}

impl Message {
    fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

/// Classify one line of input.
pub fn decode_frame(line: &str) -> Message {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => return Message::malformed(format!("invalid JSON: {}", e)),
    };

    if value.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Message::malformed("missing or unsupported jsonrpc version");
    }

    let has_method = value.get("method").is_some();
    let has_id = value.get("id").is_some();

    let decoded = match (has_method, has_id) {
        (true, true) => serde_json::from_value(value).map(Message::Request),
        (true, false) => serde_json::from_value(value).map(Message::Notification),
        (false, true) => serde_json::from_value(value).map(Message::Response),
        (false, false) => return Message::malformed("message has neither method nor id"),
    };

    decoded.unwrap_or_else(|e| Message::malformed(e.to_string()))
}

/// Serialize an outbound message as one line (without the terminator).
pub fn encode_frame(message: &Message) -> Result<String> {
    let line = match message {
        Message::Request(req) => serde_json::to_string(req)?,
        Message::Response(res) => serde_json::to_string(res)?,
        Message::Notification(notif) => serde_json::to_string(notif)?,
        Message::Malformed { reason } => {
            return Err(Error::Framing(format!(
                "cannot encode malformed message: {}",
                reason
            )))
        }
    };
    Ok(line)
}

/// Transport trait for MCP communication.
#[async_trait]
pub trait Transport: Send {
    /// Start the transport, returning channels for messages.
    async fn start(&mut self) -> Result<(mpsc::Receiver<Message>, mpsc::Sender<Message>)>;

    /// Stop the transport at once, discarding anything not yet written.
    async fn stop(&mut self) -> Result<()>;

    /// Finish after the outbound sender has been dropped: every queued
    /// message is written before this returns.
    async fn close(&mut self) -> Result<()>;
}

/// Line-framed transport over any byte stream pair.
pub struct StreamTransport<R, W> {
    io: Option<(R, W)>,
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

/// Stdio transport for MCP.
pub type StdioTransport = StreamTransport<Stdin, Stdout>;

impl StdioTransport {
    /// Transport over the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Some((reader, writer)),
            reader: None,
            writer: None,
        }
    }
}

#[async_trait]
impl<R, W> Transport for StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn start(&mut self) -> Result<(mpsc::Receiver<Message>, mpsc::Sender<Message>)> {
        let (reader, writer) = self
            .io
            .take()
            .ok_or_else(|| Error::Internal("transport already started".to_string()))?;

        let (incoming_tx, incoming_rx) = mpsc::channel::<Message>(CHANNEL_CAPACITY);
        let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<Message>(CHANNEL_CAPACITY);

        self.reader = Some(tokio::spawn(async move {
            let mut lines = FramedRead::new(reader, LinesCodec::new());
            while let Some(line) = lines.next().await {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        error!("Error reading input: {}", e);
                        break;
                    }
                };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                trace!("Received: {}", trimmed);
                if incoming_tx.send(decode_frame(trimmed)).await.is_err() {
                    break;
                }
            }
            debug!("Input closed, stopping transport");
        }));

        self.writer = Some(tokio::spawn(async move {
            let mut sink = FramedWrite::new(writer, LinesCodec::new());
            while let Some(message) = outgoing_rx.recv().await {
                let line = match encode_frame(&message) {
                    Ok(line) => line,
                    Err(e) => {
                        error!("Error serializing message: {}", e);
                        continue;
                    }
                };
                trace!("Sending: {}", line);
                if let Err(e) = sink.send(line).await {
                    error!("Error writing output: {}", e);
                    break;
                }
            }
        }));

        Ok((incoming_rx, outgoing_tx))
    }

    async fn stop(&mut self) -> Result<()> {
        for task in [self.reader.take(), self.writer.take()].into_iter().flatten() {
            task.abort();
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if let Some(writer) = self.writer.take() {
            writer
                .await
                .map_err(|e| Error::Internal(format!("output task failed: {}", e)))?;
        }
        debug!("Output flushed, transport closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::RequestId;
    use serde_json::json;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    #[test]
    fn test_decode_request() {
        match decode_frame(r#"{"jsonrpc":"2.0","id":7,"method":"resources/list"}"#) {
            Message::Request(req) => {
                assert_eq!(req.id, RequestId::Number(7));
                assert_eq!(req.method, "resources/list");
                assert!(req.params.is_none());
            }
            other => panic!("Expected request, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_notification() {
        assert!(matches!(
            decode_frame(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#),
            Message::Notification(_)
        ));
    }

    #[test]
    fn test_decode_response() {
        match decode_frame(r#"{"jsonrpc":"2.0","id":"a","result":{}}"#) {
            Message::Response(res) => {
                assert_eq!(res.id, RequestId::String("a".to_string()));
                assert_eq!(res.result, Some(json!({})));
            }
            other => panic!("Expected response, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_malformed() {
        for line in [
            "not json",
            r#"{"id":1,"method":"ping"}"#,
            r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#,
            r#"{"jsonrpc":"2.0"}"#,
            r#"{"jsonrpc":"2.0","id":1,"method":42}"#,
        ] {
            assert!(
                matches!(decode_frame(line), Message::Malformed { .. }),
                "{} should be malformed",
                line
            );
        }
    }

    #[test]
    fn test_encode_is_single_line() {
        let message = Message::Response(JsonRpcResponse::success(
            RequestId::Number(1),
            json!({ "text": "line one\nline two" }),
        ));
        let line = encode_frame(&message).unwrap();
        assert!(!line.contains('\n'));
        assert!(encode_frame(&Message::malformed("x")).is_err());
    }

    #[tokio::test]
    async fn test_stream_transport_round_trip() {
        let (client, server) = tokio::io::duplex(4096);
        let (server_read, server_write) = tokio::io::split(server);
        let (client_read, mut client_write) = tokio::io::split(client);

        let mut transport = StreamTransport::new(server_read, server_write);
        let (mut incoming, outgoing) = transport.start().await.unwrap();
        assert!(transport.start().await.is_err());

        client_write
            .write_all(b"\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n")
            .await
            .unwrap();
        match incoming.recv().await.unwrap() {
            Message::Request(req) => assert_eq!(req.method, "ping"),
            other => panic!("Expected request, got {:?}", other),
        }

        outgoing
            .send(Message::Response(JsonRpcResponse::success(
                RequestId::Number(1),
                json!({}),
            )))
            .await
            .unwrap();
        let mut lines = BufReader::new(client_read).lines();
        let line = lines.next_line().await.unwrap().unwrap();
        assert_eq!(line, r#"{"jsonrpc":"2.0","id":1,"result":{}}"#);

        drop(lines);
        drop(client_write);
        assert!(incoming.recv().await.is_none());
        transport.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_writes_every_queued_reply() {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (client_read, mut client_write) = tokio::io::split(client);

        let batch: String = (1..=50)
            .map(|id| format!("{{\"jsonrpc\":\"2.0\",\"id\":{},\"method\":\"ping\"}}\n", id))
            .collect();
        client_write.write_all(batch.as_bytes()).await.unwrap();
        client_write.shutdown().await.unwrap();

        let mut transport = StreamTransport::new(server_read, server_write);
        let (mut incoming, outgoing) = transport.start().await.unwrap();
        while let Some(message) = incoming.recv().await {
            if let Message::Request(req) = message {
                outgoing
                    .send(Message::Response(JsonRpcResponse::success(req.id, json!({}))))
                    .await
                    .unwrap();
            }
        }
        drop(outgoing);
        transport.close().await.unwrap();

        let mut lines = BufReader::new(client_read).lines();
        for id in 1..=50 {
            let line = lines.next_line().await.unwrap().unwrap();
            assert_eq!(line, format!("{{\"jsonrpc\":\"2.0\",\"id\":{},\"result\":{{}}}}", id));
        }
        assert!(lines.next_line().await.unwrap().is_none());
    }
}
