//! MCP client over a line-framed byte stream.
//!
//! Replies are matched to requests in strict FIFO order: the server answers
//! one request at a time, in the order they were written, so each inbound
//! reply belongs to the oldest outstanding request. Concurrent out-of-order
//! servers would need an id-keyed waiter map instead.

use futures::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::mcp::prompts::{GetPromptResult, ListPromptsResult};
use crate::mcp::protocol::{
    InitializeResult, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId,
    JSONRPC_VERSION, MCP_VERSION,
};
use crate::mcp::resources::{ListResourcesResult, ReadResourceResult};
use crate::mcp::transport::{decode_frame, encode_frame, Message};
use crate::{SERVER_NAME, VERSION};

type Writer = FramedWrite<Box<dyn AsyncWrite + Send + Unpin>, LinesCodec>;
type Reply = Result<JsonRpcResponse>;

/// A request waiting for its reply.
#[derive(Debug)]
struct PendingRequest {
    id: RequestId,
    reply: oneshot::Sender<Reply>,
}

type PendingQueue = Arc<Mutex<VecDeque<PendingRequest>>>;

/// Client side of an MCP connection.
pub struct McpClient {
    writer: Mutex<Writer>,
    pending: PendingQueue,
    dropped: Arc<AtomicUsize>,
    next_id: AtomicI64,
    reader: JoinHandle<()>,
}

impl McpClient {
    /// Attach to a server through `reader`/`writer` and start reading replies.
    pub fn connect<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let pending = PendingQueue::default();
        let dropped = Arc::new(AtomicUsize::new(0));
        let boxed: Box<dyn AsyncWrite + Send + Unpin> = Box::new(writer);

        Self {
            writer: Mutex::new(FramedWrite::new(boxed, LinesCodec::new())),
            pending: pending.clone(),
            dropped: dropped.clone(),
            next_id: AtomicI64::new(1),
            reader: tokio::spawn(read_replies(reader, pending, dropped)),
        }
    }

    /// Number of requests still waiting for a reply.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Number of replies discarded because no request was waiting.
    pub fn dropped_count(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    /// Send a request and wait for its result.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let line = encode_frame(&Message::Request(JsonRpcRequest::new(
            id.clone(),
            method,
            params,
        )))?;
        self.send_line(id, line).await
    }

    /// Write `line` verbatim and wait for the next reply.
    pub async fn send_raw(&self, line: impl Into<String>) -> Result<Value> {
        self.send_line(RequestId::Null, line.into()).await
    }

    async fn send_line(&self, id: RequestId, line: String) -> Result<Value> {
        let (tx, rx) = oneshot::channel();
        {
            // Holding the writer keeps queue order equal to write order.
            let mut writer = self.writer.lock().await;
            self.pending
                .lock()
                .await
                .push_back(PendingRequest { id: id.clone(), reply: tx });
            debug!("Sending request {}", id);
            if let Err(e) = writer.send(line).await {
                self.pending.lock().await.pop_back();
                return Err(Error::Framing(format!("cannot write request {}: {}", id, e)));
            }
        }

        let response = rx
            .await
            .map_err(|_| Error::Framing(format!("request {} was abandoned", id)))??;

        match response.error {
            Some(error) => Err(Error::Rpc {
                code: error.code,
                message: error.message,
            }),
            None => Ok(response.result.unwrap_or(Value::Null)),
        }
    }

    /// Send a notification; no reply is expected.
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        let line = encode_frame(&Message::Notification(JsonRpcNotification {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
        }))?;
        self.writer
            .lock()
            .await
            .send(line)
            .await
            .map_err(|e| Error::Framing(format!("cannot write notification: {}", e)))
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Option<Value>) -> Result<T> {
        let result = self.request(method, params).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Perform the initialize handshake.
    pub async fn initialize(&self) -> Result<InitializeResult> {
        let result = self
            .call(
                "initialize",
                Some(json!({
                    "protocolVersion": MCP_VERSION,
                    "capabilities": {},
                    "clientInfo": { "name": format!("{}-client", SERVER_NAME), "version": VERSION }
                })),
            )
            .await?;
        self.notify("notifications/initialized", None).await?;
        Ok(result)
    }

    pub async fn ping(&self) -> Result<()> {
        self.request("ping", None).await.map(|_| ())
    }

    pub async fn list_resources(&self) -> Result<ListResourcesResult> {
        self.call("resources/list", None).await
    }

    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult> {
        self.call("resources/read", Some(json!({ "uri": uri }))).await
    }

    pub async fn list_prompts(&self) -> Result<ListPromptsResult> {
        self.call("prompts/list", None).await
    }

    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: HashMap<String, Value>,
    ) -> Result<GetPromptResult> {
        self.call(
            "prompts/get",
            Some(json!({ "name": name, "arguments": arguments })),
        )
        .await
    }
}

impl Drop for McpClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_replies<R>(reader: R, pending: PendingQueue, dropped: Arc<AtomicUsize>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = FramedRead::new(reader, LinesCodec::new());

    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Error reading replies: {}", e);
                break;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let reply = match decode_frame(trimmed) {
            Message::Response(response) => Ok(response),
            Message::Malformed { reason } => Err(Error::Framing(reason)),
            Message::Notification(notif) => {
                debug!("Received notification: {}", notif.method);
                continue;
            }
            Message::Request(req) => {
                warn!("Ignoring request from server: {}", req.method);
                continue;
            }
        };

        let Some(waiter) = pending.lock().await.pop_front() else {
            warn!("Dropping reply with no pending request: {}", trimmed);
            dropped.fetch_add(1, Ordering::SeqCst);
            continue;
        };
        if let Ok(response) = &reply {
            if response.id != waiter.id && response.id != RequestId::Null {
                warn!(
                    "Reply id {} does not match oldest pending request {}",
                    response.id, waiter.id
                );
            }
        }
        if waiter.reply.send(reply).is_err() {
            debug!("Request {} was no longer awaited", waiter.id);
        }
    }

    for waiter in pending.lock().await.drain(..) {
        let _ = waiter
            .reply
            .send(Err(Error::Framing("connection closed".to_string())));
    }
}
