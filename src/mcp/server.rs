//! MCP server implementation.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::mcp::handler::CatalogHandler;
use crate::mcp::prompts::ListPromptsResult;
use crate::mcp::protocol::*;
use crate::mcp::resources::ListResourcesResult;
use crate::mcp::transport::{Message, Transport};
use crate::repository::ContentRepository;
use crate::{SERVER_NAME, VERSION};

/// MCP server.
pub struct McpServer {
    handler: CatalogHandler,
    name: String,
    version: String,
}

#[derive(Deserialize)]
struct ReadResourceParams {
    uri: String,
}

#[derive(Deserialize)]
struct GetPromptParams {
    name: String,
    #[serde(default)]
    arguments: Option<HashMap<String, Value>>,
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T> {
    let params = params.ok_or_else(|| Error::InvalidParams("Missing params".to_string()))?;
    serde_json::from_value(params).map_err(|e| Error::InvalidParams(e.to_string()))
}

impl McpServer {
    /// Create a server around an already registered handler.
    pub fn new(handler: CatalogHandler) -> Self {
        Self {
            handler,
            name: SERVER_NAME.to_string(),
            version: VERSION.to_string(),
        }
    }

    /// Load the manifest, build the catalog and register every item.
    ///
    /// Only manifest failures are returned; defective items are skipped.
    pub async fn bootstrap(mut repository: Box<dyn ContentRepository>) -> Result<Self> {
        info!("Initialising repository at {}", repository.location());
        repository.init().await?;

        let repository: Arc<dyn ContentRepository> = Arc::from(repository);
        let catalog = Catalog::load(repository.as_ref());
        info!(
            "Loaded catalog with {} resources and {} prompts",
            catalog.resources().len(),
            catalog.prompts().len()
        );

        let mut handler = CatalogHandler::new(repository);
        handler.register_catalog(&catalog);
        Ok(Self::new(handler))
    }

    pub fn handler(&self) -> &CatalogHandler {
        &self.handler
    }

    /// Run the server with the given transport until the input ends.
    pub async fn run<T: Transport>(&self, transport: &mut T) -> Result<()> {
        info!("Starting MCP server: {} v{}", self.name, self.version);

        let (mut incoming, outgoing) = transport.start().await?;

        while let Some(msg) = incoming.recv().await {
            let reply = match msg {
                Message::Request(req) => self.handle_request(req).await,
                Message::Notification(notif) => {
                    self.handle_notification(notif);
                    continue;
                }
                Message::Response(res) => {
                    warn!("Received unexpected response (id: {})", res.id);
                    continue;
                }
                Message::Malformed { reason } => {
                    warn!("Rejecting malformed message: {}", reason);
                    JsonRpcResponse::failure(
                        RequestId::Null,
                        error_codes::PARSE_ERROR,
                        format!("Parse error: {}", reason),
                    )
                }
            };

            if outgoing.send(Message::Response(reply)).await.is_err() {
                error!("Failed to send response");
                break;
            }
        }

        info!("MCP server stopped");
        Ok(())
    }

    /// Handle a JSON-RPC request.
    pub async fn handle_request(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling request: {} (id: {})", req.method, req.id);

        let result = match req.method.as_str() {
            // Core
            "initialize" => self.handle_initialize(),
            "ping" => Ok(serde_json::json!({})),
            // Resources
            "resources/list" => self.handle_list_resources(),
            "resources/read" => self.handle_read_resource(req.params).await,
            "resources/templates/list" => Ok(serde_json::json!({ "resourceTemplates": [] })),
            // Prompts
            "prompts/list" => self.handle_list_prompts(),
            "prompts/get" => self.handle_get_prompt(req.params).await,
            // Unknown
            _ => Err(Error::MethodNotFound(req.method.clone())),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(req.id, value),
            Err(e) => {
                warn!("Request {} ({}) failed: {}", req.id, req.method, e);
                JsonRpcResponse::failure(req.id, e.rpc_code(), e.to_string())
            }
        }
    }

    /// Handle a notification.
    fn handle_notification(&self, notif: JsonRpcNotification) {
        match notif.method.as_str() {
            "notifications/initialized" => info!("Client initialized"),
            "notifications/cancelled" => {
                debug!("Ignoring cancellation; requests are served in order")
            }
            _ => debug!("Unknown notification: {}", notif.method),
        }
    }

    fn handle_initialize(&self) -> Result<Value> {
        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                resources: Some(ResourcesCapability {
                    subscribe: false,
                    list_changed: false,
                }),
                prompts: Some(PromptsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: self.name.clone(),
                version: self.version.clone(),
            },
        };

        Ok(serde_json::to_value(result)?)
    }

    fn handle_list_resources(&self) -> Result<Value> {
        let result = ListResourcesResult {
            resources: self.handler.list_resources(),
            next_cursor: None,
        };
        Ok(serde_json::to_value(result)?)
    }

    async fn handle_read_resource(&self, params: Option<Value>) -> Result<Value> {
        let params: ReadResourceParams = parse_params(params)?;
        let result = self.handler.read_resource(&params.uri).await?;
        Ok(serde_json::to_value(result)?)
    }

    fn handle_list_prompts(&self) -> Result<Value> {
        let result = ListPromptsResult {
            prompts: self.handler.list_prompts(),
            next_cursor: None,
        };
        Ok(serde_json::to_value(result)?)
    }

    async fn handle_get_prompt(&self, params: Option<Value>) -> Result<Value> {
        let params: GetPromptParams = parse_params(params)?;
        let arguments = params.arguments.unwrap_or_default();
        let result = self.handler.get_prompt(&params.name, &arguments).await?;
        Ok(serde_json::to_value(result)?)
    }
}
