//! Model Context Protocol (MCP) implementation.
//!
//! # Architecture
//!
//! - `protocol` - JSON-RPC and MCP message definitions
//! - `transport` - newline-delimited framing (stdio by default)
//! - `handler` - dispatch table serving catalog resources and prompts
//! - `server` - method dispatch and the request loop
//! - `client` - client side with FIFO reply correlation
//! - `resources`, `prompts` - result payloads

pub mod client;
pub mod handler;
pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod transport;

pub use client::McpClient;
pub use handler::CatalogHandler;
pub use protocol::*;
pub use server::McpServer;
pub use transport::{StdioTransport, StreamTransport, Transport};
