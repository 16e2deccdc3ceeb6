//! Prompt Catalog MCP Server
//!
//! A Model Context Protocol (MCP) server that publishes a catalog of reference
//! resources and prompt templates. The catalog is described by a manifest
//! (`index.json`) held in a content repository, either a local directory tree
//! or a remote versioned tree served over HTTPS.
//!
//! # Architecture
//!
//! 1. **Repository Layer** (`repository`) - manifest and content backends behind one trait
//! 2. **Catalog Layer** (`catalog`, `address`, `template`) - immutable catalog items,
//!    canonical addressing, argument schemas and template rendering
//! 3. **MCP Layer** (`mcp`) - dispatch table, protocol types, newline framing and
//!    request/reply correlation
//!
//! Startup is strictly sequential: the manifest is loaded, every item is
//! registered, and only then does the transport start reading requests.

pub mod address;
pub mod catalog;
pub mod config;
pub mod error;
pub mod mcp;
pub mod repository;
pub mod template;

pub use error::{Error, FetchError, Result};

/// Server version reported in `initialize`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name reported in `initialize`.
pub const SERVER_NAME: &str = "prompt-catalog";
