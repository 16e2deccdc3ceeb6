//! Prompt Catalog MCP Server
//!
//! Serves the resources and prompt templates listed in a catalog manifest over
//! MCP on stdio.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use prompt_catalog::config::{Args, Config};
use prompt_catalog::error::{Error, Result};
use prompt_catalog::mcp::server::McpServer;
use prompt_catalog::mcp::transport::{StdioTransport, Transport};
use prompt_catalog::repository;
use prompt_catalog::VERSION;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = Config::try_from(args)?;

    // Initialize logging; stdout carries the protocol
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| Error::Config(format!("invalid log level: {}", e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| Error::Internal(format!("failed to set tracing subscriber: {}", e)))?;

    info!("Prompt Catalog MCP Server v{}", VERSION);

    let repository = repository::create(&config.repository)?;
    let server = McpServer::bootstrap(repository).await?;

    let mut transport = StdioTransport::stdio();
    let finished = tokio::select! {
        result = server.run(&mut transport) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    match finished {
        Some(result) => {
            // Input ended: write out every reply already produced
            transport.close().await?;
            result?;
        }
        None => {
            info!("Received Ctrl-C, shutting down");
            transport.stop().await?;
        }
    }

    Ok(())
}
