//! Error types for the prompt catalog server.

use thiserror::Error;

use crate::mcp::protocol::error_codes;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a backend could not supply content for an address.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("not found: {address}")]
    NotFound { address: String },

    #[error("transport failure fetching {address}: {reason}")]
    Transport { address: String, reason: String },
}

/// Main error type for the catalog server.
#[derive(Error, Debug)]
pub enum Error {
    // ===== Load-time Errors =====
    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Registration of '{name}' failed: {reason}")]
    Registration { name: String, reason: String },

    // ===== Request-time Errors =====
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid prompt arguments: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    // ===== Protocol Errors =====
    #[error("Framing error: {0}")]
    Framing(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Remote error {code}: {message}")]
    Rpc { code: i32, message: String },

    // ===== I/O Errors =====
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ===== Internal Errors =====
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a registration error for a named catalog item.
    pub fn registration(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Registration {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a not-found fetch error.
    pub fn not_found(address: impl Into<String>) -> Self {
        Self::Fetch(FetchError::NotFound {
            address: address.into(),
        })
    }

    /// Create a transport fetch error.
    pub fn transport(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch(FetchError::Transport {
            address: address.into(),
            reason: reason.into(),
        })
    }

    /// JSON-RPC error code used when this error is returned as a reply.
    pub fn rpc_code(&self) -> i32 {
        match self {
            Self::Validation(_) | Self::InvalidParams(_) | Self::PromptNotFound(_) => {
                error_codes::INVALID_PARAMS
            }
            Self::MethodNotFound(_) => error_codes::METHOD_NOT_FOUND,
            Self::ResourceNotFound(_) | Self::Fetch(FetchError::NotFound { .. }) => {
                error_codes::RESOURCE_NOT_FOUND
            }
            Self::Framing(_) => error_codes::PARSE_ERROR,
            Self::Rpc { code, .. } => *code,
            _ => error_codes::INTERNAL_ERROR,
        }
    }

    /// Whether this error must abort startup.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Manifest(_) | Self::Config(_))
    }
}
