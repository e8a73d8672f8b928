//! Error types for the RPC client

use thiserror::Error;

/// RPC client error
#[derive(Debug, Error)]
pub enum RpcError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a non-success HTTP status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Node returned a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Response did not match the JSON-RPC envelope
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client could not be built from its configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for RPC operations
pub type Result<T> = std::result::Result<T, RpcError>;
