//! Error types for the content validator SDK
//!
//! One enum per boundary. Every variant renders a message that can be shown
//! to the user as-is.

use thiserror::Error;

/// Client-side rejection of a submission; nothing was sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter some content to validate")]
    EmptyContent,

    #[error("Content must have at least {need} words. Current: {have}")]
    TooFewWords { have: usize, need: usize },

    #[error("Content exceeds maximum length of {max} characters (has {have})")]
    TooLong { have: usize, max: usize },

    #[error("Minimum words must be greater than 0")]
    InvalidThreshold,
}

/// Failure to bind a contract session to the active identity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionInitError {
    #[error("No active identity to bind the session to")]
    NoIdentity,

    #[error("Malformed address: {0}")]
    MalformedAddress(String),

    #[error("Failed to initialize client: {0}")]
    BackendRejected(String),
}

/// Failure of a submit-and-finalize run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Client not initialized: {0}")]
    NotReady(String),

    #[error("Contract address not configured. Set CONTRACT_ADDRESS in the environment")]
    Misconfigured,

    #[error("Transaction failed: {0}")]
    BackendRejected(String),

    #[error("Transaction {tx_hash} was not finalized after {attempts} status checks; verify it manually")]
    TimedOut { tx_hash: String, attempts: u32 },

    #[error("No validation ID returned")]
    NoIdReturned,

    #[error("Identity changed while transaction {tx_hash} was in flight; result discarded")]
    Abandoned { tx_hash: String },

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl SubmissionError {
    /// Transaction hash to follow up on out-of-band, when one is known
    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            SubmissionError::TimedOut { tx_hash, .. } | SubmissionError::Abandoned { tx_hash } => {
                Some(tx_hash)
            }
            _ => None,
        }
    }
}

/// Failure on the read path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Client not initialized")]
    NotReady,

    #[error("Contract address not configured")]
    Misconfigured,

    #[error("{0} is required")]
    MissingArgument(&'static str),

    #[error("Failed to query {method}: {reason}")]
    Backend { method: String, reason: String },

    #[error("Unexpected response from {method}: {detail}")]
    UnexpectedShape { method: String, detail: String },
}

/// Failure while connecting an external wallet
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("No external wallet installed")]
    WalletUnavailable,

    #[error("Wallet request rejected by the user")]
    UserRejected,

    #[error("Please switch to the {0} network in your wallet")]
    NetworkMismatch(String),

    #[error("Wallet returned no accounts")]
    NoAccounts,

    #[error("Wallet returned a malformed address: {0}")]
    InvalidAddress(String),

    #[error("Wallet error {code}: {message}")]
    Provider { code: i64, message: String },
}

/// Transport failure reported by a contract backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend rejected request: {0}")]
    Rejected(String),

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),
}

/// Invalid or unreadable configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(feature = "client")]
impl From<validator_rpc_client::RpcError> for BackendError {
    fn from(err: validator_rpc_client::RpcError) -> Self {
        use validator_rpc_client::RpcError;
        match err {
            RpcError::Http(e) => BackendError::Network(e.to_string()),
            RpcError::Server { status, message } => {
                BackendError::Network(format!("HTTP {} - {}", status, message))
            }
            RpcError::Rpc { message, .. } => BackendError::Rejected(message),
            other => BackendError::InvalidResponse(other.to_string()),
        }
    }
}
