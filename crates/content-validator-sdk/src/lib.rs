//! Content Validator SDK
//!
//! Client library for the content validator contract. Text is checked
//! locally, submitted as a contract write, polled until consensus
//! finalizes it, and read back as a normalized [`ValidationRecord`].
//!
//! # Architecture
//!
//! - [`identity`]: the single active signing identity, generated in-process
//!   or supplied by an external wallet
//! - [`session`]: contract calls bound to one identity, over any
//!   [`ContractBackend`]
//! - [`lifecycle`]: the submit-and-finalize controller
//! - [`normalize`], [`history`], [`score`]: turning wire records into
//!   results, statistics and display bands
//!
//! With the default `client` feature, [`client::RpcBackend`] talks to a
//! consensus node over JSON-RPC.
//!
//! # Example
//!
//! ```rust,ignore
//! use content_validator_sdk::{ContentValidator, SubmissionRequest, ValidatorConfig};
//!
//! let validator = ContentValidator::over_rpc(ValidatorConfig::default().with_env_overrides())?;
//!
//! let record = validator
//!     .submit_and_finalize(&SubmissionRequest::new(essay, 50))
//!     .await?;
//!
//! println!("{}: {} ({})", record.validation_id, record.score, record.band(70));
//! ```

// Error types
pub mod error;

// Configuration
pub mod config;

// Identity and external wallets
pub mod identity;

// Pre-flight checks
pub mod gate;

// Contract sessions and the backend seam
pub mod session;

// Wire record normalization
pub mod normalize;

// History and statistics
pub mod history;

// Score display helpers
pub mod score;

// Submit-and-finalize controller
pub mod lifecycle;

// JSON-RPC backend
#[cfg(feature = "client")]
pub mod client;

pub use config::{PollConfig, SubmissionLimits, ValidatorConfig};
pub use error::{
    BackendError, ConfigError, QueryError, SessionInitError, SubmissionError, ValidationError,
    WalletError,
};
pub use gate::SubmissionRequest;
pub use history::{compute_stats, HistoryFetch, HistoryFilter, HistoryStats, HistoryView};
pub use identity::{ChainDescriptor, ExternalWallet, Identity, IdentityProvider, SigningMeans};
pub use lifecycle::{ContentValidator, TransactionOutcome};
pub use normalize::{normalize, ValidationRecord};
pub use score::{short_address, ScoreBand};
pub use session::{
    ContractBackend, ContractCall, ContractRead, ContractSession, TransactionHandle,
    TransactionStatus,
};

#[cfg(feature = "client")]
pub use client::RpcBackend;

#[cfg(feature = "client")]
pub use validator_rpc_client::{RpcClient, RpcConfig};
