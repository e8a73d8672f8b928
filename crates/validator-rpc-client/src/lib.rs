//! Rust JSON-RPC client for the content validator consensus node
//!
//! # Example
//!
//! ```rust,no_run
//! use validator_rpc_client::{ContractReadParams, RpcClient, RpcConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create client
//! let client = RpcClient::new(RpcConfig {
//!     endpoint: "http://localhost:4000/api".into(),
//!     ..Default::default()
//! })?;
//!
//! // Read contract state
//! let count = client
//!     .call_contract(&ContractReadParams {
//!         from: None,
//!         to: "0x7C09035EbBe5150cc9567D225b713aE0568373A6".into(),
//!         method: "get_validation_count".into(),
//!         args: vec![],
//!     })
//!     .await?;
//!
//! // Check on a submitted transaction
//! let status = client.transaction_status("0xabc123").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod types;

// Re-export main types
pub use client::RpcClient;
pub use error::{Result, RpcError};
pub use types::*;
