//! External wallet boundary
//!
//! The SDK never talks to a browser extension directly. Hosts implement
//! [`ExternalWallet`] over whatever provider they have (an EIP-1193 bridge,
//! a desktop signer) and the SDK drives the connection protocol.

use crate::error::WalletError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Provider error code for "this chain has not been added to the wallet"
pub const UNKNOWN_CHAIN_CODE: i64 = 4902;

/// Provider error code for "the user rejected the request"
pub const USER_REJECTED_CODE: i64 = 4001;

/// Network description handed to the wallet when registering a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    /// Hex chain id, e.g. `0xf22f`
    pub chain_id: String,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub native_currency: NativeCurrency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for ChainDescriptor {
    fn default() -> Self {
        Self::studio()
    }
}

impl ChainDescriptor {
    /// The public GenLayer Studio network (chain 62255)
    pub fn studio() -> Self {
        Self {
            chain_id: "0xf22f".to_string(),
            chain_name: "GenLayer Studio".to_string(),
            rpc_urls: vec!["https://studio.genlayer.com/api".to_string()],
            native_currency: NativeCurrency {
                name: "GEN".to_string(),
                symbol: "GEN".to_string(),
                decimals: 18,
            },
        }
    }
}

/// Outcome of asking the wallet to switch networks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainSwitch {
    Switched,
    /// The wallet does not know the chain yet; it must be registered first
    UnknownChain,
    Failed(WalletError),
}

impl ChainSwitch {
    /// Classify a provider error returned by a switch request
    pub fn from_provider_error(code: i64, message: impl Into<String>) -> Self {
        if code == UNKNOWN_CHAIN_CODE {
            ChainSwitch::UnknownChain
        } else {
            ChainSwitch::Failed(WalletError::from_provider_error(code, message))
        }
    }
}

impl WalletError {
    /// Classify a raw provider error code
    pub fn from_provider_error(code: i64, message: impl Into<String>) -> Self {
        if code == USER_REJECTED_CODE {
            WalletError::UserRejected
        } else {
            WalletError::Provider {
                code,
                message: message.into(),
            }
        }
    }
}

/// Host-supplied external signing capability
#[async_trait]
pub trait ExternalWallet: Send + Sync {
    /// Whether a wallet is installed on the host at all
    fn is_available(&self) -> bool;

    /// Ask the user to expose their accounts
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError>;

    /// Ask the wallet to switch to `chain_id`
    async fn switch_chain(&self, chain_id: &str) -> ChainSwitch;

    /// Register a network the wallet does not know yet
    async fn add_chain(&self, chain: &ChainDescriptor) -> Result<(), WalletError>;
}

/// Put the wallet on `chain`: switch, and register the chain only when the
/// wallet reports it as unknown. Any other failure ends the attempt.
pub async fn negotiate_network<W>(wallet: &W, chain: &ChainDescriptor) -> Result<(), WalletError>
where
    W: ExternalWallet + ?Sized,
{
    match wallet.switch_chain(&chain.chain_id).await {
        ChainSwitch::Switched => Ok(()),
        ChainSwitch::UnknownChain => {
            tracing::info!(chain_id = %chain.chain_id, "Chain unknown to wallet, registering it");
            wallet.add_chain(chain).await.map_err(|e| {
                tracing::warn!(chain_id = %chain.chain_id, error = %e, "Failed to add network");
                network_failure(e, chain)
            })
        }
        ChainSwitch::Failed(e) => {
            tracing::warn!(chain_id = %chain.chain_id, error = %e, "Failed to switch network");
            Err(network_failure(e, chain))
        }
    }
}

fn network_failure(err: WalletError, chain: &ChainDescriptor) -> WalletError {
    match err {
        WalletError::UserRejected => WalletError::UserRejected,
        _ => WalletError::NetworkMismatch(chain.chain_name.clone()),
    }
}
