//! Contract session bound to one identity
//!
//! A [`ContractSession`] pairs an identity snapshot with the contract address
//! and a [`ContractBackend`]. It never looks the identity up again: when the
//! provider's epoch moves on, the session is stale and must be rebuilt.

use crate::error::{BackendError, SessionInitError};
use crate::identity::{is_valid_address, Identity, IdentitySnapshot, SigningMeans};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Contract method names
pub mod methods {
    pub const VALIDATE_CONTENT: &str = "validate_content";
    pub const GET_VALIDATION: &str = "get_validation";
    pub const GET_USER_VALIDATIONS: &str = "get_user_validations";
    pub const GET_VALIDATION_COUNT: &str = "get_validation_count";
    pub const GET_LATEST_VALIDATION_ID: &str = "get_latest_validation_id";
}

/// Receipt for a submitted write, opaque until it finalizes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionHandle {
    pub hash: String,
}

/// What a status check reports about a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Terminal {
        result_code: i64,
        result_label: Option<String>,
    },
}

/// A state-changing call as handed to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractCall {
    pub from: String,
    pub to: String,
    pub method: String,
    pub args: Vec<Value>,
    /// Hex Ed25519 signature over [`signing_payload`], for generated identities
    pub signature: Option<String>,
}

/// A read-only query as handed to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRead {
    pub from: Option<String>,
    pub to: String,
    pub method: String,
    pub args: Vec<Value>,
}

/// Transport to the node executing the contract
#[async_trait]
pub trait ContractBackend: Send + Sync {
    /// Accept `from` as a caller of contract `to`. Backends without a
    /// binding step accept everything.
    async fn bind(&self, from: &str, to: &str) -> Result<(), BackendError> {
        let _ = (from, to);
        Ok(())
    }

    /// Submit a write; returns once the node acknowledged it
    async fn submit(&self, call: ContractCall) -> Result<TransactionHandle, BackendError>;

    /// Read current contract state
    async fn read(&self, read: ContractRead) -> Result<Value, BackendError>;

    /// Report where a submitted transaction stands
    async fn transaction_status(&self, tx_hash: &str) -> Result<TransactionStatus, BackendError>;
}

/// Canonical bytes signed for a write call
pub fn signing_payload(to: &str, method: &str, args: &[Value]) -> Vec<u8> {
    // serde_json objects keep keys sorted, so the encoding is stable
    let payload = serde_json::json!({
        "to": to,
        "method": method,
        "args": args,
    });
    payload.to_string().into_bytes()
}

/// Handle for calls against one contract from one identity
pub struct ContractSession<B: ContractBackend + ?Sized> {
    identity: Identity,
    epoch: u64,
    contract: Option<String>,
    backend: Arc<B>,
}

impl<B: ContractBackend + ?Sized> ContractSession<B> {
    /// Bind a session to an identity snapshot and contract.
    ///
    /// A missing contract address still yields a session so callers can
    /// report the misconfiguration themselves; a malformed one does not.
    pub async fn bind(
        snapshot: Option<IdentitySnapshot>,
        contract: Option<String>,
        backend: Arc<B>,
    ) -> Result<Self, SessionInitError> {
        let IdentitySnapshot { identity, epoch } = snapshot.ok_or(SessionInitError::NoIdentity)?;

        if !is_valid_address(identity.address()) {
            return Err(SessionInitError::MalformedAddress(identity.address().to_string()));
        }

        if let Some(ref to) = contract {
            if !is_valid_address(to) {
                return Err(SessionInitError::MalformedAddress(to.clone()));
            }
            backend
                .bind(identity.address(), to)
                .await
                .map_err(|e| SessionInitError::BackendRejected(e.to_string()))?;
        }

        tracing::debug!(
            address = %identity.address(),
            epoch = epoch,
            contract = ?contract,
            "Contract session bound"
        );

        Ok(Self {
            identity,
            epoch,
            contract,
            backend,
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Epoch of the identity this session was bound to
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn contract_address(&self) -> Option<&str> {
        self.contract.as_deref()
    }

    /// Whether the identity has changed since binding
    pub fn is_stale(&self, current_epoch: u64) -> bool {
        self.epoch != current_epoch
    }

    /// Issue a state-changing call
    pub async fn call(&self, method: &str, args: Vec<Value>) -> Result<TransactionHandle, BackendError> {
        let to = self.require_contract()?;

        let signature = match self.identity.signing_means() {
            SigningMeans::GeneratedKey => self.identity.sign(&signing_payload(to, method, &args)),
            SigningMeans::ExternalWallet => None,
        };

        self.backend
            .submit(ContractCall {
                from: self.identity.address().to_string(),
                to: to.to_string(),
                method: method.to_string(),
                args,
                signature,
            })
            .await
    }

    /// Read contract state
    pub async fn query(&self, method: &str, args: Vec<Value>) -> Result<Value, BackendError> {
        let to = self.require_contract()?;

        self.backend
            .read(ContractRead {
                from: Some(self.identity.address().to_string()),
                to: to.to_string(),
                method: method.to_string(),
                args,
            })
            .await
    }

    /// Check on a submitted transaction
    pub async fn transaction_status(&self, handle: &TransactionHandle) -> Result<TransactionStatus, BackendError> {
        self.backend.transaction_status(&handle.hash).await
    }

    fn require_contract(&self) -> Result<&str, BackendError> {
        self.contract
            .as_deref()
            .ok_or_else(|| BackendError::Rejected("contract address not configured".into()))
    }
}

impl<B: ContractBackend + ?Sized> std::fmt::Debug for ContractSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractSession")
            .field("identity", &self.identity)
            .field("epoch", &self.epoch)
            .field("contract", &self.contract)
            .finish()
    }
}
