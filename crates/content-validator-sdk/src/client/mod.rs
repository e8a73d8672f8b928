//! JSON-RPC contract backend
//!
//! Adapts [`RpcClient`] to [`ContractBackend`] so a [`ContentValidator`]
//! can talk to a consensus node over HTTP.

use crate::config::ValidatorConfig;
use crate::error::{BackendError, ConfigError};
use crate::identity::IdentityProvider;
use crate::lifecycle::ContentValidator;
use crate::session::{ContractBackend, ContractCall, ContractRead, TransactionHandle, TransactionStatus};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use validator_rpc_client::{ContractCallParams, ContractReadParams, RpcClient, TransactionStatusResponse};

/// Result code reported for a terminal transaction the node gave no code for
pub const MISSING_RESULT_CODE: i64 = -1;

/// [`ContractBackend`] over the node's JSON-RPC API
pub struct RpcBackend {
    client: RpcClient,
}

impl RpcBackend {
    pub fn new(client: RpcClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let client = RpcClient::new(config.rpc.clone()).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(Self::new(client))
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }
}

#[async_trait]
impl ContractBackend for RpcBackend {
    async fn bind(&self, from: &str, to: &str) -> Result<(), BackendError> {
        Ok(self.client.bind_account(from, to).await?)
    }

    async fn submit(&self, call: ContractCall) -> Result<TransactionHandle, BackendError> {
        let hash = self
            .client
            .send_contract_call(&ContractCallParams {
                from: call.from,
                to: call.to,
                method: call.method,
                args: call.args,
                signature: call.signature,
            })
            .await?;
        Ok(TransactionHandle { hash })
    }

    async fn read(&self, read: ContractRead) -> Result<Value, BackendError> {
        Ok(self
            .client
            .call_contract(&ContractReadParams {
                from: read.from,
                to: read.to,
                method: read.method,
                args: read.args,
            })
            .await?)
    }

    async fn transaction_status(&self, tx_hash: &str) -> Result<TransactionStatus, BackendError> {
        let status = self.client.transaction_status(tx_hash).await?;
        Ok(status.map(status_from_response).unwrap_or(TransactionStatus::Pending))
    }
}

/// Map a node status report onto the lifecycle's view of it
pub fn status_from_response(response: TransactionStatusResponse) -> TransactionStatus {
    if !response.is_terminal() {
        return TransactionStatus::Pending;
    }

    match response.result_code {
        Some(result_code) => TransactionStatus::Terminal {
            result_code,
            result_label: response.result_label,
        },
        None => TransactionStatus::Terminal {
            result_code: MISSING_RESULT_CODE,
            result_label: Some(response.result_label.unwrap_or(response.status)),
        },
    }
}

impl ContentValidator<RpcBackend> {
    /// Controller over JSON-RPC with a freshly generated identity
    pub fn over_rpc(config: ValidatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let backend = Arc::new(RpcBackend::from_config(&config)?);
        let identity = IdentityProvider::new(config.reconnect_delay());
        Ok(ContentValidator::new(config, identity, backend))
    }
}
