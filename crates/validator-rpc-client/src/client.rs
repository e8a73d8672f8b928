//! HTTP client for the consensus node JSON-RPC API

use crate::error::{Result, RpcError};
use crate::types::*;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// HTTP client for the consensus node JSON-RPC API
///
/// # Example
///
/// ```rust,no_run
/// use validator_rpc_client::{RpcClient, RpcConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RpcClient::new(RpcConfig::default())?;
///
/// // Poll a transaction
/// if let Some(status) = client.transaction_status("0xabc123").await? {
///     println!("status: {}", status.status);
/// }
/// # Ok(())
/// # }
/// ```
pub struct RpcClient {
    config: RpcConfig,
    client: Client,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a new RPC client
    pub fn new(config: RpcConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RpcError::Config(e.to_string()))?;

        Ok(Self {
            config,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    // ==================== Contract API ====================

    /// Ask the node to accept `from` as a caller of contract `to`
    pub async fn bind_account(&self, from: &str, to: &str) -> Result<()> {
        let params = [BindAccountParams {
            from: from.to_string(),
            to: to.to_string(),
        }];
        let _: serde_json::Value = self
            .request(&self.config.methods.bind_account, &params)
            .await?;
        Ok(())
    }

    /// Submit a state-changing contract call, returning the transaction hash
    pub async fn send_contract_call(&self, params: &ContractCallParams) -> Result<String> {
        let hash: Option<String> = self
            .request(&self.config.methods.send_contract_call, [params])
            .await?;

        match hash {
            Some(hash) if !hash.is_empty() => Ok(hash),
            _ => Err(RpcError::InvalidResponse(
                "node acknowledged the call without a transaction hash".to_string(),
            )),
        }
    }

    /// Read contract state
    pub async fn call_contract(&self, params: &ContractReadParams) -> Result<serde_json::Value> {
        self.request(&self.config.methods.call, [params]).await
    }

    /// Get the status of a submitted transaction, `None` while the node does not know it yet
    pub async fn transaction_status(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TransactionStatusResponse>> {
        self.request(&self.config.methods.transaction_status, [tx_hash])
            .await
    }

    // ==================== Helper Methods ====================

    async fn request<P: Serialize, T: DeserializeOwned>(&self, method: &str, params: P) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = JsonRpcRequest::new(id, method, params);

        tracing::debug!(method = method, id = id, "Sending JSON-RPC request");

        let response = self
            .client
            .post(&self.config.endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        let envelope = self.handle_response(response).await?;
        decode_envelope(envelope, id)
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<JsonRpcResponse> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RpcError::Server {
                status,
                message: body,
            });
        }

        let body = response.json().await?;
        Ok(body)
    }
}

/// Turn a JSON-RPC envelope into its result, or the error it carries.
/// A `null` or absent id is accepted; any other id must match the request.
fn decode_envelope<T: DeserializeOwned>(envelope: JsonRpcResponse, expected_id: u64) -> Result<T> {
    match envelope.id {
        None | Some(serde_json::Value::Null) => {}
        Some(ref id) if id.as_u64() == Some(expected_id) => {}
        Some(id) => {
            return Err(RpcError::InvalidResponse(format!(
                "response id {} does not match request id {}",
                id, expected_id
            )));
        }
    }

    if let Some(error) = envelope.error {
        return Err(RpcError::Rpc {
            code: error.code,
            message: error.message,
        });
    }

    let result = envelope.result.unwrap_or(serde_json::Value::Null);
    Ok(serde_json::from_value(result)?)
}
