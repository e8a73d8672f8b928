//! Types for the consensus node JSON-RPC API

use serde::{Deserialize, Serialize};

/// Default endpoint: a node bridge on the local machine
pub const DEFAULT_ENDPOINT: &str = "http://localhost:4000/api";

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC endpoint of a node bridge speaking [`RpcMethods`]
    pub endpoint: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Method names used for each operation
    pub methods: RpcMethods,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 30,
            methods: RpcMethods::default(),
        }
    }
}

/// JSON-RPC method names of the node bridge protocol
///
/// The bridge sits in front of a consensus node: it accepts account binding,
/// relays contract writes and reads, and reports transaction status. A
/// public node endpoint serves reads only, so pointing [`RpcConfig::endpoint`]
/// at one requires remapping these names to whatever that node exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcMethods {
    pub bind_account: String,
    pub send_contract_call: String,
    pub call: String,
    pub transaction_status: String,
}

impl Default for RpcMethods {
    fn default() -> Self {
        Self {
            bind_account: "gen_bindAccount".to_string(),
            send_contract_call: "gen_sendContractCall".to_string(),
            call: "gen_call".to_string(),
            transaction_status: "gen_getTransactionStatus".to_string(),
        }
    }
}

/// JSON-RPC 2.0 request envelope
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a, P: Serialize> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: P,
}

impl<'a, P: Serialize> JsonRpcRequest<'a, P> {
    pub fn new(id: u64, method: &'a str, params: P) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// JSON-RPC 2.0 response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    /// Echo of the request id; `null` when the node could not parse the request
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
}

/// Error object carried by a failed JSON-RPC response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Parameters for binding an account to a contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindAccountParams {
    pub from: String,
    pub to: String,
}

/// Parameters for a state-changing contract call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractCallParams {
    /// Sender address
    pub from: String,
    /// Contract address
    pub to: String,
    /// Contract method name
    pub method: String,
    /// Positional arguments
    pub args: Vec<serde_json::Value>,
    /// Hex signature over the call payload, when signed locally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Parameters for a read-only contract call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractReadParams {
    /// Caller address, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Contract address
    pub to: String,
    /// Contract method name
    pub method: String,
    /// Positional arguments
    pub args: Vec<serde_json::Value>,
}

/// Status of a submitted transaction as reported by the node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStatusResponse {
    /// Consensus status name (e.g. "PENDING", "ACCEPTED", "FINALIZED")
    pub status: String,
    /// Execution result code, present once execution finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_code: Option<i64>,
    /// Human label for the result code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_label: Option<String>,
}

/// Statuses after which a transaction can no longer change
pub const TERMINAL_STATUSES: &[&str] = &["ACCEPTED", "FINALIZED", "UNDETERMINED", "CANCELED"];

impl TransactionStatusResponse {
    /// Whether consensus has settled on this transaction
    pub fn is_terminal(&self) -> bool {
        let status = self.status.to_ascii_uppercase();
        TERMINAL_STATUSES.contains(&status.as_str())
    }
}
