//! Scripted contract backend for lifecycle tests

#![allow(dead_code)]

use async_trait::async_trait;
use content_validator_sdk::{
    BackendError, ContentValidator, ContractBackend, ContractCall, ContractRead, IdentityProvider,
    PollConfig, TransactionHandle, TransactionStatus, ValidatorConfig,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TX_HASH: &str = "0xabc123";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Backend answering from a script
///
/// Status checks pop from `statuses` and report `Pending` once it runs dry.
/// Reads answer from `reads` by method name.
pub struct ScriptedBackend {
    pub submit_result: Mutex<Result<TransactionHandle, BackendError>>,
    pub statuses: Mutex<VecDeque<Result<TransactionStatus, BackendError>>>,
    pub reads: Mutex<HashMap<String, Result<Value, BackendError>>>,
    pub submits: Mutex<Vec<ContractCall>>,
    pub read_log: Mutex<Vec<ContractRead>>,
    pub status_checks: AtomicU32,
    /// Status checks already made when each submit arrived
    pub checks_at_submit: Mutex<Vec<u32>>,
    /// Switch this provider's identity when the given status check runs
    pub switch_identity_on: Mutex<Option<(u32, Arc<IdentityProvider>)>>,
    /// Switch this provider's identity when the named method is read
    pub switch_identity_on_read: Mutex<Option<(String, Arc<IdentityProvider>)>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            submit_result: Mutex::new(Ok(TransactionHandle {
                hash: TX_HASH.to_string(),
            })),
            statuses: Mutex::new(VecDeque::new()),
            reads: Mutex::new(HashMap::new()),
            submits: Mutex::new(Vec::new()),
            read_log: Mutex::new(Vec::new()),
            status_checks: AtomicU32::new(0),
            checks_at_submit: Mutex::new(Vec::new()),
            switch_identity_on: Mutex::new(None),
            switch_identity_on_read: Mutex::new(None),
        }
    }
}

impl ScriptedBackend {
    pub fn with_statuses(statuses: Vec<Result<TransactionStatus, BackendError>>) -> Self {
        let backend = Self::default();
        *backend.statuses.lock().unwrap() = statuses.into();
        backend
    }

    pub fn answer(&self, method: &str, result: Result<Value, BackendError>) -> &Self {
        self.reads.lock().unwrap().insert(method.to_string(), result);
        self
    }

    pub fn status_checks(&self) -> u32 {
        self.status_checks.load(Ordering::SeqCst)
    }

    pub fn read_methods(&self) -> Vec<String> {
        self.read_log
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.method.clone())
            .collect()
    }
}

#[async_trait]
impl ContractBackend for ScriptedBackend {
    async fn submit(&self, call: ContractCall) -> Result<TransactionHandle, BackendError> {
        self.checks_at_submit.lock().unwrap().push(self.status_checks());
        self.submits.lock().unwrap().push(call);
        self.submit_result.lock().unwrap().clone()
    }

    async fn read(&self, read: ContractRead) -> Result<Value, BackendError> {
        let method = read.method.clone();
        self.read_log.lock().unwrap().push(read);

        if let Some((on, provider)) = self.switch_identity_on_read.lock().unwrap().as_ref() {
            if *on == method {
                provider.connect_generated();
            }
        }

        self.reads
            .lock()
            .unwrap()
            .get(&method)
            .cloned()
            .unwrap_or_else(|| Err(BackendError::Rejected(format!("no answer for {method}"))))
    }

    async fn transaction_status(&self, _tx_hash: &str) -> Result<TransactionStatus, BackendError> {
        let check = self.status_checks.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some((at, provider)) = self.switch_identity_on.lock().unwrap().as_ref() {
            if *at == check {
                provider.connect_generated();
            }
        }

        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(TransactionStatus::Pending))
    }
}

pub fn terminal(code: i64, label: &str) -> Result<TransactionStatus, BackendError> {
    Ok(TransactionStatus::Terminal {
        result_code: code,
        result_label: Some(label.to_string()),
    })
}

pub fn fast_config(max_attempts: u32) -> ValidatorConfig {
    ValidatorConfig {
        poll: PollConfig {
            interval_ms: 1,
            max_attempts,
        },
        reconnect_delay_ms: 1,
        ..Default::default()
    }
}

pub fn build_validator(
    config: ValidatorConfig,
    backend: Arc<ScriptedBackend>,
) -> (ContentValidator<ScriptedBackend>, Arc<IdentityProvider>) {
    let identity = IdentityProvider::new(Duration::from_millis(config.reconnect_delay_ms));
    (
        ContentValidator::new(config, Arc::clone(&identity), backend),
        identity,
    )
}

/// `n` words of filler
pub fn words(n: usize) -> String {
    vec!["word"; n].join(" ")
}
