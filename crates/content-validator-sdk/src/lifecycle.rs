//! Submit-and-finalize controller
//!
//! [`ContentValidator`] drives one submission through a fixed sequence:
//! gate check, session check, write call, finalization polling, latest-id
//! read, record read. Polling is a small state machine bounded by the retry
//! budget; an identity change while it runs abandons the submission.

use crate::config::{PollConfig, ValidatorConfig};
use crate::error::{QueryError, SessionInitError, SubmissionError};
use crate::gate::{self, SubmissionRequest};
use crate::history::{self, HistoryFetch};
use crate::identity::IdentityProvider;
use crate::normalize::{coerce_u64, normalize, ValidationRecord};
use crate::session::{methods, ContractBackend, ContractSession, TransactionHandle, TransactionStatus};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

/// Where a submitted transaction ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// Terminal with a success code
    Finalized {
        result_code: i64,
        result_label: Option<String>,
    },
    /// Budget exhausted while still pending
    TimedOut { attempts: u32 },
    /// Terminal with any other code
    Failed { reason: String },
    /// The identity changed while polling
    Abandoned,
}

/// Poll loop state
#[derive(Debug, Clone, PartialEq, Eq)]
enum PollState {
    Pending { attempt: u32 },
    Done(TransactionOutcome),
}

/// Interpret one status report. `None` means keep polling.
pub fn classify_status(status: TransactionStatus, success_codes: &[i64]) -> Option<TransactionOutcome> {
    match status {
        TransactionStatus::Pending => None,
        TransactionStatus::Terminal {
            result_code,
            result_label,
        } if success_codes.contains(&result_code) => Some(TransactionOutcome::Finalized {
            result_code,
            result_label,
        }),
        TransactionStatus::Terminal { result_label, .. } => Some(TransactionOutcome::Failed {
            reason: result_label
                .filter(|label| !label.trim().is_empty())
                .unwrap_or_else(|| "Unknown error".to_string()),
        }),
    }
}

#[derive(Debug, Default)]
struct ControllerState {
    latest: Option<ValidationRecord>,
    last_error: Option<String>,
    loading: bool,
}

/// Client-side controller for validation submissions
///
/// # Example
///
/// ```rust,ignore
/// use content_validator_sdk::{ContentValidator, SubmissionRequest, ValidatorConfig};
///
/// let validator = ContentValidator::over_rpc(ValidatorConfig::default().with_env_overrides())?;
///
/// let record = validator
///     .submit_and_finalize(&SubmissionRequest::new(text, 50))
///     .await?;
/// println!("{} scored {}", record.validation_id, record.score);
///
/// let history = validator.get_history(record.author.as_str()).await;
/// ```
pub struct ContentValidator<B: ContractBackend + ?Sized> {
    config: ValidatorConfig,
    identity: Arc<IdentityProvider>,
    backend: Arc<B>,
    session: Mutex<Option<Arc<ContractSession<B>>>>,
    /// One submission in flight at a time
    submit_lock: Mutex<()>,
    state: RwLock<ControllerState>,
}

impl<B: ContractBackend + ?Sized> ContentValidator<B> {
    pub fn new(config: ValidatorConfig, identity: Arc<IdentityProvider>, backend: Arc<B>) -> Self {
        Self {
            config,
            identity,
            backend,
            session: Mutex::new(None),
            submit_lock: Mutex::new(()),
            state: RwLock::new(ControllerState::default()),
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn identity(&self) -> &Arc<IdentityProvider> {
        &self.identity
    }

    /// Most recent successful result
    pub fn latest(&self) -> Option<ValidationRecord> {
        self.read_state().latest.clone()
    }

    /// Message of the most recent failure
    pub fn last_error(&self) -> Option<String> {
        self.read_state().last_error.clone()
    }

    pub fn clear_error(&self) {
        self.write_state().last_error = None;
    }

    /// Whether a submission is in flight
    pub fn is_loading(&self) -> bool {
        self.read_state().loading
    }

    /// Session for the active identity, rebuilt when the identity changed
    pub async fn session(&self) -> Result<Arc<ContractSession<B>>, SessionInitError> {
        let mut slot = self.session.lock().await;

        let current_epoch = self.identity.epoch();
        if let Some(session) = slot.as_ref() {
            if !session.is_stale(current_epoch) {
                return Ok(Arc::clone(session));
            }
            tracing::debug!(
                bound_epoch = session.epoch(),
                current_epoch = current_epoch,
                "Identity changed, rebuilding contract session"
            );
        }
        *slot = None;

        let session = ContractSession::bind(
            self.identity.snapshot(),
            self.config.contract_address.clone(),
            Arc::clone(&self.backend),
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Client initialization error");
            e
        })?;

        let session = Arc::new(session);
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Submit content for scoring and wait for its result
    pub async fn submit_and_finalize(
        &self,
        request: &SubmissionRequest,
    ) -> Result<ValidationRecord, SubmissionError> {
        let _guard = self.submit_lock.lock().await;

        {
            let mut state = self.write_state();
            state.loading = true;
            state.latest = None;
            state.last_error = None;
        }

        let result = self.run_submission(request).await;

        let mut state = self.write_state();
        state.loading = false;
        match &result {
            Ok(record) => state.latest = Some(record.clone()),
            // Belongs to an identity that is no longer active
            Err(SubmissionError::Abandoned { .. }) => {}
            Err(e) => state.last_error = Some(e.to_string()),
        }
        result
    }

    async fn run_submission(
        &self,
        request: &SubmissionRequest,
    ) -> Result<ValidationRecord, SubmissionError> {
        gate::validate(request, &self.config.limits)?;

        let session = self
            .session()
            .await
            .map_err(|e| SubmissionError::NotReady(e.to_string()))?;

        if session.contract_address().is_none() {
            return Err(SubmissionError::Misconfigured);
        }

        tracing::info!(
            author = %session.identity().address(),
            words = gate::word_count(&request.content),
            "Submitting validation transaction"
        );

        let handle = session
            .call(
                methods::VALIDATE_CONTENT,
                vec![
                    Value::String(request.content.clone()),
                    Value::from(request.min_words as u64),
                ],
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Validation submission rejected");
                SubmissionError::BackendRejected(e.to_string())
            })?;

        tracing::info!(tx_hash = %handle.hash, "Transaction submitted");

        let result = self.finalize(&session, &handle).await;

        // Nothing that happens after an identity change belongs to the new identity
        match result {
            Err(SubmissionError::Abandoned { .. }) => result,
            _ if session.is_stale(self.identity.epoch()) => {
                tracing::warn!(tx_hash = %handle.hash, "Identity changed before result arrived, discarding it");
                Err(SubmissionError::Abandoned { tx_hash: handle.hash })
            }
            _ => result,
        }
    }

    /// Poll a submitted transaction to completion and read back its record
    async fn finalize(
        &self,
        session: &ContractSession<B>,
        handle: &TransactionHandle,
    ) -> Result<ValidationRecord, SubmissionError> {
        match self.await_finalization(session, handle).await {
            TransactionOutcome::Finalized { result_code, .. } => {
                tracing::info!(tx_hash = %handle.hash, result_code = result_code, "Transaction finalized");
            }
            TransactionOutcome::Failed { reason } => {
                tracing::error!(tx_hash = %handle.hash, reason = %reason, "Transaction failed");
                return Err(SubmissionError::BackendRejected(reason));
            }
            TransactionOutcome::TimedOut { attempts } => {
                tracing::error!(tx_hash = %handle.hash, attempts = attempts, "Transaction not finalized in time");
                return Err(SubmissionError::TimedOut {
                    tx_hash: handle.hash.clone(),
                    attempts,
                });
            }
            TransactionOutcome::Abandoned => {
                tracing::warn!(tx_hash = %handle.hash, "Identity changed, abandoning transaction");
                return Err(SubmissionError::Abandoned {
                    tx_hash: handle.hash.clone(),
                });
            }
        }

        let validation_id = self.latest_validation_id(session).await?;
        tracing::info!(validation_id = %validation_id, "Latest validation ID");

        Ok(read_validation(session, &validation_id).await?)
    }

    /// Poll until the transaction is terminal, the budget runs out, or the
    /// identity changes. Makes at most `poll.max_attempts` status checks.
    /// Staleness is checked before and after every check, so an outcome
    /// observed after an identity change is reported as `Abandoned`.
    pub async fn await_finalization(
        &self,
        session: &ContractSession<B>,
        handle: &TransactionHandle,
    ) -> TransactionOutcome {
        let poll: &PollConfig = &self.config.poll;
        let max_attempts = poll.max_attempts;
        let interval = poll.interval();

        let mut state = PollState::Pending { attempt: 0 };
        loop {
            state = match state {
                PollState::Done(outcome) => return outcome,
                PollState::Pending { attempt } if attempt >= max_attempts => {
                    PollState::Done(TransactionOutcome::TimedOut { attempts: attempt })
                }
                PollState::Pending { attempt } => {
                    if attempt > 0 {
                        tokio::time::sleep(interval).await;
                    }
                    if session.is_stale(self.identity.epoch()) {
                        PollState::Done(TransactionOutcome::Abandoned)
                    } else {
                        let next = self.poll_once(session, handle, attempt + 1, max_attempts).await;
                        // The identity may have changed while the check was in flight
                        if session.is_stale(self.identity.epoch()) {
                            PollState::Done(TransactionOutcome::Abandoned)
                        } else {
                            next
                        }
                    }
                }
            };
        }
    }

    async fn poll_once(
        &self,
        session: &ContractSession<B>,
        handle: &TransactionHandle,
        attempt: u32,
        max_attempts: u32,
    ) -> PollState {
        match session.transaction_status(handle).await {
            Ok(status) => match classify_status(status, &self.config.success_codes) {
                Some(outcome) => PollState::Done(outcome),
                None => {
                    tracing::debug!(
                        tx_hash = %handle.hash,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        "Transaction pending"
                    );
                    PollState::Pending { attempt }
                }
            },
            Err(e) => {
                tracing::warn!(
                    tx_hash = %handle.hash,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    error = %e,
                    "Status check failed, retrying..."
                );
                PollState::Pending { attempt }
            }
        }
    }

    async fn latest_validation_id(&self, session: &ContractSession<B>) -> Result<String, SubmissionError> {
        let raw = session
            .query(methods::GET_LATEST_VALIDATION_ID, vec![])
            .await
            .map_err(|e| QueryError::Backend {
                method: methods::GET_LATEST_VALIDATION_ID.to_string(),
                reason: e.to_string(),
            })?;

        match raw {
            Value::String(id) if !id.trim().is_empty() => Ok(id),
            other => {
                tracing::warn!(response = %other, "No validation ID returned");
                Err(SubmissionError::NoIdReturned)
            }
        }
    }

    // === Direct reads ===

    /// Read one validation by id
    pub async fn get_validation(&self, validation_id: &str) -> Result<ValidationRecord, QueryError> {
        let result = self.get_validation_inner(validation_id).await;
        if let Err(ref e) = result {
            tracing::error!(validation_id = %validation_id, error = %e, "Validation fetch error");
            self.write_state().last_error = Some(e.to_string());
        }
        result
    }

    async fn get_validation_inner(&self, validation_id: &str) -> Result<ValidationRecord, QueryError> {
        let session = self.read_session().await?;
        if validation_id.is_empty() {
            return Err(QueryError::MissingArgument("Validation ID"));
        }
        read_validation(&session, validation_id).await
    }

    /// Total validations stored by the contract; 0 when unavailable
    pub async fn get_validation_count(&self) -> u64 {
        let session = match self.read_session().await {
            Ok(session) => session,
            Err(_) => return 0,
        };

        match session.query(methods::GET_VALIDATION_COUNT, vec![]).await {
            Ok(raw) => {
                let count = coerce_u64(&raw);
                tracing::debug!(count = count, "Validation count");
                count
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch validation count");
                0
            }
        }
    }

    /// History for `address`; failures yield an empty list plus the error
    pub async fn get_history(&self, address: &str) -> HistoryFetch {
        let fetch = match self.read_session().await {
            Ok(session) => history::fetch_history(&session, address).await,
            Err(e) => HistoryFetch::failed(e),
        };

        if let Some(ref e) = fetch.error {
            self.write_state().last_error = Some(format!("Failed to fetch history: {e}"));
        }
        fetch
    }

    async fn read_session(&self) -> Result<Arc<ContractSession<B>>, QueryError> {
        let session = self.session().await.map_err(|_| QueryError::NotReady)?;
        if session.contract_address().is_none() {
            return Err(QueryError::Misconfigured);
        }
        Ok(session)
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, ControllerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, ControllerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn read_validation<B>(session: &ContractSession<B>, validation_id: &str) -> Result<ValidationRecord, QueryError>
where
    B: ContractBackend + ?Sized,
{
    let raw = session
        .query(methods::GET_VALIDATION, vec![Value::String(validation_id.to_string())])
        .await
        .map_err(|e| QueryError::Backend {
            method: methods::GET_VALIDATION.to_string(),
            reason: e.to_string(),
        })?;

    Ok(normalize(&raw))
}
