//! Submit-and-finalize lifecycle against a scripted backend

mod common;

use common::*;
use content_validator_sdk::session::methods;
use content_validator_sdk::{
    BackendError, SubmissionError, SubmissionRequest, TransactionStatus, ValidationError,
};
use serde_json::json;
use std::sync::Arc;

fn answer_reads(backend: &ScriptedBackend) {
    backend
        .answer(methods::GET_LATEST_VALIDATION_ID, Ok(json!("val_3")))
        .answer(
            methods::GET_VALIDATION,
            Ok(json!([
                ["validation_id", "val_3"],
                ["content_hash", "word word word"],
                ["author", "0x00000000000000000000000000000000000000aa"],
                ["score", "82"],
                ["passed", true],
                ["feedback", "Clear and well structured."],
                ["timestamp", 3],
                ["word_count", 60]
            ])),
        );
}

#[tokio::test]
async fn test_success_code_zero_yields_record() {
    init_tracing();
    let backend = Arc::new(ScriptedBackend::with_statuses(vec![
        Ok(TransactionStatus::Pending),
        terminal(0, "SUCCESS"),
    ]));
    answer_reads(&backend);
    let (validator, _identity) = build_validator(fast_config(10), backend.clone());

    let record = validator
        .submit_and_finalize(&SubmissionRequest::new(words(60), 50))
        .await
        .unwrap();

    assert_eq!(record.validation_id, "val_3");
    assert_eq!(record.score, 82);
    assert!(record.passed);
    assert_eq!(backend.status_checks(), 2);
    assert_eq!(validator.latest(), Some(record));
    assert_eq!(validator.last_error(), None);
    assert!(!validator.is_loading());

    let submits = backend.submits.lock().unwrap();
    assert_eq!(submits.len(), 1);
    assert_eq!(submits[0].method, methods::VALIDATE_CONTENT);
    assert_eq!(submits[0].args, vec![json!(words(60)), json!(50)]);
    assert!(submits[0].signature.is_some());
}

#[tokio::test]
async fn test_code_six_counts_as_success() {
    init_tracing();
    let backend = Arc::new(ScriptedBackend::with_statuses(vec![terminal(6, "")]));
    answer_reads(&backend);
    let (validator, _identity) = build_validator(fast_config(10), backend.clone());

    let record = validator
        .submit_and_finalize(&SubmissionRequest::new(words(5), 1))
        .await
        .unwrap();
    assert_eq!(record.validation_id, "val_3");
}

#[tokio::test]
async fn test_failure_code_is_rejected_with_label() {
    init_tracing();
    let backend = Arc::new(ScriptedBackend::with_statuses(vec![terminal(3, "USER_ERROR")]));
    answer_reads(&backend);
    let (validator, _identity) = build_validator(fast_config(10), backend.clone());

    let err = validator
        .submit_and_finalize(&SubmissionRequest::new(words(5), 1))
        .await
        .unwrap_err();

    assert_eq!(err, SubmissionError::BackendRejected("USER_ERROR".into()));
    assert_eq!(validator.latest(), None);
    assert_eq!(validator.last_error(), Some(err.to_string()));
    // No result reads after a failed transaction
    assert!(backend.read_methods().is_empty());

    validator.clear_error();
    assert_eq!(validator.last_error(), None);
}

#[tokio::test]
async fn test_never_terminal_times_out_within_budget() {
    init_tracing();
    let backend = Arc::new(ScriptedBackend::default());
    let (validator, _identity) = build_validator(fast_config(4), backend.clone());

    let err = validator
        .submit_and_finalize(&SubmissionRequest::new(words(5), 1))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SubmissionError::TimedOut {
            tx_hash: TX_HASH.into(),
            attempts: 4
        }
    );
    assert!(err.to_string().contains(TX_HASH));
    assert_eq!(backend.status_checks(), 4);
}

#[tokio::test]
async fn test_transport_errors_count_as_attempts() {
    init_tracing();
    let backend = Arc::new(ScriptedBackend::with_statuses(vec![
        Err(BackendError::Network("connection reset".into())),
        Err(BackendError::Network("connection reset".into())),
        terminal(0, "SUCCESS"),
    ]));
    answer_reads(&backend);
    let (validator, _identity) = build_validator(fast_config(3), backend.clone());

    let record = validator
        .submit_and_finalize(&SubmissionRequest::new(words(5), 1))
        .await
        .unwrap();
    assert_eq!(record.score, 82);
    assert_eq!(backend.status_checks(), 3);

    // Same script with one attempt fewer runs out of budget
    let backend = Arc::new(ScriptedBackend::with_statuses(vec![
        Err(BackendError::Network("connection reset".into())),
        Err(BackendError::Network("connection reset".into())),
        terminal(0, "SUCCESS"),
    ]));
    let (validator, _identity) = build_validator(fast_config(2), backend.clone());
    let err = validator
        .submit_and_finalize(&SubmissionRequest::new(words(5), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::TimedOut { attempts: 2, .. }));
}

#[tokio::test]
async fn test_empty_latest_id_is_no_id_returned() {
    init_tracing();
    let backend = Arc::new(ScriptedBackend::with_statuses(vec![terminal(0, "SUCCESS")]));
    backend.answer(methods::GET_LATEST_VALIDATION_ID, Ok(json!("")));
    let (validator, _identity) = build_validator(fast_config(5), backend.clone());

    let err = validator
        .submit_and_finalize(&SubmissionRequest::new(words(5), 1))
        .await
        .unwrap_err();
    assert_eq!(err, SubmissionError::NoIdReturned);
    assert_eq!(backend.read_methods(), vec![methods::GET_LATEST_VALIDATION_ID]);
}

#[tokio::test]
async fn test_identity_switch_abandons_submission() {
    init_tracing();
    let backend = Arc::new(ScriptedBackend::with_statuses(vec![
        Ok(TransactionStatus::Pending),
        terminal(0, "SUCCESS"),
    ]));
    answer_reads(&backend);
    let (validator, identity) = build_validator(fast_config(10), backend.clone());
    *backend.switch_identity_on.lock().unwrap() = Some((1, Arc::clone(&identity)));

    let err = validator
        .submit_and_finalize(&SubmissionRequest::new(words(5), 1))
        .await
        .unwrap_err();

    assert_eq!(err, SubmissionError::Abandoned { tx_hash: TX_HASH.into() });
    assert_eq!(backend.status_checks(), 1);
    assert_eq!(validator.latest(), None);
    assert_eq!(validator.last_error(), None);
}

#[tokio::test]
async fn test_failure_seen_after_switch_is_abandoned() {
    init_tracing();
    let backend = Arc::new(ScriptedBackend::with_statuses(vec![
        Ok(TransactionStatus::Pending),
        terminal(3, "USER_ERROR"),
    ]));
    let (validator, identity) = build_validator(fast_config(10), backend.clone());
    *backend.switch_identity_on.lock().unwrap() = Some((2, Arc::clone(&identity)));

    let err = validator
        .submit_and_finalize(&SubmissionRequest::new(words(5), 1))
        .await
        .unwrap_err();

    assert_eq!(err, SubmissionError::Abandoned { tx_hash: TX_HASH.into() });
    assert_eq!(backend.status_checks(), 2);
    assert_eq!(validator.last_error(), None);
    assert_eq!(validator.latest(), None);
}

#[tokio::test]
async fn test_switch_on_last_pending_check_is_abandoned() {
    init_tracing();
    let backend = Arc::new(ScriptedBackend::default());
    let (validator, identity) = build_validator(fast_config(3), backend.clone());
    *backend.switch_identity_on.lock().unwrap() = Some((3, Arc::clone(&identity)));

    let err = validator
        .submit_and_finalize(&SubmissionRequest::new(words(5), 1))
        .await
        .unwrap_err();

    assert_eq!(err, SubmissionError::Abandoned { tx_hash: TX_HASH.into() });
    assert_eq!(backend.status_checks(), 3);
    assert_eq!(validator.last_error(), None);
}

#[tokio::test]
async fn test_read_failure_after_switch_is_abandoned() {
    init_tracing();
    let backend = Arc::new(ScriptedBackend::with_statuses(vec![terminal(0, "SUCCESS")]));
    backend.answer(methods::GET_LATEST_VALIDATION_ID, Ok(json!("")));
    let (validator, identity) = build_validator(fast_config(5), backend.clone());
    *backend.switch_identity_on_read.lock().unwrap() =
        Some((methods::GET_LATEST_VALIDATION_ID.to_string(), Arc::clone(&identity)));

    let err = validator
        .submit_and_finalize(&SubmissionRequest::new(words(5), 1))
        .await
        .unwrap_err();

    // Would be NoIdReturned had the identity stayed put
    assert_eq!(err, SubmissionError::Abandoned { tx_hash: TX_HASH.into() });
    assert_eq!(validator.last_error(), None);
}

#[tokio::test]
async fn test_switch_after_terminal_discards_result() {
    init_tracing();
    let backend = Arc::new(ScriptedBackend::with_statuses(vec![terminal(0, "SUCCESS")]));
    answer_reads(&backend);
    let (validator, identity) = build_validator(fast_config(10), backend.clone());
    *backend.switch_identity_on_read.lock().unwrap() =
        Some((methods::GET_VALIDATION.to_string(), Arc::clone(&identity)));

    let err = validator
        .submit_and_finalize(&SubmissionRequest::new(words(5), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Abandoned { .. }));
    assert_eq!(validator.latest(), None);
    assert_eq!(
        backend.read_methods(),
        vec![methods::GET_LATEST_VALIDATION_ID, methods::GET_VALIDATION]
    );
}

#[tokio::test]
async fn test_terminal_success_seen_after_switch_skips_reads() {
    init_tracing();
    let backend = Arc::new(ScriptedBackend::with_statuses(vec![terminal(0, "SUCCESS")]));
    answer_reads(&backend);
    let (validator, identity) = build_validator(fast_config(10), backend.clone());
    *backend.switch_identity_on.lock().unwrap() = Some((1, Arc::clone(&identity)));

    let err = validator
        .submit_and_finalize(&SubmissionRequest::new(words(5), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Abandoned { .. }));
    assert!(backend.read_methods().is_empty());
}

#[tokio::test]
async fn test_next_submission_uses_new_identity() {
    init_tracing();
    let backend = Arc::new(ScriptedBackend::with_statuses(vec![
        terminal(0, "SUCCESS"),
        terminal(0, "SUCCESS"),
    ]));
    answer_reads(&backend);
    let (validator, identity) = build_validator(fast_config(10), backend.clone());
    let request = SubmissionRequest::new(words(5), 1);

    validator.submit_and_finalize(&request).await.unwrap();
    let replacement = identity.connect_generated();
    validator.submit_and_finalize(&request).await.unwrap();

    let submits = backend.submits.lock().unwrap();
    assert_ne!(submits[0].from, submits[1].from);
    assert_eq!(submits[1].from, replacement.address());
}

#[tokio::test]
async fn test_gate_runs_before_any_backend_call() {
    init_tracing();
    let backend = Arc::new(ScriptedBackend::default());
    let (validator, _identity) = build_validator(fast_config(5), backend.clone());

    let err = validator
        .submit_and_finalize(&SubmissionRequest::new("   ", 1))
        .await
        .unwrap_err();
    assert_eq!(err, SubmissionError::Invalid(ValidationError::EmptyContent));

    let err = validator
        .submit_and_finalize(&SubmissionRequest::new(words(3), 5))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SubmissionError::Invalid(ValidationError::TooFewWords { have: 3, need: 5 })
    );

    assert!(backend.submits.lock().unwrap().is_empty());
    assert_eq!(backend.status_checks(), 0);
}

#[tokio::test]
async fn test_missing_contract_is_misconfigured() {
    init_tracing();
    let backend = Arc::new(ScriptedBackend::default());
    let mut config = fast_config(5);
    config.contract_address = None;
    let (validator, _identity) = build_validator(config, backend.clone());

    let err = validator
        .submit_and_finalize(&SubmissionRequest::new(words(5), 1))
        .await
        .unwrap_err();
    assert_eq!(err, SubmissionError::Misconfigured);
    assert!(backend.submits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_disconnected_identity_is_not_ready() {
    init_tracing();
    let backend = Arc::new(ScriptedBackend::default());
    let mut config = fast_config(5);
    config.reconnect_delay_ms = 60_000;
    let (validator, identity) = build_validator(config, backend.clone());

    identity.disconnect();

    let err = validator
        .submit_and_finalize(&SubmissionRequest::new(words(5), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::NotReady(_)));
    assert!(backend.submits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_rejection() {
    init_tracing();
    let backend = Arc::new(ScriptedBackend::default());
    *backend.submit_result.lock().unwrap() = Err(BackendError::Rejected("insufficient funds".into()));
    let (validator, _identity) = build_validator(fast_config(5), backend.clone());

    let err = validator
        .submit_and_finalize(&SubmissionRequest::new(words(5), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::BackendRejected(ref m) if m.contains("insufficient funds")));
    assert_eq!(backend.status_checks(), 0);
}

#[tokio::test]
async fn test_concurrent_submissions_are_serialized() {
    init_tracing();
    let backend = Arc::new(ScriptedBackend::with_statuses(vec![
        Ok(TransactionStatus::Pending),
        terminal(0, "SUCCESS"),
        Ok(TransactionStatus::Pending),
        terminal(0, "SUCCESS"),
    ]));
    answer_reads(&backend);
    let (validator, _identity) = build_validator(fast_config(10), backend.clone());
    let request = SubmissionRequest::new(words(5), 1);

    let (a, b) = tokio::join!(
        validator.submit_and_finalize(&request),
        validator.submit_and_finalize(&request)
    );

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(backend.status_checks(), 4);
    // The second write waited for the first to finish polling
    assert_eq!(*backend.checks_at_submit.lock().unwrap(), vec![0, 2]);
}
