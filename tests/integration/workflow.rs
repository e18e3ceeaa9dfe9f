//! End-to-end scheduler workflow tests driven through the handle.

use recurrente::{
    InMemoryStore, Scheduler, SchedulerError, SchedulerState, TransactionCode, TransactionState,
    TransactionStore,
};

use chrono::{Datelike, NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::common::{Script, ScriptedClient, sample_record};

#[tokio::test]
async fn test_manual_trigger_submits_payment() {
    let store = Arc::new(InMemoryStore::new());
    store.save(sample_record("rec-001")).await.unwrap();

    let client = ScriptedClient::accepting();
    let scheduler = Scheduler::with_shared(Arc::clone(&store), Arc::clone(&client));
    let (handle, task) = scheduler.start();

    let submission_id = handle.trigger("rec-001").await.unwrap();
    assert!(!submission_id.as_uuid().is_nil());

    let submissions = client.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].transaction_type, "PAG");
    assert_eq!(submissions[0].state, "PEN");
    assert!(submissions[0].reference.starts_with("rec-001-"));
    assert_eq!(submissions[0].interval_minutes, 30);

    // The execution is recorded in storage.
    assert_eq!(store.executions().len(), 1);

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_manual_trigger_unknown_record() {
    let store = Arc::new(InMemoryStore::new());
    let client = ScriptedClient::accepting();
    let scheduler = Scheduler::with_shared(store, Arc::clone(&client));
    let (handle, task) = scheduler.start();

    let result = handle.trigger("missing").await;
    assert!(matches!(
        result,
        Err(SchedulerError::TransactionNotFound(_))
    ));
    assert_eq!(client.submission_count(), 0);

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_manual_trigger_rejects_inactive_and_expired() {
    let store = Arc::new(InMemoryStore::new());
    store
        .save(sample_record("inactive").with_state(TransactionState::Inactive))
        .await
        .unwrap();
    store
        .save(sample_record("expired").with_end_date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()))
        .await
        .unwrap();

    let client = ScriptedClient::accepting();
    let scheduler = Scheduler::with_shared(store, Arc::clone(&client));
    let (handle, task) = scheduler.start();

    assert!(matches!(
        handle.trigger("inactive").await,
        Err(SchedulerError::InvalidState(_))
    ));
    assert!(matches!(
        handle.trigger("expired").await,
        Err(SchedulerError::Expired(_))
    ));
    assert_eq!(client.submission_count(), 0);

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_manual_trigger_surfaces_submission_failure() {
    let store = Arc::new(InMemoryStore::new());
    store.save(sample_record("rec-001")).await.unwrap();

    let client = ScriptedClient::new(vec![Script::Reject(500)]);
    let scheduler = Scheduler::with_shared(Arc::clone(&store), Arc::clone(&client));
    let (handle, task) = scheduler.start();

    let result = handle.trigger("rec-001").await;
    assert!(matches!(result, Err(SchedulerError::Submit(_))));

    // The record is untouched; a later trigger can succeed.
    let record = store
        .find_by_code(&TransactionCode::new("rec-001"))
        .await
        .unwrap();
    assert_eq!(record.state, TransactionState::Active);

    let submission_id = handle.trigger("rec-001").await.unwrap();
    assert!(!submission_id.as_uuid().is_nil());

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_batch_run_submits_todays_pay_day_records() {
    let store = Arc::new(InMemoryStore::new());
    let today = Utc::now().date_naive().day();
    store
        .save(sample_record("due-1").with_pay_day(today))
        .await
        .unwrap();
    store
        .save(sample_record("due-2").with_pay_day(today))
        .await
        .unwrap();
    store.save(sample_record("no-pay-day")).await.unwrap();
    store
        .save(
            sample_record("inactive")
                .with_pay_day(today)
                .with_state(TransactionState::Inactive),
        )
        .await
        .unwrap();

    let client = ScriptedClient::accepting();
    let scheduler = Scheduler::with_shared(Arc::clone(&store), Arc::clone(&client));
    let (handle, task) = scheduler.start();

    let outcomes = handle.trigger_due_today().await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.succeeded()));
    assert_eq!(client.submission_count(), 2);

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_batch_run_reports_partial_failure() {
    let store = Arc::new(InMemoryStore::new());
    let today = Utc::now().date_naive().day();
    store
        .save(sample_record("bad").with_pay_day(today))
        .await
        .unwrap();
    store
        .save(sample_record("good").with_pay_day(today))
        .await
        .unwrap();

    // Records come back in code order: "bad" first.
    let client = ScriptedClient::new(vec![Script::Reject(502), Script::Accept]);
    let scheduler = Scheduler::with_shared(Arc::clone(&store), Arc::clone(&client));
    let (handle, task) = scheduler.start();

    let outcomes = handle.trigger_due_today().await.unwrap();
    assert_eq!(outcomes.len(), 2);

    let bad = outcomes.iter().find(|o| o.code.as_str() == "bad").unwrap();
    let good = outcomes.iter().find(|o| o.code.as_str() == "good").unwrap();
    assert!(!bad.succeeded());
    assert!(good.succeeded());

    handle.shutdown().await.unwrap();
    let _ = task.await;
}

#[tokio::test]
async fn test_pause_resume_and_manual_trigger_while_paused() {
    let store = Arc::new(InMemoryStore::new());
    store.save(sample_record("rec-001")).await.unwrap();

    let client = ScriptedClient::accepting();
    let scheduler = Scheduler::with_shared(Arc::clone(&store), Arc::clone(&client))
        .with_tick_interval(Duration::from_millis(50));
    let (handle, task) = scheduler.start();

    assert_eq!(handle.state().await, SchedulerState::Running);

    handle.pause().await.unwrap();
    assert_eq!(handle.state().await, SchedulerState::Paused);

    // Manual triggers keep working while paused.
    handle.trigger("rec-001").await.unwrap();
    assert_eq!(client.submission_count(), 1);

    handle.resume().await.unwrap();
    assert_eq!(handle.state().await, SchedulerState::Running);

    handle.shutdown().await.unwrap();
    let _ = task.await;
    assert_eq!(handle.state().await, SchedulerState::Stopped);
}

#[tokio::test]
async fn test_trigger_after_shutdown_fails() {
    let store = Arc::new(InMemoryStore::new());
    store.save(sample_record("rec-001")).await.unwrap();

    let client = ScriptedClient::accepting();
    let scheduler = Scheduler::with_shared(store, Arc::clone(&client));
    let (handle, task) = scheduler.start();

    handle.shutdown().await.unwrap();
    let _ = task.await;

    let result = handle.trigger("rec-001").await;
    assert!(matches!(result, Err(SchedulerError::ChannelError(_))));
}
