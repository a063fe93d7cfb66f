//! Trigger queue draining: exactly-once consumption on every exit path.

use chrono::{Duration, TimeZone, Utc};
use inventa_core::application::{ActiveRuns, JobExecutor, ShutdownToken, TriggerPoller};
use inventa_core::domain::{
    AuthMode, ConnectionDescriptor, Job, JobId, JobKind, RunStatus, TriggerKind,
};
use inventa_core::port::job_store::mocks::MemoryJobStore;
use inventa_core::port::run_store::mocks::MemoryRunStore;
use inventa_core::port::sheet_reader::mocks::{sheet, MemorySheetReader};
use inventa_core::port::time_provider::mocks::FixedTimeProvider;
use inventa_core::port::trigger_queue::mocks::MemoryTriggerQueue;
use inventa_core::port::warehouse::mocks::MemoryWarehouse;
use inventa_core::port::TriggerQueue;
use inventa_core::security::CredentialVault;
use std::path::Path;
use std::sync::Arc;

struct Harness {
    poller: TriggerPoller,
    triggers: Arc<MemoryTriggerQueue>,
    jobs: Arc<MemoryJobStore>,
    runs: Arc<MemoryRunStore>,
    sheets: Arc<MemorySheetReader>,
    time: Arc<FixedTimeProvider>,
}

fn harness(jobs: Vec<Job>) -> Harness {
    let time = Arc::new(FixedTimeProvider::new(
        Utc.with_ymd_and_hms(2026, 8, 23, 2, 0, 0).unwrap(),
    ));
    let jobs = Arc::new(MemoryJobStore::new(jobs));
    let triggers = Arc::new(MemoryTriggerQueue::new(time.clone()));
    let runs = Arc::new(MemoryRunStore::new());
    let sheets = Arc::new(MemorySheetReader::new());
    let executor = Arc::new(JobExecutor::new(
        runs.clone(),
        sheets.clone(),
        Arc::new(MemoryWarehouse::new()),
        Arc::new(CredentialVault::new([1u8; 32])),
        ActiveRuns::new(),
        time.clone(),
    ));
    let poller = TriggerPoller::new(triggers.clone(), jobs.clone(), executor);
    Harness {
        poller,
        triggers,
        jobs,
        runs,
        sheets,
        time,
    }
}

fn import_job(id: JobId, enabled: bool, incoming: &Path) -> Job {
    Job {
        id,
        name: format!("import-{id}"),
        kind: JobKind::Manual,
        enabled,
        incoming_folder: incoming.to_path_buf(),
        processed_folder: None,
        errors_folder: None,
        cron_schedule: None,
        time_zone: "UTC".to_string(),
        connection: ConnectionDescriptor {
            server: "warehouse-01".to_string(),
            database: "inventory".to_string(),
            auth_mode: AuthMode::Integrated,
            encrypted_credential: None,
        },
        source_system: None,
    }
}

#[tokio::test]
async fn trigger_for_enabled_job_runs_and_is_consumed() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![import_job(1, true, dir.path())]);

    std::fs::write(dir.path().join("export.xlsx"), b"bytes").unwrap();
    h.sheets.put_workbook("export.xlsx", vec![sheet("vInfo", 3)]);

    h.triggers
        .enqueue(1, TriggerKind::Manual, Some("alice"))
        .await
        .unwrap();

    let handled = h.poller.drain_once(&ShutdownToken::never()).await.unwrap();
    assert_eq!(handled, 1);

    let runs = h.runs.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Success);
    assert_eq!(runs[0].trigger_principal.as_deref(), Some("alice"));
    assert_eq!(h.triggers.count_pending().await.unwrap(), 0);
}

#[tokio::test]
async fn disabled_job_trigger_is_consumed_without_a_run() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![import_job(1, false, dir.path())]);

    h.triggers.enqueue(1, TriggerKind::Manual, None).await.unwrap();
    h.poller.drain_once(&ShutdownToken::never()).await.unwrap();

    assert!(h.runs.runs().is_empty());
    assert_eq!(h.triggers.count_pending().await.unwrap(), 0);
}

#[tokio::test]
async fn missing_job_trigger_is_consumed_without_a_run() {
    let h = harness(vec![]);

    h.triggers.enqueue(42, TriggerKind::Manual, None).await.unwrap();
    h.poller.drain_once(&ShutdownToken::never()).await.unwrap();

    assert!(h.runs.runs().is_empty());
    assert_eq!(h.triggers.count_pending().await.unwrap(), 0);
}

#[tokio::test]
async fn failed_execution_still_marks_the_trigger_processed() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![import_job(1, true, dir.path())]);

    std::fs::write(dir.path().join("broken.xlsx"), b"bytes").unwrap();
    h.sheets.poison("broken.xlsx", "truncated archive");

    h.triggers.enqueue(1, TriggerKind::Manual, None).await.unwrap();
    h.poller.drain_once(&ShutdownToken::never()).await.unwrap();

    let runs = h.runs.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Failed);
    assert_eq!(h.triggers.count_pending().await.unwrap(), 0);
}

#[tokio::test]
async fn one_bad_trigger_never_blocks_the_rest_of_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![import_job(1, true, dir.path())]);

    // Oldest first: the missing-job trigger precedes the good one
    h.triggers.enqueue(99, TriggerKind::Manual, None).await.unwrap();
    h.time.advance(Duration::seconds(1));
    h.triggers.enqueue(1, TriggerKind::Manual, None).await.unwrap();

    let handled = h.poller.drain_once(&ShutdownToken::never()).await.unwrap();
    assert_eq!(handled, 2);
    assert_eq!(h.runs.runs().len(), 1, "the resolvable trigger still ran");
    assert_eq!(h.triggers.count_pending().await.unwrap(), 0);
}

#[tokio::test]
async fn jobs_disabled_after_enqueue_are_skipped_at_drain_time() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![import_job(1, true, dir.path())]);

    h.triggers.enqueue(1, TriggerKind::Manual, None).await.unwrap();
    h.jobs.set_enabled(1, false);

    h.poller.drain_once(&ShutdownToken::never()).await.unwrap();
    assert!(h.runs.runs().is_empty());
    assert_eq!(h.triggers.count_pending().await.unwrap(), 0);
}
