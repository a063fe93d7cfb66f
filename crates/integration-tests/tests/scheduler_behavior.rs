//! Scheduler fires: registration, fresh config at fire time, no-overlap
//! skips, graceful stop.

use inventa_core::application::{
    shutdown_channel, ActiveRuns, JobExecutor, Scheduler,
};
use inventa_core::domain::{AuthMode, ConnectionDescriptor, Job, JobId, JobKind, RunStatus};
use inventa_core::error::AppError;
use inventa_core::port::job_store::mocks::MemoryJobStore;
use inventa_core::port::run_store::mocks::MemoryRunStore;
use inventa_core::port::sheet_reader::mocks::MemorySheetReader;
use inventa_core::port::time_provider::SystemTimeProvider;
use inventa_core::port::warehouse::mocks::MemoryWarehouse;
use inventa_core::security::CredentialVault;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const EVERY_SECOND: &str = "* * * * * *";

struct Harness {
    scheduler: Scheduler,
    jobs: Arc<MemoryJobStore>,
    runs: Arc<MemoryRunStore>,
    active: Arc<ActiveRuns>,
    shutdown: inventa_core::application::ShutdownSender,
}

fn harness(jobs: Vec<Job>) -> Harness {
    let jobs = Arc::new(MemoryJobStore::new(jobs));
    let runs = Arc::new(MemoryRunStore::new());
    let active = ActiveRuns::new();
    let executor = Arc::new(JobExecutor::new(
        runs.clone(),
        Arc::new(MemorySheetReader::new()),
        Arc::new(MemoryWarehouse::new()),
        Arc::new(CredentialVault::new([1u8; 32])),
        active.clone(),
        Arc::new(SystemTimeProvider),
    ));
    let (shutdown, token) = shutdown_channel();
    let scheduler = Scheduler::new(jobs.clone(), executor, token);
    Harness {
        scheduler,
        jobs,
        runs,
        active,
        shutdown,
    }
}

fn scheduled_job(id: JobId, incoming: &Path, cron: &str) -> Job {
    Job {
        id,
        name: format!("nightly-{id}"),
        kind: JobKind::Scheduled,
        enabled: true,
        incoming_folder: incoming.to_path_buf(),
        processed_folder: None,
        errors_folder: None,
        cron_schedule: Some(cron.to_string()),
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
async fn invalid_cron_is_a_schedule_error() {
    let h = harness(vec![]);
    let err = h.scheduler.register(1, "not a cron line", "UTC").unwrap_err();
    assert!(matches!(err, AppError::Schedule(_)));
    assert!(!h.scheduler.is_registered(1));
}

#[tokio::test]
async fn start_registers_enabled_scheduled_jobs_and_skips_bad_ones() {
    let dir = tempfile::tempdir().unwrap();
    let good = scheduled_job(1, dir.path(), "0 0 2 * * *");
    let mut bad = scheduled_job(2, dir.path(), "0 0 2 * * *");
    bad.cron_schedule = Some("garbage".to_string());

    let h = harness(vec![good, bad]);
    let registered = h.scheduler.start().await.unwrap();

    assert_eq!(registered, 1);
    assert!(h.scheduler.is_registered(1));
    assert!(!h.scheduler.is_registered(2));

    h.shutdown.shutdown();
    h.scheduler.stop().await;
}

#[tokio::test]
async fn unregister_cancels_the_entry() {
    let h = harness(vec![]);
    h.scheduler.register(5, "0 0 2 * * *", "UTC").unwrap();
    assert!(h.scheduler.is_registered(5));

    h.scheduler.unregister(5);
    assert!(!h.scheduler.is_registered(5));
}

#[tokio::test]
async fn unknown_timezone_falls_back_to_utc_and_still_registers() {
    let h = harness(vec![]);
    h.scheduler.register(6, "0 0 2 * * *", "Mars/Olympus_Mons").unwrap();
    assert!(h.scheduler.is_registered(6));
    h.scheduler.unregister(6);
}

#[tokio::test]
async fn fire_executes_with_configuration_read_at_fire_time() {
    let dir = tempfile::tempdir().unwrap();
    let job = scheduled_job(1, dir.path(), EVERY_SECOND);
    let h = harness(vec![job]);

    h.scheduler.register(1, EVERY_SECOND, "UTC").unwrap();

    // An empty incoming folder still makes a Success run
    tokio::time::sleep(Duration::from_millis(2500)).await;
    h.shutdown.shutdown();
    h.scheduler.stop().await;

    let runs = h.runs.runs();
    assert!(!runs.is_empty(), "at least one fire within 2.5s");
    assert!(runs.iter().all(|r| r.status == RunStatus::Success));
}

#[tokio::test]
async fn disabling_a_job_takes_effect_at_the_next_fire_without_restart() {
    let dir = tempfile::tempdir().unwrap();
    let job = scheduled_job(1, dir.path(), EVERY_SECOND);
    let h = harness(vec![job]);

    h.scheduler.register(1, EVERY_SECOND, "UTC").unwrap();
    // Disabled before the first fire: the entry stays, the run does not
    h.jobs.set_enabled(1, false);

    tokio::time::sleep(Duration::from_millis(2500)).await;
    h.shutdown.shutdown();
    h.scheduler.stop().await;

    assert!(h.runs.runs().is_empty());
}

#[tokio::test]
async fn fires_during_an_active_run_are_skipped_not_queued() {
    let dir = tempfile::tempdir().unwrap();
    let job = scheduled_job(1, dir.path(), EVERY_SECOND);
    let h = harness(vec![job]);

    // Hold the job's claim for the whole window
    let claim = h.active.try_begin(1).unwrap();
    h.scheduler.register(1, EVERY_SECOND, "UTC").unwrap();

    tokio::time::sleep(Duration::from_millis(2500)).await;
    h.shutdown.shutdown();
    h.scheduler.stop().await;
    drop(claim);

    assert!(
        h.runs.runs().is_empty(),
        "every fire during the active claim must be skipped"
    );
}
