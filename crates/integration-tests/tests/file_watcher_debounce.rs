//! File watcher: size-stability debounce and one-trigger-per-settle.

use chrono::Utc;
use inventa_core::application::FileWatcher;
use inventa_core::domain::{AuthMode, ConnectionDescriptor, Job, JobId, JobKind, TriggerKind};
use inventa_core::port::job_store::mocks::MemoryJobStore;
use inventa_core::port::time_provider::mocks::FixedTimeProvider;
use inventa_core::port::trigger_queue::mocks::MemoryTriggerQueue;
use inventa_core::port::TriggerQueue;
use std::path::Path;
use std::sync::Arc;

fn watcher_job(id: JobId, incoming: &Path) -> Job {
    Job {
        id,
        name: format!("watched-{id}"),
        kind: JobKind::FileWatcher,
        enabled: true,
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

fn harness(jobs: Vec<Job>) -> (FileWatcher, Arc<MemoryTriggerQueue>) {
    let time = Arc::new(FixedTimeProvider::new(Utc::now()));
    let triggers = Arc::new(MemoryTriggerQueue::new(time));
    let watcher = FileWatcher::new(Arc::new(MemoryJobStore::new(jobs)), triggers.clone());
    (watcher, triggers)
}

#[tokio::test]
async fn a_file_must_hold_its_size_across_two_scans() {
    let dir = tempfile::tempdir().unwrap();
    let (watcher, triggers) = harness(vec![watcher_job(1, dir.path())]);

    std::fs::write(dir.path().join("export.xlsx"), b"partial").unwrap();
    assert_eq!(watcher.scan_once().await.unwrap(), 0, "first sighting never triggers");

    // Still being copied: size changed between scans
    std::fs::write(dir.path().join("export.xlsx"), b"partial but longer now").unwrap();
    assert_eq!(watcher.scan_once().await.unwrap(), 0);

    // Settled: same size as the previous scan
    assert_eq!(watcher.scan_once().await.unwrap(), 1);

    let pending = triggers.list_pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].job_id, 1);
    assert_eq!(pending[0].kind, TriggerKind::FileWatcher);
}

#[tokio::test]
async fn a_settled_file_is_announced_only_once() {
    let dir = tempfile::tempdir().unwrap();
    let (watcher, triggers) = harness(vec![watcher_job(1, dir.path())]);

    std::fs::write(dir.path().join("export.xlsx"), b"bytes").unwrap();
    watcher.scan_once().await.unwrap();
    assert_eq!(watcher.scan_once().await.unwrap(), 1);

    // Nothing new: no further triggers while the file sits there
    assert_eq!(watcher.scan_once().await.unwrap(), 0);
    assert_eq!(watcher.scan_once().await.unwrap(), 0);
    assert_eq!(triggers.all().len(), 1);
}

#[tokio::test]
async fn several_settled_files_make_one_trigger_per_job() {
    let dir = tempfile::tempdir().unwrap();
    let (watcher, triggers) = harness(vec![watcher_job(1, dir.path())]);

    std::fs::write(dir.path().join("a.xlsx"), b"one").unwrap();
    std::fs::write(dir.path().join("b.xlsx"), b"two").unwrap();
    watcher.scan_once().await.unwrap();
    assert_eq!(watcher.scan_once().await.unwrap(), 1);
    assert_eq!(triggers.all().len(), 1, "batched into a single trigger");
}

#[tokio::test]
async fn removal_and_return_of_a_file_is_a_fresh_announcement() {
    let dir = tempfile::tempdir().unwrap();
    let (watcher, triggers) = harness(vec![watcher_job(1, dir.path())]);
    let path = dir.path().join("export.xlsx");

    std::fs::write(&path, b"bytes").unwrap();
    watcher.scan_once().await.unwrap();
    watcher.scan_once().await.unwrap();
    assert_eq!(triggers.all().len(), 1);

    // Picked up (moved away by the executor), then a new export arrives
    std::fs::remove_file(&path).unwrap();
    watcher.scan_once().await.unwrap();

    std::fs::write(&path, b"fresh export").unwrap();
    watcher.scan_once().await.unwrap();
    assert_eq!(watcher.scan_once().await.unwrap(), 1);
    assert_eq!(triggers.all().len(), 2);
}

#[tokio::test]
async fn non_spreadsheet_files_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let (watcher, triggers) = harness(vec![watcher_job(1, dir.path())]);

    std::fs::write(dir.path().join("notes.txt"), b"readme").unwrap();
    watcher.scan_once().await.unwrap();
    assert_eq!(watcher.scan_once().await.unwrap(), 0);
    assert!(triggers.all().is_empty());
}
