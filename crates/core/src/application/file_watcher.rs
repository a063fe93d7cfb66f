// File Watcher - folder scans for FileWatcher jobs
//
// Polls the incoming folder of every enabled FileWatcher job. A file
// must hold the same size across two consecutive scans before it counts
// as settled (exports are copied in over the network). Settled files
// produce one trigger per job per scan; the trigger rides the normal
// poller path, so single-run-per-job semantics are preserved.

use crate::application::constants::DEFAULT_WATCH_INTERVAL;
use crate::application::shutdown::ShutdownToken;
use crate::domain::{Job, JobId, TriggerKind};
use crate::error::Result;
use crate::port::{JobStore, TriggerQueue};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct FileWatcher {
    jobs: Arc<dyn JobStore>,
    triggers: Arc<dyn TriggerQueue>,
    interval: Duration,
    /// File size at the previous scan, per (job, file name)
    sizes: Mutex<HashMap<(JobId, String), u64>>,
    /// Files already announced via a trigger and not yet picked up
    announced: Mutex<HashSet<(JobId, String)>>,
}

impl FileWatcher {
    pub fn new(jobs: Arc<dyn JobStore>, triggers: Arc<dyn TriggerQueue>) -> Self {
        Self::with_interval(jobs, triggers, DEFAULT_WATCH_INTERVAL)
    }

    pub fn with_interval(
        jobs: Arc<dyn JobStore>,
        triggers: Arc<dyn TriggerQueue>,
        interval: Duration,
    ) -> Self {
        Self {
            jobs,
            triggers,
            interval,
            sizes: Mutex::new(HashMap::new()),
            announced: Mutex::new(HashSet::new()),
        }
    }

    /// Scan loop with graceful shutdown support
    pub async fn run(&self, mut shutdown: ShutdownToken) {
        info!(interval_secs = self.interval.as_secs(), "File watcher started");
        loop {
            if shutdown.is_shutdown() {
                break;
            }
            match self.scan_once().await {
                Ok(0) => {}
                Ok(count) => info!(count, "File watcher enqueued trigger(s)"),
                Err(e) => error!(error = %e, "File watcher scan failed"),
            }
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.wait() => break,
            }
        }
        info!("File watcher stopped");
    }

    /// One scan over all watcher jobs. Returns triggers enqueued.
    pub async fn scan_once(&self) -> Result<usize> {
        let jobs = self.jobs.list_enabled_watchers().await?;
        let mut enqueued = 0usize;

        for job in &jobs {
            match self.scan_job(job).await {
                Ok(true) => enqueued += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(job_id = job.id, folder = %job.incoming_folder.display(), error = %e, "Folder scan failed");
                }
            }
        }
        Ok(enqueued)
    }

    /// Scan one job's incoming folder; enqueue at most one trigger
    async fn scan_job(&self, job: &Job) -> Result<bool> {
        let current = read_sizes(&job.incoming_folder).await?;

        let mut newly_settled = Vec::new();
        {
            let sizes = self.sizes.lock().unwrap();
            let announced = self.announced.lock().unwrap();
            for (name, size) in &current {
                let key = (job.id, name.clone());
                if announced.contains(&key) {
                    continue;
                }
                if sizes.get(&key) == Some(size) {
                    newly_settled.push(name.clone());
                }
            }
        }

        // Refresh bookkeeping: forget files that were picked up
        {
            let mut sizes = self.sizes.lock().unwrap();
            let mut announced = self.announced.lock().unwrap();
            sizes.retain(|(id, name), _| *id != job.id || current.contains_key(name));
            announced.retain(|(id, name)| *id != job.id || current.contains_key(name));
            for (name, size) in &current {
                sizes.insert((job.id, name.clone()), *size);
            }
        }

        if newly_settled.is_empty() {
            return Ok(false);
        }

        debug!(job_id = job.id, files = ?newly_settled, "Settled files detected");
        self.triggers
            .enqueue(job.id, TriggerKind::FileWatcher, None)
            .await?;

        let mut announced = self.announced.lock().unwrap();
        for name in newly_settled {
            announced.insert((job.id, name));
        }
        Ok(true)
    }
}

/// Spreadsheet file sizes in a folder, by file name
async fn read_sizes(folder: &Path) -> Result<HashMap<String, u64>> {
    let mut dir = tokio::fs::read_dir(folder).await?;
    let mut sizes = HashMap::new();
    while let Some(entry) = dir.next_entry().await? {
        let path = entry.path();
        let is_spreadsheet = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("xlsx"))
            .unwrap_or(false);
        if !is_spreadsheet {
            continue;
        }
        let meta = entry.metadata().await?;
        if meta.is_file() {
            if let Some(name) = path.file_name() {
                sizes.insert(name.to_string_lossy().into_owned(), meta.len());
            }
        }
    }
    Ok(sizes)
}
