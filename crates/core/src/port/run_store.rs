// Run Store Port (Interface)

use crate::domain::{ImportBatch, JobId, JobRun, RunId, TriggerKind};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait RunStore: Send + Sync {
    /// Insert a new run with status Running, returning its id
    async fn create(
        &self,
        job_id: JobId,
        trigger_kind: TriggerKind,
        trigger_principal: Option<&str>,
        started_at: DateTime<Utc>,
    ) -> Result<RunId>;

    /// Persist the terminal state of a run (end time, duration, status,
    /// counts, error message)
    async fn finalize(&self, run: &JobRun) -> Result<()>;

    /// Fetch one run (run-history surface, tests)
    async fn find(&self, id: RunId) -> Result<Option<JobRun>>;

    /// Runs currently in status Running (heartbeat bookkeeping)
    async fn count_running(&self) -> Result<u32>;

    /// Attach the per-file row accounting to a run
    async fn record_batch(&self, batch: &ImportBatch) -> Result<()>;
}

pub mod mocks {
    use super::*;
    use crate::domain::RunStatus;
    use std::sync::Mutex;

    /// In-memory run history for tests
    #[derive(Default)]
    pub struct MemoryRunStore {
        runs: Mutex<Vec<JobRun>>,
        batches: Mutex<Vec<ImportBatch>>,
    }

    impl MemoryRunStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn runs(&self) -> Vec<JobRun> {
            self.runs.lock().unwrap().clone()
        }

        pub fn batches(&self) -> Vec<ImportBatch> {
            self.batches.lock().unwrap().clone()
        }

        pub fn running_for_job(&self, job_id: JobId) -> usize {
            self.runs
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.job_id == job_id && r.status == RunStatus::Running)
                .count()
        }
    }

    #[async_trait]
    impl RunStore for MemoryRunStore {
        async fn create(
            &self,
            job_id: JobId,
            trigger_kind: TriggerKind,
            trigger_principal: Option<&str>,
            started_at: DateTime<Utc>,
        ) -> Result<RunId> {
            let mut runs = self.runs.lock().unwrap();
            let id = runs.len() as RunId + 1;
            runs.push(JobRun {
                id,
                job_id,
                trigger_kind,
                trigger_principal: trigger_principal.map(str::to_string),
                started_at,
                finished_at: None,
                duration_ms: None,
                status: RunStatus::Running,
                files_processed: 0,
                files_failed: 0,
                error_message: None,
            });
            Ok(id)
        }

        async fn finalize(&self, run: &JobRun) -> Result<()> {
            let mut runs = self.runs.lock().unwrap();
            if let Some(existing) = runs.iter_mut().find(|r| r.id == run.id) {
                *existing = run.clone();
            }
            Ok(())
        }

        async fn find(&self, id: RunId) -> Result<Option<JobRun>> {
            Ok(self.runs.lock().unwrap().iter().find(|r| r.id == id).cloned())
        }

        async fn count_running(&self) -> Result<u32> {
            Ok(self
                .runs
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.status == RunStatus::Running)
                .count() as u32)
        }

        async fn record_batch(&self, batch: &ImportBatch) -> Result<()> {
            self.batches.lock().unwrap().push(batch.clone());
            Ok(())
        }
    }
}
