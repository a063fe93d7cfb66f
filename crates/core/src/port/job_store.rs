// Job Store Port (Interface)
//
// The job catalog is written by an external administrative surface; the
// core only ever reads it.

use crate::domain::{Job, JobId};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Fetch one job by id, fresh from the catalog
    async fn find(&self, id: JobId) -> Result<Option<Job>>;

    /// All enabled jobs, ordered by name
    async fn list_enabled(&self) -> Result<Vec<Job>>;

    /// Enabled jobs of kind Scheduled (cron candidates)
    async fn list_enabled_scheduled(&self) -> Result<Vec<Job>>;

    /// Enabled jobs of kind FileWatcher (folder-scan candidates)
    async fn list_enabled_watchers(&self) -> Result<Vec<Job>>;
}

pub mod mocks {
    use super::*;
    use crate::domain::JobKind;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory catalog for tests
    #[derive(Default)]
    pub struct MemoryJobStore {
        jobs: Mutex<HashMap<JobId, Job>>,
    }

    impl MemoryJobStore {
        pub fn new(jobs: Vec<Job>) -> Self {
            Self {
                jobs: Mutex::new(jobs.into_iter().map(|j| (j.id, j)).collect()),
            }
        }

        /// Simulates an external edit between registration and fire time
        pub fn upsert(&self, job: Job) {
            self.jobs.lock().unwrap().insert(job.id, job);
        }

        pub fn set_enabled(&self, id: JobId, enabled: bool) {
            if let Some(job) = self.jobs.lock().unwrap().get_mut(&id) {
                job.enabled = enabled;
            }
        }

        pub fn remove(&self, id: JobId) {
            self.jobs.lock().unwrap().remove(&id);
        }

        fn filtered(&self, predicate: impl Fn(&Job) -> bool) -> Vec<Job> {
            let mut jobs: Vec<Job> = self
                .jobs
                .lock()
                .unwrap()
                .values()
                .filter(|j| predicate(j))
                .cloned()
                .collect();
            jobs.sort_by(|a, b| a.name.cmp(&b.name));
            jobs
        }
    }

    #[async_trait]
    impl JobStore for MemoryJobStore {
        async fn find(&self, id: JobId) -> Result<Option<Job>> {
            Ok(self.jobs.lock().unwrap().get(&id).cloned())
        }

        async fn list_enabled(&self) -> Result<Vec<Job>> {
            Ok(self.filtered(|j| j.enabled))
        }

        async fn list_enabled_scheduled(&self) -> Result<Vec<Job>> {
            Ok(self.filtered(|j| j.enabled && j.kind == JobKind::Scheduled))
        }

        async fn list_enabled_watchers(&self) -> Result<Vec<Job>> {
            Ok(self.filtered(|j| j.enabled && j.kind == JobKind::FileWatcher))
        }
    }
}
