// Trigger Queue Port (Interface)

use crate::domain::{JobId, JobTrigger, TriggerId, TriggerKind};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait TriggerQueue: Send + Sync {
    /// Queue an execution request (dashboard button, watcher event)
    async fn enqueue(
        &self,
        job_id: JobId,
        kind: TriggerKind,
        principal: Option<&str>,
    ) -> Result<TriggerId>;

    /// Unprocessed triggers, oldest first
    async fn list_pending(&self) -> Result<Vec<JobTrigger>>;

    /// Stamp a trigger processed. Idempotent: calling twice is safe and
    /// keeps the first timestamp.
    async fn mark_processed(&self, id: TriggerId) -> Result<()>;

    /// Number of unprocessed triggers (heartbeat bookkeeping)
    async fn count_pending(&self) -> Result<u32>;
}

pub mod mocks {
    use super::*;
    use crate::port::TimeProvider;
    use std::sync::{Arc, Mutex};

    /// In-memory queue for tests
    pub struct MemoryTriggerQueue {
        triggers: Mutex<Vec<JobTrigger>>,
        next_id: Mutex<TriggerId>,
        time: Arc<dyn TimeProvider>,
    }

    impl MemoryTriggerQueue {
        pub fn new(time: Arc<dyn TimeProvider>) -> Self {
            Self {
                triggers: Mutex::new(Vec::new()),
                next_id: Mutex::new(1),
                time,
            }
        }

        pub fn all(&self) -> Vec<JobTrigger> {
            self.triggers.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TriggerQueue for MemoryTriggerQueue {
        async fn enqueue(
            &self,
            job_id: JobId,
            kind: TriggerKind,
            principal: Option<&str>,
        ) -> Result<TriggerId> {
            let mut next_id = self.next_id.lock().unwrap();
            let id = *next_id;
            *next_id += 1;

            self.triggers.lock().unwrap().push(JobTrigger {
                id,
                job_id,
                kind,
                principal: principal.map(str::to_string),
                created_at: self.time.now(),
                processed_at: None,
            });
            Ok(id)
        }

        async fn list_pending(&self) -> Result<Vec<JobTrigger>> {
            let mut pending: Vec<JobTrigger> = self
                .triggers
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.is_pending())
                .cloned()
                .collect();
            pending.sort_by_key(|t| (t.created_at, t.id));
            Ok(pending)
        }

        async fn mark_processed(&self, id: TriggerId) -> Result<()> {
            let now = self.time.now();
            if let Some(trigger) = self
                .triggers
                .lock()
                .unwrap()
                .iter_mut()
                .find(|t| t.id == id)
            {
                if trigger.processed_at.is_none() {
                    trigger.processed_at = Some(now);
                }
            }
            Ok(())
        }

        async fn count_pending(&self) -> Result<u32> {
            Ok(self
                .triggers
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.is_pending())
                .count() as u32)
        }
    }
}
