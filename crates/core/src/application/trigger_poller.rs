// Trigger Poller - drains the manual/external trigger queue
//
// Single cooperative loop: one interval, strictly sequential processing
// within a tick, no overlap across ticks (the loop blocks until the
// whole batch is handled). Every trigger is marked processed exactly
// once on every exit path, whether the execution succeeded, the job was
// missing, or the job was disabled.

use crate::application::constants::DEFAULT_TRIGGER_POLL_INTERVAL;
use crate::application::executor::JobExecutor;
use crate::application::shutdown::ShutdownToken;
use crate::domain::JobTrigger;
use crate::error::{AppError, Result};
use crate::port::{JobStore, TriggerQueue};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub struct TriggerPoller {
    triggers: Arc<dyn TriggerQueue>,
    jobs: Arc<dyn JobStore>,
    executor: Arc<JobExecutor>,
    interval: Duration,
}

impl TriggerPoller {
    pub fn new(
        triggers: Arc<dyn TriggerQueue>,
        jobs: Arc<dyn JobStore>,
        executor: Arc<JobExecutor>,
    ) -> Self {
        Self::with_interval(triggers, jobs, executor, DEFAULT_TRIGGER_POLL_INTERVAL)
    }

    pub fn with_interval(
        triggers: Arc<dyn TriggerQueue>,
        jobs: Arc<dyn JobStore>,
        executor: Arc<JobExecutor>,
        interval: Duration,
    ) -> Self {
        Self {
            triggers,
            jobs,
            executor,
            interval,
        }
    }

    /// Poll loop with graceful shutdown support
    pub async fn run(&self, mut shutdown: ShutdownToken) {
        info!(interval_secs = self.interval.as_secs(), "Trigger poller started");
        loop {
            if shutdown.is_shutdown() {
                break;
            }

            match self.drain_once(&shutdown).await {
                Ok(0) => {}
                Ok(count) => info!(count, "Processed pending triggers"),
                Err(e) => error!(error = %e, "Trigger poll failed"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.wait() => break,
            }
        }
        info!("Trigger poller stopped");
    }

    /// One tick: list pending triggers and handle them sequentially.
    /// Returns the number of triggers handled.
    pub async fn drain_once(&self, shutdown: &ShutdownToken) -> Result<usize> {
        let pending = self.triggers.list_pending().await?;
        let count = pending.len();

        for trigger in pending {
            self.process_trigger(&trigger, shutdown).await;
        }
        Ok(count)
    }

    /// Handle one trigger. Never returns an error: failures are logged
    /// so the remaining triggers in the batch still get their turn, and
    /// the mark-processed step runs on every path.
    async fn process_trigger(&self, trigger: &JobTrigger, shutdown: &ShutdownToken) {
        match self.jobs.find(trigger.job_id).await {
            Ok(Some(job)) if job.enabled => {
                match self
                    .executor
                    .execute(&job, trigger.kind, trigger.principal.as_deref(), shutdown)
                    .await
                {
                    Ok(outcome) => {
                        info!(
                            trigger_id = trigger.id,
                            job_id = job.id,
                            job_name = %job.name,
                            status = %outcome.status,
                            files_processed = outcome.files_processed,
                            files_failed = outcome.files_failed,
                            "Triggered run completed"
                        );
                    }
                    Err(AppError::AlreadyRunning(_)) => {
                        warn!(
                            trigger_id = trigger.id,
                            job_id = job.id,
                            "Job already running, trigger skipped"
                        );
                    }
                    Err(AppError::Cancelled) => {
                        info!(trigger_id = trigger.id, job_id = job.id, "Triggered run cancelled by shutdown");
                    }
                    Err(e) => {
                        error!(trigger_id = trigger.id, job_id = job.id, error = %e, "Triggered run failed");
                    }
                }
            }
            Ok(Some(job)) => {
                info!(
                    trigger_id = trigger.id,
                    job_id = job.id,
                    job_name = %job.name,
                    "Job is disabled, trigger consumed without a run"
                );
            }
            Ok(None) => {
                warn!(
                    trigger_id = trigger.id,
                    job_id = trigger.job_id,
                    "Job not found, trigger consumed without a run"
                );
            }
            Err(e) => {
                error!(trigger_id = trigger.id, error = %e, "Failed to resolve job for trigger");
            }
        }

        // Guaranteed-cleanup step: runs whatever happened above
        if let Err(e) = self.triggers.mark_processed(trigger.id).await {
            error!(trigger_id = trigger.id, error = %e, "Failed to mark trigger processed");
        }
    }
}
