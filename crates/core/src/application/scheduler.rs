// Scheduler - cron fires for enabled scheduled jobs
//
// One timer task per registered job, keyed by job id only. At fire time
// the full job configuration is re-read from the catalog, so edits made
// between registration and firing take effect without a restart. A fire
// for a job whose previous run has not finished is skipped, not queued.
// A failed run never requests a re-fire; the job waits for its next
// natural cron occurrence or a manual trigger.

use crate::application::constants::SCHEDULER_STOP_TIMEOUT;
use crate::application::executor::JobExecutor;
use crate::application::shutdown::ShutdownToken;
use crate::domain::{JobId, TriggerKind};
use crate::error::{AppError, Result};
use crate::port::JobStore;
use chrono::Utc;
use chrono_tz::Tz;
use cron::Schedule;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub struct Scheduler {
    jobs: Arc<dyn JobStore>,
    executor: Arc<JobExecutor>,
    shutdown: ShutdownToken,
    entries: Mutex<HashMap<JobId, JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        executor: Arc<JobExecutor>,
        shutdown: ShutdownToken,
    ) -> Self {
        Self {
            jobs,
            executor,
            shutdown,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Load all enabled scheduled jobs and register one entry each.
    /// Returns the number of registered entries; a bad cron expression
    /// skips that job with an error, never aborts startup.
    pub async fn start(&self) -> Result<usize> {
        info!("Starting scheduler...");

        let jobs = self.jobs.list_enabled_scheduled().await?;
        let mut registered = 0usize;
        let mut skipped = 0usize;

        for job in &jobs {
            let Some(cron) = job.cron_schedule.as_deref() else {
                debug!(job_id = job.id, job_name = %job.name, "Job has no cron schedule, skipping");
                skipped += 1;
                continue;
            };
            match self.register(job.id, cron, &job.time_zone) {
                Ok(()) => registered += 1,
                Err(e) => {
                    error!(job_id = job.id, job_name = %job.name, error = %e, "Failed to schedule job");
                    skipped += 1;
                }
            }
        }

        info!(registered, skipped, "Scheduler started");
        Ok(registered)
    }

    /// Register one schedule entry, replacing any existing entry for the
    /// same job id. Only the id is captured: configuration is resolved
    /// fresh at every fire.
    pub fn register(&self, job_id: JobId, cron_expr: &str, tz_name: &str) -> Result<()> {
        let schedule = Schedule::from_str(cron_expr)
            .map_err(|e| AppError::Schedule(format!("'{cron_expr}': {e}")))?;

        let tz: Tz = tz_name.parse().unwrap_or_else(|_| {
            warn!(job_id, tz_name, "Unknown timezone, falling back to UTC");
            Tz::UTC
        });

        let next_fire = schedule.upcoming(tz).next();
        info!(job_id, cron = cron_expr, timezone = %tz, next_fire = ?next_fire, "Registered schedule entry");

        let handle = tokio::spawn(run_entry(
            Arc::clone(&self.jobs),
            Arc::clone(&self.executor),
            job_id,
            schedule,
            tz,
            self.shutdown.clone(),
        ));

        if let Some(replaced) = self.entries.lock().unwrap().insert(job_id, handle) {
            replaced.abort();
            debug!(job_id, "Replaced existing schedule entry");
        }
        Ok(())
    }

    /// Remove the entry for a job, cancelling its timer
    pub fn unregister(&self, job_id: JobId) {
        if let Some(handle) = self.entries.lock().unwrap().remove(&job_id) {
            handle.abort();
            info!(job_id, "Unregistered schedule entry");
        }
    }

    pub fn is_registered(&self, job_id: JobId) -> bool {
        self.entries.lock().unwrap().contains_key(&job_id)
    }

    /// Drain all entry tasks. Call after the shutdown signal has fired;
    /// in-flight executions finish or are cancelled by that same signal.
    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        let entries: Vec<(JobId, JoinHandle<()>)> =
            self.entries.lock().unwrap().drain().collect();
        for (job_id, handle) in entries {
            if tokio::time::timeout(SCHEDULER_STOP_TIMEOUT, handle).await.is_err() {
                warn!(job_id, "Schedule entry did not stop in time, aborting");
            }
        }
        info!("Scheduler stopped");
    }
}

/// Timer loop for one job id
async fn run_entry(
    jobs: Arc<dyn JobStore>,
    executor: Arc<JobExecutor>,
    job_id: JobId,
    schedule: Schedule,
    tz: Tz,
    mut shutdown: ShutdownToken,
) {
    loop {
        if shutdown.is_shutdown() {
            break;
        }

        let Some(next) = schedule.upcoming(tz).next() else {
            info!(job_id, "Schedule has no further occurrences");
            break;
        };
        let wait = (next.with_timezone(&Utc) - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown.wait() => break,
        }

        fire(&jobs, &executor, job_id, &shutdown).await;
    }
    debug!(job_id, "Schedule entry stopped");
}

/// One fire: re-resolve the current configuration, then execute
async fn fire(
    jobs: &Arc<dyn JobStore>,
    executor: &Arc<JobExecutor>,
    job_id: JobId,
    shutdown: &ShutdownToken,
) {
    let job = match jobs.find(job_id).await {
        Ok(Some(job)) => job,
        Ok(None) => {
            warn!(job_id, "Job not found in catalog, skipping scheduled fire");
            return;
        }
        Err(e) => {
            error!(job_id, error = %e, "Failed to resolve job at fire time");
            return;
        }
    };

    if !job.enabled {
        info!(job_id, job_name = %job.name, "Job is disabled, skipping scheduled fire");
        return;
    }

    match executor
        .execute(&job, TriggerKind::Scheduled, None, shutdown)
        .await
    {
        Ok(outcome) => {
            info!(
                job_id,
                job_name = %job.name,
                status = %outcome.status,
                files_processed = outcome.files_processed,
                files_failed = outcome.files_failed,
                "Scheduled fire completed"
            );
        }
        Err(AppError::AlreadyRunning(_)) => {
            // Skipped, not queued; the next cron occurrence will try again
            info!(job_id, job_name = %job.name, "Previous run still active, skipping this fire");
        }
        Err(AppError::Cancelled) => {
            info!(job_id, job_name = %job.name, "Scheduled fire cancelled by shutdown");
        }
        Err(e) => {
            // No immediate re-fire on failure
            error!(job_id, job_name = %job.name, error = %e, "Scheduled fire failed");
        }
    }
}
