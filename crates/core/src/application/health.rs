// Health Reporter - periodic heartbeat/status publisher
//
// Observes only aggregate state (running runs, pending triggers) and
// overwrites one status row per (service, machine). Staleness detection
// happens on the consuming dashboard, not here.

use crate::application::constants::DEFAULT_HEARTBEAT_INTERVAL;
use crate::application::shutdown::ShutdownToken;
use crate::domain::{ServiceState, ServiceStatus};
use crate::error::Result;
use crate::port::{RunStore, StatusStore, TimeProvider, TriggerQueue};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Who is reporting
#[derive(Debug, Clone)]
pub struct ServiceIdentity {
    pub service_name: String,
    pub machine_name: String,
    pub service_version: String,
}

pub struct HealthReporter {
    status: Arc<dyn StatusStore>,
    runs: Arc<dyn RunStore>,
    triggers: Arc<dyn TriggerQueue>,
    time: Arc<dyn TimeProvider>,
    identity: ServiceIdentity,
    interval: Duration,
}

impl HealthReporter {
    pub fn new(
        status: Arc<dyn StatusStore>,
        runs: Arc<dyn RunStore>,
        triggers: Arc<dyn TriggerQueue>,
        time: Arc<dyn TimeProvider>,
        identity: ServiceIdentity,
    ) -> Self {
        Self::with_interval(status, runs, triggers, time, identity, DEFAULT_HEARTBEAT_INTERVAL)
    }

    pub fn with_interval(
        status: Arc<dyn StatusStore>,
        runs: Arc<dyn RunStore>,
        triggers: Arc<dyn TriggerQueue>,
        time: Arc<dyn TimeProvider>,
        identity: ServiceIdentity,
        interval: Duration,
    ) -> Self {
        Self {
            status,
            runs,
            triggers,
            time,
            identity,
            interval,
        }
    }

    /// Heartbeat loop with graceful shutdown support
    pub async fn run(&self, mut shutdown: ShutdownToken) {
        info!(interval_secs = self.interval.as_secs(), "Health reporter started");
        loop {
            if shutdown.is_shutdown() {
                break;
            }
            if let Err(e) = self.heartbeat().await {
                warn!(error = %e, "Heartbeat write failed");
            }
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.wait() => break,
            }
        }
        info!("Health reporter stopped");
    }

    /// Write one heartbeat with current job counts
    pub async fn heartbeat(&self) -> Result<()> {
        let (active, queued) = self.job_counts().await;
        self.write_status(ServiceState::Running, active, queued).await
    }

    /// Explicit state transition, once at start (Running) and once at
    /// graceful stop (Stopped), independent of the heartbeat cadence
    pub async fn set_status(&self, state: ServiceState) -> Result<()> {
        let (active, queued) = match state {
            ServiceState::Running => self.job_counts().await,
            _ => (0, 0),
        };
        self.write_status(state, active, queued).await
    }

    async fn write_status(&self, state: ServiceState, active: u32, queued: u32) -> Result<()> {
        self.status
            .upsert(&ServiceStatus {
                service_name: self.identity.service_name.clone(),
                machine_name: self.identity.machine_name.clone(),
                state,
                last_heartbeat: self.time.now(),
                service_version: self.identity.service_version.clone(),
                active_jobs: active,
                queued_jobs: queued,
            })
            .await
    }

    /// Best effort: a failed count query degrades to zeros rather than
    /// suppressing the heartbeat
    async fn job_counts(&self) -> (u32, u32) {
        let active = match self.runs.count_running().await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "Failed to count active runs");
                0
            }
        };
        let queued = match self.triggers.count_pending().await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "Failed to count pending triggers");
                0
            }
        };
        (active, queued)
    }
}
