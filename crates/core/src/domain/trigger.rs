// Job Trigger Domain Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::job::JobId;

/// Trigger ID (database identity)
pub type TriggerId = i64;

/// What asked for an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerKind {
    Scheduled,
    Manual,
    FileWatcher,
    Reschedule,
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerKind::Scheduled => write!(f, "Scheduled"),
            TriggerKind::Manual => write!(f, "Manual"),
            TriggerKind::FileWatcher => write!(f, "FileWatcher"),
            TriggerKind::Reschedule => write!(f, "Reschedule"),
        }
    }
}

impl FromStr for TriggerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Scheduled" => Ok(TriggerKind::Scheduled),
            "Manual" => Ok(TriggerKind::Manual),
            "FileWatcher" => Ok(TriggerKind::FileWatcher),
            "Reschedule" => Ok(TriggerKind::Reschedule),
            other => Err(format!("unknown trigger kind: {other}")),
        }
    }
}

/// A queued request that a job run outside its normal schedule.
/// Created externally (dashboard button, file-watcher event); consumed by
/// the trigger poller. Transitions to processed exactly once, whatever the
/// outcome of the execution it requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTrigger {
    pub id: TriggerId,
    pub job_id: JobId,
    pub kind: TriggerKind,
    pub principal: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl JobTrigger {
    pub fn is_pending(&self) -> bool {
        self.processed_at.is_none()
    }
}
