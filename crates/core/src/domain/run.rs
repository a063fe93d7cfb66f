// Job Run Domain Model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::job::JobId;
use crate::domain::trigger::TriggerKind;

/// Run ID (database identity)
pub type RunId = i64;

/// Outcome of one execution attempt of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Success,
    Failed,
    Cancelled,
    PartialSuccess,
}

impl RunStatus {
    /// Final status from aggregate file counts. An empty incoming folder
    /// is a successful (if uneventful) run.
    pub fn from_counts(files_processed: u32, files_failed: u32) -> Self {
        match (files_processed, files_failed) {
            (_, 0) => RunStatus::Success,
            (0, _) => RunStatus::Failed,
            _ => RunStatus::PartialSuccess,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "Running"),
            RunStatus::Success => write!(f, "Success"),
            RunStatus::Failed => write!(f, "Failed"),
            RunStatus::Cancelled => write!(f, "Cancelled"),
            RunStatus::PartialSuccess => write!(f, "PartialSuccess"),
        }
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Running" => Ok(RunStatus::Running),
            "Success" => Ok(RunStatus::Success),
            "Failed" => Ok(RunStatus::Failed),
            "Cancelled" => Ok(RunStatus::Cancelled),
            "PartialSuccess" => Ok(RunStatus::PartialSuccess),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}

/// One execution attempt of a job. Created by the executor at run start
/// and mutated only by that same run, never concurrently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRun {
    pub id: RunId,
    pub job_id: JobId,
    pub trigger_kind: TriggerKind,
    pub trigger_principal: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub status: RunStatus,
    pub files_processed: u32,
    pub files_failed: u32,
    pub error_message: Option<String>,
}

/// Per-file record of rows staged during one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub run_id: RunId,
    pub source_file: String,
    /// Source server parsed from the filename or taken from the job
    pub source_server: Option<String>,
    /// Export date parsed from the filename, best effort
    pub export_date: Option<NaiveDate>,
    pub source_rows: u64,
    pub loaded_rows: u64,
    pub failed_rows: u64,
    pub succeeded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_from_counts() {
        assert_eq!(RunStatus::from_counts(4, 0), RunStatus::Success);
        assert_eq!(RunStatus::from_counts(0, 3), RunStatus::Failed);
        assert_eq!(RunStatus::from_counts(4, 1), RunStatus::PartialSuccess);
        // Nothing to do counts as success
        assert_eq!(RunStatus::from_counts(0, 0), RunStatus::Success);
    }

    #[test]
    fn running_is_not_terminal() {
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Cancelled.is_terminal());
    }
}
