// Job Domain Model

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Job ID (database identity)
pub type JobId = i64;

/// How a job is normally started. Closed set; trigger-type bookkeeping
/// is the only behavior variation, so no polymorphism here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobKind {
    Scheduled,
    Manual,
    FileWatcher,
    Reschedule,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::Scheduled => write!(f, "Scheduled"),
            JobKind::Manual => write!(f, "Manual"),
            JobKind::FileWatcher => write!(f, "FileWatcher"),
            JobKind::Reschedule => write!(f, "Reschedule"),
        }
    }
}

impl FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Scheduled" => Ok(JobKind::Scheduled),
            "Manual" => Ok(JobKind::Manual),
            "FileWatcher" => Ok(JobKind::FileWatcher),
            "Reschedule" => Ok(JobKind::Reschedule),
            other => Err(format!("unknown job kind: {other}")),
        }
    }
}

/// How the executor authenticates against the warehouse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMode {
    /// Ambient process identity; no stored credential involved
    Integrated,
    /// Stored username/password, protected by the credential vault
    Credential,
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::Integrated => write!(f, "Integrated"),
            AuthMode::Credential => write!(f, "Credential"),
        }
    }
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Integrated" => Ok(AuthMode::Integrated),
            "Credential" => Ok(AuthMode::Credential),
            other => Err(format!("unknown auth mode: {other}")),
        }
    }
}

/// Target warehouse connection for a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    pub server: String,
    pub database: String,
    pub auth_mode: AuthMode,
    /// Opaque vault payload; only the executor ever decrypts it
    pub encrypted_credential: Option<String>,
}

/// A configured, named import task. Created and edited by an external
/// administrative surface; strictly read-only inside the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub kind: JobKind,
    pub enabled: bool,
    pub incoming_folder: PathBuf,
    pub processed_folder: Option<PathBuf>,
    pub errors_folder: Option<PathBuf>,
    /// A job with no cron expression is never registered with the Scheduler
    pub cron_schedule: Option<String>,
    /// IANA timezone name for the cron schedule
    pub time_zone: String,
    pub connection: ConnectionDescriptor,
    /// Default source system (e.g. the vCenter name) when the filename
    /// carries none
    pub source_system: Option<String>,
}

impl Job {
    /// True when the scheduler should register this job
    pub fn is_schedulable(&self) -> bool {
        self.enabled && self.kind == JobKind::Scheduled && self.cron_schedule.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(kind: JobKind, enabled: bool, cron: Option<&str>) -> Job {
        Job {
            id: 1,
            name: "nightly".to_string(),
            kind,
            enabled,
            incoming_folder: PathBuf::from("/data/incoming"),
            processed_folder: None,
            errors_folder: None,
            cron_schedule: cron.map(str::to_string),
            time_zone: "UTC".to_string(),
            connection: ConnectionDescriptor {
                server: "warehouse".to_string(),
                database: "inventory".to_string(),
                auth_mode: AuthMode::Integrated,
                encrypted_credential: None,
            },
            source_system: None,
        }
    }

    #[test]
    fn schedulable_requires_cron_and_enabled() {
        assert!(job(JobKind::Scheduled, true, Some("0 0 2 * * *")).is_schedulable());
        assert!(!job(JobKind::Scheduled, true, None).is_schedulable());
        assert!(!job(JobKind::Scheduled, false, Some("0 0 2 * * *")).is_schedulable());
        assert!(!job(JobKind::Manual, true, Some("0 0 2 * * *")).is_schedulable());
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [
            JobKind::Scheduled,
            JobKind::Manual,
            JobKind::FileWatcher,
            JobKind::Reschedule,
        ] {
            assert_eq!(kind.to_string().parse::<JobKind>().unwrap(), kind);
        }
        assert!("Cron".parse::<JobKind>().is_err());
    }
}
