// Service Status Domain Model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Heartbeat age at which the external dashboard treats the service as
/// stale. The core never alerts on this itself.
pub const STALE_HEARTBEAT_AGE_SECS: i64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceState {
    Running,
    Stopped,
    Error,
    Unknown,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceState::Running => write!(f, "Running"),
            ServiceState::Stopped => write!(f, "Stopped"),
            ServiceState::Error => write!(f, "Error"),
            ServiceState::Unknown => write!(f, "Unknown"),
        }
    }
}

impl FromStr for ServiceState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Running" => Ok(ServiceState::Running),
            "Stopped" => Ok(ServiceState::Stopped),
            "Error" => Ok(ServiceState::Error),
            "Unknown" => Ok(ServiceState::Unknown),
            other => Err(format!("unknown service state: {other}")),
        }
    }
}

/// Liveness row, overwritten on every heartbeat tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub service_name: String,
    pub machine_name: String,
    pub state: ServiceState,
    pub last_heartbeat: DateTime<Utc>,
    pub service_version: String,
    pub active_jobs: u32,
    pub queued_jobs: u32,
}

impl ServiceStatus {
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now - self.last_heartbeat >= Duration::seconds(STALE_HEARTBEAT_AGE_SECS)
    }
}
