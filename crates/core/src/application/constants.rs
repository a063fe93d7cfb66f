// Orchestration constants (no magic values)
use std::time::Duration;

/// Default interval between trigger-queue polls (10s)
pub const DEFAULT_TRIGGER_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default interval between heartbeat writes (30s)
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Default interval between file-watcher folder scans (15s)
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(15);

/// How long Scheduler::stop waits for an entry task to drain (30s)
pub const SCHEDULER_STOP_TIMEOUT: Duration = Duration::from_secs(30);

/// Date suffix appended to moved files (YYYYMMDD)
pub const MOVE_DATE_FORMAT: &str = "%Y%m%d";

/// Time suffix appended on destination collisions (HHMMSS)
pub const MOVE_TIME_FORMAT: &str = "%H%M%S";
