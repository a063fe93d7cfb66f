//! Environment-driven daemon configuration, resolved once at startup

use std::time::Duration;

const DEFAULT_DB_PATH: &str = "inventa.db";
const DEFAULT_KEY_PATH: &str = "inventa.key";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 30;
const DEFAULT_WATCH_INTERVAL_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub db_path: String,
    pub key_path: String,
    pub poll_interval: Duration,
    pub heartbeat_interval: Duration,
    pub watch_interval: Duration,
}

impl DaemonConfig {
    pub fn from_env() -> Self {
        Self {
            db_path: env_string("INVENTA_DB_PATH", DEFAULT_DB_PATH),
            key_path: env_string("INVENTA_KEY_PATH", DEFAULT_KEY_PATH),
            poll_interval: env_secs("INVENTA_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS),
            heartbeat_interval: env_secs(
                "INVENTA_HEARTBEAT_INTERVAL_SECS",
                DEFAULT_HEARTBEAT_INTERVAL_SECS,
            ),
            watch_interval: env_secs("INVENTA_WATCH_INTERVAL_SECS", DEFAULT_WATCH_INTERVAL_SECS),
        }
    }
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_secs(name: &str, default: u64) -> Duration {
    let secs = std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}
