// SQLite StatusStore Implementation
//
// One row per (service, machine), overwritten on every heartbeat.

use async_trait::async_trait;
use inventa_core::domain::ServiceStatus;
use inventa_core::error::Result;
use inventa_core::port::StatusStore;
use sqlx::SqlitePool;

use crate::connection::map_sqlx_error;

pub struct SqliteStatusStore {
    pool: SqlitePool,
}

impl SqliteStatusStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatusStore for SqliteStatusStore {
    async fn upsert(&self, status: &ServiceStatus) -> Result<()> {
        sqlx::query(
            "INSERT INTO service_status \
             (service_name, machine_name, status, last_heartbeat, service_version, \
              active_jobs, queued_jobs) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(service_name, machine_name) DO UPDATE SET \
             status = excluded.status, \
             last_heartbeat = excluded.last_heartbeat, \
             service_version = excluded.service_version, \
             active_jobs = excluded.active_jobs, \
             queued_jobs = excluded.queued_jobs",
        )
        .bind(&status.service_name)
        .bind(&status.machine_name)
        .bind(status.state.to_string())
        .bind(status.last_heartbeat)
        .bind(&status.service_version)
        .bind(status.active_jobs as i64)
        .bind(status.queued_jobs as i64)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }
}
