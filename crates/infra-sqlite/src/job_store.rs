// SQLite JobStore Implementation
//
// The catalog is written by the administrative surface; this adapter
// only reads it, and always fresh (no caching between calls).

use async_trait::async_trait;
use inventa_core::domain::{AuthMode, ConnectionDescriptor, Job, JobId, JobKind};
use inventa_core::error::{AppError, Result};
use inventa_core::port::JobStore;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::PathBuf;

use crate::connection::map_sqlx_error;

const JOB_COLUMNS: &str = "job_id, job_name, job_kind, enabled, \
     incoming_folder, processed_folder, errors_folder, \
     cron_schedule, time_zone, \
     server_name, database_name, auth_mode, encrypted_credential, \
     source_system";

pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn query_jobs(&self, predicate: &str) -> Result<Vec<Job>> {
        let sql =
            format!("SELECT {JOB_COLUMNS} FROM jobs WHERE {predicate} ORDER BY job_name");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        rows.iter().map(job_from_row).collect()
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn find(&self, id: JobId) -> Result<Option<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE job_id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(job_from_row).transpose()
    }

    async fn list_enabled(&self) -> Result<Vec<Job>> {
        self.query_jobs("enabled = 1").await
    }

    async fn list_enabled_scheduled(&self) -> Result<Vec<Job>> {
        self.query_jobs("enabled = 1 AND job_kind = 'Scheduled'").await
    }

    async fn list_enabled_watchers(&self) -> Result<Vec<Job>> {
        self.query_jobs("enabled = 1 AND job_kind = 'FileWatcher'").await
    }
}

fn job_from_row(row: &SqliteRow) -> Result<Job> {
    let kind: String = row.try_get("job_kind").map_err(map_sqlx_error)?;
    let auth_mode: String = row.try_get("auth_mode").map_err(map_sqlx_error)?;

    Ok(Job {
        id: row.try_get("job_id").map_err(map_sqlx_error)?,
        name: row.try_get("job_name").map_err(map_sqlx_error)?,
        kind: kind.parse::<JobKind>().map_err(AppError::Database)?,
        enabled: row.try_get("enabled").map_err(map_sqlx_error)?,
        incoming_folder: PathBuf::from(
            row.try_get::<String, _>("incoming_folder").map_err(map_sqlx_error)?,
        ),
        processed_folder: row
            .try_get::<Option<String>, _>("processed_folder")
            .map_err(map_sqlx_error)?
            .map(PathBuf::from),
        errors_folder: row
            .try_get::<Option<String>, _>("errors_folder")
            .map_err(map_sqlx_error)?
            .map(PathBuf::from),
        cron_schedule: row.try_get("cron_schedule").map_err(map_sqlx_error)?,
        time_zone: row.try_get("time_zone").map_err(map_sqlx_error)?,
        connection: ConnectionDescriptor {
            server: row.try_get("server_name").map_err(map_sqlx_error)?,
            database: row.try_get("database_name").map_err(map_sqlx_error)?,
            auth_mode: auth_mode.parse::<AuthMode>().map_err(AppError::Database)?,
            encrypted_credential: row
                .try_get("encrypted_credential")
                .map_err(map_sqlx_error)?,
        },
        source_system: row.try_get("source_system").map_err(map_sqlx_error)?,
    })
}
