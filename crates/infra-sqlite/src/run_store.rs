// SQLite RunStore Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inventa_core::domain::{ImportBatch, JobId, JobRun, RunId, RunStatus, TriggerKind};
use inventa_core::error::{AppError, Result};
use inventa_core::port::RunStore;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::connection::map_sqlx_error;

pub struct SqliteRunStore {
    pool: SqlitePool,
}

impl SqliteRunStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RunStore for SqliteRunStore {
    async fn create(
        &self,
        job_id: JobId,
        trigger_kind: TriggerKind,
        trigger_principal: Option<&str>,
        started_at: DateTime<Utc>,
    ) -> Result<RunId> {
        let id: RunId = sqlx::query_scalar(
            "INSERT INTO job_runs (job_id, trigger_kind, trigger_principal, started_at, status) \
             VALUES (?, ?, ?, ?, 'Running') RETURNING run_id",
        )
        .bind(job_id)
        .bind(trigger_kind.to_string())
        .bind(trigger_principal)
        .bind(started_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(run_id = id, job_id, "Created run record");
        Ok(id)
    }

    async fn finalize(&self, run: &JobRun) -> Result<()> {
        sqlx::query(
            "UPDATE job_runs SET finished_at = ?, duration_ms = ?, status = ?, \
             files_processed = ?, files_failed = ?, error_message = ? \
             WHERE run_id = ?",
        )
        .bind(run.finished_at)
        .bind(run.duration_ms)
        .bind(run.status.to_string())
        .bind(run.files_processed as i64)
        .bind(run.files_failed as i64)
        .bind(run.error_message.as_deref())
        .bind(run.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn find(&self, id: RunId) -> Result<Option<JobRun>> {
        let row = sqlx::query(
            "SELECT run_id, job_id, trigger_kind, trigger_principal, started_at, \
             finished_at, duration_ms, status, files_processed, files_failed, error_message \
             FROM job_runs WHERE run_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        row.as_ref().map(run_from_row).transpose()
    }

    async fn count_running(&self) -> Result<u32> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM job_runs WHERE status = 'Running'")
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        Ok(count as u32)
    }

    async fn record_batch(&self, batch: &ImportBatch) -> Result<()> {
        sqlx::query(
            "INSERT INTO import_batches (run_id, source_file, source_server, export_date, \
             source_rows, loaded_rows, failed_rows, succeeded) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(batch.run_id)
        .bind(&batch.source_file)
        .bind(batch.source_server.as_deref())
        .bind(batch.export_date.map(|d| d.to_string()))
        .bind(batch.source_rows as i64)
        .bind(batch.loaded_rows as i64)
        .bind(batch.failed_rows as i64)
        .bind(batch.succeeded)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }
}

fn run_from_row(row: &SqliteRow) -> Result<JobRun> {
    let kind: String = row.try_get("trigger_kind").map_err(map_sqlx_error)?;
    let status: String = row.try_get("status").map_err(map_sqlx_error)?;
    Ok(JobRun {
        id: row.try_get("run_id").map_err(map_sqlx_error)?,
        job_id: row.try_get("job_id").map_err(map_sqlx_error)?,
        trigger_kind: kind.parse::<TriggerKind>().map_err(AppError::Database)?,
        trigger_principal: row.try_get("trigger_principal").map_err(map_sqlx_error)?,
        started_at: row.try_get("started_at").map_err(map_sqlx_error)?,
        finished_at: row.try_get("finished_at").map_err(map_sqlx_error)?,
        duration_ms: row.try_get("duration_ms").map_err(map_sqlx_error)?,
        status: status.parse::<RunStatus>().map_err(AppError::Database)?,
        files_processed: row.try_get::<i64, _>("files_processed").map_err(map_sqlx_error)? as u32,
        files_failed: row.try_get::<i64, _>("files_failed").map_err(map_sqlx_error)? as u32,
        error_message: row.try_get("error_message").map_err(map_sqlx_error)?,
    })
}