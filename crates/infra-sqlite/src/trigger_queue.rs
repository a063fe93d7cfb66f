// SQLite TriggerQueue Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inventa_core::domain::{JobId, JobTrigger, TriggerId, TriggerKind};
use inventa_core::error::{AppError, Result};
use inventa_core::port::TriggerQueue;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::connection::map_sqlx_error;

pub struct SqliteTriggerQueue {
    pool: SqlitePool,
}

impl SqliteTriggerQueue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TriggerQueue for SqliteTriggerQueue {
    async fn enqueue(
        &self,
        job_id: JobId,
        kind: TriggerKind,
        principal: Option<&str>,
    ) -> Result<TriggerId> {
        let id: TriggerId = sqlx::query_scalar(
            "INSERT INTO job_triggers (job_id, trigger_kind, trigger_principal, created_at) \
             VALUES (?, ?, ?, ?) RETURNING trigger_id",
        )
        .bind(job_id)
        .bind(kind.to_string())
        .bind(principal)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(trigger_id = id, job_id, kind = %kind, "Enqueued trigger");
        Ok(id)
    }

    async fn list_pending(&self) -> Result<Vec<JobTrigger>> {
        let rows = sqlx::query(
            "SELECT trigger_id, job_id, trigger_kind, trigger_principal, created_at, processed_at \
             FROM job_triggers WHERE processed_at IS NULL \
             ORDER BY created_at ASC, trigger_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        rows.iter().map(trigger_from_row).collect()
    }

    async fn mark_processed(&self, id: TriggerId) -> Result<()> {
        // Idempotent: a second call finds processed_at already set
        sqlx::query(
            "UPDATE job_triggers SET processed_at = ? \
             WHERE trigger_id = ? AND processed_at IS NULL",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(trigger_id = id, "Marked trigger processed");
        Ok(())
    }

    async fn count_pending(&self) -> Result<u32> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM job_triggers WHERE processed_at IS NULL")
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        Ok(count as u32)
    }
}

fn trigger_from_row(row: &SqliteRow) -> Result<JobTrigger> {
    let kind: String = row.try_get("trigger_kind").map_err(map_sqlx_error)?;
    Ok(JobTrigger {
        id: row.try_get("trigger_id").map_err(map_sqlx_error)?,
        job_id: row.try_get("job_id").map_err(map_sqlx_error)?,
        kind: kind.parse::<TriggerKind>().map_err(AppError::Database)?,
        principal: row.try_get("trigger_principal").map_err(map_sqlx_error)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(map_sqlx_error)?,
        processed_at: row
            .try_get::<Option<DateTime<Utc>>, _>("processed_at")
            .map_err(map_sqlx_error)?,
    })
}
