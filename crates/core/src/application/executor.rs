// Job Executor - one complete import cycle, end to end
//
// The executor owns all per-run state: the run row, the file counters,
// the decrypted credential. Both security primitives gate the warehouse:
// the credential is decrypted before any file is touched, and every
// sheet name passes the whitelist before any write is issued.

use crate::application::active_runs::ActiveRuns;
use crate::application::constants::{MOVE_DATE_FORMAT, MOVE_TIME_FORMAT};
use crate::application::shutdown::ShutdownToken;
use crate::domain::{
    ExportFileInfo, ImportBatch, Job, JobRun, RunId, RunStatus, TriggerKind,
};
use crate::error::{AppError, Result};
use crate::port::{RunStore, SheetReader, TimeProvider, WarehouseWriter};
use crate::security::whitelist::PROCESSING_ORDER;
use crate::security::{Credential, CredentialVault, TableName};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Aggregate result of one run, mirrored into the persisted JobRun
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: RunId,
    pub status: RunStatus,
    pub files_processed: u32,
    pub files_failed: u32,
    pub rows_loaded: u64,
    pub error_message: Option<String>,
}

pub struct JobExecutor {
    runs: Arc<dyn RunStore>,
    sheets: Arc<dyn SheetReader>,
    warehouse: Arc<dyn WarehouseWriter>,
    vault: Arc<CredentialVault>,
    active: Arc<ActiveRuns>,
    time: Arc<dyn TimeProvider>,
}

impl JobExecutor {
    pub fn new(
        runs: Arc<dyn RunStore>,
        sheets: Arc<dyn SheetReader>,
        warehouse: Arc<dyn WarehouseWriter>,
        vault: Arc<CredentialVault>,
        active: Arc<ActiveRuns>,
        time: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            runs,
            sheets,
            warehouse,
            vault,
            active,
            time,
        }
    }

    /// Run one complete import cycle for `job`.
    ///
    /// Returns `Ok` with the finalized outcome for both successful and
    /// failed runs; per-run failures (credential decryption, missing
    /// incoming folder) are persisted on the run record, not raised.
    /// Two cases are raised instead:
    /// - `AppError::AlreadyRunning` when a run for this job id is still
    ///   in progress (the caller skips, never queues), and
    /// - `AppError::Cancelled` after the run has been finalized as
    ///   Cancelled, so a scheduler layer can tell clean shutdown apart
    ///   from execution failure and apply no failure policy to it.
    pub async fn execute(
        &self,
        job: &Job,
        trigger_kind: TriggerKind,
        trigger_principal: Option<&str>,
        cancel: &ShutdownToken,
    ) -> Result<RunOutcome> {
        let _token = self
            .active
            .try_begin(job.id)
            .ok_or(AppError::AlreadyRunning(job.id))?;

        let started_at = self.time.now();
        let run_id = self
            .runs
            .create(job.id, trigger_kind, trigger_principal, started_at)
            .await?;

        info!(
            job_id = job.id,
            job_name = %job.name,
            run_id,
            trigger = %trigger_kind,
            "Starting job run"
        );

        // Decrypt before touching any file; failure aborts the whole run
        let credential = match self.resolve_credential(job) {
            Ok(credential) => credential,
            Err(e) => {
                return self
                    .fail_run(run_id, job, trigger_kind, trigger_principal, started_at, e)
                    .await;
            }
        };

        let files = match list_incoming_files(&job.incoming_folder).await {
            Ok(files) => files,
            Err(e) => {
                return self
                    .fail_run(run_id, job, trigger_kind, trigger_principal, started_at, e)
                    .await;
            }
        };

        if files.is_empty() {
            info!(job_id = job.id, folder = %job.incoming_folder.display(), "No spreadsheet files to process");
        } else {
            info!(job_id = job.id, count = files.len(), "Found spreadsheet file(s) to process");
        }

        let mut files_processed = 0u32;
        let mut files_failed = 0u32;
        let mut rows_loaded = 0u64;
        let mut last_error: Option<String> = None;

        for path in &files {
            // Observed at file boundaries only: a write in flight for the
            // current file is never aborted, the next file is never started
            if cancel.is_shutdown() {
                info!(job_id = job.id, run_id, "Cancellation requested, stopping before next file");
                self.finalize_run(
                    run_id,
                    job,
                    trigger_kind,
                    trigger_principal,
                    started_at,
                    RunStatus::Cancelled,
                    files_processed,
                    files_failed,
                    Some(AppError::Cancelled.to_string()),
                )
                .await?;
                return Err(AppError::Cancelled);
            }

            match self.import_file(job, run_id, path, credential.as_ref()).await {
                Ok(batch) => {
                    files_processed += 1;
                    rows_loaded += batch.loaded_rows;
                    self.record_batch(&batch).await;
                    self.move_file(path, job.processed_folder.as_deref()).await;
                }
                Err(e) => {
                    files_failed += 1;
                    let message = e.to_string();
                    warn!(
                        job_id = job.id,
                        run_id,
                        file = %path.display(),
                        error = %message,
                        "File import failed"
                    );
                    self.record_batch(&failed_batch(run_id, job, path)).await;
                    self.move_file(path, job.errors_folder.as_deref()).await;
                    last_error = Some(message);
                }
            }
        }

        let status = RunStatus::from_counts(files_processed, files_failed);
        let outcome = self
            .finalize_run(
                run_id,
                job,
                trigger_kind,
                trigger_principal,
                started_at,
                status,
                files_processed,
                files_failed,
                last_error,
            )
            .await?;
        Ok(RunOutcome {
            rows_loaded,
            ..outcome
        })
    }

    fn resolve_credential(&self, job: &Job) -> Result<Option<Credential>> {
        use crate::domain::AuthMode;

        match job.connection.auth_mode {
            AuthMode::Integrated => Ok(None),
            AuthMode::Credential => {
                let encrypted = job.connection.encrypted_credential.as_deref().ok_or_else(|| {
                    AppError::Config(format!(
                        "job '{}' uses credential auth but has no stored credential",
                        job.name
                    ))
                })?;
                Ok(Some(self.vault.unprotect(encrypted)?))
            }
        }
    }

    /// Import one file: read, validate every referenced name, stage rows.
    /// Any error fails this file only; nothing reaches the warehouse for
    /// a file whose sheet names did not all pass the whitelist.
    async fn import_file(
        &self,
        job: &Job,
        run_id: RunId,
        path: &Path,
        credential: Option<&Credential>,
    ) -> Result<ImportBatch> {
        let file_name = file_name_of(path);
        debug!(run_id, file = %file_name, "Reading workbook");

        let info = ExportFileInfo::parse(&file_name);
        let source_server = job.source_system.clone().or(info.source_server);

        let sheets = self.sheets.read_workbook(path).await?;
        if sheets.is_empty() {
            return Err(AppError::Workbook(format!(
                "no readable sheets found in '{file_name}'"
            )));
        }

        // Whitelist gate: validate all names before the first write
        let mut targets = Vec::with_capacity(sheets.len());
        for sheet in &sheets {
            let table = TableName::validate(&sheet.name)?;
            targets.push((table, sheet));
        }
        targets.sort_by_key(|(table, _)| processing_rank(table.as_str()));

        let mut source_rows = 0u64;
        let mut loaded_rows = 0u64;
        for (table, sheet) in targets {
            source_rows += sheet.row_count();
            loaded_rows += self
                .warehouse
                .load_rows(&job.connection, credential, table, &file_name, sheet)
                .await?;
            debug!(run_id, table = %table, rows = sheet.row_count(), "Sheet staged");
        }

        Ok(ImportBatch {
            run_id,
            source_file: file_name,
            source_server,
            export_date: info.export_date,
            source_rows,
            loaded_rows,
            failed_rows: source_rows - loaded_rows,
            succeeded: true,
        })
    }

    /// Batch bookkeeping must never mask the import result
    async fn record_batch(&self, batch: &ImportBatch) {
        if let Err(e) = self.runs.record_batch(batch).await {
            warn!(run_id = batch.run_id, error = %e, "Failed to record import batch");
        }
    }

    /// Move a processed/failed file out of the incoming folder. With no
    /// destination configured the file is left in place. Move failures
    /// are logged, not raised: the import result already stands.
    async fn move_file(&self, source: &Path, destination: Option<&Path>) {
        let Some(folder) = destination else {
            debug!(file = %source.display(), "No destination folder configured, leaving file in place");
            return;
        };

        if let Err(e) = self.try_move_file(source, folder).await {
            warn!(
                file = %source.display(),
                folder = %folder.display(),
                error = %e,
                "Failed to move file"
            );
        }
    }

    async fn try_move_file(&self, source: &Path, folder: &Path) -> Result<()> {
        tokio::fs::create_dir_all(folder).await?;

        let now = self.time.now();
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = source
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let date = now.format(MOVE_DATE_FORMAT);
        let mut destination = folder.join(format!("{stem}.{date}{extension}"));
        if tokio::fs::try_exists(&destination).await.unwrap_or(false) {
            let time = now.format(MOVE_TIME_FORMAT);
            destination = folder.join(format!("{stem}.{date}_{time}{extension}"));
        }

        tokio::fs::rename(source, &destination).await?;
        debug!(from = %source.display(), to = %destination.display(), "Moved file");
        Ok(())
    }

    async fn fail_run(
        &self,
        run_id: RunId,
        job: &Job,
        trigger_kind: TriggerKind,
        trigger_principal: Option<&str>,
        started_at: DateTime<Utc>,
        error: AppError,
    ) -> Result<RunOutcome> {
        warn!(job_id = job.id, run_id, error = %error, "Run aborted");
        self.finalize_run(
            run_id,
            job,
            trigger_kind,
            trigger_principal,
            started_at,
            RunStatus::Failed,
            0,
            0,
            Some(error.to_string()),
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn finalize_run(
        &self,
        run_id: RunId,
        job: &Job,
        trigger_kind: TriggerKind,
        trigger_principal: Option<&str>,
        started_at: DateTime<Utc>,
        status: RunStatus,
        files_processed: u32,
        files_failed: u32,
        error_message: Option<String>,
    ) -> Result<RunOutcome> {
        let finished_at = self.time.now();
        let duration_ms = (finished_at - started_at).num_milliseconds();

        let run = JobRun {
            id: run_id,
            job_id: job.id,
            trigger_kind,
            trigger_principal: trigger_principal.map(str::to_string),
            started_at,
            finished_at: Some(finished_at),
            duration_ms: Some(duration_ms),
            status,
            files_processed,
            files_failed,
            error_message: error_message.clone(),
        };
        self.runs.finalize(&run).await?;

        info!(
            job_id = job.id,
            job_name = %job.name,
            run_id,
            status = %status,
            files_processed,
            files_failed,
            duration_ms,
            "Job run finished"
        );

        Ok(RunOutcome {
            run_id,
            status,
            files_processed,
            files_failed,
            rows_loaded: 0,
            error_message,
        })
    }
}

/// Spreadsheet files in the incoming folder, lexicographic filename
/// order. Deterministic so re-runs walk files the same way.
async fn list_incoming_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut dir = tokio::fs::read_dir(folder).await?;
    let mut files = Vec::new();
    while let Some(entry) = dir.next_entry().await? {
        let path = entry.path();
        let is_spreadsheet = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("xlsx"))
            .unwrap_or(false);
        if is_spreadsheet && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    files.sort_by_key(|p| file_name_of(p));
    Ok(files)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn processing_rank(canonical: &str) -> usize {
    PROCESSING_ORDER
        .iter()
        .position(|name| *name == canonical)
        .unwrap_or(PROCESSING_ORDER.len())
}

fn failed_batch(run_id: RunId, job: &Job, path: &Path) -> ImportBatch {
    let file_name = file_name_of(path);
    let info = ExportFileInfo::parse(&file_name);
    ImportBatch {
        run_id,
        source_file: file_name,
        source_server: job.source_system.clone().or(info.source_server),
        export_date: info.export_date,
        source_rows: 0,
        loaded_rows: 0,
        failed_rows: 0,
        succeeded: false,
    }
}
