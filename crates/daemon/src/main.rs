//! Inventa Import Service - Main Entry Point

mod config;
mod inspect;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::DaemonConfig;
use inventa_core::application::{
    shutdown_channel, ActiveRuns, FileWatcher, HealthReporter, JobExecutor, Scheduler,
    ServiceIdentity, TriggerPoller,
};
use inventa_core::domain::ServiceState;
use inventa_core::port::time_provider::SystemTimeProvider;
use inventa_core::security::CredentialVault;
use inventa_infra_excel::CalamineSheetReader;
use inventa_infra_sqlite::{
    create_pool, run_migrations, SqliteJobStore, SqliteRunStore, SqliteStatusStore,
    SqliteTriggerQueue, SqliteWarehouse,
};

const SERVICE_NAME: &str = "inventa-import-service";
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostic mode short-circuits the daemon entirely
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("--inspect-workbook") {
        let Some(path) = args.get(2) else {
            eprintln!("Usage: inventa-service --inspect-workbook <path>");
            std::process::exit(1);
        };
        if let Err(e) = inspect::inspect_workbook(Path::new(path)).await {
            eprintln!("Inspection failed: {e}");
            std::process::exit(1);
        }
        return Ok(());
    }

    // 1. Initialize logging
    let log_format = std::env::var("INVENTA_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("inventa=info"))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {e}"))?;

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("Inventa Import Service v{} starting...", VERSION);

    // 2. Load configuration
    let config = DaemonConfig::from_env();
    info!(db_path = %config.db_path, "Initializing database...");

    // 3. Initialize database
    let pool = create_pool(&config.db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {e}"))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {e}"))?;

    // 4. Credential protection key (shared with whatever surface writes
    //    job credentials; a fresh key makes existing secrets unreadable)
    let key_path = Path::new(&config.key_path);
    let vault = if key_path.exists() {
        CredentialVault::from_key_file(key_path)
            .map_err(|e| anyhow::anyhow!("Credential key load failed: {e}"))?
    } else {
        info!(key_path = %key_path.display(), "Key file not found, generating a new one");
        CredentialVault::create_key_file(key_path)
            .map_err(|e| anyhow::anyhow!("Credential key creation failed: {e}"))?
    };

    // 5. Setup dependencies (DI wiring)
    let time = Arc::new(SystemTimeProvider);
    let jobs = Arc::new(SqliteJobStore::new(pool.clone()));
    let triggers = Arc::new(SqliteTriggerQueue::new(pool.clone()));
    let runs = Arc::new(SqliteRunStore::new(pool.clone()));
    let status = Arc::new(SqliteStatusStore::new(pool.clone()));
    let sheets = Arc::new(CalamineSheetReader::new());
    let warehouse = Arc::new(SqliteWarehouse::new());
    let active = ActiveRuns::new();

    let executor = Arc::new(JobExecutor::new(
        runs.clone(),
        sheets,
        warehouse,
        Arc::new(vault),
        active,
        time.clone(),
    ));

    let identity = ServiceIdentity {
        service_name: SERVICE_NAME.to_string(),
        machine_name: machine_name(),
        service_version: VERSION.to_string(),
    };
    let health = Arc::new(HealthReporter::with_interval(
        status,
        runs.clone(),
        triggers.clone(),
        time.clone(),
        identity,
        config.heartbeat_interval,
    ));

    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let scheduler = Arc::new(Scheduler::new(jobs.clone(), executor.clone(), shutdown_rx.clone()));
    let poller = TriggerPoller::with_interval(
        triggers.clone(),
        jobs.clone(),
        executor.clone(),
        config.poll_interval,
    );
    let watcher = FileWatcher::with_interval(jobs.clone(), triggers.clone(), config.watch_interval);

    // 6. Announce Running, then start the loops
    health
        .set_status(ServiceState::Running)
        .await
        .map_err(|e| anyhow::anyhow!("Initial status write failed: {e}"))?;

    match scheduler.start().await {
        Ok(count) => info!(scheduled_jobs = count, "Scheduler ready"),
        Err(e) => error!(error = %e, "Scheduler startup failed, continuing with triggers only"),
    }

    let poller_handle = {
        let token = shutdown_rx.clone();
        tokio::spawn(async move { poller.run(token).await })
    };
    let watcher_handle = {
        let token = shutdown_rx.clone();
        tokio::spawn(async move { watcher.run(token).await })
    };
    let health_handle = {
        let health = health.clone();
        let token = shutdown_rx.clone();
        tokio::spawn(async move { health.run(token).await })
    };

    info!("Service ready. Waiting for triggers and schedules...");

    // 7. Wait for shutdown signal
    wait_for_signal().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown: signal, drain, announce Stopped
    shutdown_tx.shutdown();
    scheduler.stop().await;
    let _ = poller_handle.await;
    let _ = watcher_handle.await;
    let _ = health_handle.await;

    if let Err(e) = health.set_status(ServiceState::Stopped).await {
        error!(error = %e, "Final status write failed");
    }

    info!("Shutdown complete.");
    Ok(())
}

fn machine_name() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown-host".to_string())
}

#[cfg(unix)]
async fn wait_for_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = sigterm.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
