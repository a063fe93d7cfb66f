// Inventa Infrastructure - SQLite Adapter
// Implements: JobStore, TriggerQueue, RunStore, StatusStore, WarehouseWriter

mod connection;
mod job_store;
mod migration;
mod run_store;
mod status_store;
mod trigger_queue;
mod warehouse;

pub use connection::{create_pool, map_sqlx_error};
pub use job_store::SqliteJobStore;
pub use migration::run_migrations;
pub use run_store::SqliteRunStore;
pub use status_store::SqliteStatusStore;
pub use trigger_queue::SqliteTriggerQueue;
pub use warehouse::SqliteWarehouse;

// Note: sqlx::Error conversion is handled by map_sqlx_error
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
