// Port Layer - Interfaces for external dependencies

pub mod job_store;
pub mod run_store;
pub mod sheet_reader;
pub mod status_store;
pub mod time_provider;
pub mod trigger_queue;
pub mod warehouse;

// Re-exports
pub use job_store::JobStore;
pub use run_store::RunStore;
pub use sheet_reader::{Sheet, SheetReader};
pub use status_store::StatusStore;
pub use time_provider::TimeProvider;
pub use trigger_queue::TriggerQueue;
pub use warehouse::WarehouseWriter;
