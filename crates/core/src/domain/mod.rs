// Domain Layer - Pure business entities

pub mod export_file;
pub mod job;
pub mod run;
pub mod status;
pub mod trigger;

// Re-exports
pub use export_file::ExportFileInfo;
pub use job::{AuthMode, ConnectionDescriptor, Job, JobId, JobKind};
pub use run::{ImportBatch, JobRun, RunId, RunStatus};
pub use status::{ServiceState, ServiceStatus};
pub use trigger::{JobTrigger, TriggerId, TriggerKind};
