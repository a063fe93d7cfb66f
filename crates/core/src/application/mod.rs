// Application Layer - Orchestration

pub mod active_runs;
pub mod constants;
pub mod executor;
pub mod file_watcher;
pub mod health;
pub mod scheduler;
pub mod shutdown;
pub mod trigger_poller;

// Re-exports
pub use active_runs::{ActiveRuns, RunToken};
pub use executor::{JobExecutor, RunOutcome};
pub use file_watcher::FileWatcher;
pub use health::{HealthReporter, ServiceIdentity};
pub use scheduler::Scheduler;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use trigger_poller::TriggerPoller;
