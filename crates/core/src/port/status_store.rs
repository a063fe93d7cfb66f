// Status Store Port (Interface)

use crate::domain::ServiceStatus;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Insert or overwrite the status row for (service, machine)
    async fn upsert(&self, status: &ServiceStatus) -> Result<()>;
}

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Records every upsert, newest last
    #[derive(Default)]
    pub struct MemoryStatusStore {
        history: Mutex<Vec<ServiceStatus>>,
    }

    impl MemoryStatusStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn latest(&self) -> Option<ServiceStatus> {
            self.history.lock().unwrap().last().cloned()
        }

        pub fn history(&self) -> Vec<ServiceStatus> {
            self.history.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatusStore for MemoryStatusStore {
        async fn upsert(&self, status: &ServiceStatus) -> Result<()> {
            self.history.lock().unwrap().push(status.clone());
            Ok(())
        }
    }
}
