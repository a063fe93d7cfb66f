// Warehouse Writer Port (Interface)
//
// Bulk-insert mechanics live outside the core. The table name parameter
// is the `TableName` proof type: there is no way to call this port with
// a string that has not passed the whitelist.

use crate::domain::ConnectionDescriptor;
use crate::error::Result;
use crate::port::sheet_reader::Sheet;
use crate::security::{Credential, TableName};
use async_trait::async_trait;

#[async_trait]
pub trait WarehouseWriter: Send + Sync {
    /// Stage one sheet's rows into the warehouse, returning rows loaded.
    /// Connections are acquired per call and released on every exit path.
    async fn load_rows(
        &self,
        connection: &ConnectionDescriptor,
        credential: Option<&Credential>,
        table: TableName,
        batch_label: &str,
        sheet: &Sheet,
    ) -> Result<u64>;
}

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Records loads instead of writing anywhere
    #[derive(Default)]
    pub struct MemoryWarehouse {
        loads: Mutex<Vec<(String, u64)>>,
        failing_tables: Mutex<HashSet<&'static str>>,
    }

    impl MemoryWarehouse {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make loads into this table fail (connectivity-style error)
        pub fn fail_table(&self, table: &'static str) {
            self.failing_tables.lock().unwrap().insert(table);
        }

        /// (canonical table name, rows loaded) per call, in call order
        pub fn loads(&self) -> Vec<(String, u64)> {
            self.loads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WarehouseWriter for MemoryWarehouse {
        async fn load_rows(
            &self,
            _connection: &ConnectionDescriptor,
            _credential: Option<&Credential>,
            table: TableName,
            _batch_label: &str,
            sheet: &Sheet,
        ) -> Result<u64> {
            if self.failing_tables.lock().unwrap().contains(table.as_str()) {
                return Err(AppError::Database(format!(
                    "simulated load failure for table {table}"
                )));
            }
            let loaded = sheet.row_count();
            self.loads
                .lock()
                .unwrap()
                .push((table.as_str().to_string(), loaded));
            Ok(loaded)
        }
    }
}
