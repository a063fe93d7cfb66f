// Sheet Reader Port (Interface)
//
// Spreadsheet parsing mechanics live outside the core: given a file
// path, the capability returns sheet names and rows.

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// One worksheet, header row separated from data rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn row_count(&self) -> u64 {
        self.rows.len() as u64
    }
}

#[async_trait]
pub trait SheetReader: Send + Sync {
    /// Worksheet names, in workbook order
    async fn sheet_names(&self, path: &Path) -> Result<Vec<String>>;

    /// All worksheets with their data
    async fn read_workbook(&self, path: &Path) -> Result<Vec<Sheet>>;
}

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned workbooks keyed by file name (not full path).
    /// Unknown or poisoned files fail the way a corrupt export would.
    #[derive(Default)]
    pub struct MemorySheetReader {
        workbooks: Mutex<HashMap<String, Vec<Sheet>>>,
        poisoned: Mutex<HashMap<String, String>>,
    }

    impl MemorySheetReader {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn put_workbook(&self, file_name: &str, sheets: Vec<Sheet>) {
            self.workbooks
                .lock()
                .unwrap()
                .insert(file_name.to_string(), sheets);
        }

        /// Make reads of this file fail with the given message
        pub fn poison(&self, file_name: &str, message: &str) {
            self.poisoned
                .lock()
                .unwrap()
                .insert(file_name.to_string(), message.to_string());
        }

        fn file_name(path: &Path) -> String {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        }

        fn lookup(&self, path: &Path) -> Result<Vec<Sheet>> {
            let name = Self::file_name(path);
            if let Some(message) = self.poisoned.lock().unwrap().get(&name) {
                return Err(AppError::Workbook(message.clone()));
            }
            self.workbooks
                .lock()
                .unwrap()
                .get(&name)
                .cloned()
                .ok_or_else(|| AppError::Workbook(format!("no readable sheets in '{name}'")))
        }
    }

    #[async_trait]
    impl SheetReader for MemorySheetReader {
        async fn sheet_names(&self, path: &Path) -> Result<Vec<String>> {
            Ok(self.lookup(path)?.into_iter().map(|s| s.name).collect())
        }

        async fn read_workbook(&self, path: &Path) -> Result<Vec<Sheet>> {
            self.lookup(path)
        }
    }

    /// Builds a minimal sheet with one header and `rows` data rows
    pub fn sheet(name: &str, rows: usize) -> Sheet {
        Sheet {
            name: name.to_string(),
            headers: vec!["VM".to_string(), "Powerstate".to_string()],
            rows: (0..rows)
                .map(|i| vec![format!("vm-{i}"), "poweredOn".to_string()])
                .collect(),
        }
    }
}
