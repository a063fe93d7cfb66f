// Excel Infrastructure Adapter
//
// calamine-based SheetReader. Workbook parsing is synchronous CPU work,
// so every read runs on the blocking pool.

use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};
use inventa_core::error::{AppError, Result};
use inventa_core::port::sheet_reader::{Sheet, SheetReader};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct CalamineSheetReader;

impl CalamineSheetReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CalamineSheetReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SheetReader for CalamineSheetReader {
    async fn sheet_names(&self, path: &Path) -> Result<Vec<String>> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let workbook = open_workbook_auto(&path)
                .map_err(|e| workbook_error(&path, &e.to_string()))?;
            Ok(workbook.sheet_names().to_vec())
        })
        .await
        .map_err(|e| AppError::Workbook(format!("workbook read task failed: {e}")))?
    }

    async fn read_workbook(&self, path: &Path) -> Result<Vec<Sheet>> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || read_workbook_sync(&path))
            .await
            .map_err(|e| AppError::Workbook(format!("workbook read task failed: {e}")))?
    }
}

fn read_workbook_sync(path: &PathBuf) -> Result<Vec<Sheet>> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| workbook_error(path, &e.to_string()))?;

    let names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| workbook_error(path, &format!("sheet '{name}': {e}")))?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row.iter().map(cell_to_string).collect(),
            None => Vec::new(),
        };
        let data: Vec<Vec<String>> = rows
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();

        debug!(sheet = %name, rows = data.len(), "Read worksheet");
        sheets.push(Sheet {
            name,
            headers,
            rows: data,
        });
    }
    Ok(sheets)
}

/// Presentation-free cell text. Downstream staging stores strings; cell
/// typing is out of scope.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn workbook_error(path: &Path, detail: &str) -> AppError {
    AppError::Workbook(format!("{}: {detail}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_a_workbook_error() {
        let reader = CalamineSheetReader::new();
        let err = reader
            .read_workbook(Path::new("/nonexistent/export.xlsx"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Workbook(_)));
    }

    #[tokio::test]
    async fn garbage_bytes_are_a_workbook_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-workbook.xlsx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();

        let reader = CalamineSheetReader::new();
        assert!(reader.sheet_names(&path).await.is_err());
        assert!(reader.read_workbook(&path).await.is_err());
    }
}
