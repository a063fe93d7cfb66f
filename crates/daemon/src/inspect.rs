//! `--inspect-workbook` diagnostic: dump sheet names and sample rows so
//! operators can see what an export file contains before importing it.

use anyhow::Result;
use inventa_core::port::SheetReader;
use inventa_core::security;
use inventa_infra_excel::CalamineSheetReader;
use std::path::Path;

const SAMPLE_ROWS: usize = 3;

pub async fn inspect_workbook(path: &Path) -> Result<()> {
    let reader = CalamineSheetReader::new();
    let sheets = reader.read_workbook(path).await?;

    println!("Workbook: {}", path.display());
    println!("Sheets:   {}", sheets.len());
    for sheet in &sheets {
        let recognized = if security::whitelist::is_valid(&sheet.name) {
            "importable"
        } else {
            "not importable (unknown name)"
        };
        println!();
        println!(
            "  {} - {} column(s), {} row(s) [{recognized}]",
            sheet.name,
            sheet.headers.len(),
            sheet.rows.len()
        );
        if !sheet.headers.is_empty() {
            println!("    headers: {}", sheet.headers.join(", "));
        }
        for row in sheet.rows.iter().take(SAMPLE_ROWS) {
            println!("    row: {}", row.join(" | "));
        }
    }
    Ok(())
}
