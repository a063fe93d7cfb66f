// Export Filename Parsing
//
// Historical exports embed the source server and export date in the
// filename: {server}_{m}_{d}_{yyyy}.{domain}.xlsx. Parsing is best
// effort; a filename that does not match is simply an export with no
// embedded metadata, never an error.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportFileInfo {
    pub source_server: Option<String>,
    pub export_date: Option<NaiveDate>,
}

fn filename_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^([a-zA-Z0-9-]+)_(\d{1,2})_(\d{1,2})_(\d{4})\.[^.]+\.[^.]+.*\.xlsx$")
            .expect("filename pattern is valid")
    })
}

impl ExportFileInfo {
    pub fn parse(file_name: &str) -> Self {
        let Some(caps) = filename_pattern().captures(file_name) else {
            return Self::default();
        };

        let server = caps[1].to_string();
        let month: u32 = caps[2].parse().unwrap_or(0);
        let day: u32 = caps[3].parse().unwrap_or(0);
        let year: i32 = caps[4].parse().unwrap_or(0);

        // An impossible date invalidates the date only, not the server
        Self {
            source_server: Some(server),
            export_date: NaiveDate::from_ymd_opt(year, month, day),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_historical_filename() {
        let info = ExportFileInfo::parse("vcenter01_3_14_2024.corp.example.xlsx");
        assert_eq!(info.source_server.as_deref(), Some("vcenter01"));
        assert_eq!(info.export_date, NaiveDate::from_ymd_opt(2024, 3, 14));
    }

    #[test]
    fn plain_filename_yields_nothing() {
        let info = ExportFileInfo::parse("export.xlsx");
        assert_eq!(info, ExportFileInfo::default());
    }

    #[test]
    fn impossible_date_is_dropped_but_server_kept() {
        let info = ExportFileInfo::parse("vcenter01_2_30_2024.corp.example.xlsx");
        assert_eq!(info.source_server.as_deref(), Some("vcenter01"));
        assert_eq!(info.export_date, None);
    }

    #[test]
    fn non_xlsx_extension_does_not_match() {
        let info = ExportFileInfo::parse("vcenter01_3_14_2024.corp.example.csv");
        assert_eq!(info, ExportFileInfo::default());
    }
}
