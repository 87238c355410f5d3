// crates/tessera-cli/src/output.rs
//
// Output formatting utilities for the tessera CLI.
// Supports table and JSON output modes.

use serde::Serialize;
use tabled::{Table, Tabled};

use tessera_core::{BatchUploadResult, Dataset, DatasetVersion, FailedUpload, UploadResult};

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data)
        .unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

#[derive(Tabled)]
pub struct DatasetRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Version")]
    pub version: String,
    #[tabled(rename = "Files")]
    pub files: usize,
    #[tabled(rename = "Size")]
    pub size: String,
    #[tabled(rename = "Encrypted")]
    pub encrypted: String,
    #[tabled(rename = "Updated")]
    pub updated: String,
}

impl From<&Dataset> for DatasetRow {
    fn from(d: &Dataset) -> Self {
        Self {
            id: d.id.to_string(),
            name: d.name.clone(),
            version: d.version.to_string(),
            files: d.files.len(),
            size: human_bytes(d.total_size()),
            encrypted: yes_no(d.encrypted),
            updated: d.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Tabled)]
pub struct FileRow {
    #[tabled(rename = "CID")]
    pub cid: String,
    #[tabled(rename = "Size")]
    pub size: String,
    #[tabled(rename = "Path")]
    pub path: String,
}

impl From<&UploadResult> for FileRow {
    fn from(f: &UploadResult) -> Self {
        Self {
            cid: f.cid.clone(),
            size: human_bytes(f.size),
            path: f.original_path.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct FailureRow {
    #[tabled(rename = "Path")]
    pub path: String,
    #[tabled(rename = "Error")]
    pub error: String,
}

impl From<&FailedUpload> for FailureRow {
    fn from(f: &FailedUpload) -> Self {
        Self {
            path: f.path.clone(),
            error: f.error.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct VersionRow {
    #[tabled(rename = "Version")]
    pub version: String,
    #[tabled(rename = "Created")]
    pub created: String,
    #[tabled(rename = "By")]
    pub created_by: String,
    #[tabled(rename = "Files")]
    pub files: usize,
    #[tabled(rename = "Summary")]
    pub summary: String,
}

impl From<&DatasetVersion> for VersionRow {
    fn from(v: &DatasetVersion) -> Self {
        Self {
            version: v.version.to_string(),
            created: v.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            created_by: v.created_by.clone(),
            files: v.snapshot.file_count,
            summary: v.summary.clone(),
        }
    }
}

/// Print the file and failure tables of a batch plus a one-line summary.
pub fn print_batch(result: &BatchUploadResult) {
    if !result.successful_uploads.is_empty() {
        let rows: Vec<FileRow> = result.successful_uploads.iter().map(FileRow::from).collect();
        println!("{}", format_table(&rows));
    }
    if result.has_failures() {
        println!();
        println!("Failed uploads:");
        let rows: Vec<FailureRow> = result.failed_uploads.iter().map(FailureRow::from).collect();
        println!("{}", format_table(&rows));
    }
    println!(
        "{} of {} files uploaded ({}) in {} ms, {}/s",
        result.successful,
        result.total,
        human_bytes(result.total_bytes()),
        result.duration_ms,
        human_bytes(result.average_speed as u64)
    );
}

pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_bytes_scales_units() {
        assert_eq!(human_bytes(0), "0 B");
        assert_eq!(human_bytes(1023), "1023 B");
        assert_eq!(human_bytes(1536), "1.5 KiB");
        assert_eq!(human_bytes(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn dataset_rows_render_as_table() {
        let dataset = Dataset::new(tessera_core::DatasetConfig::new("table"), Vec::new());
        let table = format_table(&[DatasetRow::from(&dataset)]);
        assert!(table.contains("Name"));
        assert!(table.contains("table"));
        assert!(table.contains("1.0.0"));
    }
}
