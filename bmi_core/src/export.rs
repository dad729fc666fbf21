//! CSV export of the retry queue, for inspecting or hand-importing
//! submissions that never reached the endpoint.

use crate::queue::PendingSubmission;
use crate::Result;
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    id: String,
    saved_at: String,
    attempts: u32,
    timestamp: &'a str,
    height: &'a str,
    weight: &'a str,
    bmi: &'a str,
    category: &'a str,
    note: &'a str,
    method: &'a str,
}

impl<'a> From<&'a PendingSubmission> for CsvRow<'a> {
    fn from(entry: &'a PendingSubmission) -> Self {
        CsvRow {
            id: entry.id.to_string(),
            saved_at: entry.saved_at.to_rfc3339(),
            attempts: entry.attempts,
            timestamp: &entry.payload.timestamp,
            height: &entry.payload.height,
            weight: &entry.payload.weight,
            bmi: &entry.payload.bmi,
            category: &entry.payload.category,
            note: &entry.payload.note,
            method: &entry.payload.method,
        }
    }
}

/// Write queued entries to `path` as CSV with a header row
///
/// Returns the number of rows written. The file is synced before returning.
pub fn export_pending_csv(entries: &[PendingSubmission], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(&file);
    for entry in entries {
        writer.serialize(CsvRow::from(entry))?;
    }
    writer.flush()?;
    drop(writer);
    file.sync_all()?;

    tracing::info!("Exported {} pending submissions to {:?}", entries.len(), path);
    Ok(entries.len())
}
