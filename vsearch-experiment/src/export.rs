//! Hands finished main-phase records to delimited text or JSON.

use std::io::Write;
use std::path::Path;

use csv::{Terminator, WriterBuilder};
use tracing::info;
use vsearch_core::ResultRecord;

use crate::error::Result;

pub const DEFAULT_FILE_NAME: &str = "visual_search_data.csv";

pub const COLUMNS: [&str; 8] = [
    "trial_index",
    "block",
    "set_size",
    "display_duration",
    "target_present",
    "response_key",
    "correct",
    "rt_ms",
];

/// Header plus one CRLF-terminated row per record, in the order given.
pub fn write_csv<W: Write>(records: &[ResultRecord], writer: W) -> Result<()> {
    let mut csv = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::CRLF)
        .from_writer(writer);
    csv.write_record(COLUMNS)?;
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes `path` unless there is nothing to write. Returns whether a file
/// was created.
pub fn save_csv(records: &[ResultRecord], path: impl AsRef<Path>) -> Result<bool> {
    if records.is_empty() {
        return Ok(false);
    }
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    write_csv(records, file)?;
    info!(rows = records.len(), path = %path.display(), "results saved");
    Ok(true)
}

pub fn write_json<W: Write>(records: &[ResultRecord], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}
