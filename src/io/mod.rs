//! Tabular I/O around the pipeline: input records, crawler exports and the
//! scored report.
pub mod merger;
pub mod records;
pub mod report;

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{Result, TriageError};

/// Rows of one CSV file plus the number of rows that failed to parse.
#[derive(Debug)]
pub(crate) struct CsvRows<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
}

/// Reads a headed CSV file into `T`, skipping malformed rows with a
/// warning. A leading UTF-8 BOM is ignored.
pub(crate) fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<CsvRows<T>> {
    if !path.is_file() {
        return Err(TriageError::InputMissing(path.to_path_buf()));
    }
    let data = read_text(path)?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(data.as_bytes());

    let mut rows = Vec::new();
    let mut skipped = 0;
    for (index, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                skipped += 1;
                // +2: header line and 1-based numbering
                warn!("Skipping row {} of {}: {e}", index + 2, path.display());
            }
        }
    }
    Ok(CsvRows { rows, skipped })
}

/// File contents with a leading UTF-8 BOM removed. Invalid UTF-8 is
/// replaced with U+FFFD so one bad byte costs a character, not the file.
pub(crate) fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(&bytes);
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(text) => Ok(text.to_string()),
        Cow::Owned(text) => {
            warn!("{} contains invalid UTF-8, replaced bad bytes", path.display());
            Ok(text)
        }
    }
}

/// Headers of a CSV file, BOM stripped.
pub(crate) fn read_headers(path: &Path) -> Result<Vec<String>> {
    let data = read_text(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(data.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| TriageError::csv(path, e))?
        .iter()
        .map(str::to_string)
        .collect();
    Ok(headers)
}

/// Writes rows as CSV, creating parent directories. `header` is written
/// explicitly when there are no rows to derive it from.
pub(crate) fn write_csv<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path).map_err(|e| TriageError::csv(path, e))?;
    if rows.is_empty() {
        writer
            .write_record(header)
            .map_err(|e| TriageError::csv(path, e))?;
    }
    for row in rows {
        writer.serialize(row).map_err(|e| TriageError::csv(path, e))?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
