//! Input table reading and raw-directory ingest.
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Result, TriageError};
use crate::io::{read_csv, read_headers, write_csv};
use crate::models::Record;

pub const RECORD_COLUMNS: [&str; 7] = [
    "record_id",
    "timestamp",
    "social_user_id",
    "source_channel",
    "original_text",
    "reaction_label",
    "context_content",
];

/// Records loaded from the input boundary.
#[derive(Debug, Default)]
pub struct LoadedRecords {
    pub records: Vec<Record>,
    /// Rows dropped because they could not be parsed.
    pub skipped: usize,
}

/// Column set accepted on input; unknown columns are ignored.
#[derive(Debug, Deserialize)]
struct InputRow {
    #[serde(default)]
    record_id: Option<String>,
    #[serde(default)]
    post_id: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    created_time: Option<String>,
    #[serde(default)]
    social_user_id: Option<String>,
    #[serde(default)]
    source_channel: Option<String>,
    #[serde(default)]
    original_text: Option<String>,
    #[serde(default)]
    reaction_label: Option<String>,
    #[serde(default)]
    context_content: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Sequential record id: `REC_001`, `REC_002`, …
#[must_use]
pub fn record_id(index: usize) -> String {
    format!("REC_{:03}", index + 1)
}

impl InputRow {
    fn into_record(self, index: usize) -> Record {
        Record {
            record_id: non_blank(self.record_id)
                .or_else(|| non_blank(self.post_id))
                .map(|id| id.trim().to_string())
                .unwrap_or_else(|| record_id(index)),
            timestamp: non_blank(self.timestamp)
                .or(self.created_time)
                .unwrap_or_default(),
            social_user_id: self.social_user_id.unwrap_or_default(),
            source_channel: self.source_channel.unwrap_or_default(),
            original_text: non_blank(self.original_text),
            reaction_label: non_blank(self.reaction_label),
            context_content: non_blank(self.context_content),
        }
    }
}

/// Reads the input table. A missing file is fatal; unparsable rows are
/// skipped and counted.
pub fn read_records(path: &Path) -> Result<LoadedRecords> {
    let parsed = read_csv::<InputRow>(path)?;
    let records: Vec<Record> = parsed
        .rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| row.into_record(i))
        .collect();

    info!("Read {} records from {}", records.len(), path.display());
    if parsed.skipped > 0 {
        warn!("Skipped {} malformed rows in {}", parsed.skipped, path.display());
    }
    Ok(LoadedRecords {
        records,
        skipped: parsed.skipped,
    })
}

pub fn write_records(path: &Path, records: &[Record]) -> Result<()> {
    write_csv(path, &RECORD_COLUMNS, records)?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Concatenates every `*.csv` file in `dir` (sorted by path) into one
/// record list and re-issues ids `REC_001…` over the result.
///
/// Files without a `source_channel` column take their file stem as the
/// channel. Unreadable files are skipped with a warning.
pub fn ingest_dir(dir: &Path) -> Result<LoadedRecords> {
    if !dir.is_dir() {
        return Err(TriageError::InputMissing(dir.to_path_buf()));
    }

    let pattern = format!("{}/*.csv", glob::Pattern::escape(&dir.to_string_lossy()));
    let mut files: Vec<PathBuf> = glob::glob(&pattern)?
        .flatten()
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(TriageError::NoInputFiles(dir.to_path_buf()));
    }
    info!("Found {} source file(s) in {}", files.len(), dir.display());

    let mut merged = LoadedRecords::default();
    for file in &files {
        let has_channel = match read_headers(file) {
            Ok(headers) => headers.iter().any(|h| h == "source_channel"),
            Err(e) => {
                warn!("Failed to read {}: {e}", file.display());
                continue;
            }
        };
        let loaded = match read_records(file) {
            Ok(l) => l,
            Err(e) => {
                warn!("Failed to read {}: {e}", file.display());
                continue;
            }
        };

        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        merged.skipped += loaded.skipped;
        merged
            .records
            .extend(loaded.records.into_iter().map(|mut r| {
                if !has_channel {
                    r.source_channel = stem.clone();
                }
                r
            }));
    }

    for (i, record) in merged.records.iter_mut().enumerate() {
        record.record_id = record_id(i);
    }
    info!("Merged {} records", merged.records.len());
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_read_records_with_bom_and_fallback_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        fs::write(
            &path,
            "\u{feff}post_id,original_text,reaction_label,source_channel,extra\n\
             P_9,Tốt quá,love,Fanpage_Comment,x\n\
             ,,ANGRY,Fanpage_Post_Reaction,y\n",
        )
        .unwrap();

        let loaded = read_records(&path).unwrap();
        assert_eq!(loaded.skipped, 0);
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.records[0].record_id, "P_9");
        assert_eq!(loaded.records[0].original_text.as_deref(), Some("Tốt quá"));
        assert_eq!(loaded.records[1].record_id, "REC_002");
        assert_eq!(loaded.records[1].original_text, None);
        assert_eq!(loaded.records[1].reaction_label.as_deref(), Some("ANGRY"));
    }

    #[test]
    fn test_invalid_utf8_byte_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        let bytes: &[u8] = b"record_id,original_text\nREC_001,t\xf4t\nREC_002,ok\nREC_003,fine\n";
        fs::write(&path, bytes).unwrap();

        let loaded = read_records(&path).unwrap();
        assert_eq!(loaded.records.len(), 3);
        assert_eq!(loaded.skipped, 0);
        assert_eq!(loaded.records[0].original_text.as_deref(), Some("t\u{fffd}t"));
        assert_eq!(loaded.records[2].original_text.as_deref(), Some("fine"));
    }

    #[test]
    fn test_glob_pattern_error_variant() {
        let err: TriageError = glob::Pattern::new("a[").unwrap_err().into();
        assert!(matches!(err, TriageError::Pattern(_)));
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_records(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, TriageError::InputMissing(_)));
    }

    #[test]
    fn test_write_then_read_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/records.csv");
        let records = vec![Record {
            record_id: "REC_001".to_string(),
            timestamp: "2025-02-01 08:00:00".to_string(),
            social_user_id: "u1".to_string(),
            source_channel: "Fanpage_Comment".to_string(),
            original_text: Some("rút tiền, chậm".to_string()),
            reaction_label: None,
            context_content: None,
        }];
        write_records(&path, &records).unwrap();
        let loaded = read_records(&path).unwrap();
        assert_eq!(loaded.records, records);
    }

    #[test]
    fn test_ingest_dir_merges_and_reindexes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("b_app_store.csv"),
            "record_id,original_text\nX1,app lỗi\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("a_fanpage.csv"),
            "record_id,original_text,source_channel\n\
             Y1,tốt,Fanpage_Comment\n\
             Y2,ổn,Fanpage_Comment\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let merged = ingest_dir(dir.path()).unwrap();
        let ids: Vec<&str> = merged.records.iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(ids, vec!["REC_001", "REC_002", "REC_003"]);
        assert_eq!(merged.records[0].source_channel, "Fanpage_Comment");
        assert_eq!(merged.records[2].source_channel, "b_app_store");
        assert_eq!(merged.records[2].original_text.as_deref(), Some("app lỗi"));
    }

    #[test]
    fn test_ingest_empty_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = ingest_dir(dir.path()).unwrap_err();
        assert!(matches!(err, TriageError::NoInputFiles(_)));
    }
}
