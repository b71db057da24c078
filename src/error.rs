/// Error type for the I/O boundary of the triage pipeline.
///
/// Stage functions (normalizer, segmenter, classifier, scorer) are total and
/// never produce these; only reading inputs, loading mandatory resources and
/// writing reports can fail.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("input not found: {}", .0.display())]
    InputMissing(PathBuf),

    #[error("no csv files found in {}", .0.display())]
    NoInputFiles(PathBuf),

    #[error("no rows in {}", .0.display())]
    EmptyInput(PathBuf),

    #[error("csv error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TriageError {
    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TriageError>;
