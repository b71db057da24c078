//! Scored report writer (CSV or JSON).
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::io::{ensure_parent, write_csv};
use crate::models::{PriorityLevel, ScoredSegment, SentimentLabel, TopicCode};

pub const REPORT_COLUMNS: [&str; 13] = [
    "segment_id",
    "original_record_id",
    "social_user_id",
    "timestamp",
    "segment_content",
    "is_split",
    "topic_code",
    "reaction_label",
    "text_score",
    "reaction_score",
    "final_score",
    "sentiment_label",
    "priority_level",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub format: ReportFormat,
    /// Show the parent post text instead of the placeholder on
    /// reaction-only rows.
    pub expand_reactions: bool,
}

/// One output row, columns in report order.
#[derive(Debug, Serialize)]
pub struct ReportRow<'a> {
    pub segment_id: &'a str,
    pub original_record_id: &'a str,
    pub social_user_id: &'a str,
    pub timestamp: &'a str,
    pub segment_content: &'a str,
    pub is_split: bool,
    pub topic_code: &'a TopicCode,
    pub reaction_label: &'a str,
    pub text_score: f64,
    pub reaction_score: f64,
    pub final_score: f64,
    pub sentiment_label: SentimentLabel,
    pub priority_level: PriorityLevel,
}

impl<'a> ReportRow<'a> {
    pub fn new(scored: &'a ScoredSegment, expand_reactions: bool) -> Self {
        let segment = &scored.segment;
        let content = if expand_reactions
            && segment.is_reaction_only()
            && !scored.context_content.is_empty()
        {
            scored.context_content.as_str()
        } else {
            segment.segment_content.as_str()
        };

        Self {
            segment_id: segment.segment_id.as_str(),
            original_record_id: &segment.parent_id,
            social_user_id: &scored.social_user_id,
            timestamp: &scored.timestamp,
            segment_content: content,
            is_split: segment.is_split,
            topic_code: &scored.topic_code,
            reaction_label: &scored.reaction_label,
            text_score: scored.assessment.text_score,
            reaction_score: scored.assessment.reaction_score,
            final_score: scored.assessment.final_score,
            sentiment_label: scored.assessment.label,
            priority_level: scored.assessment.priority,
        }
    }
}

/// Writes the scored segments in the order given.
pub fn write_report(
    path: &Path,
    segments: &[ScoredSegment],
    options: ReportOptions,
) -> Result<()> {
    let rows: Vec<ReportRow<'_>> = segments
        .iter()
        .map(|s| ReportRow::new(s, options.expand_reactions))
        .collect();

    match options.format {
        ReportFormat::Csv => write_csv(path, &REPORT_COLUMNS, &rows)?,
        ReportFormat::Json => {
            ensure_parent(path)?;
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, &rows)?;
            writer.flush()?;
        }
    }

    info!("Wrote {} segments to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assessment, POST_REACTION, Segment, SegmentId};
    use std::fs;

    fn scored(parent: &str, content: &str, context: &str) -> ScoredSegment {
        ScoredSegment {
            segment: Segment {
                segment_id: SegmentId::new(parent, 0, false),
                parent_id: parent.to_string(),
                segment_content: content.to_string(),
                is_split: false,
            },
            social_user_id: "u1".to_string(),
            timestamp: "2025-03-01 09:00:00".to_string(),
            reaction_label: "LOVE".to_string(),
            context_content: context.to_string(),
            topic_code: TopicCode::Product,
            assessment: Assessment {
                text_score: 0.0,
                reaction_score: 2.0,
                final_score: 2.0,
                label: SentimentLabel::Advocacy,
                priority: PriorityLevel::Opportunity,
            },
        }
    }

    #[test]
    fn test_csv_columns_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/out.csv");
        write_report(
            &path,
            &[scored("REC_001", POST_REACTION, "Ra mắt sản phẩm mới")],
            ReportOptions::default(),
        )
        .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), REPORT_COLUMNS.join(","));
        let row = lines.next().unwrap();
        assert!(row.starts_with(
            "SEG_001,REC_001,u1,2025-03-01 09:00:00,[POST_REACTION],false,TOPIC_PRODUCT,LOVE,"
        ));
        assert!(row.ends_with(",ADVOCACY,OPPORTUNITY"));
    }

    #[test]
    fn test_expand_reactions_shows_context() {
        let s = scored("REC_001", POST_REACTION, "Ra mắt sản phẩm mới");
        assert_eq!(ReportRow::new(&s, true).segment_content, "Ra mắt sản phẩm mới");
        assert_eq!(ReportRow::new(&s, false).segment_content, POST_REACTION);
    }

    #[test]
    fn test_empty_report_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_report(&path, &[], ReportOptions::default()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim_end(), REPORT_COLUMNS.join(","));
    }

    #[test]
    fn test_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let options = ReportOptions {
            format: ReportFormat::Json,
            expand_reactions: false,
        };
        write_report(&path, &[scored("REC_004", "tốt", "")], options).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["segment_id"], "SEG_004");
        assert_eq!(value[0]["topic_code"], "TOPIC_PRODUCT");
        assert_eq!(value[0]["final_score"], 2.0);
        assert_eq!(value[0]["priority_level"], "OPPORTUNITY");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_json_write_failure_is_reported() {
        let options = ReportOptions {
            format: ReportFormat::Json,
            expand_reactions: false,
        };
        let segments = [scored("REC_001", "tốt", "")];
        // Writes to /dev/full fail with ENOSPC once flushed
        assert!(write_report(Path::new("/dev/full"), &segments, options).is_err());
    }
}
