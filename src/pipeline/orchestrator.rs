use std::collections::{BTreeMap, HashSet};

use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::config::Resources;
use crate::models::{PriorityLevel, Record, ScoredSegment};
use crate::pipeline::classifier::TopicClassifier;
use crate::pipeline::normalizer::TextNormalizer;
use crate::pipeline::scorer::SentimentScorer;
use crate::pipeline::segmenter::ContrastSegmenter;

/// Outcome of one batch run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Scored segments sorted by (parent id, segment ordinal).
    pub segments: Vec<ScoredSegment>,
    pub records: usize,
    /// Input rows dropped before reaching the pipeline.
    pub skipped: usize,
    pub split_records: usize,
    pub priority_counts: BTreeMap<PriorityLevel, usize>,
}

impl RunReport {
    #[must_use]
    pub fn count(&self, priority: PriorityLevel) -> usize {
        self.priority_counts.get(&priority).copied().unwrap_or(0)
    }
}

/// Drives records through normalize → segment → classify → score.
pub struct Pipeline<'a> {
    normalizer: TextNormalizer<'a>,
    segmenter: ContrastSegmenter,
    classifier: TopicClassifier<'a>,
    scorer: SentimentScorer<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(resources: &'a Resources) -> Self {
        let dicts = &resources.dictionaries;
        Self {
            normalizer: TextNormalizer::new(dicts),
            segmenter: ContrastSegmenter::new(&dicts.pivots),
            classifier: TopicClassifier::new(&dicts.topics),
            scorer: SentimentScorer::new(&resources.config, &dicts.sentiment),
        }
    }

    /// Processes one record into its scored segments, in segment order.
    pub fn process_record(&self, record: &Record) -> Vec<ScoredSegment> {
        let normalized = self.normalizer.normalize_record(record);
        let segments = self.segmenter.segment_record(&normalized);
        let context = normalized.context();

        segments
            .into_iter()
            .map(|segment| {
                let topic_code = self.classifier.classify(&segment.segment_content, context);
                let assessment = self.scorer.score(
                    &segment.segment_content,
                    &normalized.reaction_label,
                    segment.is_split,
                    &topic_code,
                );
                ScoredSegment {
                    social_user_id: record.social_user_id.clone(),
                    timestamp: record.timestamp.clone(),
                    reaction_label: normalized.reaction_label.clone(),
                    context_content: context.to_string(),
                    topic_code,
                    assessment,
                    segment,
                }
            })
            .collect()
    }

    /// Runs the whole batch without progress output.
    pub fn run(&self, records: &[Record]) -> RunReport {
        self.run_with_progress(records, &ProgressBar::hidden())
    }

    pub fn run_with_progress(&self, records: &[Record], progress: &ProgressBar) -> RunReport {
        info!("Scoring {} records", records.len());
        progress.set_length(records.len() as u64);

        let mut seen_ids = HashSet::new();
        let mut report = RunReport {
            records: records.len(),
            ..RunReport::default()
        };

        for record in records {
            if !seen_ids.insert(record.record_id.as_str()) {
                warn!("Duplicate record id {}", record.record_id);
            }

            let scored = self.process_record(record);
            if scored.len() > 1 {
                report.split_records += 1;
            }
            debug!("{} -> {} segment(s)", record.record_id, scored.len());
            report.segments.extend(scored);
            progress.inc(1);
        }
        progress.finish_and_clear();

        // Stable, so duplicate ids keep input order.
        report.segments.sort_by(|a, b| {
            a.segment
                .parent_id
                .cmp(&b.segment.parent_id)
                .then(a.segment.segment_id.ordinal().cmp(&b.segment.segment_id.ordinal()))
        });

        for segment in &report.segments {
            *report
                .priority_counts
                .entry(segment.assessment.priority)
                .or_insert(0) += 1;
        }

        info!(
            "Scored {} records -> {} segments ({} split)",
            report.records,
            report.segments.len(),
            report.split_records
        );
        report
    }
}
