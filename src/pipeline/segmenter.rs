use regex::Regex;
use tracing::warn;

use crate::models::{NormalizedRecord, POST_REACTION, Segment, SegmentId};

/// Splits normalized text at contrastive conjunctions ("nhưng", "tuy nhiên").
///
/// Matching is plain substring matching, longest keyword first.
pub struct ContrastSegmenter {
    pattern: Option<Regex>,
}

impl ContrastSegmenter {
    pub fn new(keywords: &[String]) -> Self {
        let mut sorted: Vec<&str> = keywords
            .iter()
            .map(String::as_str)
            .filter(|k| !k.is_empty())
            .collect();
        // Stable: equal-length keywords keep their configured order.
        sorted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        sorted.dedup();

        if sorted.is_empty() {
            return Self { pattern: None };
        }

        let alternation = sorted
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = match Regex::new(&format!("(?:{alternation})")) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!("Failed to build pivot pattern, segmentation disabled: {e}");
                None
            }
        };
        Self { pattern }
    }

    /// Splits `text` into trimmed, non-empty pieces with the keywords removed.
    ///
    /// Returns `[text]` unchanged for the sentinel, blank text, or text with
    /// no keyword.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() || text == POST_REACTION {
            return vec![text.to_string()];
        }
        let Some(pattern) = &self.pattern else {
            return vec![text.to_string()];
        };

        let pieces: Vec<String> = pattern
            .split(text)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        if pieces.is_empty() {
            vec![text.to_string()]
        } else {
            pieces
        }
    }

    /// Expands one record into its ordered segments.
    pub fn segment_record(&self, record: &NormalizedRecord) -> Vec<Segment> {
        let parent_id = &record.record.record_id;
        let pieces = self.split(&record.processed_text);
        let is_split = pieces.len() > 1;

        pieces
            .into_iter()
            .enumerate()
            .map(|(ordinal, content)| Segment {
                segment_id: SegmentId::new(parent_id, ordinal, is_split),
                parent_id: parent_id.clone(),
                // Blank content is stored as the sentinel
                segment_content: if content.trim().is_empty() {
                    POST_REACTION.to_string()
                } else {
                    content
                },
                is_split,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    fn segmenter(keywords: &[&str]) -> ContrastSegmenter {
        let owned: Vec<String> = keywords.iter().map(|k| k.to_string()).collect();
        ContrastSegmenter::new(&owned)
    }

    fn normalized(id: &str, text: &str) -> NormalizedRecord {
        NormalizedRecord {
            record: Record {
                record_id: id.to_string(),
                ..Record::default()
            },
            processed_text: text.to_string(),
            reaction_label: "NONE".to_string(),
        }
    }

    #[test]
    fn test_no_keyword_returns_original() {
        let s = segmenter(&["nhưng", "tuy nhiên"]);
        assert_eq!(s.split("app dùng ổn định"), vec!["app dùng ổn định"]);
    }

    #[test]
    fn test_split_drops_keyword_and_trims() {
        let s = segmenter(&["nhưng"]);
        assert_eq!(
            s.split("lãi suất tốt nhưng rút tiền chậm"),
            vec!["lãi suất tốt", "rút tiền chậm"]
        );
    }

    #[test]
    fn test_longest_keyword_wins() {
        let s = segmenter(&["nhiên", "tuy nhiên"]);
        assert_eq!(
            s.split("lãi tốt tuy nhiên rút chậm"),
            vec!["lãi tốt", "rút chậm"]
        );
    }

    #[test]
    fn test_multiple_keywords() {
        let s = segmenter(&["nhưng", "mà"]);
        assert_eq!(s.split("a nhưng b mà c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sentinel_and_empty_untouched() {
        let s = segmenter(&["nhưng"]);
        assert_eq!(s.split(POST_REACTION), vec![POST_REACTION]);
        assert_eq!(s.split(""), vec![""]);
    }

    #[test]
    fn test_keyword_only_text_falls_back() {
        let s = segmenter(&["nhưng"]);
        assert_eq!(s.split("nhưng"), vec!["nhưng"]);
    }

    #[test]
    fn test_no_keywords_configured() {
        let s = segmenter(&[]);
        assert_eq!(s.split("tốt nhưng chậm"), vec!["tốt nhưng chậm"]);
    }

    #[test]
    fn test_segment_record_ids_and_flags() {
        let s = segmenter(&["nhưng"]);
        let segments = s.segment_record(&normalized("REC_007", "lãi tốt nhưng rút chậm"));
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|seg| seg.is_split));
        assert_eq!(segments[0].segment_id.as_str(), "SEG_007_A");
        assert_eq!(segments[1].segment_id.as_str(), "SEG_007_B");
        assert_eq!(segments[1].parent_id, "REC_007");
        assert_eq!(segments[1].segment_content, "rút chậm");

        let single = s.segment_record(&normalized("REC_008", "ổn"));
        assert_eq!(single.len(), 1);
        assert!(!single[0].is_split);
        assert_eq!(single[0].segment_id.as_str(), "SEG_008");
    }
}
