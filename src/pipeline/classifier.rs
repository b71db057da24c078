use crate::dictionary::TopicRule;
use crate::models::{POST_REACTION, TopicCode};

/// First-match keyword topic classifier.
///
/// Topics are tried in table order and the first one with a keyword
/// contained in the text wins, so table order is priority order.
pub struct TopicClassifier<'a> {
    topics: &'a [TopicRule],
}

impl<'a> TopicClassifier<'a> {
    pub fn new(topics: &'a [TopicRule]) -> Self {
        Self { topics }
    }

    /// Classifies a segment, reading `fallback_context` (the parent post)
    /// instead when the segment is a reaction-only placeholder.
    pub fn classify(&self, segment_text: &str, fallback_context: &str) -> TopicCode {
        let target = if segment_text == POST_REACTION {
            fallback_context
        } else {
            segment_text
        };
        self.classify_text(target)
    }

    pub fn classify_text(&self, text: &str) -> TopicCode {
        if text.trim().is_empty() {
            return TopicCode::Other;
        }
        let lowered = text.to_lowercase();

        self.topics
            .iter()
            .find(|rule| rule.keywords.iter().any(|kw| lowered.contains(kw.as_str())))
            .map(|rule| rule.code.clone())
            .unwrap_or_default()
    }
}
