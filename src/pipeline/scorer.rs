//! Sentiment scoring: text score, reaction score, conflict resolution
//! between the two, and the derived label and priority tier.
use crate::config::{Config, EmojiMode, KeywordMode};
use crate::dictionary::SentimentEntry;
use crate::models::{Assessment, POST_REACTION, PriorityLevel, SentimentLabel, TopicCode};

pub struct SentimentScorer<'a> {
    config: &'a Config,
    sentiment: &'a [SentimentEntry],
}

impl<'a> SentimentScorer<'a> {
    pub fn new(config: &'a Config, sentiment: &'a [SentimentEntry]) -> Self {
        Self { config, sentiment }
    }

    /// Scores one segment end to end.
    pub fn score(
        &self,
        segment_text: &str,
        reaction_label: &str,
        is_split: bool,
        topic: &TopicCode,
    ) -> Assessment {
        let text_score = self.text_score(segment_text);
        let reaction_score = self.config.reaction_score(reaction_label);
        let final_score = self.final_score(text_score, reaction_score, is_split);

        Assessment {
            text_score,
            reaction_score,
            final_score,
            label: self.label(final_score),
            priority: self.priority(topic, final_score),
        }
    }

    /// Keyword plus emoji-token score, clamped to the configured bounds.
    /// The reaction-only placeholder always scores 0.0.
    pub fn text_score(&self, text: &str) -> f64 {
        if text == POST_REACTION {
            return 0.0;
        }
        let lowered = text.to_lowercase();
        let mut score = 0.0;

        for entry in self.sentiment {
            match self.config.scoring.keyword_mode {
                KeywordMode::Entry => {
                    if entry.keywords.iter().any(|kw| lowered.contains(kw.as_str())) {
                        score += entry.score;
                    }
                }
                KeywordMode::Keyword => {
                    let hits = entry
                        .keywords
                        .iter()
                        .filter(|kw| lowered.contains(kw.as_str()))
                        .count();
                    score += entry.score * hits as f64;
                }
            }
        }

        for (token, value) in &self.config.emoji_scores {
            let token = token.to_lowercase();
            if token.is_empty() {
                continue;
            }
            let count = lowered.matches(token.as_str()).count();
            if count == 0 {
                continue;
            }
            score += match self.config.scoring.emoji_mode {
                EmojiMode::Occurrences => value * count as f64,
                EmojiMode::Presence => *value,
            };
        }

        let bounds = &self.config.system;
        score.max(bounds.min_score).min(bounds.max_score)
    }

    /// Combines text and reaction scores. Rules apply in order:
    ///
    /// 1. silent text with a reaction takes the reaction score;
    /// 2. on a split record, a negative reaction does not count against a
    ///    positive clause;
    /// 3. positive text with a (still) negative reaction takes the reaction
    ///    score;
    /// 4. otherwise the weighted blend, rounded to 2 decimals.
    pub fn final_score(&self, text_score: f64, reaction_score: f64, is_split: bool) -> f64 {
        if text_score == 0.0 && reaction_score != 0.0 {
            return reaction_score;
        }

        let effective_reaction = if is_split && text_score > 0.0 && reaction_score < 0.0 {
            0.0
        } else {
            reaction_score
        };

        if text_score > 0.0 && effective_reaction < 0.0 {
            return effective_reaction;
        }

        let w = &self.config.weights;
        round2(text_score * w.text_content + effective_reaction * w.reaction)
    }

    pub fn label(&self, score: f64) -> SentimentLabel {
        let t = &self.config.priority_thresholds;
        if score <= t.critical {
            SentimentLabel::Panic
        } else if score <= t.high {
            SentimentLabel::Negative
        } else if score < t.medium {
            SentimentLabel::Skeptical
        } else if score >= t.opportunity {
            SentimentLabel::Advocacy
        } else if score > t.medium {
            SentimentLabel::Positive
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn priority(&self, topic: &TopicCode, score: f64) -> PriorityLevel {
        let t = &self.config.priority_thresholds;
        match topic {
            TopicCode::Trust => PriorityLevel::Critical,
            _ if score <= t.critical => PriorityLevel::Critical,
            TopicCode::Deposit | TopicCode::Withdraw if score <= t.high => PriorityLevel::High,
            TopicCode::Ekyc if score < t.medium => PriorityLevel::Medium,
            TopicCode::Product if score >= t.opportunity => PriorityLevel::Opportunity,
            _ => PriorityLevel::Normal,
        }
    }
}

/// Rounds half away from zero to 2 decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
