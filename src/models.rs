//! Value types produced by each pipeline stage.
//!
//! Record → NormalizedRecord → Segment → ScoredSegment. Each stage builds the
//! next type; nothing is mutated after construction.
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Placeholder text for a reaction-only interaction with no authored comment.
pub const POST_REACTION: &str = "[POST_REACTION]";

/// Reaction label used when none was recorded.
pub const NO_REACTION: &str = "NONE";

/// One comment or reaction-only interaction, as read from the input table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub record_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub social_user_id: String,
    #[serde(default)]
    pub source_channel: String,
    #[serde(default)]
    pub original_text: Option<String>,
    #[serde(default)]
    pub reaction_label: Option<String>,
    /// Parent post text, used for topic fallback on reaction-only records.
    #[serde(default)]
    pub context_content: Option<String>,
}

/// A record after text normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub record: Record,
    /// Cleaned text, or [`POST_REACTION`].
    pub processed_text: String,
    /// Upper-cased reaction, defaulting to [`NO_REACTION`].
    pub reaction_label: String,
}

impl NormalizedRecord {
    #[must_use]
    pub fn context(&self) -> &str {
        self.record.context_content.as_deref().unwrap_or_default()
    }
}

/// Segment identifier with the ordinal kept for ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentId {
    text: String,
    ordinal: usize,
}

impl SegmentId {
    /// `SEG_{suffix}` for an unsplit record, `SEG_{suffix}_{letters}` for
    /// ordinal `n` of a split one; `suffix` is the part of the parent id
    /// after its last underscore.
    #[must_use]
    pub fn new(parent_id: &str, ordinal: usize, is_split: bool) -> Self {
        let suffix = parent_id.rsplit('_').next().unwrap_or(parent_id);
        let text = if is_split {
            format!("SEG_{suffix}_{}", letter_suffix(ordinal))
        } else {
            format!("SEG_{suffix}")
        };
        Self { text, ordinal }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// 0 → A, 25 → Z, 26 → AA, 27 → AB, …
fn letter_suffix(mut n: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// One clause of a record's normalized text.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub segment_id: SegmentId,
    pub parent_id: String,
    pub segment_content: String,
    /// True iff the parent text broke into two or more segments.
    pub is_split: bool,
}

impl Segment {
    #[must_use]
    pub fn is_reaction_only(&self) -> bool {
        self.segment_content == POST_REACTION
    }
}

/// Topic codes. The five named codes drive priority rules; any other code
/// found in the topic table is carried through as [`TopicCode::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TopicCode {
    Trust,
    Deposit,
    Withdraw,
    Ekyc,
    Product,
    #[default]
    Other,
    Custom(String),
}

impl TopicCode {
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "TOPIC_TRUST" => Self::Trust,
            "TOPIC_DEPOSIT" => Self::Deposit,
            "TOPIC_WITHDRAW" => Self::Withdraw,
            "TOPIC_EKYC" => Self::Ekyc,
            "TOPIC_PRODUCT" => Self::Product,
            "TOPIC_OTHER" | "" => Self::Other,
            other => Self::Custom(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Trust => "TOPIC_TRUST",
            Self::Deposit => "TOPIC_DEPOSIT",
            Self::Withdraw => "TOPIC_WITHDRAW",
            Self::Ekyc => "TOPIC_EKYC",
            Self::Product => "TOPIC_PRODUCT",
            Self::Other => "TOPIC_OTHER",
            Self::Custom(code) => code,
        }
    }
}

impl fmt::Display for TopicCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TopicCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentLabel {
    Panic,
    Negative,
    Skeptical,
    Neutral,
    Positive,
    Advocacy,
}

impl SentimentLabel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Panic => "PANIC",
            Self::Negative => "NEGATIVE",
            Self::Skeptical => "SKEPTICAL",
            Self::Neutral => "NEUTRAL",
            Self::Positive => "POSITIVE",
            Self::Advocacy => "ADVOCACY",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityLevel {
    Critical,
    High,
    Medium,
    Opportunity,
    Normal,
}

impl PriorityLevel {
    pub const ALL: [PriorityLevel; 5] = [
        Self::Critical,
        Self::High,
        Self::Medium,
        Self::Opportunity,
        Self::Normal,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Opportunity => "OPPORTUNITY",
            Self::Normal => "NORMAL",
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores and labels for one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub text_score: f64,
    pub reaction_score: f64,
    pub final_score: f64,
    pub label: SentimentLabel,
    pub priority: PriorityLevel,
}

/// A fully classified and scored segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSegment {
    pub segment: Segment,
    pub social_user_id: String,
    pub timestamp: String,
    pub reaction_label: String,
    /// Parent post text, kept for reaction-only display.
    pub context_content: String,
    pub topic_code: TopicCode,
    pub assessment: Assessment,
}
