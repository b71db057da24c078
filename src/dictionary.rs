/// Keyword dictionaries consumed read-only by the pipeline stages.
///
/// Every dictionary lives in its own JSON file. A missing or malformed file
/// degrades to an empty dictionary with a warning. Dictionaries whose order
/// carries meaning (emoji replacement, topic priority) keep file order.
use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::models::TopicCode;

pub const EMOJI_MAP_FILE: &str = "emoji_map.json";
pub const TEENCODE_FILE: &str = "teencode.json";
pub const SENTIMENT_FILE: &str = "sentiment_keywords.json";
pub const TOPIC_FILE: &str = "topic_keywords.json";
pub const PIVOT_FILE: &str = "pivot_keywords.json";
pub const REACTION_MAP_FILE: &str = "reaction_map.json";

/// One sentiment class: a base score and the keywords that trigger it.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentEntry {
    pub label: String,
    pub score: f64,
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawSentimentEntry {
    #[serde(default)]
    score: f64,
    #[serde(default)]
    keywords: Vec<String>,
}

/// One row of the topic table. Table order is priority order.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicRule {
    pub code: TopicCode,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Dictionaries {
    /// Emoji → sentiment token, in file order.
    pub emoji_map: Vec<(String, String)>,
    /// Slang / abbreviation → canonical word.
    pub teencode: HashMap<String, String>,
    pub sentiment: Vec<SentimentEntry>,
    pub topics: Vec<TopicRule>,
    /// Contrastive conjunctions used as split points.
    pub pivots: Vec<String>,
    /// Raw crawler reaction name (lower-case) → canonical reaction label.
    pub reaction_map: HashMap<String, String>,
}

impl Dictionaries {
    /// Load every dictionary file from `dir`.
    pub fn load(dir: &Path) -> Self {
        let emoji_map = ordered_entries::<String>(&dir.join(EMOJI_MAP_FILE));
        let teencode: HashMap<String, String> = load_json(&dir.join(TEENCODE_FILE));

        let sentiment = ordered_entries::<RawSentimentEntry>(&dir.join(SENTIMENT_FILE))
            .into_iter()
            .map(|(label, raw)| SentimentEntry {
                keywords: clean_keywords(&label, raw.keywords),
                label,
                score: raw.score,
            })
            .collect::<Vec<_>>();

        let topics = ordered_entries::<Vec<String>>(&dir.join(TOPIC_FILE))
            .into_iter()
            .map(|(code, keywords)| TopicRule {
                keywords: clean_keywords(&code, keywords),
                code: TopicCode::from_code(&code),
            })
            .collect::<Vec<_>>();

        let pivots: Vec<String> = load_json::<Vec<String>>(&dir.join(PIVOT_FILE))
            .into_iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        let reaction_map = load_json::<HashMap<String, String>>(&dir.join(REACTION_MAP_FILE))
            .into_iter()
            .map(|(raw, label)| (raw.trim().to_lowercase(), label.trim().to_uppercase()))
            .collect();

        let dicts = Self {
            emoji_map,
            teencode,
            sentiment,
            topics,
            pivots,
            reaction_map,
        };
        info!(
            "Loaded dictionaries: {} emoji, {} teencode, {} sentiment classes, {} topics, {} pivots, {} reaction rules",
            dicts.emoji_map.len(),
            dicts.teencode.len(),
            dicts.sentiment.len(),
            dicts.topics.len(),
            dicts.pivots.len(),
            dicts.reaction_map.len()
        );
        dicts
    }

    /// Canonical reaction label for a raw crawler reaction name.
    #[must_use]
    pub fn normalize_reaction(&self, raw: &str) -> String {
        let key = raw.trim().to_lowercase();
        if key.is_empty() {
            return "NONE".to_string();
        }
        self.reaction_map
            .get(&key)
            .cloned()
            .unwrap_or_else(|| "NONE".to_string())
    }
}

/// Lower-cases keywords and drops empty ones, which would match every text.
fn clean_keywords(owner: &str, keywords: Vec<String>) -> Vec<String> {
    let before = keywords.len();
    let cleaned: Vec<String> = keywords
        .into_iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if cleaned.len() != before {
        warn!("{owner}: dropped {} empty keyword(s)", before - cleaned.len());
    }
    cleaned
}

fn read_value(path: &Path) -> Option<Value> {
    if !path.exists() {
        warn!("Dictionary not found: {}, using empty", path.display());
        return None;
    }
    let data = match std::fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) => {
            warn!("Failed to read {}: {e}", path.display());
            return None;
        }
    };
    match serde_json::from_str(&data) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Invalid JSON in {}: {e}", path.display());
            None
        }
    }
}

fn load_json<T: DeserializeOwned + Default>(path: &Path) -> T {
    let Some(value) = read_value(path) else {
        return T::default();
    };
    match serde_json::from_value(value) {
        Ok(v) => v,
        Err(e) => {
            warn!("Unexpected shape in {}: {e}", path.display());
            T::default()
        }
    }
}

/// Parse a JSON object keeping key order; bad values are skipped.
fn ordered_entries<T: DeserializeOwned>(path: &Path) -> Vec<(String, T)> {
    let object: Map<String, Value> = match read_value(path) {
        Some(Value::Object(map)) => map,
        Some(_) => {
            warn!("Expected a JSON object in {}", path.display());
            return Vec::new();
        }
        None => return Vec::new(),
    };

    let mut entries = Vec::with_capacity(object.len());
    for (key, value) in object {
        match serde_json::from_value::<T>(value) {
            Ok(v) => entries.push((key, v)),
            Err(e) => warn!("Skipping {key} in {}: {e}", path.display()),
        }
    }
    entries
}
