/// Configuration module for the triage pipeline.
///
/// Handles loading, validating, and providing default values for the scoring
/// tunables in `config.yaml`, and bundles them with the keyword dictionaries
/// into the read-only [`Resources`] passed to every pipeline stage.
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dictionary::Dictionaries;
use crate::error::TriageError;

// ── Default value functions ──────────────────────────────────────────

fn default_text_weight() -> f64 {
    0.7
}

fn default_reaction_weight() -> f64 {
    0.3
}

fn default_critical() -> f64 {
    -2.0
}

fn default_high() -> f64 {
    -1.0
}

fn default_medium() -> f64 {
    0.0
}

fn default_opportunity() -> f64 {
    1.5
}

fn default_min_score() -> f64 {
    -2.0
}

fn default_max_score() -> f64 {
    2.0
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub weights: Weights,

    /// Reaction label (upper-case) → score. Unknown labels score 0.0.
    #[serde(default)]
    pub reaction_scores: BTreeMap<String, f64>,

    /// Emoji sentiment token → score added per match.
    #[serde(default)]
    pub emoji_scores: BTreeMap<String, f64>,

    #[serde(default)]
    pub priority_thresholds: Thresholds,

    #[serde(default)]
    pub system: ScoreBounds,

    #[serde(default)]
    pub scoring: ScoringModes,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Weights {
    #[serde(default = "default_text_weight")]
    pub text_content: f64,

    #[serde(default = "default_reaction_weight")]
    pub reaction: f64,
}

/// Score cutoffs shared by label and priority assignment.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Thresholds {
    #[serde(default = "default_critical")]
    pub critical: f64,

    #[serde(default = "default_high")]
    pub high: f64,

    #[serde(default = "default_medium")]
    pub medium: f64,

    #[serde(default = "default_opportunity")]
    pub opportunity: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScoreBounds {
    #[serde(default = "default_min_score")]
    pub min_score: f64,

    #[serde(default = "default_max_score")]
    pub max_score: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ScoringModes {
    #[serde(default)]
    pub keyword_mode: KeywordMode,

    #[serde(default)]
    pub emoji_mode: EmojiMode,
}

/// How sentiment-dictionary keyword hits contribute to the text score.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeywordMode {
    /// Each entry contributes its base score once if any keyword matches.
    #[default]
    Entry,
    /// Each distinct matching keyword contributes its entry's base score.
    Keyword,
}

/// How emoji sentiment tokens contribute to the text score.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmojiMode {
    /// Token value multiplied by its occurrence count.
    #[default]
    Occurrences,
    /// Token value added once if the token appears at all.
    Presence,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Weights {
    fn default() -> Self {
        Self {
            text_content: default_text_weight(),
            reaction: default_reaction_weight(),
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            critical: default_critical(),
            high: default_high(),
            medium: default_medium(),
            opportunity: default_opportunity(),
        }
    }
}

impl Default for ScoreBounds {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            max_score: default_max_score(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// A missing or unparsable file is not fatal: a warning is logged and
    /// the defaults are returned.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("{} not found, using default scoring config", path.display());
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        // An empty file parses as YAML null
        if data.trim().is_empty() {
            warn!("{} is empty, using default scoring config", path.display());
            return Ok(Self::default());
        }

        let cfg: Config = match serde_yaml::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid YAML in {}: {e}", path.display());
                warn!("Using default scoring config");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {}", path.display());
        Ok(cfg)
    }

    /// Score for a reaction label; unknown labels and `NONE` score 0.0.
    #[must_use]
    pub fn reaction_score(&self, label: &str) -> f64 {
        self.reaction_scores.get(label).copied().unwrap_or(0.0)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        let bounds = &self.system;
        anyhow::ensure!(
            bounds.min_score.is_finite() && bounds.max_score.is_finite(),
            "system.min_score and system.max_score must be finite"
        );
        anyhow::ensure!(
            bounds.min_score < bounds.max_score,
            "system.min_score ({}) must be below system.max_score ({})",
            bounds.min_score,
            bounds.max_score
        );
        anyhow::ensure!(
            self.weights.text_content.is_finite() && self.weights.reaction.is_finite(),
            "weights must be finite"
        );

        let t = &self.priority_thresholds;
        anyhow::ensure!(
            t.critical <= t.high && t.high <= t.medium && t.medium <= t.opportunity,
            "priority_thresholds must satisfy critical <= high <= medium <= opportunity"
        );

        for (label, score) in &self.reaction_scores {
            if !score.is_finite() {
                anyhow::bail!("reaction_scores.{label} must be finite");
            }
            if *score < bounds.min_score || *score > bounds.max_score {
                warn!(
                    "reaction_scores.{label} = {score} lies outside [{}, {}]",
                    bounds.min_score, bounds.max_score
                );
            }
        }
        for (token, score) in &self.emoji_scores {
            if !score.is_finite() {
                anyhow::bail!("emoji_scores.{token} must be finite");
            }
        }
        Ok(())
    }
}

// ── Resource bundle ──────────────────────────────────────────────────

/// Scoring config plus keyword dictionaries, loaded once at startup and
/// shared read-only with every stage.
#[derive(Debug, Clone, Default)]
pub struct Resources {
    pub config: Config,
    pub dictionaries: Dictionaries,
}

impl Resources {
    /// Load `<dir>/config.yaml` and `<dir>/dictionaries/*.json`.
    ///
    /// Missing files degrade to defaults with a warning; a config that
    /// parses but fails validation is an error.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            warn!("resource directory {} not found", dir.display());
        }

        let config = Config::load(&dir.join("config.yaml"))?;
        config
            .validate()
            .map_err(|e| TriageError::InvalidConfig(format!("{e:#}")))?;

        let dictionaries = Dictionaries::load(&dir.join("dictionaries"));

        Ok(Self {
            config,
            dictionaries,
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.weights.text_content, 0.7);
        assert_eq!(config.weights.reaction, 0.3);
        assert_eq!(config.priority_thresholds.critical, -2.0);
        assert_eq!(config.priority_thresholds.high, -1.0);
        assert_eq!(config.priority_thresholds.opportunity, 1.5);
        assert_eq!(config.system.min_score, -2.0);
        assert_eq!(config.system.max_score, 2.0);
        assert_eq!(config.scoring.keyword_mode, KeywordMode::Entry);
        assert_eq!(config.scoring.emoji_mode, EmojiMode::Occurrences);
    }

    #[test]
    fn test_load_from_yaml_partial() {
        let yaml = r#"
weights:
  text_content: 0.6
reaction_scores:
  LOVE: 2.0
  ANGRY: -2.0
scoring:
  emoji_mode: presence
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.weights.text_content, 0.6);
        // Other fields should have defaults
        assert_eq!(config.weights.reaction, 0.3);
        assert_eq!(config.system.max_score, 2.0);
        assert_eq!(config.reaction_score("LOVE"), 2.0);
        assert_eq!(config.reaction_score("ANGRY"), -2.0);
        assert_eq!(config.scoring.emoji_mode, EmojiMode::Presence);
    }

    #[test]
    fn test_unknown_reaction_scores_zero() {
        let config = Config::default();
        assert_eq!(config.reaction_score("NONE"), 0.0);
        assert_eq!(config.reaction_score("WOW"), 0.0);
    }

    #[test]
    fn test_validate_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_inverted_bounds() {
        let mut config = Config::default();
        config.system.min_score = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_unordered_thresholds() {
        let mut config = Config::default();
        config.priority_thresholds.high = -3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(config.weights.text_content, 0.7);
    }

    #[test]
    fn test_load_invalid_yaml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "weights: [not, a, map").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.weights.reaction, 0.3);
    }

    #[test]
    fn test_resources_reject_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "system:\n  min_score: 1.0\n  max_score: -1.0\n",
        )
        .unwrap();
        let err = Resources::load(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TriageError>(),
            Some(TriageError::InvalidConfig(_))
        ));
    }
}
