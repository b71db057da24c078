//! # sentiment-triage - Social feedback scoring engine
//!
//! Batch tool that turns collected social-media interactions (comments and
//! reaction-only records) into scored, labeled and prioritized segments for
//! customer-care triage. Scoring is deterministic and dictionary driven.
//!
//! ## Architecture
//!
//! - **[`config`]**: Scoring tunables (`config.yaml`) and the shared resource bundle
//! - **[`dictionary`]**: Keyword dictionaries (emoji, slang, sentiment, topics, pivots, reactions)
//! - **[`models`]**: Stage value types: Record → NormalizedRecord → Segment → ScoredSegment
//! - **[`pipeline`]**: Normalizer, contrastive segmenter, topic classifier, scorer, orchestrator
//! - **[`io`]**: CSV input, crawler export merging, CSV/JSON report output
//! - **[`error`]**: Error type for the I/O boundary

pub mod config;
pub mod dictionary;
pub mod error;
pub mod io;
pub mod models;
pub mod pipeline;
