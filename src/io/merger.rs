//! Joins crawler exports (posts, comments, reactions) into input records.
//!
//! Post authors are treated as page admins; their comments and reactions
//! are dropped. A user's reaction on a post is attached to their comment on
//! that post; reactions without a comment become reaction-only records.
use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::dictionary::Dictionaries;
use crate::error::{Result, TriageError};
use crate::io::records::record_id;
use crate::io::{CsvRows, read_csv};
use crate::models::Record;

pub const POSTS_FILE: &str = "posts_detail.csv";
pub const COMMENTS_FILE: &str = "comments_detail.csv";
pub const REACTIONS_FILE: &str = "reactions_detail.csv";

pub const COMMENT_CHANNEL: &str = "Fanpage_Comment";
pub const REACTION_CHANNEL: &str = "Fanpage_Post_Reaction";

#[derive(Debug, Deserialize)]
struct PostRow {
    #[serde(default)]
    post_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    context_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentRow {
    #[serde(default)]
    post_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    original_text: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReactionRow {
    #[serde(default)]
    post_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    reaction_type: Option<String>,
}

#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub records: Vec<Record>,
    pub skipped_admin_comments: usize,
    pub skipped_admin_reactions: usize,
}

fn key(value: &Option<String>) -> String {
    value.as_deref().unwrap_or_default().trim().to_string()
}

/// Reads an optional export; absent files count as empty.
fn read_optional<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    match read_csv::<T>(path) {
        Ok(CsvRows { rows, .. }) => Ok(rows),
        Err(TriageError::InputMissing(_)) => {
            warn!("{} not found, treating as empty", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Merges the exports in `crawler_dir`. The posts file is mandatory.
pub fn merge_exports(crawler_dir: &Path, dicts: &Dictionaries) -> Result<MergeOutcome> {
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    merge_exports_at(crawler_dir, dicts, &now)
}

/// As [`merge_exports`], stamping rows that carry no time with `now`.
pub fn merge_exports_at(
    crawler_dir: &Path,
    dicts: &Dictionaries,
    now: &str,
) -> Result<MergeOutcome> {
    let posts = read_csv::<PostRow>(&crawler_dir.join(POSTS_FILE))?.rows;
    if posts.is_empty() {
        return Err(TriageError::EmptyInput(crawler_dir.join(POSTS_FILE)));
    }
    let comments: Vec<CommentRow> = read_optional(&crawler_dir.join(COMMENTS_FILE))?;
    let reactions: Vec<ReactionRow> = read_optional(&crawler_dir.join(REACTIONS_FILE))?;

    let admin_ids: HashSet<String> = posts.iter().map(|p| key(&p.user_id)).collect();
    info!("Identified {} admin id(s) to filter", admin_ids.len());

    let post_context: HashMap<String, String> = posts
        .iter()
        .filter_map(|p| {
            let text = p.context_content.as_deref()?.trim();
            (!text.is_empty()).then(|| (key(&p.post_id), text.to_string()))
        })
        .collect();

    // First reaction per (post, user)
    let mut reaction_by_pair: HashMap<(String, String), String> = HashMap::new();
    for r in &reactions {
        reaction_by_pair
            .entry((key(&r.post_id), key(&r.user_id)))
            .or_insert_with(|| r.reaction_type.clone().unwrap_or_default());
    }

    let mut outcome = MergeOutcome::default();
    let mut commented: HashSet<(String, String)> = HashSet::new();

    for c in &comments {
        let pair = (key(&c.post_id), key(&c.user_id));
        if admin_ids.contains(&pair.1) {
            outcome.skipped_admin_comments += 1;
            continue;
        }

        let raw_reaction = reaction_by_pair.get(&pair).map(String::as_str).unwrap_or("");
        let timestamp = [&c.timestamp, &c.time]
            .into_iter()
            .find_map(|t| t.as_deref().map(str::trim).filter(|t| !t.is_empty()))
            .unwrap_or(now)
            .to_string();

        outcome.records.push(Record {
            record_id: String::new(),
            timestamp,
            social_user_id: pair.1.clone(),
            source_channel: COMMENT_CHANNEL.to_string(),
            original_text: c.original_text.clone(),
            reaction_label: Some(dicts.normalize_reaction(raw_reaction)),
            context_content: post_context.get(&pair.0).cloned(),
        });
        commented.insert(pair);
    }

    for r in &reactions {
        let pair = (key(&r.post_id), key(&r.user_id));
        if admin_ids.contains(&pair.1) {
            outcome.skipped_admin_reactions += 1;
            continue;
        }
        if commented.contains(&pair) {
            continue;
        }
        let Some(context) = post_context.get(&pair.0) else {
            continue;
        };

        outcome.records.push(Record {
            record_id: String::new(),
            timestamp: now.to_string(),
            social_user_id: pair.1.clone(),
            source_channel: REACTION_CHANNEL.to_string(),
            original_text: None,
            reaction_label: Some(
                dicts.normalize_reaction(r.reaction_type.as_deref().unwrap_or_default()),
            ),
            context_content: Some(context.clone()),
        });
    }

    for (i, record) in outcome.records.iter_mut().enumerate() {
        record.record_id = record_id(i);
    }

    if outcome.skipped_admin_comments + outcome.skipped_admin_reactions > 0 {
        info!(
            "Filtered {} admin comment(s) and {} admin reaction(s)",
            outcome.skipped_admin_comments, outcome.skipped_admin_reactions
        );
    }
    info!("Merged {} records", outcome.records.len());
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn dicts() -> Dictionaries {
        let mut d = Dictionaries::default();
        d.reaction_map.insert("thích".to_string(), "LIKE".to_string());
        d.reaction_map.insert("phẫn nộ".to_string(), "ANGRY".to_string());
        d
    }

    fn write_exports(dir: &Path) {
        fs::write(
            dir.join(POSTS_FILE),
            "post_id,user_id,context_content\n\
             P1,admin,Hướng dẫn nạp tiền\n\
             P2,admin,\n",
        )
        .unwrap();
        fs::write(
            dir.join(COMMENTS_FILE),
            "post_id,user_id,original_text,time\n\
             P1,u1,nạp mãi không được,2025-01-02 10:00:00\n\
             P1,admin,cảm ơn bạn,2025-01-02 11:00:00\n\
             P2,u2,hay,\n",
        )
        .unwrap();
        fs::write(
            dir.join(REACTIONS_FILE),
            "post_id,user_id,reaction_type\n\
             P1,u1,Phẫn nộ\n\
             P1,u3,Thích\n\
             P1,u3,Thích\n\
             P1,admin,Thích\n\
             P2,u4,Thích\n",
        )
        .unwrap();
    }

    #[test]
    fn test_merge_exports() {
        let dir = tempfile::tempdir().unwrap();
        write_exports(dir.path());
        let outcome = merge_exports_at(dir.path(), &dicts(), "2025-01-03 00:00:00").unwrap();

        assert_eq!(outcome.skipped_admin_comments, 1);
        assert_eq!(outcome.skipped_admin_reactions, 1);
        assert_eq!(outcome.records.len(), 4);

        let first = &outcome.records[0];
        assert_eq!(first.record_id, "REC_001");
        assert_eq!(first.source_channel, COMMENT_CHANNEL);
        assert_eq!(first.reaction_label.as_deref(), Some("ANGRY"));
        assert_eq!(first.timestamp, "2025-01-02 10:00:00");

        let second = &outcome.records[1];
        assert_eq!(second.social_user_id, "u2");
        assert_eq!(second.reaction_label.as_deref(), Some("NONE"));
        assert_eq!(second.timestamp, "2025-01-03 00:00:00");

        // Each of u3's reaction rows is kept; u4 reacted to a post without text
        for (i, reaction) in outcome.records[2..].iter().enumerate() {
            assert_eq!(reaction.record_id, record_id(i + 2));
            assert_eq!(reaction.social_user_id, "u3");
            assert_eq!(reaction.source_channel, REACTION_CHANNEL);
            assert_eq!(reaction.original_text, None);
            assert_eq!(reaction.reaction_label.as_deref(), Some("LIKE"));
            assert_eq!(reaction.context_content.as_deref(), Some("Hướng dẫn nạp tiền"));
        }
    }

    #[test]
    fn test_missing_posts_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(merge_exports(dir.path(), &dicts()).is_err());
    }

    #[test]
    fn test_missing_optional_exports() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(POSTS_FILE),
            "post_id,user_id,context_content\nP1,admin,bài viết\n",
        )
        .unwrap();
        let outcome = merge_exports(dir.path(), &dicts()).unwrap();
        assert!(outcome.records.is_empty());
    }
}
