use regex::Regex;
use scraper::Html;

use crate::dictionary::Dictionaries;
use crate::models::{NO_REACTION, NormalizedRecord, POST_REACTION, Record};

pub const PHONE_TOKEN: &str = "[PHONE]";
pub const ID_CARD_TOKEN: &str = "[ID_CARD]";
pub const BANK_ACC_TOKEN: &str = "[BANK_ACC]";
pub const EMAIL_TOKEN: &str = "[EMAIL]";
pub const MONEY_TOKEN: &str = "[MONEY]";

/// Source channel marker for reaction-only crawler rows.
const POST_REACTION_CHANNEL: &str = "Post_React";

/// Cleans free text: PII masking, lower-casing, HTML and URL removal,
/// slang expansion and emoji tokenization.
pub struct TextNormalizer<'a> {
    dicts: &'a Dictionaries,
    phone_pattern: Regex,
    id_card_pattern: Regex,
    bank_pattern: Regex,
    email_pattern: Regex,
    money_pattern: Regex,
    tag_pattern: Regex,
    url_pattern: Regex,
}

impl<'a> TextNormalizer<'a> {
    pub fn new(dicts: &'a Dictionaries) -> Self {
        Self {
            dicts,
            // Vietnamese mobile prefixes followed by 8 digits
            phone_pattern: Regex::new(r"(?:03|05|07|08|09|01[2689])+[0-9]{8}\b").unwrap(),
            // CCCD / CMND
            id_card_pattern: Regex::new(r"\b\d{9}\b|\b\d{12}\b").unwrap(),
            bank_pattern: Regex::new(r"\b\d{10,16}\b").unwrap(),
            email_pattern: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
                .unwrap(),
            // 500k, 10tr, 10.000đ, 100,000 VND
            money_pattern: Regex::new(r"(?i)\b\d+(?:[.,]\d+)*\s?(?:k|tr|triệu|đ|vnd|vnđ)\b")
                .unwrap(),
            tag_pattern: Regex::new(r"<[^>]+>").unwrap(),
            url_pattern: Regex::new(r"http\S+|www\.\S+").unwrap(),
        }
    }

    /// Normalizes one record's text and reaction label.
    pub fn normalize_record(&self, record: &Record) -> NormalizedRecord {
        let processed_text =
            self.normalize(record.original_text.as_deref(), &record.source_channel);
        let reaction_label = record
            .reaction_label
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_uppercase)
            .unwrap_or_else(|| NO_REACTION.to_string());

        NormalizedRecord {
            record: record.clone(),
            processed_text,
            reaction_label,
        }
    }

    /// Returns [`POST_REACTION`] for reaction-only input or input with no
    /// text left after cleaning; otherwise the cleaned text.
    pub fn normalize(&self, raw_text: Option<&str>, source_channel: &str) -> String {
        let raw = raw_text.unwrap_or_default();
        if raw.trim().is_empty() || source_channel.contains(POST_REACTION_CHANNEL) {
            return POST_REACTION.to_string();
        }

        // Masking runs on the original casing.
        let masked = self.mask_pii(raw);
        let lowered = masked.to_lowercase();
        let unescaped = decode_entities(&lowered);
        let stripped = self.tag_pattern.replace_all(&unescaped, "");
        let without_urls = self.url_pattern.replace_all(&stripped, "");
        let expanded = self.expand_slang(&without_urls);
        let tokenized = self.tokenize_emoji(&expanded);

        let cleaned = collapse_whitespace(&tokenized);
        if cleaned.is_empty() {
            POST_REACTION.to_string()
        } else {
            cleaned
        }
    }

    /// Replaces phone, ID card, bank account, email and money amounts with
    /// placeholder tokens, in that order.
    pub fn mask_pii(&self, text: &str) -> String {
        let text = self.phone_pattern.replace_all(text, PHONE_TOKEN);
        let text = self.id_card_pattern.replace_all(&text, ID_CARD_TOKEN);
        let text = self.bank_pattern.replace_all(&text, BANK_ACC_TOKEN);
        let text = self.email_pattern.replace_all(&text, EMAIL_TOKEN);
        let text = self.money_pattern.replace_all(&text, MONEY_TOKEN);
        text.into_owned()
    }

    fn expand_slang(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|word| {
                self.dicts
                    .teencode
                    .get(word)
                    .map(String::as_str)
                    .unwrap_or(word)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn tokenize_emoji(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (emoji, token) in &self.dicts.emoji_map {
            if !emoji.is_empty() && out.contains(emoji.as_str()) {
                out = out.replace(emoji.as_str(), &format!(" {token} "));
            }
        }
        out
    }
}

/// Decodes HTML character references, leaving markup characters literal.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    // Escaping '<' keeps the parser from consuming anything as markup.
    let escaped = text.replace('<', "&lt;");
    let fragment = Html::parse_fragment(&escaped);
    fragment.root_element().text().collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
