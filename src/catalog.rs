//! Label catalog and label normalization.
//!
//! Classifier labels are short model identifiers ("hola", "a-web", "x.jpg").
//! The catalog maps them to the word and translation shown to the learner. A
//! label without an entry is displayed as-is.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub label: String,
    pub word: String,
    pub translation: String,
}

#[derive(Debug, Deserialize)]
struct CatalogRecord {
    label: Option<String>,
    word: Option<String>,
    translation: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LabelCatalog {
    entries: HashMap<String, CatalogEntry>,
}

impl LabelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON array of `{ label, word, translation }` records.
    ///
    /// Records without a label are skipped; `word` defaults to the label and
    /// `translation` to the word.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid catalog {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let records: Vec<CatalogRecord> = serde_json::from_str(raw)?;
        let mut catalog = Self::new();
        for record in records {
            let Some(label) = record.label else {
                log::debug!("catalog record without label skipped");
                continue;
            };
            let word = record.word.unwrap_or_else(|| label.clone());
            let translation = record.translation.unwrap_or_else(|| word.clone());
            catalog.insert(CatalogEntry {
                label,
                word,
                translation,
            });
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, entry: CatalogEntry) {
        self.entries.insert(entry.label.clone(), entry);
    }

    pub fn lookup(&self, label: &str) -> Option<&CatalogEntry> {
        self.entries.get(label)
    }

    /// `(word, translation)` for a label, falling back to the label itself.
    pub fn display(&self, label: &str) -> (String, String) {
        match self.lookup(label) {
            Some(entry) => (entry.word.clone(), entry.translation.clone()),
            None => (label.to_string(), label.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn file_like_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([a-z0-9])[.].*$").expect("static regex"))
}

fn alphabet_char(ch: char) -> Option<String> {
    if ch.is_alphabetic() {
        Some(ch.to_uppercase().collect())
    } else if ch.is_ascii_digit() {
        Some(ch.to_string())
    } else {
        None
    }
}

/// Normalize an alphabet-model label to a single uppercase letter or digit.
///
/// Accepts `"a"`, `"A-web"`, `" z "`, `"7"` and file-like forms such as
/// `"x.jpg"`. Anything else yields `None`.
pub fn normalize_alphabet_label(raw: &str) -> Option<String> {
    let lower = raw.trim().to_lowercase();
    let base = lower.strip_suffix("-web").unwrap_or(lower.as_str());

    let mut chars = base.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return alphabet_char(ch);
    }

    file_like_label()
        .captures(base)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().chars().next())
        .and_then(alphabet_char)
}
