//! Session-local adaptive state: word and pattern frequencies, and learned spelling
//! corrections that are applied to later inputs before extraction.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::{debug, info, warn};
use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::normalize::tokens;
use crate::types::*;

/// How far a learned correction reaches into the address text
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionScope {
    /// Replace every occurrence anywhere in the text, also inside longer words
    #[default]
    Substring,
    /// Replace only occurrences delimited by word boundaries
    Token,
}

/// The learning state of one engine. Created empty, mutated after every resolution,
/// and exported/imported as a whole through [`LearningSnapshot`].
#[derive(Clone, Debug, Default)]
pub struct LearningStore {
    word_frequency: IndexMap<String, u64>,
    pattern_frequency: IndexMap<String, u64>,
    corrections: IndexMap<String, String>,
    ///Compiled matchers, position i belongs to the i-th key of `corrections`
    matchers: Vec<CorrectionMatcher>,
    resolved_total: u64,
    resolved_successful: u64,
}

impl PartialEq for LearningStore {
    fn eq(&self, other: &Self) -> bool {
        //the matchers are derived from the correction keys
        self.word_frequency == other.word_frequency
            && self.pattern_frequency == other.pattern_frequency
            && self.corrections == other.corrections
            && self.resolved_total == other.resolved_total
            && self.resolved_successful == other.resolved_successful
    }
}

/// A correction key compiled once for each scope, when the correction is learned
#[derive(Clone, Debug)]
struct CorrectionMatcher {
    substring: Regex,
    token: Regex,
}

impl CorrectionMatcher {
    fn new(wrong: &str) -> Result<Self> {
        let literal = regex::escape(wrong);
        Ok(Self {
            substring: RegexBuilder::new(&literal).case_insensitive(true).build()?,
            token: RegexBuilder::new(&format!(r"\b{}\b", literal)).case_insensitive(true).build()?,
        })
    }

    fn get(&self, scope: CorrectionScope) -> &Regex {
        match scope {
            CorrectionScope::Substring => &self.substring,
            CorrectionScope::Token => &self.token,
        }
    }
}

impl LearningStore {
    pub fn new() -> Self {
        Self::default()
    }

    ///Count every token longer than two characters
    pub fn learn_words(&mut self, normalized: &str) {
        for word in tokens(normalized) {
            if word.chars().count() > 2 {
                *self.word_frequency.entry(word.to_string()).or_insert(0) += 1;
            }
        }
    }

    ///Count the signature of the levels that were extracted; an empty signature is not counted
    pub fn learn_pattern(&mut self, extracted: &AddressComponents) {
        let signature = pattern_signature(extracted);
        if !signature.is_empty() {
            *self.pattern_frequency.entry(signature).or_insert(0) += 1;
        }
    }

    ///Store (or overwrite) a correction. Keys are lowercased; blank keys or values are ignored.
    pub fn learn_correction(&mut self, wrong: &str, right: &str) -> bool {
        let wrong = wrong.trim().to_lowercase();
        let right = right.trim();
        if wrong.is_empty() || right.is_empty() {
            return false;
        }
        if let Some(existing) = self.corrections.get_mut(&wrong) {
            //same key, so the compiled matcher still applies
            debug!("   (updated correction {} -> {})", wrong, right);
            *existing = right.to_string();
            return true;
        }
        match CorrectionMatcher::new(&wrong) {
            Ok(matcher) => {
                debug!("   (learned correction {} -> {})", wrong, right);
                self.corrections.insert(wrong, right.to_string());
                self.matchers.push(matcher);
                true
            }
            Err(e) => {
                warn!("Skipping correction {:?}: {}", wrong, e);
                false
            }
        }
    }

    pub fn count_resolution(&mut self, success: bool) {
        self.resolved_total += 1;
        if success {
            self.resolved_successful += 1;
        }
    }

    ///Apply all corrections, in the order they were learned, as case-insensitive literal replacements
    pub fn apply_corrections(&self, text: &str, scope: CorrectionScope) -> String {
        let mut corrected = text.to_string();
        for ((wrong, right), matcher) in self.corrections.iter().zip(self.matchers.iter()) {
            let re = matcher.get(scope);
            if re.is_match(&corrected) {
                debug!("   (applying correction {} -> {})", wrong, right);
                corrected = re.replace_all(&corrected, NoExpand(right)).into_owned();
            }
        }
        corrected
    }

    pub fn correction(&self, wrong: &str) -> Option<&str> {
        self.corrections.get(&wrong.to_lowercase()).map(|s| s.as_str())
    }

    pub fn word_frequency(&self, word: &str) -> u64 {
        self.word_frequency.get(word).copied().unwrap_or(0)
    }

    pub fn pattern_frequency(&self, signature: &str) -> u64 {
        self.pattern_frequency.get(signature).copied().unwrap_or(0)
    }

    pub fn words(&self) -> &IndexMap<String, u64> {
        &self.word_frequency
    }

    pub fn patterns(&self) -> &IndexMap<String, u64> {
        &self.pattern_frequency
    }

    pub fn corrections(&self) -> &IndexMap<String, String> {
        &self.corrections
    }

    ///Counters; the gazetteer size is filled in by the engine
    pub fn stats(&self) -> LearningStats {
        LearningStats {
            learned_words: self.word_frequency.len(),
            address_patterns: self.pattern_frequency.len(),
            corrections: self.corrections.len(),
            gazetteer_size: 0,
            resolved_total: self.resolved_total,
            resolved_successful: self.resolved_successful,
        }
    }

    pub fn snapshot(&self) -> LearningSnapshot {
        LearningSnapshot {
            learned_words: self.word_frequency.clone(),
            address_patterns: self.pattern_frequency.clone(),
            corrections: self.corrections.clone(),
            resolved_total: self.resolved_total,
            resolved_successful: self.resolved_successful,
            exported_at: Some(Utc::now()),
        }
    }

    ///Replace the whole state with the snapshot's
    pub fn restore(&mut self, snapshot: LearningSnapshot) {
        info!(
            "Importing learning state: {} words, {} patterns, {} corrections",
            snapshot.learned_words.len(),
            snapshot.address_patterns.len(),
            snapshot.corrections.len()
        );
        *self = Self::from(snapshot);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl From<LearningSnapshot> for LearningStore {
    fn from(snapshot: LearningSnapshot) -> Self {
        let mut store = Self {
            word_frequency: snapshot.learned_words,
            pattern_frequency: snapshot.address_patterns,
            corrections: IndexMap::with_capacity(snapshot.corrections.len()),
            matchers: Vec::with_capacity(snapshot.corrections.len()),
            resolved_total: snapshot.resolved_total,
            resolved_successful: snapshot.resolved_successful,
        };
        for (wrong, right) in snapshot.corrections {
            store.learn_correction(&wrong, &right);
        }
        store
    }
}

///Join the extracted levels, in hierarchy order, into a signature like `district->village`
pub fn pattern_signature(extracted: &AddressComponents) -> String {
    extracted
        .present_levels()
        .map(|level| level.as_str())
        .collect::<Vec<_>>()
        .join(PATTERN_SEPARATOR)
}

/// Serializable copy of a [`LearningStore`]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningSnapshot {
    #[serde(default)]
    pub learned_words: IndexMap<String, u64>,
    #[serde(default)]
    pub address_patterns: IndexMap<String, u64>,
    #[serde(default)]
    pub corrections: IndexMap<String, String>,
    #[serde(default)]
    pub resolved_total: u64,
    #[serde(default)]
    pub resolved_successful: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

impl LearningSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
