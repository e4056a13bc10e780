//! Engine configuration.
//!
//! Built in code through the `with_*` methods, or loaded with Figment from a TOML
//! file merged with `ALAMAT_*` environment variables.

use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::learning::CorrectionScope;
use crate::types::*;

///Prefix of environment variables that override configuration values
pub const ENV_PREFIX: &str = "ALAMAT_";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum similarity for the province fallback match, in [0,1]
    pub fuzzy_match_threshold: f64,

    /// Similarity a gazetteer key must exceed to be offered as a suggestion, in [0,1]
    pub suggestion_threshold: f64,

    /// Update the learning store after every resolution
    pub learning_enabled: bool,

    /// Whether learned corrections replace substrings anywhere or whole words only
    pub correction_scope: CorrectionScope,

    /// Add every name in the loaded gazetteer to the extraction lexicon
    pub extend_lexicon_from_gazetteer: bool,

    pub max_suggestions_per_field: usize,

    pub max_suggestions: usize,

    /// Resolve batches sequentially instead of leveraging multiple cores
    pub single_thread: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fuzzy_match_threshold: DEFAULT_FUZZY_THRESHOLD,
            suggestion_threshold: DEFAULT_SUGGESTION_THRESHOLD,
            learning_enabled: true,
            correction_scope: CorrectionScope::Substring,
            extend_lexicon_from_gazetteer: false,
            max_suggestions_per_field: 3,
            max_suggestions: 5,
            single_thread: false,
        }
    }
}

impl EngineConfig {
    ///Load from a TOML file (keys as the field names), then apply `ALAMAT_*` environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_figment(
            Figment::from(figment::providers::Serialized::defaults(Self::default()))
                .merge(Toml::file(path.as_ref()))
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    ///Defaults with `ALAMAT_*` environment overrides only
    pub fn from_env() -> Result<Self> {
        Self::from_figment(
            Figment::from(figment::providers::Serialized::defaults(Self::default())).merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        Ok(config.clamped())
    }

    ///Thresholds forced into [0,1]
    pub fn clamped(mut self) -> Self {
        self.fuzzy_match_threshold = clamp_unit(self.fuzzy_match_threshold);
        self.suggestion_threshold = clamp_unit(self.suggestion_threshold);
        self
    }

    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_match_threshold = clamp_unit(threshold);
        self
    }
    pub fn with_suggestion_threshold(mut self, threshold: f64) -> Self {
        self.suggestion_threshold = clamp_unit(threshold);
        self
    }
    pub fn with_learning(mut self, enabled: bool) -> Self {
        self.learning_enabled = enabled;
        self
    }
    pub fn with_correction_scope(mut self, scope: CorrectionScope) -> Self {
        self.correction_scope = scope;
        self
    }
    pub fn with_lexicon_from_gazetteer(mut self) -> Self {
        self.extend_lexicon_from_gazetteer = true;
        self
    }
    pub fn with_max_suggestions(mut self, per_field: usize, total: usize) -> Self {
        self.max_suggestions_per_field = per_field;
        self.max_suggestions = total;
        self
    }
    pub fn with_single_thread(mut self) -> Self {
        self.single_thread = true;
        self
    }
}

///Clamp into [0,1]; NaN becomes 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
