use std::io::Read;
use std::path::Path;

use log::{debug, info};
use parking_lot::RwLock;
use rayon::prelude::*;

use crate::config::{clamp_unit, EngineConfig};
use crate::error::Result;
use crate::extract::Extractor;
use crate::gazetteer::{Gazetteer, TableParams};
use crate::learning::{LearningSnapshot, LearningStore};
use crate::lexicon::Lexicon;
use crate::normalize::normalize;
use crate::resolver;
use crate::types::*;

/// The address resolution engine.
///
/// The gazetteer and extractor are read-only between loads. The learning store is the
/// only state that changes during [`AddressEngine::resolve`]; it sits behind a lock so
/// a shared engine can resolve from several threads at once.
pub struct AddressEngine {
    gazetteer: Gazetteer,
    extractor: Extractor,
    config: EngineConfig,
    learning: RwLock<LearningStore>,
}

impl AddressEngine {
    ///An engine with an empty gazetteer; call one of the `load` methods before resolving
    pub fn new(config: EngineConfig) -> Self {
        Self {
            gazetteer: Gazetteer::new(),
            extractor: Extractor::builtin(),
            config: config.clamped(),
            learning: RwLock::new(LearningStore::new()),
        }
    }

    pub fn with_gazetteer(gazetteer: Gazetteer, config: EngineConfig) -> Result<Self> {
        let mut engine = Self::new(config);
        engine.install(gazetteer)?;
        Ok(engine)
    }

    ///(Re)build the gazetteer and index from a reference table.
    ///On failure the previously loaded gazetteer stays in place.
    pub fn load(&mut self, table: &str) -> Result<()> {
        let gazetteer = Gazetteer::from_table(table, &TableParams::default())?;
        self.install(gazetteer)
    }

    pub fn load_reader(&mut self, reader: impl Read, params: &TableParams) -> Result<()> {
        let gazetteer = Gazetteer::from_reader(reader, params)?;
        self.install(gazetteer)
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>, params: &TableParams) -> Result<()> {
        let gazetteer = Gazetteer::from_file(path, params)?;
        self.install(gazetteer)
    }

    fn install(&mut self, gazetteer: Gazetteer) -> Result<()> {
        let extractor = if self.config.extend_lexicon_from_gazetteer {
            let mut lexicon = Lexicon::builtin();
            let added = lexicon.extend_from_gazetteer(&gazetteer);
            info!("Extended lexicon with {} names from the gazetteer", added);
            Extractor::new(&lexicon)?
        } else {
            Extractor::builtin()
        };
        self.gazetteer = gazetteer;
        self.extractor = extractor;
        Ok(())
    }

    /// Resolve a free-text address. Never fails: input that normalizes to nothing yields
    /// an unsuccessful resolution with confidence 0 and leaves the learning store alone.
    pub fn resolve(&self, address: &str) -> Resolution {
        let normalized = normalize(address);
        if normalized.is_empty() {
            debug!("(empty address, nothing to resolve)");
            return Resolution::invalid(address);
        }

        let corrected = self.learning.read().apply_corrections(&normalized, self.config.correction_scope);
        debug!("(resolving {:?}, corrected to {:?})", normalized, corrected);

        let extracted = self.extractor.extract(&corrected);
        let matched = resolver::find_matches(&extracted.components, &self.gazetteer, self.config.fuzzy_match_threshold);
        let confidence = resolver::confidence(&extracted.components, &matched);
        let success = confidence > SUCCESS_THRESHOLD;

        let suggestions = resolver::suggestions(
            &extracted.components,
            &matched,
            &self.gazetteer,
            self.config.suggestion_threshold,
            self.config.max_suggestions_per_field,
            self.config.max_suggestions,
        );
        if self.config.learning_enabled {
            self.learn(&normalized, &extracted.components, &matched, confidence, success);
        }
        //after learning, so corrections inferred from this very input are reported too
        let corrections = resolver::learned_corrections(&extracted.components, &self.learning.read());

        debug!("(confidence={}, success={})", confidence, success);
        Resolution {
            success,
            confidence,
            parsed: ParsedAddress::merge(address.trim(), &corrected, &extracted, &matched),
            extracted,
            matched,
            suggestions,
            corrections,
        }
    }

    ///Fold one resolution into the learning store
    fn learn(&self, normalized: &str, extracted: &AddressComponents, matched: &MatchResult, confidence: f64, success: bool) {
        //suggestions are computed before taking the write lock, they only need the gazetteer
        let inferred: Vec<(String, String)> = if confidence < LEARN_CORRECTIONS_BELOW {
            resolver::unmatched_levels(extracted, matched)
                .filter_map(|level| {
                    let value = extracted.get(level)?;
                    resolver::suggestions_for(level, value, &self.gazetteer, self.config.suggestion_threshold, 1)
                        .into_iter()
                        .next()
                        .map(|suggestion| (value.to_string(), suggestion))
                })
                .collect()
        } else {
            Vec::new()
        };

        let mut learning = self.learning.write();
        learning.learn_words(normalized);
        learning.learn_pattern(extracted);
        for (wrong, right) in inferred {
            learning.learn_correction(&wrong, &right);
        }
        learning.count_resolution(success);
    }

    /// Resolve many addresses, in parallel unless configured to use a single thread.
    /// Results are in input order.
    pub fn resolve_batch<S: AsRef<str> + Sync>(&self, addresses: &[S]) -> Vec<Resolution> {
        if self.config.single_thread {
            addresses.iter().map(|a| self.resolve(a.as_ref())).collect()
        } else {
            addresses.par_iter().map(|a| self.resolve(a.as_ref())).collect()
        }
    }

    pub fn get_learning_stats(&self) -> LearningStats {
        let mut stats = self.learning.read().stats();
        stats.gazetteer_size = self.gazetteer.len();
        stats
    }

    pub fn export_learning_state(&self) -> LearningSnapshot {
        self.learning.read().snapshot()
    }

    ///Replace the learning store; the gazetteer is not affected
    pub fn import_learning_state(&self, snapshot: LearningSnapshot) {
        self.learning.write().restore(snapshot);
    }

    pub fn reset_learning(&self) {
        self.learning.write().clear();
    }

    ///Register a correction supplied from outside, e.g. a user fixing a parsed field
    pub fn teach_correction(&self, wrong: &str, right: &str) -> bool {
        self.learning.write().learn_correction(wrong, right)
    }

    pub fn set_learning_enabled(&mut self, enabled: bool) {
        self.config.learning_enabled = enabled;
    }

    ///Set the province fallback threshold, clamped to [0,1]
    pub fn set_fuzzy_threshold(&mut self, threshold: f64) {
        self.config.fuzzy_match_threshold = clamp_unit(threshold);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn gazetteer(&self) -> &Gazetteer {
        &self.gazetteer
    }

    pub fn is_loaded(&self) -> bool {
        !self.gazetteer.is_empty()
    }

    ///Run a closure with read access to the learning store
    pub fn with_learning<T>(&self, f: impl FnOnce(&LearningStore) -> T) -> T {
        f(&self.learning.read())
    }
}

impl Default for AddressEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
