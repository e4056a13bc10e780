use serde::{Deserialize, Serialize};

///Each gazetteer record gets assigned an ID integer, which is its position in the store
pub type RecordId = u32;

///Default minimum similarity for the province fallback match
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;

///Default similarity a key must exceed before it is offered as a suggestion
pub const DEFAULT_SUGGESTION_THRESHOLD: f64 = 0.6;

///A resolution is considered successful when its confidence exceeds this value
pub const SUCCESS_THRESHOLD: f64 = 0.3;

///Corrections are only learned from resolutions with a confidence below this value
pub const LEARN_CORRECTIONS_BELOW: f64 = 0.7;

///Credit for a level that was extracted but could not be matched
pub const PARTIAL_CREDIT: f64 = 0.3;

///Bonus when the extracted postal code agrees with the matched one
pub const POSTAL_CODE_BONUS: f64 = 0.5;

///Separator used to join levels into a pattern signature
pub const PATTERN_SEPARATOR: &str = "->";

/// The four nested administrative levels, broadest first
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Province,
    RegencyCity,
    District,
    Village,
}

impl Level {
    /// All levels in lookup order (broadest to narrowest)
    pub const ALL: [Level; 4] = [
        Level::Province,
        Level::RegencyCity,
        Level::District,
        Level::Village,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Province => "province",
            Level::RegencyCity => "regency_city",
            Level::District => "district",
            Level::Village => "village",
        }
    }

    ///Position of the level in [`Level::ALL`]
    pub fn index(&self) -> usize {
        match self {
            Level::Province => 0,
            Level::RegencyCity => 1,
            Level::District => 2,
            Level::Village => 3,
        }
    }

    /// The levels broader than this one, plus this one
    pub fn up_to(&self) -> &'static [Level] {
        &Level::ALL[..=self.index()]
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the gazetteer. Immutable once loaded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub province: String,
    pub regency_city: String,
    pub district: String,
    pub village: String,
    pub postal_code: String,
}

impl AddressRecord {
    pub fn new(province: &str, regency_city: &str, district: &str, village: &str, postal_code: &str) -> Self {
        Self {
            province: province.to_string(),
            regency_city: regency_city.to_string(),
            district: district.to_string(),
            village: village.to_string(),
            postal_code: postal_code.to_string(),
        }
    }

    /// The canonical value of this record at the given level (may be empty)
    pub fn get(&self, level: Level) -> &str {
        match level {
            Level::Province => &self.province,
            Level::RegencyCity => &self.regency_city,
            Level::District => &self.district,
            Level::Village => &self.village,
        }
    }
}

/// The five administrative fields, each explicitly absent or present.
/// A present field is never the empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressComponents {
    pub province: Option<String>,
    pub regency_city: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,
    pub postal_code: Option<String>,
}

impl AddressComponents {
    pub fn get(&self, level: Level) -> Option<&str> {
        match level {
            Level::Province => self.province.as_deref(),
            Level::RegencyCity => self.regency_city.as_deref(),
            Level::District => self.district.as_deref(),
            Level::Village => self.village.as_deref(),
        }
    }

    /// Sets a level; empty values are stored as absent
    pub fn set(&mut self, level: Level, value: &str) {
        let value = non_empty(value);
        match level {
            Level::Province => self.province = value,
            Level::RegencyCity => self.regency_city = value,
            Level::District => self.district = value,
            Level::Village => self.village = value,
        }
    }

    pub fn set_postal_code(&mut self, value: &str) {
        self.postal_code = non_empty(value);
    }

    pub fn has(&self, level: Level) -> bool {
        self.get(level).is_some()
    }

    ///Iterates over the administrative levels that are present, in hierarchy order
    pub fn present_levels(&self) -> impl Iterator<Item = Level> + '_ {
        Level::ALL.into_iter().filter(move |level| self.has(*level))
    }

    pub fn is_empty(&self) -> bool {
        self.present_levels().next().is_none() && self.postal_code.is_none()
    }

    ///All present values (levels first, then the postal code)
    pub fn values(&self) -> impl Iterator<Item = &str> + '_ {
        Level::ALL
            .into_iter()
            .filter_map(move |level| self.get(level))
            .chain(self.postal_code.as_deref())
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// What the extractor pulled out of the text, as it appeared in the text
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedComponents {
    pub components: AddressComponents,
    /// Tokens not covered by any extracted value, in their original order
    pub detail: Option<String>,
}

/// Values resolved from the gazetteer; authoritative, canonical casing
pub type MatchResult = AddressComponents;

/// The final, merged view of a resolved address: the matched value for each field
/// where there is one, the extracted text otherwise
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAddress {
    pub original: String,
    pub normalized: String,
    pub province: Option<String>,
    pub regency_city: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,
    pub postal_code: Option<String>,
    pub detail: Option<String>,
}

impl ParsedAddress {
    pub fn merge(original: &str, normalized: &str, extracted: &ExtractedComponents, matched: &MatchResult) -> Self {
        let pick = |m: &Option<String>, e: &Option<String>| m.clone().or_else(|| e.clone());
        let e = &extracted.components;
        Self {
            original: original.to_string(),
            normalized: normalized.to_string(),
            province: pick(&matched.province, &e.province),
            regency_city: pick(&matched.regency_city, &e.regency_city),
            district: pick(&matched.district, &e.district),
            village: pick(&matched.village, &e.village),
            postal_code: pick(&matched.postal_code, &e.postal_code),
            detail: extracted.detail.clone(),
        }
    }

    pub fn get(&self, level: Level) -> Option<&str> {
        match level {
            Level::Province => self.province.as_deref(),
            Level::RegencyCity => self.regency_city.as_deref(),
            Level::District => self.district.as_deref(),
            Level::Village => self.village.as_deref(),
        }
    }
}

/// A previously learned correction that applies to an extracted value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionHint {
    pub original: String,
    pub suggested: String,
}

/// The outcome of resolving one address
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub success: bool,
    pub confidence: f64,
    pub parsed: ParsedAddress,
    pub extracted: ExtractedComponents,
    pub matched: MatchResult,
    pub suggestions: Vec<String>,
    pub corrections: Vec<CorrectionHint>,
}

impl Resolution {
    ///The result for input that normalizes to nothing
    pub fn invalid(original: &str) -> Self {
        Self {
            parsed: ParsedAddress {
                original: original.trim().to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Read-only snapshot of the engine's learning counters
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningStats {
    pub learned_words: usize,
    pub address_patterns: usize,
    pub corrections: usize,
    pub gazetteer_size: usize,
    pub resolved_total: u64,
    pub resolved_successful: u64,
}

impl LearningStats {
    /// Share of successful resolutions, in percent (0 when nothing was resolved yet)
    pub fn accuracy(&self) -> f64 {
        if self.resolved_total == 0 {
            0.0
        } else {
            self.resolved_successful as f64 / self.resolved_total as f64 * 100.0
        }
    }
}
