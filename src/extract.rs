//! Pattern based extraction of administrative components from normalised text.

use log::debug;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::error::Result;
use crate::lexicon::Lexicon;
use crate::types::*;

///Compiled size limit for a single level's pattern; large gazetteers produce large alternations
const PATTERN_SIZE_LIMIT: usize = 1 << 26;

static POSTAL_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[0-9]{5}\b").expect("valid postal code pattern"));

static BUILTIN: Lazy<Extractor> =
    Lazy::new(|| Extractor::new(&Lexicon::builtin()).expect("built-in lexicon compiles"));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleTarget {
    PostalCode,
    Level(Level),
}

/// A single extraction rule: the first match of its pattern fills its target field
#[derive(Clone, Debug)]
pub struct ExtractionRule {
    pub target: RuleTarget,
    pattern: Regex,
}

impl ExtractionRule {
    pub fn postal_code() -> Self {
        Self {
            target: RuleTarget::PostalCode,
            pattern: POSTAL_CODE.clone(),
        }
    }

    ///Compile a rule matching any of the names (or their variants) as whole words.
    ///Returns None when there are no names.
    pub fn for_level<'a>(level: Level, names: impl IntoIterator<Item = &'a str>) -> Result<Option<Self>> {
        let mut names: Vec<&str> = names.into_iter().filter(|n| !n.is_empty()).collect();
        if names.is_empty() {
            return Ok(None);
        }
        //longest first, so a name is never shadowed by one of its own prefixes
        names.sort_by_key(|n| std::cmp::Reverse(n.chars().count()));
        let alternatives: Vec<String> = names.iter().map(|n| variant_pattern(n)).collect();
        let pattern = RegexBuilder::new(&format!(r"\b(?:{})\b", alternatives.join("|")))
            .case_insensitive(true)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()?;
        Ok(Some(Self {
            target: RuleTarget::Level(level),
            pattern,
        }))
    }

    ///First match in the text, if any
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern.find(text).map(|m| m.as_str())
    }
}

///Turns a normalised name into a pattern tolerating repeated letters and missing word gaps,
///so `jawa barat` also accepts `jawa barrat` and `tanah abang` also accepts `tanahabang`.
///A gap may also hold punctuation, as in a substituted correction like `Kota Adm. Jakarta Pusat`.
pub fn variant_pattern(name: &str) -> String {
    let mut pattern = String::with_capacity(name.len() * 3);
    let mut gap = false;
    for c in name.chars() {
        if c.is_whitespace() {
            gap = true;
            continue;
        }
        if gap {
            pattern.push_str(r"[\s[:punct:]]*");
            gap = false;
        }
        let mut buf = [0u8; 4];
        pattern.push_str(&regex::escape(c.encode_utf8(&mut buf)));
        pattern.push('+');
    }
    pattern
}

/// Applies an ordered list of rules to a text. Rules never consume text, so each one
/// sees the whole input.
#[derive(Clone, Debug)]
pub struct Extractor {
    rules: Vec<ExtractionRule>,
}

impl Extractor {
    ///Postal code first, then one rule per level from broad to narrow
    pub fn new(lexicon: &Lexicon) -> Result<Self> {
        let mut rules = vec![ExtractionRule::postal_code()];
        for level in Level::ALL {
            if let Some(rule) = ExtractionRule::for_level(level, lexicon.names(level))? {
                rules.push(rule);
            }
        }
        Ok(Self { rules })
    }

    /// The extractor over the built-in lexicon (compiled once per process)
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    pub fn with_rules(rules: Vec<ExtractionRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ExtractionRule] {
        &self.rules
    }

    pub fn extract(&self, text: &str) -> ExtractedComponents {
        let mut extracted = ExtractedComponents::default();
        for rule in self.rules.iter() {
            let already = match rule.target {
                RuleTarget::PostalCode => extracted.components.postal_code.is_some(),
                RuleTarget::Level(level) => extracted.components.has(level),
            };
            if already {
                continue;
            }
            if let Some(found) = rule.find(text) {
                debug!("   (extracted {:?}: {})", rule.target, found);
                match rule.target {
                    RuleTarget::PostalCode => extracted.components.set_postal_code(found),
                    RuleTarget::Level(level) => extracted.components.set(level, found),
                }
            }
        }
        extracted.detail = detail(text, &extracted.components);
        extracted
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::builtin()
    }
}

///The tokens of the text that are not part of any extracted value, in order
fn detail(text: &str, components: &AddressComponents) -> Option<String> {
    let values: Vec<String> = components.values().map(|v| v.to_lowercase()).collect();
    let rest: Vec<&str> = text
        .split_whitespace()
        .filter(|token| {
            let token = token.to_lowercase();
            !values.iter().any(|value| value.contains(&token))
        })
        .collect();
    if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    }
}
