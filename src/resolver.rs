//! Hierarchical lookup of extracted components, confidence scoring and suggestions.
//! These are pure functions over a gazetteer; the engine strings them together.

use log::debug;

use crate::distance::{best_match, similar_candidates};
use crate::gazetteer::Gazetteer;
use crate::learning::LearningStore;
use crate::normalize::normalize;
use crate::types::*;

/// Look up the extracted components level by level, broadest first.
///
/// Every exact hit overwrites the fields of its own level and all broader levels, plus
/// the postal code, with the values of the first record filed under the key; the
/// narrowest hit therefore wins. When no level produced a province but a province was
/// extracted, the province keys are searched by similarity as a last resort.
pub fn find_matches(extracted: &AddressComponents, gazetteer: &Gazetteer, fuzzy_threshold: f64) -> MatchResult {
    let mut matches = MatchResult::default();

    for level in Level::ALL {
        let Some(value) = extracted.get(level) else {
            continue;
        };
        if let Some(record) = gazetteer.first(level, value) {
            debug!("   (exact {} match: {})", level, value);
            apply_record(&mut matches, level, record);
        }
    }

    if !matches.has(Level::Province) {
        if let Some(value) = extracted.get(Level::Province) {
            let keys = gazetteer.index().keys(Level::Province);
            if let Some((key, score)) = best_match(&normalize(value), keys, fuzzy_threshold) {
                if let Some(record) = gazetteer.first(Level::Province, key) {
                    debug!("   (fuzzy province match: {} -> {}, score={})", value, key, score);
                    matches.set(Level::Province, &record.province);
                    matches.set_postal_code(&record.postal_code);
                }
            }
        }
    }

    matches
}

fn apply_record(matches: &mut MatchResult, level: Level, record: &AddressRecord) {
    for broader in level.up_to() {
        matches.set(*broader, record.get(*broader));
    }
    matches.set_postal_code(&record.postal_code);
}

/// Full credit for every extracted level that ended up matched, partial credit for the
/// ones that did not, plus a bonus when the postal codes agree. Clamped to [0,1].
pub fn confidence(extracted: &AddressComponents, matches: &MatchResult) -> f64 {
    let mut score = 0.0;
    let mut total = 0;
    for level in extracted.present_levels() {
        total += 1;
        score += if matches.has(level) { 1.0 } else { PARTIAL_CREDIT };
    }
    if let Some(postal_code) = extracted.postal_code.as_deref() {
        if matches.postal_code.as_deref() == Some(postal_code) {
            score += POSTAL_CODE_BONUS;
        }
    }
    if total == 0 {
        0.0
    } else {
        (score / total as f64).clamp(0.0, 1.0)
    }
}

/// Canonical values of gazetteer keys similar to an unmatched value, in index order
pub fn suggestions_for(level: Level, value: &str, gazetteer: &Gazetteer, threshold: f64, limit: usize) -> Vec<String> {
    similar_candidates(&normalize(value), gazetteer.index().keys(level), threshold)
        .into_iter()
        .filter_map(|(key, _)| gazetteer.first(level, key))
        .map(|record| record.get(level).to_string())
        .take(limit)
        .collect()
}

/// Suggestions for every level that was extracted but not matched
pub fn suggestions(
    extracted: &AddressComponents,
    matches: &MatchResult,
    gazetteer: &Gazetteer,
    threshold: f64,
    per_field: usize,
    total: usize,
) -> Vec<String> {
    let mut found = Vec::new();
    for level in unmatched_levels(extracted, matches) {
        if found.len() >= total {
            break;
        }
        if let Some(value) = extracted.get(level) {
            found.extend(suggestions_for(level, value, gazetteer, threshold, per_field));
        }
    }
    found.truncate(total);
    found
}

/// Extracted levels for which no match was found, in hierarchy order
pub fn unmatched_levels<'a>(extracted: &'a AddressComponents, matches: &'a MatchResult) -> impl Iterator<Item = Level> + 'a {
    extracted.present_levels().filter(move |level| !matches.has(*level))
}

/// Previously learned corrections for any of the extracted values
pub fn learned_corrections(extracted: &AddressComponents, learning: &LearningStore) -> Vec<CorrectionHint> {
    extracted
        .values()
        .filter_map(|value| {
            learning.correction(value).map(|suggested| CorrectionHint {
                original: value.to_string(),
                suggested: suggested.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gazetteer() -> Gazetteer {
        Gazetteer::from_records(vec![
            AddressRecord::new("DKI Jakarta", "Jakarta Pusat", "Tanah Abang", "Kebon Melati", "10230"),
            AddressRecord::new("DKI Jakarta", "Jakarta Pusat", "Tanah Abang", "Kebon Kacang", "10240"),
            AddressRecord::new("Jawa Barat", "Bogor", "Cileungsi", "Cileungsi", "16820"),
            AddressRecord::new("Jawa Timur", "Malang", "Klojen", "Klojen", "65111"),
        ])
    }

    fn extracted(pairs: &[(Level, &str)]) -> AddressComponents {
        let mut c = AddressComponents::default();
        for (level, value) in pairs {
            c.set(*level, value);
        }
        c
    }

    #[test]
    fn narrowest_match_wins() {
        let g = gazetteer();
        let e = extracted(&[(Level::Province, "jawa barat"), (Level::Village, "kebon kacang")]);
        let m = find_matches(&e, &g, DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(m.province.as_deref(), Some("DKI Jakarta"));
        assert_eq!(m.regency_city.as_deref(), Some("Jakarta Pusat"));
        assert_eq!(m.district.as_deref(), Some("Tanah Abang"));
        assert_eq!(m.village.as_deref(), Some("Kebon Kacang"));
        assert_eq!(m.postal_code.as_deref(), Some("10240"));
    }

    #[test]
    fn district_match_leaves_village_unset() {
        let g = gazetteer();
        let m = find_matches(&extracted(&[(Level::District, "Tanah Abang")]), &g, DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(m.district.as_deref(), Some("Tanah Abang"));
        assert_eq!(m.village, None);
        //first record under the key
        assert_eq!(m.postal_code.as_deref(), Some("10230"));
    }

    #[test]
    fn fuzzy_fallback_for_province_only() {
        let g = gazetteer();
        let m = find_matches(&extracted(&[(Level::Province, "jawa barrat")]), &g, 0.8);
        assert_eq!(m.province.as_deref(), Some("Jawa Barat"));
        assert_eq!(m.postal_code.as_deref(), Some("16820"));

        let m = find_matches(&extracted(&[(Level::Province, "jawa barrat")]), &g, 0.95);
        assert_eq!(m.province, None);

        //no fallback for narrower levels
        let m = find_matches(&extracted(&[(Level::District, "tanahabang")]), &g, 0.0);
        assert!(m.is_empty());
    }

    #[test]
    fn confidence_scoring() {
        let e = extracted(&[(Level::Province, "dki jakarta"), (Level::District, "tanahabang")]);
        let mut m = MatchResult::default();
        m.set(Level::Province, "DKI Jakarta");
        assert!((confidence(&e, &m) - 1.3 / 2.0).abs() < 1e-9);

        assert_eq!(confidence(&AddressComponents::default(), &m), 0.0);

        //the postal code bonus can not push confidence past 1
        let mut e = extracted(&[(Level::Province, "dki jakarta")]);
        e.set_postal_code("10230");
        m.set_postal_code("10230");
        assert_eq!(confidence(&e, &m), 1.0);

        //postal code alone does not count
        let mut e = AddressComponents::default();
        e.set_postal_code("10230");
        assert_eq!(confidence(&e, &m), 0.0);
    }

    #[test]
    fn postal_code_bonus_lifts_partial_matches() {
        let mut e = extracted(&[(Level::Province, "dki jakarta"), (Level::District, "tanahabang")]);
        e.set_postal_code("10230");
        let mut m = MatchResult::default();
        m.set(Level::Province, "DKI Jakarta");
        m.set_postal_code("10230");
        assert!((confidence(&e, &m) - 1.8 / 2.0).abs() < 1e-9);
    }

    #[test]
    fn suggestions_are_canonical_and_capped() {
        let g = gazetteer();
        assert_eq!(
            suggestions_for(Level::District, "tanahabang", &g, DEFAULT_SUGGESTION_THRESHOLD, 3),
            vec!["Tanah Abang".to_string()]
        );
        assert_eq!(
            suggestions_for(Level::Village, "kebon", &g, 0.0, 1),
            vec!["Kebon Melati".to_string()]
        );
        let e = extracted(&[(Level::Province, "jawa"), (Level::Village, "kebon")]);
        let found = suggestions(&e, &MatchResult::default(), &g, 0.0, 3, 5);
        assert_eq!(found.len(), 5);
    }
}
