use std::io::Write;

use alamat::resolver::find_matches;
use alamat::test::*;
use alamat::*;
use proptest::prelude::*;

#[test]
fn test0001_normalize() {
    assert_eq!(normalize("  Jl. Mawar No.5,  KEBON-Melati  "), "jl mawar no 5 kebon melati");
    assert_eq!(normalize("!!!"), "");
    assert_eq!(normalize(""), "");
}

#[test]
fn test0002_similarity() {
    assert_eq!(similarity("", ""), 1.0);
    assert_eq!(similarity("bali", "bali"), 1.0);
    assert_eq!(similarity("abc", ""), 0.0);
    //one substitution over ten characters
    assert!((similarity("jawa barat", "jawa barot") - 0.9).abs() < 1e-9);
    //one insertion over eleven characters
    assert!((similarity("jawa barrat", "jawa barat") - 10.0 / 11.0).abs() < 1e-9);
}

proptest! {
    #[test]
    fn test0003_similarity_is_symmetric(a in "[a-z ]{0,12}", b in "[a-z ]{0,12}") {
        let ab = similarity(&a, &b);
        prop_assert_eq!(ab, similarity(&b, &a));
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert_eq!(similarity(&a, &a), 1.0);
    }
}

#[test]
fn test0101_load_gazetteer() {
    let gazetteer = get_test_gazetteer();
    assert_eq!(gazetteer.len(), 11);
    assert_eq!(gazetteer.index().len(Level::Province), 7);
    //two records share the district
    assert_eq!(gazetteer.lookup(Level::District, "tanah abang").len(), 2);
    assert_eq!(
        gazetteer.first(Level::Village, "kebon melati").map(|r| r.postal_code.as_str()),
        Some("10120")
    );
}

#[test]
fn test0102_load_indonesian_headers() {
    let mut engine = AddressEngine::new(get_test_config());
    engine
        .load_reader(TEST_GAZETTEER_INDONESIAN.as_bytes(), &TableParams { delimiter: ';' })
        .expect("table loads");
    assert_eq!(engine.gazetteer().len(), 2);
    let record = &engine.gazetteer().records()[0];
    assert_eq!(record, &AddressRecord::new("DKI Jakarta", "Jakarta Pusat", "Tanah Abang", "Kebon Melati", "10120"));
    assert!(engine.resolve("kebon melati").success);
}

#[test]
fn test0103_load_file() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    file.write_all(TEST_GAZETTEER.as_bytes()).expect("write");
    let mut engine = AddressEngine::default();
    engine.load_file(file.path(), &TableParams::default()).expect("file loads");
    assert_eq!(engine.get_learning_stats().gazetteer_size, 11);
}

#[test]
fn test0104_load_errors() {
    let mut engine = AddressEngine::default();
    assert!(matches!(engine.load(""), Err(Error::EmptyTable)));
    assert!(matches!(engine.load("\n\n"), Err(Error::EmptyTable)));
    assert!(matches!(engine.load("naam,nomor\nfoo,1\n"), Err(Error::NoKnownColumns { .. })));
    let err = engine
        .load_file("/nonexistent/gazetteer.csv", &TableParams::default())
        .expect_err("missing file");
    assert!(err.is_load_error());
    assert!(!engine.is_loaded());
}

#[test]
fn test0201_extract() {
    let extracted = Extractor::builtin().extract("jl mawar 7 kebon melati tanah abang jakarta pusat 10120");
    let c = &extracted.components;
    assert_eq!(c.village.as_deref(), Some("kebon melati"));
    assert_eq!(c.district.as_deref(), Some("tanah abang"));
    assert_eq!(c.regency_city.as_deref(), Some("jakarta pusat"));
    assert_eq!(c.province, None);
    assert_eq!(c.postal_code.as_deref(), Some("10120"));
    assert_eq!(extracted.detail.as_deref(), Some("jl mawar 7"));
}

#[test]
fn test0202_extract_variants() {
    let extractor = Extractor::builtin();
    let extracted = extractor.extract("jawa barrat");
    assert_eq!(extracted.components.province.as_deref(), Some("jawa barrat"));
    let extracted = extractor.extract("jalan mawar tanahabang");
    assert_eq!(extracted.components.district.as_deref(), Some("tanahabang"));
    assert!(extractor.extract("jalan mawar no 7").components.is_empty());
}

#[test]
fn test0301_every_record_resolves_from_district_and_village() {
    let engine = get_test_engine();
    for record in engine.gazetteer().records().to_vec() {
        let address = format!("{} {}", record.district, record.village);
        let resolution = engine.resolve(&address);
        assert!(resolution.success, "{} should resolve", address);
        assert_eq!(resolution.confidence, 1.0, "{}", address);
        for level in Level::ALL {
            assert_eq!(resolution.parsed.get(level), Some(record.get(level)), "{} ({})", address, level);
        }
        assert_eq!(resolution.parsed.postal_code.as_deref(), Some(record.postal_code.as_str()));
    }
}

#[test]
fn test0302_resolve_full_address() {
    let engine = get_test_engine();
    let resolution = engine.resolve("Kebon Melati Tanah Abang Jakarta Pusat");
    assert!(resolution.success);
    assert_eq!(resolution.confidence, 1.0);
    let parsed = &resolution.parsed;
    assert_eq!(parsed.village.as_deref(), Some("Kebon Melati"));
    assert_eq!(parsed.district.as_deref(), Some("Tanah Abang"));
    assert_eq!(parsed.regency_city.as_deref(), Some("Jakarta Pusat"));
    assert_eq!(parsed.province.as_deref(), Some("DKI Jakarta"));
    assert_eq!(parsed.postal_code.as_deref(), Some("10120"));
    assert_eq!(parsed.original, "Kebon Melati Tanah Abang Jakarta Pusat");
    assert_eq!(parsed.normalized, "kebon melati tanah abang jakarta pusat");
    assert!(resolution.suggestions.is_empty());
    assert!(resolution.corrections.is_empty());
}

#[test]
fn test0303_resolve_misspelled_province() {
    let engine = get_test_engine();
    let resolution = engine.resolve("jawa barrat");
    assert!(resolution.success);
    //one extracted field, matched through the fallback
    assert_eq!(resolution.confidence, 1.0);
    assert_eq!(resolution.extracted.components.province.as_deref(), Some("jawa barrat"));
    assert_eq!(resolution.parsed.province.as_deref(), Some("Jawa Barat"));
    assert_eq!(resolution.parsed.regency_city, None);
    assert_eq!(resolution.parsed.postal_code.as_deref(), Some("16820"));

    //without learning, so the second attempt can only succeed through the fallback
    let mut engine = get_test_engine_with(get_test_config().with_fuzzy_threshold(0.95).with_learning(false));
    let resolution = engine.resolve("jawa barrat");
    assert_eq!(resolution.matched.province, None);
    assert!(!resolution.success);
    engine.set_fuzzy_threshold(0.9);
    let resolution = engine.resolve("jawa barrat");
    assert!(resolution.success);
    assert_eq!(resolution.parsed.normalized, "jawa barrat");
    assert_eq!(resolution.matched.province.as_deref(), Some("Jawa Barat"));
}

#[test]
fn test0304_resolve_without_known_tokens() {
    let engine = get_test_engine();
    let resolution = engine.resolve("jalan mawar no 7");
    assert!(!resolution.success);
    assert_eq!(resolution.confidence, 0.0);
    assert!(resolution.matched.is_empty());
    assert_eq!(resolution.parsed.detail.as_deref(), Some("jalan mawar no 7"));
    //the words are learned, there is no pattern to learn
    let stats = engine.get_learning_stats();
    assert_eq!(stats.learned_words, 2);
    assert_eq!(stats.address_patterns, 0);
}

#[test]
fn test0305_empty_input() {
    let engine = get_test_engine();
    for input in ["", "   ", "?!,."] {
        let resolution = engine.resolve(input);
        assert!(!resolution.success);
        assert_eq!(resolution.confidence, 0.0);
        assert!(resolution.extracted.components.is_empty());
    }
    assert_eq!(engine.get_learning_stats().resolved_total, 0);
}

proptest! {
    #[test]
    fn test0306_higher_threshold_never_adds_fallback_matches(low in 0.0f64..=1.0, high in 0.0f64..=1.0) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let gazetteer = get_test_gazetteer();
        let count = |threshold: f64| {
            ["jawa barrat", "jawa tenggah", "dki jakartaa", "sumatra utara", "bal", "papua"]
                .iter()
                .filter(|value| {
                    let mut extracted = AddressComponents::default();
                    extracted.set(Level::Province, value);
                    find_matches(&extracted, &gazetteer, threshold).has(Level::Province)
                })
                .count()
        };
        prop_assert!(count(high) <= count(low));
    }
}

#[test]
fn test0401_learn_correction_from_low_confidence() {
    let engine = get_test_engine();
    let first = engine.resolve("jalan mawar tanahabang");
    assert!(!first.success);
    assert!((first.confidence - PARTIAL_CREDIT).abs() < 1e-9);
    assert_eq!(first.suggestions, vec!["Tanah Abang".to_string()]);
    engine.with_learning(|learning| {
        assert_eq!(learning.correction("tanahabang"), Some("Tanah Abang"));
    });
    assert_eq!(
        first.corrections,
        vec![CorrectionHint {
            original: "tanahabang".to_string(),
            suggested: "Tanah Abang".to_string()
        }]
    );

    //the correction is substituted before extraction
    let second = engine.resolve("jalan mawar tanahabang");
    assert!(second.success);
    assert_eq!(second.confidence, 1.0);
    assert_eq!(second.parsed.normalized, "jalan mawar Tanah Abang");
    assert_eq!(second.parsed.district.as_deref(), Some("Tanah Abang"));
    assert_eq!(second.parsed.province.as_deref(), Some("DKI Jakarta"));

    let stats = engine.get_learning_stats();
    assert_eq!(stats.corrections, 1);
    assert_eq!(stats.resolved_total, 2);
    assert_eq!(stats.resolved_successful, 1);
    assert_eq!(stats.accuracy(), 50.0);
}

#[test]
fn test0402_repeated_resolves_only_grow_frequencies() {
    let engine = get_test_engine();
    let address = "Kebon Melati Tanah Abang Jakarta Pusat";
    let first = engine.resolve(address);
    for _ in 0..3 {
        let again = engine.resolve(address);
        assert_eq!(again.parsed, first.parsed);
        assert_eq!(again.confidence, first.confidence);
    }
    engine.with_learning(|learning| {
        assert_eq!(learning.word_frequency("kebon"), 4);
        assert_eq!(learning.pattern_frequency("regency_city->district->village"), 4);
        assert!(learning.corrections().is_empty());
    });
}

#[test]
fn test0403_export_import_learning_state() {
    let engine = get_test_engine();
    engine.resolve("jalan mawar tanahabang");
    engine.resolve("penjaringan pluit");
    engine.resolve("jawa barrat");
    let exported = engine.export_learning_state();
    assert!(exported.exported_at.is_some());

    let json = exported.to_json().expect("serializes");
    let other = get_test_engine();
    other.import_learning_state(LearningSnapshot::from_json(&json).expect("deserializes"));
    assert_eq!(other.get_learning_stats(), engine.get_learning_stats());
    let reexported = other.export_learning_state();
    assert_eq!(reexported.learned_words, exported.learned_words);
    assert_eq!(reexported.address_patterns, exported.address_patterns);
    assert_eq!(reexported.corrections, exported.corrections);

    //importing replaces rather than merges
    other.import_learning_state(LearningSnapshot::default());
    assert_eq!(other.get_learning_stats().learned_words, 0);
    assert_eq!(other.get_learning_stats().gazetteer_size, 11);
}

#[test]
fn test0404_teach_correction() {
    let engine = get_test_engine();
    assert!(engine.teach_correction("Plut", "pluit"));
    assert!(!engine.teach_correction("", "pluit"));
    let resolution = engine.resolve("penjaringan plut");
    assert!(resolution.success);
    assert_eq!(resolution.parsed.village.as_deref(), Some("Pluit"));

    engine.reset_learning();
    assert_eq!(engine.get_learning_stats().corrections, 0);
    assert_eq!(engine.get_learning_stats().resolved_total, 0);
}

#[test]
fn test0405_correction_scope() {
    let substring = get_test_engine_with(get_test_config().with_learning(false));
    substring.teach_correction("sel", "selatan");
    assert_eq!(substring.resolve("selong jakarta sel").parsed.normalized, "selatanong jakarta selatan");

    let token = get_test_engine_with(
        get_test_config()
            .with_learning(false)
            .with_correction_scope(CorrectionScope::Token),
    );
    token.teach_correction("sel", "selatan");
    assert_eq!(token.resolve("selong jakarta sel").parsed.normalized, "selong jakarta selatan");
}

#[test]
fn test0501_resolve_batch_keeps_input_order() {
    let engine = get_test_engine_with(EngineConfig::default().with_learning(false));
    let addresses = vec!["penjaringan pluit", "jalan mawar no 7", "cileungsi cileungsi", "jawa barrat"];
    let resolutions = engine.resolve_batch(addresses.as_slice());
    assert_eq!(resolutions.len(), addresses.len());
    for (address, resolution) in addresses.iter().zip(resolutions.iter()) {
        assert_eq!(resolution.parsed.original, *address);
        assert_eq!(resolution, &engine.resolve(address));
    }
    assert!(!resolutions[1].success);
}

#[test]
fn test0502_extend_lexicon_from_gazetteer() {
    let table = format!("{}Kalimantan Timur,Samarinda,Sungai Kunjang,Loa Bakung,75125\n", TEST_GAZETTEER);

    let mut engine = AddressEngine::new(get_test_config());
    engine.load(&table).expect("table loads");
    assert_eq!(engine.resolve("sungai kunjang loa bakung").confidence, 0.0);

    let mut engine = AddressEngine::new(get_test_config().with_lexicon_from_gazetteer());
    engine.load(&table).expect("table loads");
    let resolution = engine.resolve("sungai kunjang loa bakung");
    assert_eq!(resolution.confidence, 1.0);
    assert_eq!(resolution.parsed.village.as_deref(), Some("Loa Bakung"));
    assert_eq!(resolution.parsed.province.as_deref(), Some("Kalimantan Timur"));
}

#[test]
fn test0504_punctuated_gazetteer_names() {
    let table = "province,regency_city,district,village,postal_code
DKI Jakarta,Kota Adm. Jakarta Pusat,Tanah Abang,Kebon Melati,10120
Jawa Barat,Kab. Bogor,Cileungsi,Cileungsi,16820
";
    let mut engine = AddressEngine::new(get_test_config().with_lexicon_from_gazetteer());
    engine.load(table).expect("table loads");

    let resolution = engine.resolve("Kebon Melati, Kota Adm. Jakarta Pusat");
    assert_eq!(resolution.extracted.components.regency_city.as_deref(), Some("kota adm jakarta pusat"));
    assert_eq!(resolution.matched.regency_city.as_deref(), Some("Kota Adm. Jakarta Pusat"));
    assert_eq!(resolution.confidence, 1.0);

    let resolution = engine.resolve("kab bogor");
    assert!(resolution.success);
    assert_eq!(resolution.parsed.regency_city.as_deref(), Some("Kab. Bogor"));
    assert_eq!(resolution.parsed.province.as_deref(), Some("Jawa Barat"));
}

#[test]
fn test0505_many_corrections() {
    let engine = get_test_engine_with(get_test_config().with_learning(false));
    for i in 0..2000 {
        engine.teach_correction(&format!("salah{}", i), &format!("benar{}", i));
    }
    engine.teach_correction("plut", "pluit");
    for _ in 0..50 {
        let resolution = engine.resolve("penjaringan plut");
        assert!(resolution.success);
        assert_eq!(resolution.parsed.normalized, "penjaringan pluit");
    }
    assert_eq!(engine.get_learning_stats().corrections, 2001);
}

#[test]
fn test0503_engine_is_shareable_across_threads() {
    let engine = std::sync::Arc::new(get_test_engine());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            std::thread::spawn(move || engine.resolve("tanah abang kebon kacang").confidence)
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().expect("thread completes"), 1.0);
    }
    assert_eq!(engine.get_learning_stats().resolved_total, 4);
}

#[test]
fn test0601_configured_thresholds_are_clamped() {
    let config = EngineConfig::from_figment(
        figment::Figment::from(figment::providers::Serialized::defaults(EngineConfig::default()))
            .merge(figment::providers::Serialized::default("suggestion_threshold", 7.5)),
    )
    .expect("valid config");
    assert_eq!(config.suggestion_threshold, 1.0);
    assert!(config.learning_enabled);
}
