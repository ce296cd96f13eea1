//! Property-based tests for the search pipeline over the built-in catalogs.

use proptest::prelude::*;

use rx_search_core::catalog::{seed, MedicationStore, TestStore};
use rx_search_core::models::{ClinicalContext, MatchStrength, SearchContext};
use rx_search_core::search::MedicationSearch;
use rx_search_core::SearchConfig;

fn medications() -> MedicationStore {
    seed::medications().unwrap()
}

fn lab_tests() -> TestStore {
    seed::tests().unwrap()
}

/// Queries that hit the catalog often: fragments of real names mixed with
/// arbitrary text.
fn query_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(vec![
            "amox", "para", "ibu", "pril", "statin", "antibiotic", "nsaid", "tylenol", "zole",
            "met", "a", "", "  ",
        ])
        .prop_map(str::to_string),
        "[a-zA-Z -]{0,12}",
    ]
}

fn ids_for(store: &MedicationStore, config: &SearchConfig, request: &SearchContext) -> Vec<String> {
    MedicationSearch::new(store, config)
        .suggest(request)
        .suggestions
        .iter()
        .map(|s| s.record.id.clone())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn proptest_search_is_deterministic(
        query in query_strategy(),
        limit in 0usize..30,
        age in prop::option::of(0u32..100),
    ) {
        let store = medications();
        let config = SearchConfig::default();
        let engine = MedicationSearch::new(&store, &config);

        let mut request = SearchContext::new(query).with_limit(limit);
        if let Some(age) = age {
            request = request.with_context(ClinicalContext::with_age(age));
        }

        let first = engine.suggest(&request);
        let second = engine.suggest(&request);
        prop_assert_eq!(first, second, "Same inputs should give identical output");
    }

    #[test]
    fn proptest_search_is_case_insensitive(query in query_strategy()) {
        let store = medications();
        let config = SearchConfig::default();

        let lower = ids_for(&store, &config, &SearchContext::new(query.to_lowercase()));
        let upper = ids_for(&store, &config, &SearchContext::new(query.to_uppercase()));
        let as_is = ids_for(&store, &config, &SearchContext::new(query.clone()));

        prop_assert_eq!(&lower, &upper);
        prop_assert_eq!(&lower, &as_is);
    }

    #[test]
    fn proptest_results_are_bounded(query in query_strategy(), limit in 0usize..60) {
        let store = medications();
        let config = SearchConfig::default();
        let engine = MedicationSearch::new(&store, &config);

        let results = engine.search(&query, limit);
        prop_assert!(results.len() <= limit, "Got {} results for limit {}", results.len(), limit);
        if limit == 0 {
            prop_assert!(results.is_empty());
        }
    }

    #[test]
    fn proptest_results_ordered_by_strength_then_popularity(query in query_strategy()) {
        let store = medications();
        let config = SearchConfig::default();
        let results = MedicationSearch::new(&store, &config).search(&query, 50);

        for pair in results.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(a.strength >= b.strength, "Strength must not increase down the list");
            if a.strength == b.strength {
                prop_assert!(
                    a.record.popularity_score >= b.record.popularity_score,
                    "Popularity must not increase within a strength tier"
                );
            }
        }
    }

    #[test]
    fn proptest_empty_query_is_popularity_order(limit in 0usize..30) {
        let store = medications();
        let config = SearchConfig::default();
        let results = MedicationSearch::new(&store, &config).search("", limit);

        prop_assert_eq!(results.len(), store.len().min(limit));
        prop_assert!(results.iter().all(|c| c.strength == MatchStrength::Neutral));
        for pair in results.windows(2) {
            prop_assert!(pair[0].record.popularity_score >= pair[1].record.popularity_score);
        }
    }

    #[test]
    fn proptest_searches_never_mutate_catalog(
        queries in prop::collection::vec(query_strategy(), 1..10)
    ) {
        let store = medications();
        let config = SearchConfig::default();
        let before = store.get_all().to_vec();
        let fingerprint = store.fingerprint().to_string();

        let engine = MedicationSearch::new(&store, &config);
        for query in &queries {
            let _ = engine.suggest(&SearchContext::new(query.clone()));
            let _ = engine.complete(query, None);
        }

        prop_assert_eq!(store.get_all(), before.as_slice());
        prop_assert_eq!(store.fingerprint(), fingerprint.as_str());
    }

    #[test]
    fn proptest_completions_are_distinct_and_bounded(
        query in query_strategy(),
        limit in 0usize..15,
    ) {
        let store = medications();
        let config = SearchConfig::default();
        let names = MedicationSearch::new(&store, &config).complete(&query, Some(limit));

        prop_assert!(names.len() <= limit);
        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), names.len());
    }
}

#[test]
fn test_confidence_is_monotonic_in_strength() {
    let confidence = SearchConfig::default().confidence;
    let ordered = [
        MatchStrength::Exact,
        MatchStrength::NamePartial,
        MatchStrength::AliasPartial,
        MatchStrength::CategoryPartial,
        MatchStrength::Neutral,
    ];

    for pair in ordered.windows(2) {
        assert!(
            confidence.for_strength(pair[0]) > confidence.for_strength(pair[1]),
            "{} should be more confident than {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_graceful_miss_on_both_catalogs() {
    let config = SearchConfig::default();
    let meds = medications();
    let tests = lab_tests();

    let engine = MedicationSearch::new(&meds, &config);
    assert!(engine.suggest(&SearchContext::new("zzznonexistentdrugzzz")).is_empty());
    assert!(engine.complete("zzznonexistentdrugzzz", None).is_empty());

    let engine = rx_search_core::search::TestSearch::new(&tests, &config);
    assert!(engine.suggest(&SearchContext::new("zzznonexistentdrugzzz")).is_empty());
    assert!(engine.complete("zzznonexistentdrugzzz", None).is_empty());
}
