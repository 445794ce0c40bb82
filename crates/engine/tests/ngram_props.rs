// Property-based tests for n-gram shingling and similarity.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use datagrid_engine::ngram::{normalize, ngram_set, shingles, similarity, NgramSet};
use proptest::prelude::*;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn text() -> impl Strategy<Value = String> {
    r"[A-Za-z0-9 \t]{0,24}"
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn shingle_count_matches_window_formula(s in text(), n in 1usize..6) {
        let len = normalize(&s).chars().count();
        let grams = shingles(&s, n);

        if len >= n {
            prop_assert_eq!(grams.len(), len - n + 1);
        } else {
            prop_assert!(grams.is_empty());
        }
        prop_assert!(grams.iter().all(|g| g.chars().count() == n));
    }

    #[test]
    fn normalized_form_is_padded_and_lowercase(s in text()) {
        let norm = normalize(&s);
        prop_assert!(norm.starts_with('*'));
        prop_assert!(norm.ends_with('*'));
        prop_assert!(!norm.chars().any(|c| c.is_whitespace() || c.is_uppercase()));
    }

    #[test]
    fn similarity_is_symmetric(a in text(), b in text(), n in 1usize..5) {
        let (sa, sb) = (ngram_set(&a, n), ngram_set(&b, n));
        prop_assert_eq!(similarity(&sa, &sb), similarity(&sb, &sa));
    }

    #[test]
    fn similarity_is_bounded(a in text(), b in text()) {
        let score = similarity(&ngram_set(&a, 3), &ngram_set(&b, 3));
        prop_assert!((0.0..=1.0).contains(&score));
        prop_assert!(!score.is_nan());
    }

    #[test]
    fn self_similarity_is_one(a in text()) {
        let set = ngram_set(&a, 3);
        if set.is_empty() {
            prop_assert_eq!(similarity(&set, &set), 0.0);
        } else {
            prop_assert_eq!(similarity(&set, &set), 1.0);
        }
    }

    #[test]
    fn empty_set_scores_zero(a in text()) {
        let empty = NgramSet::default();
        prop_assert_eq!(similarity(&ngram_set(&a, 3), &empty), 0.0);
    }
}
