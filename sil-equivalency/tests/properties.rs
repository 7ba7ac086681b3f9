//! Property tests for sil-equivalency

use proptest::prelude::*;
use sil_equivalency::prelude::*;
use sil_equivalency::Failure;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Item {
    name: String,
    count: i64,
    tags: Vec<String>,
}

fn item_strategy() -> impl Strategy<Value = Item> {
    (
        "[a-z]{1,8}",
        -1_000i64..1_000,
        prop::collection::vec("[a-z]{0,4}", 0..4),
    )
        .prop_map(|(name, count, tags)| Item { name, count, tags })
}

fn messages(failures: &[Failure]) -> Vec<String> {
    failures.iter().map(|f| f.message().to_string()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_value_is_equivalent_to_itself(items in prop::collection::vec(item_strategy(), 0..8)) {
        prop_assert!(check_equivalent(&items, &items).is_ok());
        prop_assert!(check_equivalent_with(&items, &items, |o| o.with_strict_ordering()).is_ok());
    }

    #[test]
    fn prop_loose_ordering_ignores_permutation(
        items in prop::collection::vec(item_strategy(), 1..8),
        rotation in 0usize..8,
    ) {
        let mut permuted = items.clone();
        let len = permuted.len();
        permuted.rotate_left(rotation % len);
        permuted.reverse();

        prop_assert!(check_equivalent(&permuted, &items).is_ok());
    }

    #[test]
    fn prop_strict_ordering_detects_reversal(values in prop::collection::vec(-100i64..100, 2..10)) {
        let mut reversed = values.clone();
        reversed.reverse();

        let result = check_equivalent_with(&reversed, &values, |o| o.with_strict_ordering());
        prop_assert_eq!(result.is_ok(), reversed == values);
    }

    #[test]
    fn prop_comparison_is_idempotent(
        subject in prop::collection::vec(item_strategy(), 0..6),
        expectation in prop::collection::vec(item_strategy(), 0..6),
    ) {
        let engine = EquivalencyEngine::default();
        let subject = Value::from_serialize(&subject);
        let expectation = Value::from_serialize(&expectation);

        let first = engine.compare(&subject, &expectation).map(|s| messages(s.failures()));
        let second = engine.compare(&subject, &expectation).map(|s| messages(s.failures()));
        prop_assert_eq!(first.ok(), second.ok());
    }

    #[test]
    fn prop_single_change_yields_single_failure(
        item in item_strategy(),
        delta in 1i64..50,
    ) {
        let mut changed = item.clone();
        changed.count += delta;

        let error = check_equivalent(&changed, &item).unwrap_err();
        prop_assert_eq!(error.failures().len(), 1);
        prop_assert_eq!(error.failures()[0].path().to_string(), "Count");
    }
}
