//! Property tests for the assertion ledger and sort checks

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use serde_json::{json, Value};
use storecheck::assertion::is_sorted;
use storecheck::{AssertionLedger, AssertionMode, CheckError, SortOrder};

fn records(values: &[i64]) -> Vec<Value> {
    values.iter().map(|v| json!({ "price": v })).collect()
}

proptest! {
    #[test]
    fn prop_soft_failures_are_reported_once(conditions in prop::collection::vec(any::<bool>(), 0..40)) {
        let ledger = AssertionLedger::new();
        for (index, passed) in conditions.iter().enumerate() {
            ledger.soft_assert(*passed, &format!("check {index}"));
        }
        let expected = conditions.iter().filter(|passed| !**passed).count();
        prop_assert_eq!(ledger.pending(), expected);
        prop_assert_eq!(ledger.assertion_count(), conditions.len());

        match ledger.verify_soft_assertions() {
            Ok(()) => prop_assert_eq!(expected, 0),
            Err(CheckError::SoftAssertions { failures }) => prop_assert_eq!(failures.len(), expected),
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
        prop_assert!(ledger.verify_soft_assertions().is_ok());
    }

    #[test]
    fn prop_hard_failure_never_buffers(passed in any::<bool>()) {
        let ledger = AssertionLedger::new();
        let result = ledger.check(AssertionMode::Hard, storecheck::AssertionOutcome::new(passed, "hard"));
        prop_assert_eq!(result.is_ok(), passed);
        prop_assert_eq!(ledger.pending(), 0);
    }

    #[test]
    fn prop_sorted_input_is_sorted(mut values in prop::collection::vec(-1_000i64..1_000, 0..30)) {
        values.sort_unstable();
        prop_assert!(is_sorted(&records(&values), "price", SortOrder::Asc).unwrap());
        values.reverse();
        prop_assert!(is_sorted(&records(&values), "price", SortOrder::Desc).unwrap());
    }

    #[test]
    fn prop_out_of_order_pair_is_detected(
        values in prop::collection::vec(-1_000i64..1_000, 2..30),
        at in any::<prop::sample::Index>(),
    ) {
        let mut values = values;
        values.sort_unstable();
        values.dedup();
        prop_assume!(values.len() >= 2);
        let i = at.index(values.len() - 1);
        values.swap(i, i + 1);
        prop_assert!(!is_sorted(&records(&values), "price", SortOrder::Asc).unwrap());
    }
}
