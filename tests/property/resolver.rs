//! Property-based tests for longest-prefix resolution.

use std::collections::HashMap;
use std::sync::Arc;

use mccmnc_lookup::{PrefixResolver, PrefixStore, Resolve};
use proptest::prelude::*;

use super::generators::{arb_codes, arb_number, arb_table};

fn build(table: &HashMap<String, Vec<String>>) -> PrefixResolver {
    let store = Arc::new(PrefixStore::new());
    store.extend(table.iter().map(|(p, c)| (p.clone(), c.clone())));
    PrefixResolver::new(store)
}

/// Reference model: scan every prefix length, keep the longest usable one.
fn model(table: &HashMap<String, Vec<String>>, number: &str) -> Option<String> {
    (1..=number.len())
        .rev()
        .filter_map(|len| table.get(&number[..len]))
        .find_map(|codes| codes.first().filter(|c| !c.is_empty()).cloned())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Resolution agrees with the brute-force model.
    #[test]
    fn prop_matches_reference_model(table in arb_table(), number in arb_number()) {
        let resolver = build(&table);
        match (resolver.resolve(&number), model(&table, &number)) {
            (Ok(code), Some(expected)) => prop_assert_eq!(code, expected),
            (Err(err), None) => prop_assert!(err.is_not_found()),
            (got, expected) => prop_assert!(false, "got {:?}, expected {:?}", got, expected),
        }
    }

    /// A prefix equal to the whole number beats every shorter prefix.
    #[test]
    fn prop_exact_prefix_wins(
        table in arb_table(),
        number in "[0-3]{1,8}",
        codes in arb_codes(),
    ) {
        let resolver = build(&table);
        resolver.store().set(number.clone(), codes.clone());
        prop_assert_eq!(resolver.resolve(&number).unwrap(), codes[0].clone());
    }

    /// Extending a number never changes the answer when its own prefix is
    /// registered.
    #[test]
    fn prop_suffix_does_not_change_match(
        number in "[0-3]{1,6}",
        suffix in "[4-9]{0,6}",
        codes in arb_codes(),
    ) {
        let store = Arc::new(PrefixStore::new());
        store.set(number.clone(), codes.clone());
        let resolver = PrefixResolver::new(store);
        prop_assert_eq!(
            resolver.resolve(&format!("{number}{suffix}")).unwrap(),
            codes[0].clone()
        );
    }

    /// Numbers sharing no leading digit with any prefix are not found.
    #[test]
    fn prop_unrelated_number_is_not_found(table in arb_table(), number in "[4-9][0-9]{0,8}") {
        let err = build(&table).resolve(&number).unwrap_err();
        prop_assert!(err.is_not_found());
    }
}
