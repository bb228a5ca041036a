//! Proptest Generators
//!
//! Shared generators for property-based tests. Digits are drawn from a small
//! alphabet so generated prefixes and numbers overlap often.

use std::collections::HashMap;

use proptest::prelude::*;

/// Generates a short digit prefix
pub fn arb_prefix() -> impl Strategy<Value = String> {
    "[0-3]{1,4}"
}

/// Generates a number to look up
pub fn arb_number() -> impl Strategy<Value = String> {
    "[0-3]{0,8}"
}

/// Generates a five-digit MCC/MNC code
pub fn arb_code() -> impl Strategy<Value = String> {
    "[0-9]{5}"
}

/// Generates a non-empty code list
pub fn arb_codes() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_code(), 1..4)
}

/// Generates a prefix table, occasionally with empty lists
pub fn arb_table() -> impl Strategy<Value = HashMap<String, Vec<String>>> {
    prop::collection::hash_map(
        arb_prefix(),
        prop_oneof![
            8 => arb_codes(),
            1 => Just(Vec::new()),
        ],
        0..24,
    )
}
