//! Property-based tests for the prefix table.

use std::sync::atomic::{AtomicBool, Ordering};

use mccmnc_lookup::PrefixStore;
use proptest::prelude::*;

use super::generators::{arb_codes, arb_prefix};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Repeating the same `set` leaves the store as one `set` would.
    #[test]
    fn prop_set_is_idempotent(prefix in arb_prefix(), codes in arb_codes()) {
        let once = PrefixStore::new();
        once.set(prefix.clone(), codes.clone());

        let twice = PrefixStore::new();
        twice.set(prefix.clone(), codes.clone());
        twice.set(prefix.clone(), codes.clone());

        prop_assert_eq!(once.len(), twice.len());
        prop_assert_eq!(once.get(&prefix), twice.get(&prefix));
    }

    /// A later `set` fully replaces the earlier list.
    #[test]
    fn prop_later_set_replaces(prefix in arb_prefix(), first in arb_codes(), second in arb_codes()) {
        let store = PrefixStore::new();
        store.set(prefix.clone(), first);
        store.set(prefix.clone(), second.clone());

        prop_assert_eq!(&*store.get(&prefix).unwrap(), &second[..]);
        prop_assert_eq!(store.len(), 1);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Readers racing a writer see the whole old list or the whole new one.
    #[test]
    fn prop_concurrent_readers_never_see_torn_lists(len in 1usize..64, readers in 2usize..6) {
        let store = PrefixStore::new();
        let old = vec!["old".to_string(); len];
        let new = vec!["new".to_string(); len];
        store.set("7", old.clone());
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..readers)
                .map(|_| {
                    scope.spawn(|| {
                        let mut observed = 0;
                        while !done.load(Ordering::Acquire) {
                            let codes = store.get("7").unwrap();
                            assert!(codes[..] == old[..] || codes[..] == new[..]);
                            observed += 1;
                        }
                        observed
                    })
                })
                .collect();

            for i in 0..200 {
                store.set("7", if i % 2 == 0 { new.clone() } else { old.clone() });
            }
            done.store(true, Ordering::Release);

            for handle in handles {
                handle.join().unwrap();
            }
        });
    }
}
