//! In-memory prefix table.
//!
//! Multiple-reader / single-writer map from a digit prefix to its ordered
//! code list. Lists are stored as shared immutable slices, so a reader holds
//! either the list from before a write or the one after it, never a mix.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Ordered code list for one prefix. The first element is authoritative.
pub type Codes = Arc<[String]>;

/// Concurrency-safe prefix to code-list mapping.
#[derive(Debug, Default)]
pub struct PrefixStore {
    entries: RwLock<HashMap<String, Codes>>,
}

impl PrefixStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or fully replaces the code list for `prefix`.
    pub fn set(&self, prefix: impl Into<String>, codes: impl Into<Codes>) {
        let codes = codes.into();
        self.entries.write().insert(prefix.into(), codes);
    }

    /// Returns the code list for `prefix`, or `None` if it was never set.
    pub fn get(&self, prefix: &str) -> Option<Codes> {
        self.entries.read().get(prefix).cloned()
    }

    /// Applies every entry through [`set`](Self::set), in order.
    pub fn extend<I, P, C>(&self, entries: I)
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<Codes>,
    {
        for (prefix, codes) in entries {
            self.set(prefix, codes);
        }
    }

    /// Number of registered prefixes.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if no prefix has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
