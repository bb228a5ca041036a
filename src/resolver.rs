//! Longest-prefix resolution.
//!
//! A number is matched against the prefix table from its full length down to
//! its first character; the longest registered prefix wins and the first code
//! of its list is the answer.

use std::sync::Arc;
use tracing::debug;

use crate::error::LookupError;
use crate::store::PrefixStore;

/// Answers "which code belongs to this number".
///
/// The gRPC layer is generic over this trait so tests can plug in a fake.
pub trait Resolve: Send + Sync + 'static {
    /// Resolves `number` to a single code.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NotFound`] when no registered prefix matches.
    fn resolve(&self, number: &str) -> Result<String, LookupError>;
}

impl<R: Resolve + ?Sized> Resolve for Arc<R> {
    fn resolve(&self, number: &str) -> Result<String, LookupError> {
        (**self).resolve(number)
    }
}

/// Longest-prefix resolver over a shared [`PrefixStore`].
#[derive(Debug, Clone)]
pub struct PrefixResolver {
    store: Arc<PrefixStore>,
}

impl PrefixResolver {
    /// Creates a resolver reading from `store`.
    pub fn new(store: Arc<PrefixStore>) -> Self {
        Self { store }
    }

    /// The underlying table.
    pub fn store(&self) -> &Arc<PrefixStore> {
        &self.store
    }
}

impl Resolve for PrefixResolver {
    fn resolve(&self, number: &str) -> Result<String, LookupError> {
        // Longest candidate first; cut only on char boundaries.
        let candidates = number
            .char_indices()
            .map(|(idx, ch)| &number[..idx + ch.len_utf8()])
            .rev();

        for candidate in candidates {
            let Some(codes) = self.store.get(candidate) else {
                continue;
            };
            match codes.first() {
                Some(code) if !code.is_empty() => {
                    debug!(prefix = %candidate, code = %code, "Prefix matched");
                    return Ok(code.clone());
                }
                _ => continue,
            }
        }

        Err(LookupError::NotFound {
            number: number.to_string(),
        })
    }
}
