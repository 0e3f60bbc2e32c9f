//! String interning for local, field, origin and type names

use lasso::ThreadedRodeo;
pub use lasso::Spur as Symbol;
use std::fmt;
use std::sync::Arc;

/// Thread-safe string interner shared between a body and its builder.
///
/// Cloning is cheap; all clones resolve the same symbols.
#[derive(Clone)]
pub struct Interner {
    inner: Arc<ThreadedRodeo>,
}

impl Interner {
    /// Creates an empty interner.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ThreadedRodeo::new()),
        }
    }

    /// Interns `s`, returning the existing symbol if it was seen before.
    pub fn intern(&self, s: &str) -> Symbol {
        self.inner.get_or_intern(s)
    }

    /// Looks up a string without interning it.
    #[must_use]
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.inner.get(s)
    }

    /// Resolves a symbol produced by this interner.
    ///
    /// Symbols from a foreign interner resolve to `"<unknown>"` rather than
    /// panicking, since they only ever reach diagnostics.
    #[must_use]
    pub fn resolve(&self, sym: &Symbol) -> &str {
        self.inner.try_resolve(sym).unwrap_or("<unknown>")
    }

    /// Resolves a symbol, returning `None` if it is not known.
    #[must_use]
    pub fn try_resolve(&self, sym: &Symbol) -> Option<&str> {
        self.inner.try_resolve(sym)
    }

    /// Number of distinct strings interned so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if nothing has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interner").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_idempotent() {
        let interner = Interner::new();
        let a = interner.intern("x");
        let b = interner.intern("x");
        assert_eq!(a, b);
        assert_eq!(interner.len(), 1);
        assert_eq!(interner.resolve(&a), "x");
    }

    #[test]
    fn test_clones_share_symbols() {
        let interner = Interner::new();
        let clone = interner.clone();
        let sym = clone.intern("field");
        assert_eq!(interner.get("field"), Some(sym));
    }
}
