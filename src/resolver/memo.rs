use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{ResolveError, SymbolResolver};
use crate::base::Label;
use crate::host::{Config, RuleIndex};
use crate::symbol::SymbolRef;

/// Remembers successful resolutions for the rest of the run.
///
/// Failures are not cached. The cache key is `(lang, name)`; layers below
/// must therefore not depend on the requesting rule.
pub struct MemoSymbolResolver<R> {
    next: R,
    cache: RwLock<FxHashMap<(String, String), SymbolRef>>,
}

impl<R: SymbolResolver> MemoSymbolResolver<R> {
    /// Wrap `next`.
    pub fn new(next: R) -> Self {
        Self {
            next,
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// Number of memoized names.
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Whether nothing has been memoized yet.
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

impl<R: SymbolResolver> SymbolResolver for MemoSymbolResolver<R> {
    fn resolve_symbol(
        &self,
        c: &Config,
        ix: &RuleIndex,
        from: &Label,
        lang: &str,
        name: &str,
    ) -> Result<SymbolRef, ResolveError> {
        let key = (lang.to_string(), name.to_string());
        if let Some(symbol) = self.cache.read().get(&key) {
            return Ok(symbol.clone());
        }
        let symbol = self.next.resolve_symbol(c, ix, from, lang, name)?;
        self.cache.write().insert(key, symbol.clone());
        Ok(symbol)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::symbol::{Symbol, SymbolType};

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl SymbolResolver for Counting {
        fn resolve_symbol(
            &self,
            _c: &Config,
            _ix: &RuleIndex,
            _from: &Label,
            _lang: &str,
            name: &str,
        ) -> Result<SymbolRef, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if name.starts_with("known") {
                Ok(Symbol::shared(SymbolType::Class, name, "test", Label::parse("//k:k").unwrap()))
            } else {
                Err(ResolveError::NotFound(name.to_string()))
            }
        }
    }

    #[test]
    fn test_successes_are_memoized() {
        let memo = MemoSymbolResolver::new(Counting::default());
        let c = Config::default();
        let ix = RuleIndex::new();
        let from = Label::no_label();

        let a = memo.resolve_symbol(&c, &ix, &from, "scala", "known.A").unwrap();
        let b = memo.resolve_symbol(&c, &ix, &from, "scala", "known.A").unwrap();
        assert!(std::sync::Arc::ptr_eq(&a, &b));
        assert_eq!(memo.next.calls.load(Ordering::SeqCst), 1);

        assert!(memo.resolve_symbol(&c, &ix, &from, "scala", "missing.B").is_err());
        assert!(memo.resolve_symbol(&c, &ix, &from, "scala", "missing.B").is_err());
        assert_eq!(memo.next.calls.load(Ordering::SeqCst), 3);
        assert_eq!(memo.len(), 1);
    }
}
