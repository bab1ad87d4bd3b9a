use super::{ResolveError, SymbolResolver};
use crate::base::Label;
use crate::host::{Config, RuleIndex};
use crate::scope::ROOT_PREFIX;
use crate::symbol::SymbolRef;

/// Request-time normalization: strips a leading `_root_.` and a trailing
/// wildcard marker (`._`).
pub fn normalize_import(name: &str) -> &str {
    let name = name.strip_prefix(ROOT_PREFIX).unwrap_or(name);
    name.strip_suffix("._").unwrap_or(name)
}

/// Normalizes the requested name before delegating.
pub struct NormalizingSymbolResolver<R> {
    next: R,
}

impl<R: SymbolResolver> NormalizingSymbolResolver<R> {
    /// Wrap `next`.
    pub fn new(next: R) -> Self {
        Self { next }
    }
}

impl<R: SymbolResolver> SymbolResolver for NormalizingSymbolResolver<R> {
    fn resolve_symbol(
        &self,
        c: &Config,
        ix: &RuleIndex,
        from: &Label,
        lang: &str,
        name: &str,
    ) -> Result<SymbolRef, ResolveError> {
        let normalized = normalize_import(name);
        if normalized.is_empty() {
            return Err(ResolveError::NotFound(name.to_string()));
        }
        self.next.resolve_symbol(c, ix, from, lang, normalized)
    }
}
