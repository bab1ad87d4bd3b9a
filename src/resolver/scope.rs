use std::sync::Arc;

use super::{ResolveError, SymbolResolver};
use crate::base::Label;
use crate::host::{Config, RuleIndex};
use crate::scope::Scope;
use crate::symbol::SymbolRef;

/// Longest-prefix lookup in a scope.
pub struct ScopeSymbolResolver {
    scope: Arc<dyn Scope>,
}

impl ScopeSymbolResolver {
    /// Resolve against `scope`.
    pub fn new(scope: Arc<dyn Scope>) -> Self {
        Self { scope }
    }
}

impl SymbolResolver for ScopeSymbolResolver {
    fn resolve_symbol(
        &self,
        _c: &Config,
        _ix: &RuleIndex,
        _from: &Label,
        _lang: &str,
        name: &str,
    ) -> Result<SymbolRef, ResolveError> {
        self.scope
            .get_symbol(name)
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))
    }
}
