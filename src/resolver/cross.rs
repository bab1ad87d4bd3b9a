use super::{ResolveError, SymbolResolver};
use crate::base::Label;
use crate::host::{Config, ImportSpec, RuleIndex};
use crate::symbol::{Symbol, SymbolRef, SymbolType};

/// Provider tag of symbols produced from the host rule index.
pub const CROSS_RESOLVE_PROVIDER: &str = "cross";

/// Delegates to the host's cross-rule import index.
///
/// The first matching rule is canonical; any further matches become its
/// conflicts.
pub struct CrossSymbolResolver {
    lang: String,
}

impl CrossSymbolResolver {
    /// Query the index on behalf of rules of language `lang`.
    pub fn new(lang: impl Into<String>) -> Self {
        Self { lang: lang.into() }
    }
}

impl SymbolResolver for CrossSymbolResolver {
    fn resolve_symbol(
        &self,
        c: &Config,
        ix: &RuleIndex,
        _from: &Label,
        lang: &str,
        name: &str,
    ) -> Result<SymbolRef, ResolveError> {
        let spec = ImportSpec::new(lang, name);
        let mut results = ix.find_rules_by_import_with_config(c, &spec, &self.lang).into_iter();
        let Some(first) = results.next() else {
            return Err(ResolveError::NotFound(name.to_string()));
        };
        let symbol = Symbol::shared(SymbolType::CrossResolve, name, CROSS_RESOLVE_PROVIDER, first.label);
        for other in results {
            symbol.add_conflict(Symbol::shared(
                SymbolType::CrossResolve,
                name,
                CROSS_RESOLVE_PROVIDER,
                other.label,
            ));
        }
        Ok(symbol)
    }
}
