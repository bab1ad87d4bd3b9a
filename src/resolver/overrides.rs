use super::{ResolveError, SymbolResolver};
use crate::base::Label;
use crate::config::ScalaConfig;
use crate::host::{Config, ImportSpec, RuleIndex};
use crate::symbol::{Symbol, SymbolRef, SymbolType};

/// Provider tag of symbols produced by overrides.
pub const OVERRIDE_PROVIDER: &str = "override";

/// Answers from user directives: `override LANG glob PATTERN LABEL` in the
/// Scala config of the requesting directory, then the host's `resolve`
/// directives.
#[derive(Default)]
pub struct OverrideSymbolResolver;

impl OverrideSymbolResolver {
    /// Create the resolver.
    pub fn new() -> Self {
        Self
    }
}

impl SymbolResolver for OverrideSymbolResolver {
    fn resolve_symbol(
        &self,
        c: &Config,
        _ix: &RuleIndex,
        _from: &Label,
        lang: &str,
        name: &str,
    ) -> Result<SymbolRef, ResolveError> {
        let glob = ScalaConfig::get(c).and_then(|sc| sc.resolve_override(lang, name).cloned());
        let label = glob.or_else(|| {
            c.find_resolve_override(&ImportSpec::new(lang, name), lang)
                .cloned()
        });
        match label {
            Some(label) => Ok(Symbol::shared(SymbolType::Override, name, OVERRIDE_PROVIDER, label)),
            None => Err(ResolveError::NotFound(name.to_string())),
        }
    }
}
