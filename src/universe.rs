//! The universe: every scope, known rule and pluggable strategy of a run.
//!
//! Resolvers and conflict strategies see the run through this facade. The
//! registries are additive: names are registered once at start-up and
//! selected afterwards by flags and directives.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::base::{Label, Registry};
use crate::cleaner::DepsCleaner;
use crate::conflict::ConflictResolver;
use crate::error::Result;
use crate::provider::SymbolProvider;
use crate::scope::{LanguageScope, Scope, TrieScope};
use crate::symbol::SymbolRef;

/// A rule the run knows about, with the kind it was declared as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnownRule {
    pub label: Label,
    pub kind: String,
}

/// Shared state of a run.
pub struct Universe {
    scope: Arc<TrieScope>,
    providers: RwLock<Registry<dyn SymbolProvider>>,
    enabled_providers: RwLock<Vec<Arc<dyn SymbolProvider>>>,
    conflict_resolvers: RwLock<Registry<dyn ConflictResolver>>,
    deps_cleaners: RwLock<Registry<dyn DepsCleaner>>,
    known_rules: RwLock<IndexMap<Label, KnownRule>>,
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}

impl Universe {
    /// An empty universe.
    pub fn new() -> Self {
        Self {
            scope: Arc::new(TrieScope::new()),
            providers: RwLock::new(Registry::new("symbol provider")),
            enabled_providers: RwLock::new(Vec::new()),
            conflict_resolvers: RwLock::new(Registry::new("conflict resolver")),
            deps_cleaners: RwLock::new(Registry::new("deps cleaner")),
            known_rules: RwLock::new(IndexMap::new()),
        }
    }

    // ========================================================================
    // SCOPES
    // ========================================================================

    /// The global symbol table.
    pub fn scope(&self) -> Arc<TrieScope> {
        self.scope.clone()
    }

    /// The global table plus the language built-ins.
    pub fn language_scope(&self) -> Arc<dyn Scope> {
        Arc::new(LanguageScope::new(self.scope.clone()))
    }

    // ========================================================================
    // SYMBOL PROVIDERS
    // ========================================================================

    /// Register a provider under its own name.
    pub fn register_provider(&self, provider: Arc<dyn SymbolProvider>) -> Result<()> {
        let name = provider.name().to_string();
        self.providers.write().put(name, provider)
    }

    /// Every registered provider, in registration order.
    pub fn providers(&self) -> Vec<Arc<dyn SymbolProvider>> {
        self.providers.read().values().cloned().collect()
    }

    /// Select the active providers by name. Unknown names are fatal.
    pub fn enable_providers<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Arc<dyn SymbolProvider>>> {
        let enabled = self.providers.read().lookup_all(names)?;
        debug!(
            providers = ?enabled.iter().map(|p| p.name()).collect::<Vec<_>>(),
            "enabled symbol providers"
        );
        *self.enabled_providers.write() = enabled.clone();
        Ok(enabled)
    }

    /// The active providers.
    pub fn enabled_providers(&self) -> Vec<Arc<dyn SymbolProvider>> {
        self.enabled_providers.read().clone()
    }

    /// Whether some active provider manages the namespace of `label`.
    pub fn can_provide(&self, label: &Label) -> bool {
        let known_rule = |l: &Label| self.known_rule(l);
        self.enabled_providers
            .read()
            .iter()
            .any(|p| p.can_provide(label, &known_rule))
    }

    // ========================================================================
    // CONFLICT RESOLVERS & DEPS CLEANERS
    // ========================================================================

    /// Register a conflict resolver under its own name.
    pub fn register_conflict_resolver(&self, resolver: Arc<dyn ConflictResolver>) -> Result<()> {
        let name = resolver.name().to_string();
        self.conflict_resolvers.write().put(name, resolver)
    }

    /// Look up a conflict resolver by name.
    pub fn conflict_resolver(&self, name: &str) -> Result<Arc<dyn ConflictResolver>> {
        self.conflict_resolvers.read().lookup(name)
    }

    /// Every registered conflict resolver.
    pub fn conflict_resolvers(&self) -> Vec<Arc<dyn ConflictResolver>> {
        self.conflict_resolvers.read().values().cloned().collect()
    }

    /// Register a deps cleaner under its own name.
    pub fn register_deps_cleaner(&self, cleaner: Arc<dyn DepsCleaner>) -> Result<()> {
        let name = cleaner.name().to_string();
        self.deps_cleaners.write().put(name, cleaner)
    }

    /// Look up a deps cleaner by name.
    pub fn deps_cleaner(&self, name: &str) -> Result<Arc<dyn DepsCleaner>> {
        self.deps_cleaners.read().lookup(name)
    }

    // ========================================================================
    // KNOWN RULES
    // ========================================================================

    /// Record a rule seen during generation. The first kind recorded stays.
    pub fn put_known_rule(&self, label: Label, kind: impl Into<String>) {
        let mut rules = self.known_rules.write();
        if !rules.contains_key(&label) {
            let kind = kind.into();
            rules.insert(label.clone(), KnownRule { label, kind });
        }
    }

    /// Look up a known rule.
    pub fn known_rule(&self, label: &Label) -> Option<KnownRule> {
        self.known_rules.read().get(label).cloned()
    }

    /// Number of known rules.
    pub fn known_rule_count(&self) -> usize {
        self.known_rules.read().len()
    }
}

impl Scope for Universe {
    fn put_symbol(&self, symbol: SymbolRef) -> Result<()> {
        self.scope.put_symbol(symbol)
    }

    fn get_symbol(&self, name: &str) -> Option<SymbolRef> {
        self.scope.get_symbol(name)
    }

    fn get_scope(&self, name: &str) -> Option<Arc<dyn Scope>> {
        self.scope.get_scope(name)
    }

    fn get_symbols(&self, prefix: &str) -> Vec<SymbolRef> {
        self.scope.get_symbols(prefix)
    }

    fn node_id(&self) -> Option<usize> {
        self.scope.node_id()
    }
}
