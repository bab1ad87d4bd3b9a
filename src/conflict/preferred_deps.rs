use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{ConflictContext, ConflictResolution, ConflictResolver, candidates};
use crate::base::Label;
use crate::imports::{Import, ImportMap};
use crate::symbol::SymbolRef;

/// Name → preferred label, shared with the provider that loads it.
pub type PreferredDeps = Arc<RwLock<FxHashMap<String, Label>>>;

/// Picks the candidate the user prefers: first the directory's
/// `resolve_with` entries for the rule's kind, then the global map.
pub struct PreferredDepsConflictResolver {
    preferred: PreferredDeps,
}

impl PreferredDepsConflictResolver {
    /// Consult `preferred` after the per-kind directives.
    pub fn new(preferred: PreferredDeps) -> Self {
        Self { preferred }
    }
}

impl ConflictResolver for PreferredDepsConflictResolver {
    fn name(&self) -> &str {
        "preferred_deps"
    }

    fn resolve_conflict(
        &self,
        ctx: &ConflictContext<'_>,
        _imports: &mut ImportMap,
        _import: &Import,
        symbol: &SymbolRef,
    ) -> ConflictResolution {
        let candidates = candidates(symbol);
        let pick = |want: &Label| candidates.iter().find(|c| &c.label == want).cloned();

        if let Some(wanted) = ctx.config.preferred_deps(ctx.rule.kind(), &symbol.name) {
            if let Some(found) = wanted.iter().find_map(pick) {
                return ConflictResolution::Winner(found);
            }
        }
        let global = self.preferred.read().get(symbol.name.as_ref()).cloned();
        match global.as_ref().and_then(pick) {
            Some(found) => ConflictResolution::Winner(found),
            None => ConflictResolution::Unrecognized,
        }
    }
}
