use super::{ConflictContext, ConflictResolution, ConflictResolver, candidates};
use crate::imports::{Import, ImportMap};
use crate::symbol::SymbolRef;

/// A built-in (no-label) candidate always wins.
#[derive(Default)]
pub struct PredefinedLabelConflictResolver;

impl ConflictResolver for PredefinedLabelConflictResolver {
    fn name(&self) -> &str {
        "predefined_label"
    }

    fn resolve_conflict(
        &self,
        _ctx: &ConflictContext<'_>,
        _imports: &mut ImportMap,
        _import: &Import,
        symbol: &SymbolRef,
    ) -> ConflictResolution {
        match candidates(symbol).into_iter().find(|c| c.label.is_empty()) {
            Some(builtin) => ConflictResolution::Winner(builtin),
            None => ConflictResolution::Unrecognized,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::conflict::testing::{Fixture, conflicted, symbol, winner};
    use crate::parser::File;
    use crate::symbol::SymbolType;

    #[test]
    fn test_builtin_candidate_wins() {
        let fixture = Fixture::new();
        let mut imports = ImportMap::new();
        let import = Import::direct("scala.Option", Arc::new(File::default()));

        // Conflicts never hold built-ins, so a built-in can only be canonical.
        let builtin = symbol(SymbolType::Class, "scala.Option", "");
        let resolution = PredefinedLabelConflictResolver.resolve_conflict(&fixture.ctx(), &mut imports, &import, &builtin);
        assert!(matches!(resolution, ConflictResolution::Winner(ref s) if s.label.is_empty()));

        let labeled = conflicted(SymbolType::Class, "a.A", &["//a:a", "//b:b"]);
        let resolution = PredefinedLabelConflictResolver.resolve_conflict(&fixture.ctx(), &mut imports, &import, &labeled);
        assert_eq!(winner(resolution), None);
    }
}
