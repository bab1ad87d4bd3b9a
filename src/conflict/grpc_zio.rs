use super::{
    ConflictContext, ConflictResolution, ConflictResolver, GRPC_LIBRARY_SUFFIX, GRPC_ZIO_LIBRARY_SUFFIX, candidates,
    sibling_names,
};
use crate::imports::{Import, ImportMap};
use crate::symbol::SymbolRef;

/// Settles a name provided by both a `_grpc_scala_library` and a
/// `_grpc_zio_scala_library`: the zio rule wins when the rule uses any
/// `Zio*` generated name.
#[derive(Default)]
pub struct ScalaGrpcZioConflictResolver;

fn is_zio_name(name: &str) -> bool {
    name.rsplit('.').next().is_some_and(|last| last.starts_with("Zio"))
}

impl ConflictResolver for ScalaGrpcZioConflictResolver {
    fn name(&self) -> &str {
        "scala_grpc_zio"
    }

    fn resolve_conflict(
        &self,
        _ctx: &ConflictContext<'_>,
        imports: &mut ImportMap,
        import: &Import,
        symbol: &SymbolRef,
    ) -> ConflictResolution {
        let candidates = candidates(symbol);
        let grpc = candidates.iter().find(|c| c.label.name().ends_with(GRPC_LIBRARY_SUFFIX));
        let zio = candidates.iter().find(|c| c.label.name().ends_with(GRPC_ZIO_LIBRARY_SUFFIX));
        let (Some(grpc), Some(zio)) = (grpc, zio) else {
            return ConflictResolution::Unrecognized;
        };
        if grpc.name != zio.name {
            return ConflictResolution::Unrecognized;
        }

        let uses_zio = sibling_names(imports, import).any(is_zio_name);
        ConflictResolution::Winner(if uses_zio { zio.clone() } else { grpc.clone() })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::conflict::testing::{Fixture, conflicted, symbol, winner};
    use crate::resolver::ResolveError;
    use crate::parser::File;
    use crate::symbol::SymbolType;

    const GRPC: &str = "//proto/api:api_grpc_scala_library";
    const ZIO: &str = "//proto/api:api_grpc_zio_scala_library";

    #[test]
    fn test_zio_selected_by_sibling_usage() {
        let fixture = Fixture::new();
        let file = Arc::new(File::default());
        let package = conflicted(SymbolType::ProtoPackage, "proto.api", &[GRPC, ZIO]);
        let import = Import::direct("proto.api._", file.clone());

        let mut imports = ImportMap::new();
        imports.put(import.clone());
        let resolution = ScalaGrpcZioConflictResolver.resolve_conflict(&fixture.ctx(), &mut imports, &import, &package);
        assert_eq!(winner(resolution).as_deref(), Some(GRPC));

        let mut zio_import = Import::direct("proto.api.ZioApi", file);
        zio_import.set_symbol(symbol(SymbolType::ProtoService, "proto.api.ZioApi", ZIO));
        imports.put(zio_import);
        let resolution = ScalaGrpcZioConflictResolver.resolve_conflict(&fixture.ctx(), &mut imports, &import, &package);
        assert_eq!(winner(resolution).as_deref(), Some(ZIO));
    }

    #[test]
    fn test_unresolved_and_own_names_are_not_evidence() {
        let fixture = Fixture::new();
        let file = Arc::new(File::default());
        let package = conflicted(SymbolType::ProtoPackage, "proto.api.ZioApi", &[GRPC, ZIO]);
        let import = Import::direct("proto.api.ZioApi", file.clone());

        let mut imports = ImportMap::new();
        imports.put(import.clone());
        let mut failed = Import::direct("proto.api.ZioOther", file);
        failed.set_error(ResolveError::NotFound("proto.api.ZioOther".to_string()));
        imports.put(failed);

        let resolution = ScalaGrpcZioConflictResolver.resolve_conflict(&fixture.ctx(), &mut imports, &import, &package);
        assert_eq!(winner(resolution).as_deref(), Some(GRPC));
    }

    #[test]
    fn test_requires_both_flavors() {
        let fixture = Fixture::new();
        let import = Import::direct("a.A", Arc::new(File::default()));
        let symbol = conflicted(SymbolType::Class, "a.A", &["//a:a", GRPC]);
        let resolution = ScalaGrpcZioConflictResolver.resolve_conflict(&fixture.ctx(), &mut ImportMap::new(), &import, &symbol);
        assert!(matches!(resolution, ConflictResolution::Unrecognized));
    }
}
