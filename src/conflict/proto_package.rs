use super::{
    ConflictContext, ConflictResolution, ConflictResolver, GRPC_LIBRARY_SUFFIX, PROTO_LIBRARY_SUFFIX,
    sibling_names,
};
use crate::imports::{Import, ImportMap};
use crate::symbol::{SymbolRef, SymbolType};

/// Suffixes of the classes generated for a gRPC service.
pub const GRPC_STUB_SUFFIXES: [&str; 7] = [
    "Grpc",
    "Client",
    "Handler",
    "Server",
    "PowerApi",
    "PowerApiHandler",
    "ClientPowerApi",
];

/// Settles a proto package provided by both its `_proto_scala_library`
/// and its `_grpc_scala_library`: the grpc rule wins only when the rule
/// also uses a generated service stub from that package.
#[derive(Default)]
pub struct ScalaProtoPackageConflictResolver;

fn is_stub_of(package: &str, name: &str) -> bool {
    name.strip_prefix(package)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|_| GRPC_STUB_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)))
}

impl ConflictResolver for ScalaProtoPackageConflictResolver {
    fn name(&self) -> &str {
        "scala_proto_package"
    }

    fn resolve_conflict(
        &self,
        _ctx: &ConflictContext<'_>,
        imports: &mut ImportMap,
        import: &Import,
        symbol: &SymbolRef,
    ) -> ConflictResolution {
        let conflicts = symbol.conflicts();
        let [other] = conflicts.as_slice() else {
            return ConflictResolution::Unrecognized;
        };
        if symbol.symbol_type != SymbolType::ProtoPackage
            || other.symbol_type != SymbolType::ProtoPackage
            || symbol.name != other.name
        {
            return ConflictResolution::Unrecognized;
        }

        let (proto, grpc) = if symbol.label.name().ends_with(PROTO_LIBRARY_SUFFIX) {
            (symbol, other)
        } else {
            (other, symbol)
        };
        if !proto.label.name().ends_with(PROTO_LIBRARY_SUFFIX) || !grpc.label.name().ends_with(GRPC_LIBRARY_SUFFIX) {
            return ConflictResolution::Unrecognized;
        }

        let uses_grpc = sibling_names(imports, import).any(|name| is_stub_of(&symbol.name, name));
        ConflictResolution::Winner(if uses_grpc { grpc.clone() } else { proto.clone() })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use super::*;
    use crate::conflict::testing::{Fixture, conflicted, symbol, winner};
    use crate::parser::File;
    use crate::resolver::ResolveError;

    const PROTO: &str = "//proto/api:api_proto_scala_library";
    const GRPC: &str = "//proto/api:api_grpc_scala_library";

    #[rstest]
    #[case("proto.api.UserServiceGrpc", true)]
    #[case("proto.api.UserServiceClient", true)]
    #[case("proto.api.UserServicePowerApiHandler", true)]
    #[case("proto.api.User", false)]
    #[case("proto.other.UserServiceGrpc", false)]
    fn test_stub_detection(#[case] name: &str, #[case] stub: bool) {
        assert_eq!(is_stub_of("proto.api", name), stub);
    }

    fn resolve(sibling: Option<&str>) -> Option<String> {
        let fixture = Fixture::new();
        let file = Arc::new(File::default());
        let mut imports = ImportMap::new();
        let import = Import::direct("proto.api._", file.clone());
        imports.put(import.clone());
        if let Some(name) = sibling {
            let mut other = Import::direct(name, file);
            other.set_symbol(symbol(SymbolType::ProtoService, name, GRPC));
            imports.put(other);
        }
        let package = conflicted(SymbolType::ProtoPackage, "proto.api", &[GRPC, PROTO]);
        winner(ScalaProtoPackageConflictResolver.resolve_conflict(&fixture.ctx(), &mut imports, &import, &package))
    }

    #[test]
    fn test_grpc_only_when_stub_used() {
        assert_eq!(resolve(None).as_deref(), Some(PROTO));
        assert_eq!(resolve(Some("proto.api.UserServiceGrpc")).as_deref(), Some(GRPC));
    }

    #[rstest]
    #[case("proto.api.FooGrpc")]
    #[case("proto.api.FooClient")]
    fn test_unresolved_stub_sibling_keeps_proto(#[case] name: &str) {
        let fixture = Fixture::new();
        let file = Arc::new(File::default());
        let mut imports = ImportMap::new();
        let import = Import::direct("proto.api._", file.clone());
        imports.put(import.clone());
        let mut other = Import::direct(name, file);
        other.set_error(ResolveError::NotFound(name.to_string()));
        imports.put(other);

        let package = conflicted(SymbolType::ProtoPackage, "proto.api", &[GRPC, PROTO]);
        let resolution = ScalaProtoPackageConflictResolver.resolve_conflict(&fixture.ctx(), &mut imports, &import, &package);
        assert_eq!(winner(resolution).as_deref(), Some(PROTO));
    }

    #[test]
    fn test_other_shapes_unrecognized() {
        let fixture = Fixture::new();
        let import = Import::direct("a._", Arc::new(File::default()));
        let three = conflicted(SymbolType::ProtoPackage, "a", &[PROTO, GRPC, "//x:x"]);
        let resolution = ScalaProtoPackageConflictResolver.resolve_conflict(&fixture.ctx(), &mut ImportMap::new(), &import, &three);
        assert!(matches!(resolution, ConflictResolution::Unrecognized));

        let plain = conflicted(SymbolType::Package, "a", &[PROTO, GRPC]);
        let resolution = ScalaProtoPackageConflictResolver.resolve_conflict(&fixture.ctx(), &mut ImportMap::new(), &import, &plain);
        assert!(matches!(resolution, ConflictResolution::Unrecognized));
    }
}
