use tracing::debug;

use super::{ConflictContext, ConflictResolution, ConflictResolver};
use crate::imports::{Import, ImportMap};
use crate::resolver::normalize_import;
use crate::scope::Scope;
use crate::symbol::{SymbolRef, SymbolType};

/// Replaces a wildcard import of a proto package by one RESOLVED_NAME
/// import per name the file actually references from that package.
#[derive(Default)]
pub struct ProtoPackageWildcardImportConflictResolver;

impl ConflictResolver for ProtoPackageWildcardImportConflictResolver {
    fn name(&self) -> &str {
        "proto_package_wildcard_import"
    }

    fn resolve_conflict(
        &self,
        ctx: &ConflictContext<'_>,
        imports: &mut ImportMap,
        import: &Import,
        symbol: &SymbolRef,
    ) -> ConflictResolution {
        if symbol.symbol_type != SymbolType::ProtoPackage || !import.name.ends_with("._") {
            return ConflictResolution::Unrecognized;
        }
        let Some(file) = &import.source else {
            return ConflictResolution::Unrecognized;
        };
        if file.names.is_empty() {
            return ConflictResolution::Unrecognized;
        }

        let prefix = normalize_import(&import.name);
        let mut expanded_count = 0;
        for name in &file.names {
            let fqn = format!("{prefix}.{name}");
            let Some(found) = ctx.universe.get_symbol(&fqn) else {
                continue;
            };
            if &*found.name != fqn || !found.symbol_type.is_proto_entity() {
                continue;
            }
            debug!(from = %ctx.from, wildcard = %import.name, name = %fqn, "expanded wildcard import");
            let mut expanded = Import::resolved_name(fqn, Some(file.clone()), import.name.clone());
            expanded.set_symbol(found);
            imports.put(expanded);
            expanded_count += 1;
        }
        if expanded_count == 0 {
            return ConflictResolution::Unrecognized;
        }
        ConflictResolution::Elide
    }
}
