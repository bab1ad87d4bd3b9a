//! Conflict resolvers: strategies that pick a winner when several labels
//! claim the same name.
//!
//! Strategies run in the order configured for the directory; the first one
//! that recognizes the conflict decides. They see the rule's other imports,
//! so the outcome can depend on what else the rule uses.

use clap::{ArgMatches, Command};

use crate::base::Label;
use crate::config::ScalaConfig;
use crate::error::Result;
use crate::host::{Config, Rule};
use crate::imports::{Import, ImportMap};
use crate::symbol::SymbolRef;
use crate::universe::Universe;

mod grpc_zio;
mod predefined_label;
mod preferred_deps;
mod proto_package;
mod proto_wildcard;

pub use grpc_zio::ScalaGrpcZioConflictResolver;
pub use predefined_label::PredefinedLabelConflictResolver;
pub use preferred_deps::{PreferredDeps, PreferredDepsConflictResolver};
pub use proto_package::ScalaProtoPackageConflictResolver;
pub use proto_wildcard::ProtoPackageWildcardImportConflictResolver;

/// Label name suffix of generated proto message bindings.
pub const PROTO_LIBRARY_SUFFIX: &str = "_proto_scala_library";
/// Label name suffix of generated gRPC stubs.
pub const GRPC_LIBRARY_SUFFIX: &str = "_grpc_scala_library";
/// Label name suffix of generated ZIO gRPC stubs.
pub const GRPC_ZIO_LIBRARY_SUFFIX: &str = "_grpc_zio_scala_library";

/// Resolver names enabled when `--scala_conflict_resolver` is not given.
pub const DEFAULT_CONFLICT_RESOLVERS: [&str; 5] = [
    "predefined_label",
    "proto_package_wildcard_import",
    "scala_proto_package",
    "scala_grpc_zio",
    "preferred_deps",
];

/// Outcome of one strategy.
#[derive(Clone, Debug)]
pub enum ConflictResolution {
    /// Use this symbol instead.
    Winner(SymbolRef),
    /// The import was consumed; it contributes no dependency itself.
    Elide,
    /// Not this strategy's kind of conflict.
    Unrecognized,
}

/// What a strategy may look at besides the imports.
pub struct ConflictContext<'a> {
    pub universe: &'a Universe,
    pub config: &'a ScalaConfig,
    pub rule: &'a Rule,
    pub from: &'a Label,
}

/// A conflict resolution strategy.
pub trait ConflictResolver: Send + Sync {
    /// Registry name.
    fn name(&self) -> &str;

    /// Declare strategy flags.
    fn register_flags(&self, cmd: Command) -> Command {
        cmd
    }

    /// Read strategy flags.
    fn check_flags(&self, matches: &ArgMatches, c: &Config) -> Result<()> {
        let _ = (matches, c);
        Ok(())
    }

    /// Decide the conflict of `symbol`, resolved for `import`. Strategies
    /// may add imports to `imports`.
    fn resolve_conflict(
        &self,
        ctx: &ConflictContext<'_>,
        imports: &mut ImportMap,
        import: &Import,
        symbol: &SymbolRef,
    ) -> ConflictResolution;
}

/// The symbol and its conflicts, canonical first.
pub(crate) fn candidates(symbol: &SymbolRef) -> Vec<SymbolRef> {
    std::iter::once(symbol.clone()).chain(symbol.conflicts()).collect()
}

/// Names of the symbols the rule's other imports resolved to. Failed and
/// pending imports are not evidence.
pub(crate) fn sibling_names<'a>(imports: &'a ImportMap, import: &'a Import) -> impl Iterator<Item = &'a str> {
    imports
        .values()
        .filter(move |other| other.name != import.name)
        .filter_map(|other| other.symbol().map(|s| s.name.as_ref()))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use super::*;
    use crate::symbol::{Symbol, SymbolType};

    pub fn symbol(symbol_type: SymbolType, name: &str, label: &str) -> SymbolRef {
        let label = if label.is_empty() {
            Label::no_label()
        } else {
            Label::parse(label).unwrap()
        };
        Symbol::shared(symbol_type, name, "test", label)
    }

    pub fn conflicted(symbol_type: SymbolType, name: &str, labels: &[&str]) -> SymbolRef {
        let canonical = symbol(symbol_type, name, labels[0]);
        for label in &labels[1..] {
            canonical.add_conflict(symbol(symbol_type, name, label));
        }
        canonical
    }

    pub struct Fixture {
        pub universe: Arc<Universe>,
        pub config: ScalaConfig,
        pub rule: Rule,
        pub from: Label,
    }

    impl Fixture {
        pub fn new() -> Self {
            let universe = Arc::new(Universe::new());
            Self {
                config: ScalaConfig::new(universe.clone(), ""),
                universe,
                rule: Rule::new("scala_library", "lib"),
                from: Label::parse("//app:lib").unwrap(),
            }
        }

        pub fn ctx(&self) -> ConflictContext<'_> {
            ConflictContext {
                universe: &self.universe,
                config: &self.config,
                rule: &self.rule,
                from: &self.from,
            }
        }
    }

    pub fn winner(resolution: ConflictResolution) -> Option<String> {
        match resolution {
            ConflictResolution::Winner(symbol) => Some(symbol.label.to_string()),
            _ => None,
        }
    }
}
