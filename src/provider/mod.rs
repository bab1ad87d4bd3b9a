//! Symbol providers: adapters that populate the universe scope.
//!
//! Providers never resolve. They register symbols during `check_flags` or
//! `on_resolve`, and answer `can_provide` so the dep writer knows which
//! existing deps it may delete.
//!
//! - [`SourceProvider`] - symbols parsed from the rules' own sources
//! - [`JavaProvider`] - a pre-computed class index of jar files
//! - [`MavenProvider`] - rules_jvm_external install manifests
//! - [`ProtobufProvider`] - names of generated proto bindings
//! - [`SemanticdbProvider`] - compiler-resolved imports merged into parsed files

use std::sync::Arc;

use clap::{ArgMatches, Command};

use crate::base::Label;
use crate::error::Result;
use crate::host::Config;
use crate::scope::Scope;
use crate::universe::KnownRule;

mod java;
mod maven;
mod protobuf;
mod semanticdb;
mod source;

pub use java::{JavaIndex, JavaProvider};
pub use maven::MavenProvider;
pub use protobuf::{ProtoEntities, ProtobufProvider};
pub use semanticdb::{InfoMap, Role, SemanticdbProvider, SymbolOccurrence, TextDocument, TextDocuments};
pub use source::SourceProvider;

/// A source of symbols.
pub trait SymbolProvider: Send + Sync {
    /// Registry name, as used by `--scala_symbol_provider`.
    fn name(&self) -> &str;

    /// Declare provider flags on the shared command.
    fn register_flags(&self, cmd: Command) -> Command {
        cmd
    }

    /// Finish initialization. Symbols go into `scope`.
    fn check_flags(&self, matches: &ArgMatches, c: &Config, scope: Arc<dyn Scope>) -> Result<()>;

    /// Called once at the generate → resolve transition.
    fn on_resolve(&self) -> Result<()> {
        Ok(())
    }

    /// Called once after the last rule is resolved.
    fn on_end(&self) -> Result<()> {
        Ok(())
    }

    /// Whether the provider manages the namespace of `label`.
    fn can_provide(&self, label: &Label, known_rule: &dyn Fn(&Label) -> Option<KnownRule>) -> bool;
}
