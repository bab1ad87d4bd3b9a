//! Names of generated protobuf bindings.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{ArgMatches, Command};
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{debug, warn};

use super::SymbolProvider;
use crate::base::Label;
use crate::error::{Error, Result};
use crate::host::{Config, flag_value, string_flag};
use crate::scope::Scope;
use crate::symbol::{Symbol, SymbolType};
use crate::universe::KnownRule;

const IMPORTS_FILE_FLAG: &str = "proto_imports_file";

/// The generated names one binding rule provides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProtoEntities {
    pub package: Vec<String>,
    pub message: Vec<String>,
    #[serde(rename = "enum")]
    pub enums: Vec<String>,
    pub service: Vec<String>,
    pub class: Vec<String>,
}

impl ProtoEntities {
    fn merge(&mut self, other: ProtoEntities) {
        self.package.extend(other.package);
        self.message.extend(other.message);
        self.enums.extend(other.enums);
        self.service.extend(other.service);
        self.class.extend(other.class);
    }

    fn typed(&self) -> impl Iterator<Item = (SymbolType, &str)> {
        [
            (SymbolType::ProtoPackage, &self.package),
            (SymbolType::ProtoEnum, &self.enums),
            (SymbolType::ProtoMessage, &self.message),
            (SymbolType::ProtoService, &self.service),
            (SymbolType::Class, &self.class),
        ]
        .into_iter()
        .flat_map(|(symbol_type, names)| names.iter().map(move |n| (symbol_type, n.as_str())))
    }
}

#[derive(Default)]
struct ProtobufState {
    scope: Option<Arc<dyn Scope>>,
    registry: BTreeMap<String, ProtoEntities>,
}

/// Registers proto packages, messages, enums, services and generated
/// classes under the labels of the rules that compile their Scala
/// bindings. Registrations come from `--proto_imports_file` or from a
/// sibling extension through [`ProtobufProvider::register`]; symbols are
/// put into scope at the resolve transition.
#[derive(Default)]
pub struct ProtobufProvider {
    state: RwLock<ProtobufState>,
}

impl ProtobufProvider {
    /// Create the provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the names provided by `label`.
    pub fn register(&self, label: &Label, entities: ProtoEntities) {
        self.state
            .write()
            .registry
            .entry(label.to_string())
            .or_default()
            .merge(entities);
    }

    /// Load a `{label: entities}` registry file.
    pub fn read_imports_file(&self, path: &Path) -> Result<()> {
        let init_error = |message: String| Error::ProviderInit {
            provider: self.name().to_string(),
            path: path.to_path_buf(),
            message,
        };
        let data = fs::read_to_string(path).map_err(|e| init_error(e.to_string()))?;
        let registry: BTreeMap<String, ProtoEntities> =
            serde_json::from_str(&data).map_err(|e| init_error(e.to_string()))?;
        for (label, entities) in registry {
            let label = Label::parse(&label).map_err(|e| init_error(e.to_string()))?;
            self.register(&label, entities);
        }
        Ok(())
    }
}

impl SymbolProvider for ProtobufProvider {
    fn name(&self) -> &str {
        "protobuf"
    }

    fn register_flags(&self, cmd: Command) -> Command {
        cmd.arg(string_flag(
            IMPORTS_FILE_FLAG,
            "path to a JSON registry of generated proto names by label",
        ))
    }

    fn check_flags(&self, matches: &ArgMatches, c: &Config, scope: Arc<dyn Scope>) -> Result<()> {
        self.state.write().scope = Some(scope);
        if let Some(filename) = flag_value(matches, IMPORTS_FILE_FLAG) {
            let mut path = PathBuf::from(filename);
            if path.is_relative() {
                path = c.work_dir.join(path);
            }
            self.read_imports_file(&path)?;
        }
        Ok(())
    }

    fn on_resolve(&self) -> Result<()> {
        let state = self.state.read();
        let Some(scope) = &state.scope else {
            return Ok(());
        };
        let mut count = 0;
        for (label, entities) in &state.registry {
            let from = Label::parse(label)?;
            for (symbol_type, name) in entities.typed() {
                match scope.put_symbol(Symbol::shared(symbol_type, name, self.name(), from.clone())) {
                    Ok(()) => count += 1,
                    Err(err) => warn!(%err, "proto symbol not registered"),
                }
            }
        }
        debug!(symbols = count, rules = state.registry.len(), "registered proto symbols");
        Ok(())
    }

    fn can_provide(&self, label: &Label, _known_rule: &dyn Fn(&Label) -> Option<KnownRule>) -> bool {
        label.name().ends_with("proto_scala_library") || label.name().ends_with("grpc_scala_library")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::TrieScope;

    #[test]
    fn test_registrations_become_symbols_on_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proto_imports.json");
        fs::write(
            &path,
            r#"{"//proto/api:api_proto_scala_library": {
                "package": ["proto.api"],
                "message": ["proto.api.User", "proto.api.Group"],
                "enum": ["proto.api.Role"]
            }}"#,
        )
        .unwrap();

        let provider = ProtobufProvider::new();
        let scope: Arc<dyn Scope> = Arc::new(TrieScope::new());
        provider.state.write().scope = Some(scope.clone());
        provider.read_imports_file(&path).unwrap();
        provider.register(
            &Label::parse("//proto/api:api_grpc_scala_library").unwrap(),
            ProtoEntities {
                package: vec!["proto.api".to_string()],
                service: vec!["proto.api.UserService".to_string()],
                ..Default::default()
            },
        );
        assert!(scope.get_symbol("proto.api.User").is_none());

        provider.on_resolve().unwrap();
        let user = scope.get_symbol("proto.api.User").unwrap();
        assert_eq!(user.symbol_type, SymbolType::ProtoMessage);
        let package = scope.get_symbol("proto.api").unwrap();
        assert_eq!(package.symbol_type, SymbolType::ProtoPackage);
        assert_eq!(package.label.to_string(), "//proto/api:api_grpc_scala_library");
        assert_eq!(package.conflicts()[0].label.to_string(), "//proto/api:api_proto_scala_library");
        assert_eq!(scope.get_symbol("proto.api.Role").unwrap().symbol_type, SymbolType::ProtoEnum);
    }

    #[test]
    fn test_can_provide_binding_labels() {
        let provider = ProtobufProvider::new();
        let none = |_: &Label| None;
        assert!(provider.can_provide(&Label::parse("//p:foo_proto_scala_library").unwrap(), &none));
        assert!(provider.can_provide(&Label::parse("//p:foo_grpc_scala_library").unwrap(), &none));
        assert!(!provider.can_provide(&Label::parse("//p:foo").unwrap(), &none));
    }
}
