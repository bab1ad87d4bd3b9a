//! Symbols from a pre-computed class index of jar files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{ArgMatches, Command};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use tracing::{debug, trace};

use super::SymbolProvider;
use crate::base::Label;
use crate::conflict::PreferredDeps;
use crate::error::{Error, Result};
use crate::host::{Config, flag_values, repeated_flag};
use crate::scope::Scope;
use crate::symbol::{Symbol, SymbolRef, SymbolType};
use crate::universe::KnownRule;

const INDEX_FILE_FLAG: &str = "java_index_file";

/// A class index manifest.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct JavaIndex {
    pub jar_files: Vec<JarFile>,
    /// Labels whose classes are language built-ins.
    pub predefined: Vec<String>,
    /// Name → label to prefer when the name is ambiguous.
    pub preferred: BTreeMap<String, String>,
}

/// One jar in the index.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct JarFile {
    pub filename: String,
    pub label: String,
    pub package_names: Vec<String>,
    pub class_files: Vec<ClassFile>,
}

/// One class in a jar.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClassFile {
    pub name: String,
    pub is_interface: bool,
    pub superclasses: Vec<String>,
    pub interfaces: Vec<String>,
}

#[derive(Default)]
struct JavaState {
    scope: Option<Arc<dyn Scope>>,
    labels: FxHashSet<Label>,
    /// Class symbols with their parent names, to link at resolve time.
    parents: BTreeMap<String, (SymbolRef, Vec<String>)>,
}

/// Registers PACKAGE, CLASS and INTERFACE symbols from
/// `--java_index_file` manifests.
pub struct JavaProvider {
    preferred: PreferredDeps,
    state: RwLock<JavaState>,
}

impl JavaProvider {
    /// Create the provider. Preferred deps found in the manifests are
    /// written to `preferred`.
    pub fn new(preferred: PreferredDeps) -> Self {
        Self {
            preferred,
            state: RwLock::new(JavaState::default()),
        }
    }

    /// Load one manifest into `scope`.
    pub fn read_index(&self, path: &Path, scope: &Arc<dyn Scope>) -> Result<()> {
        let init_error = |message: String| Error::ProviderInit {
            provider: self.name().to_string(),
            path: path.to_path_buf(),
            message,
        };
        let data = fs::read_to_string(path).map_err(|e| init_error(e.to_string()))?;
        let index: JavaIndex = serde_json::from_str(&data).map_err(|e| init_error(e.to_string()))?;
        self.load_index(index, scope).map_err(|e| init_error(e.to_string()))
    }

    /// Register the contents of `index` into `scope`.
    pub fn load_index(&self, index: JavaIndex, scope: &Arc<dyn Scope>) -> Result<()> {
        let predefined = index
            .predefined
            .iter()
            .map(|s| Label::parse(s))
            .collect::<Result<FxHashSet<_>>>()?;

        {
            let mut preferred = self.preferred.write();
            for (name, label) in &index.preferred {
                preferred.insert(name.clone(), Label::parse(label)?);
            }
        }

        let mut state = self.state.write();
        for jar in index.jar_files {
            let mut from = if jar.label.is_empty() {
                Label::no_label()
            } else {
                Label::parse(&jar.label)?
            };
            state.labels.insert(from.clone());
            if predefined.contains(&from) {
                from = Label::no_label();
            }

            for package in &jar.package_names {
                self.put(scope, Symbol::shared(SymbolType::Package, package.as_str(), self.name(), from.clone()));
            }
            for class in jar.class_files {
                let symbol_type = if class.is_interface {
                    SymbolType::Interface
                } else {
                    SymbolType::Class
                };
                let symbol = Symbol::shared(symbol_type, class.name.as_str(), self.name(), from.clone());
                self.put(scope, symbol.clone());
                if !class.superclasses.is_empty() || !class.interfaces.is_empty() {
                    let mut parents = class.superclasses;
                    parents.extend(class.interfaces);
                    state.parents.insert(class.name, (symbol, parents));
                }
            }
            debug!(jar = %jar.filename, label = %from, "indexed jar");
        }
        Ok(())
    }

    fn put(&self, scope: &Arc<dyn Scope>, symbol: SymbolRef) {
        // Overlapping manifests register the same classes more than once.
        if let Err(err) = scope.put_symbol(symbol) {
            trace!(%err, "java symbol not registered");
        }
    }
}

impl SymbolProvider for JavaProvider {
    fn name(&self) -> &str {
        "java"
    }

    fn register_flags(&self, cmd: Command) -> Command {
        cmd.arg(repeated_flag(
            INDEX_FILE_FLAG,
            "path to a JSON class index; relative paths are resolved against the working directory",
        ))
    }

    fn check_flags(&self, matches: &ArgMatches, c: &Config, scope: Arc<dyn Scope>) -> Result<()> {
        self.state.write().scope = Some(scope.clone());
        for filename in flag_values(matches, INDEX_FILE_FLAG) {
            let mut path = PathBuf::from(filename);
            if path.is_relative() {
                path = c.work_dir.join(path);
            }
            self.read_index(&path, &scope)?;
        }
        Ok(())
    }

    fn on_resolve(&self) -> Result<()> {
        let state = self.state.read();
        let Some(scope) = &state.scope else {
            return Ok(());
        };
        for (symbol, parents) in state.parents.values() {
            for parent in parents {
                match scope.get_symbol(parent) {
                    Some(resolved) if &*resolved.name == parent.as_str() => symbol.require(&resolved),
                    _ => trace!(class = %symbol.name, parent, "unresolved parent"),
                }
            }
        }
        Ok(())
    }

    fn can_provide(&self, label: &Label, _known_rule: &dyn Fn(&Label) -> Option<KnownRule>) -> bool {
        self.state.read().labels.contains(label)
    }
}
