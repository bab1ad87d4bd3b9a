//! Imports recovered from SemanticDB documents.
//!
//! The compiler plugin writes one `TextDocuments` message per source file,
//! either loose on disk (located through an index file mapping source uri to
//! document path) or packed under `META-INF/semanticdb/` in a jar. Every
//! global symbol a document references becomes a semantic import of the
//! parsed file with the same repository-relative name.
//!
//! Only the fields used here are declared; prost skips the rest of the
//! schema when decoding.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{ArgMatches, Command};
use parking_lot::RwLock;
use prost::Message;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::SymbolProvider;
use crate::base::Label;
use crate::cache::CachedRule;
use crate::error::{Error, Result};
use crate::host::{Config, flag_value, flag_values, repeated_flag, string_flag};
use crate::parser::{File, RuleParser};
use crate::scope::Scope;
use crate::universe::KnownRule;

const INDEX_FILE_FLAG: &str = "semanticdb_index_file";
const JAR_FILE_FLAG: &str = "semanticdb_jar_file";

/// Directory of SemanticDB payloads inside a jar.
pub const JAR_ENTRY_PREFIX: &str = "META-INF/semanticdb/";
const JAR_ENTRY_SUFFIX: &str = ".semanticdb";

// ============================================================================
// SCHEMA
// ============================================================================

/// Source uri → path of the `TextDocuments` file describing it.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct InfoMap {
    #[prost(btree_map = "string, string", tag = "1")]
    pub entries: BTreeMap<String, String>,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct TextDocuments {
    #[prost(message, repeated, tag = "1")]
    pub documents: Vec<TextDocument>,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct TextDocument {
    /// Source path relative to the source root.
    #[prost(string, tag = "2")]
    pub uri: String,
    #[prost(message, repeated, tag = "6")]
    pub occurrences: Vec<SymbolOccurrence>,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct SymbolOccurrence {
    #[prost(string, tag = "2")]
    pub symbol: String,
    #[prost(enumeration = "Role", tag = "3")]
    pub role: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Role {
    UnknownRole = 0,
    Reference = 1,
    Definition = 2,
}

/// The importable name of a SemanticDB symbol: `lib/A#` and
/// `lib/A.apply().` are both `lib.A`. Locals have none.
pub fn symbol_import(symbol: &str) -> Option<String> {
    if symbol.is_empty() || symbol.starts_with("local") {
        return None;
    }
    let end = symbol.find(['#', '.']).unwrap_or(symbol.len());
    let name = symbol[..end].trim_end_matches('/').replace('/', ".");
    (!name.is_empty()).then_some(name)
}

/// Sorted, distinct imports referenced by `doc`.
pub fn document_imports(doc: &TextDocument) -> Vec<String> {
    let names: BTreeSet<String> = doc
        .occurrences
        .iter()
        .filter(|o| o.role == Role::Reference as i32)
        .filter_map(|o| symbol_import(&o.symbol))
        .collect();
    names.into_iter().collect()
}

// ============================================================================
// PROVIDER
// ============================================================================

#[derive(Default)]
struct State {
    work_dir: PathBuf,
    index: BTreeMap<String, String>,
    docs: FxHashMap<String, TextDocument>,
}

/// Wraps the rule parser and merges the semantic imports of every parsed
/// file. Registers no symbols of its own.
pub struct SemanticdbProvider {
    next: Arc<dyn RuleParser>,
    state: RwLock<State>,
}

impl SemanticdbProvider {
    pub fn new(next: Arc<dyn RuleParser>) -> Self {
        Self {
            next,
            state: RwLock::new(State::default()),
        }
    }

    fn init_error(&self, path: &Path, message: impl ToString) -> Error {
        Error::ProviderInit {
            provider: self.name().to_string(),
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Read an `InfoMap` index. Document paths are relative to `work_dir`.
    pub fn read_index_file(&self, path: &Path, work_dir: &Path) -> Result<()> {
        let data = fs::read(path).map_err(|e| self.init_error(path, e))?;
        let index = InfoMap::decode(data.as_slice()).map_err(|e| self.init_error(path, e))?;
        debug!(path = %path.display(), entries = index.entries.len(), "read semanticdb index");
        let mut state = self.state.write();
        state.work_dir = work_dir.to_path_buf();
        state.index.extend(index.entries);
        Ok(())
    }

    /// Register every document packed in the jar at `path`. A uri seen
    /// twice is an error.
    pub fn read_jar_file(&self, path: &Path) -> Result<usize> {
        let jar = fs::File::open(path).map_err(|e| self.init_error(path, e))?;
        let mut archive = zip::ZipArchive::new(BufReader::new(jar)).map_err(|e| self.init_error(path, e))?;
        let mut count = 0;
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|e| self.init_error(path, e))?;
            let name = entry.name().to_string();
            if !name.starts_with(JAR_ENTRY_PREFIX) || !name.ends_with(JAR_ENTRY_SUFFIX) {
                continue;
            }
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|e| self.init_error(path, format!("{name}: {e}")))?;
            let docs = TextDocuments::decode(data.as_slice())
                .map_err(|e| self.init_error(path, format!("{name}: {e}")))?;

            let mut state = self.state.write();
            for doc in docs.documents {
                if state.docs.contains_key(&doc.uri) {
                    return Err(self.init_error(path, format!("document already registered: {}", doc.uri)));
                }
                state.docs.insert(doc.uri.clone(), doc);
                count += 1;
            }
        }
        debug!(path = %path.display(), documents = count, "read semanticdb jar");
        Ok(count)
    }

    /// The document for `uri`, loading its info file through the index on
    /// first use.
    fn document(&self, uri: &str) -> Option<TextDocument> {
        if let Some(doc) = self.state.read().docs.get(uri) {
            return Some(doc.clone());
        }
        let mut state = self.state.write();
        let Some(rel) = state.index.get(uri).cloned() else {
            debug!(uri, "no semantic info");
            return None;
        };
        let path = state.work_dir.join(rel);
        let docs = match fs::read(&path)
            .map_err(|e| e.to_string())
            .and_then(|data| TextDocuments::decode(data.as_slice()).map_err(|e| e.to_string()))
        {
            Ok(docs) => docs,
            Err(err) => {
                warn!(uri, path = %path.display(), %err, "unreadable semantic info");
                return None;
            }
        };
        for doc in docs.documents {
            state.docs.entry(doc.uri.clone()).or_insert(doc);
        }
        state.docs.get(uri).cloned()
    }

    /// Add the imports `file` references but does not state.
    fn merge(&self, file: &mut File) {
        let Some(doc) = self.document(&file.filename) else {
            return;
        };
        let stated: BTreeSet<&str> = file.imports.iter().map(String::as_str).collect();
        let mut merged: BTreeSet<String> = file.semantic_imports.iter().cloned().collect();
        merged.extend(
            document_imports(&doc)
                .into_iter()
                .filter(|name| !stated.contains(name.as_str())),
        );
        file.semantic_imports = merged.into_iter().collect();
        debug!(file = %file.filename, imports = file.semantic_imports.len(), "merged semantic imports");
    }
}

impl SymbolProvider for SemanticdbProvider {
    fn name(&self) -> &str {
        "semanticdb"
    }

    fn register_flags(&self, cmd: Command) -> Command {
        cmd.arg(string_flag(INDEX_FILE_FLAG, "path to the semanticdb index file"))
            .arg(repeated_flag(
                JAR_FILE_FLAG,
                "path to a jar carrying META-INF/semanticdb documents",
            ))
    }

    fn check_flags(&self, matches: &ArgMatches, c: &Config, _scope: Arc<dyn Scope>) -> Result<()> {
        let absolute = |filename: String| {
            let path = PathBuf::from(filename);
            if path.is_relative() { c.work_dir.join(path) } else { path }
        };
        if let Some(filename) = flag_value(matches, INDEX_FILE_FLAG) {
            self.read_index_file(&absolute(filename), &c.work_dir)?;
        }
        for filename in flag_values(matches, JAR_FILE_FLAG) {
            self.read_jar_file(&absolute(filename))?;
        }
        Ok(())
    }

    fn can_provide(&self, _label: &Label, _known_rule: &dyn Fn(&Label) -> Option<KnownRule>) -> bool {
        false
    }
}

impl RuleParser for SemanticdbProvider {
    fn parse_rule(&self, from: &Label, kind: &str, dir: &Path, srcs: &[String]) -> Result<CachedRule> {
        let mut rule = self.next.parse_rule(from, kind, dir, srcs)?;
        for file in rule.files.iter_mut().filter(|f| f.parse_error.is_empty()) {
            self.merge(file);
        }
        Ok(rule)
    }

    fn load_rule(&self, rule: &CachedRule) -> Result<()> {
        self.next.load_rule(rule)
    }
}
