//! Import requests and the ordered map that collects them per rule.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::base::Label;
use crate::parser::File;
use crate::resolver::ResolveError;
use crate::symbol::SymbolRef;

// ============================================================================
// IMPORT
// ============================================================================

/// Why a rule requires a name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImportKind {
    /// Written as an import statement in a source file.
    Direct,
    /// Implied by an `implicit_import` directive.
    Implicit,
    /// Named by the rule's `main_class` attribute.
    MainClass,
    /// A parent type in an extends/with clause.
    Extends,
    /// A name expanded from a wildcard import.
    ResolvedName,
    /// Reported by a semantic database.
    Semantic,
}

impl ImportKind {
    /// Upper-case tag used in annotations.
    pub fn as_str(self) -> &'static str {
        match self {
            ImportKind::Direct => "DIRECT",
            ImportKind::Implicit => "IMPLICIT",
            ImportKind::MainClass => "MAIN_CLASS",
            ImportKind::Extends => "EXTENDS",
            ImportKind::ResolvedName => "RESOLVED_NAME",
            ImportKind::Semantic => "SEMANTIC",
        }
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default)]
enum Resolution {
    #[default]
    Pending,
    Resolved(SymbolRef),
    Failed(ResolveError),
    /// Consumed by a conflict resolver without producing a dependency.
    Elided,
}

/// A request to resolve `name` on behalf of a rule.
#[derive(Clone, Debug)]
pub struct Import {
    /// Why the name is required.
    pub kind: ImportKind,
    /// The fully-qualified name as requested.
    pub name: String,
    /// The file the request came from.
    pub source: Option<Arc<File>>,
    /// The name that triggered an implicit import, or the defining symbol of
    /// an extends clause.
    pub src: String,
    resolution: Resolution,
}

impl Import {
    fn new(kind: ImportKind, name: impl Into<String>, source: Option<Arc<File>>, src: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            source,
            src: src.into(),
            resolution: Resolution::Pending,
        }
    }

    /// An import statement in `source`.
    pub fn direct(name: impl Into<String>, source: Arc<File>) -> Self {
        Self::new(ImportKind::Direct, name, Some(source), "")
    }

    /// A name implied by `src`.
    pub fn implicit(name: impl Into<String>, src: impl Into<String>) -> Self {
        Self::new(ImportKind::Implicit, name, None, src)
    }

    /// The rule's main class.
    pub fn main_class(name: impl Into<String>) -> Self {
        Self::new(ImportKind::MainClass, name, None, "")
    }

    /// A parent of `defining_symbol`.
    pub fn extends(name: impl Into<String>, source: Option<Arc<File>>, defining_symbol: impl Into<String>) -> Self {
        Self::new(ImportKind::Extends, name, source, defining_symbol)
    }

    /// A name expanded from the wildcard import `wildcard`.
    pub fn resolved_name(name: impl Into<String>, source: Option<Arc<File>>, wildcard: impl Into<String>) -> Self {
        Self::new(ImportKind::ResolvedName, name, source, wildcard)
    }

    /// A semantic-database import in `source`.
    pub fn semantic(name: impl Into<String>, source: Arc<File>) -> Self {
        Self::new(ImportKind::Semantic, name, Some(source), "")
    }

    /// The resolved symbol, if resolution succeeded.
    pub fn symbol(&self) -> Option<&SymbolRef> {
        match &self.resolution {
            Resolution::Resolved(symbol) => Some(symbol),
            _ => None,
        }
    }

    /// The resolution error, if resolution failed.
    pub fn error(&self) -> Option<&ResolveError> {
        match &self.resolution {
            Resolution::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Whether resolution has been attempted and produced an outcome.
    pub fn is_resolved(&self) -> bool {
        matches!(self.resolution, Resolution::Resolved(_) | Resolution::Failed(_))
    }

    /// Whether a conflict resolver consumed this import.
    pub fn is_elided(&self) -> bool {
        matches!(self.resolution, Resolution::Elided)
    }

    /// Whether resolution has not been attempted yet.
    pub fn is_pending(&self) -> bool {
        matches!(self.resolution, Resolution::Pending)
    }

    /// Attach the resolved symbol.
    pub fn set_symbol(&mut self, symbol: SymbolRef) {
        self.resolution = Resolution::Resolved(symbol);
    }

    /// Attach a resolution error.
    pub fn set_error(&mut self, error: ResolveError) {
        self.resolution = Resolution::Failed(error);
    }

    /// Mark the import as consumed without a dependency.
    pub fn elide(&mut self) {
        self.resolution = Resolution::Elided;
    }

    /// Where the import came from, e.g. `DIRECT of A.scala`.
    pub fn origin(&self) -> String {
        match self.kind {
            ImportKind::Direct | ImportKind::Semantic => match &self.source {
                Some(file) => format!("{} of {}", self.kind, file.basename()),
                None => self.kind.to_string(),
            },
            ImportKind::Implicit => format!("{} via {:?}", self.kind, self.src),
            ImportKind::Extends => format!("{} of {}", self.kind, self.src),
            ImportKind::ResolvedName => format!("{} via {:?}", self.kind, self.src),
            ImportKind::MainClass => self.kind.to_string(),
        }
    }
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resolution {
            Resolution::Resolved(symbol) => write!(
                f,
                "{}<{}> {}<{}> ({})",
                self.name,
                symbol.symbol_type,
                symbol.label,
                symbol.provider,
                self.origin()
            ),
            Resolution::Failed(error) => write!(f, "{} ({}): {}", self.name, self.origin(), error),
            Resolution::Elided => write!(f, "{} ({}) elided", self.name, self.origin()),
            Resolution::Pending => write!(f, "{} ({})", self.name, self.origin()),
        }
    }
}

// ============================================================================
// IMPORT MAP
// ============================================================================

/// Insertion-ordered imports keyed by name. The first import put under a
/// name stays; later ones are ignored so the earliest provenance survives.
#[derive(Clone, Debug, Default)]
pub struct ImportMap {
    entries: IndexMap<String, Import>,
}

impl ImportMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `import` unless its name is already present. Returns whether
    /// it was inserted.
    pub fn put(&mut self, import: Import) -> bool {
        if self.entries.contains_key(&import.name) {
            return false;
        }
        self.entries.insert(import.name.clone(), import);
        true
    }

    /// Look up by name.
    pub fn get(&self, name: &str) -> Option<&Import> {
        self.entries.get(name)
    }

    /// Whether `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Look up by insertion index.
    pub fn get_index(&self, index: usize) -> Option<&Import> {
        self.entries.get_index(index).map(|(_, import)| import)
    }

    /// Mutable lookup by insertion index.
    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut Import> {
        self.entries.get_index_mut(index).map(|(_, import)| import)
    }

    /// Number of imports.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Imports in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Import> {
        self.entries.values()
    }

    /// Mutable imports in insertion order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Import> {
        self.entries.values_mut()
    }

    /// Labels required by the resolved imports, deduplicated in first-seen
    /// order, each with the imports that justify it.
    ///
    /// `rewrite` maps a symbol's label to the label that should be depended
    /// upon. Built-ins and self-references (`from`) are skipped.
    pub fn deps(&self, from: &Label, rewrite: impl Fn(&SymbolRef) -> Label) -> IndexMap<Label, Vec<&Import>> {
        let mut deps: IndexMap<Label, Vec<&Import>> = IndexMap::new();
        for import in self.entries.values() {
            let Some(symbol) = import.symbol() else {
                continue;
            };
            if symbol.label.is_empty() {
                continue;
            }
            let label = rewrite(symbol);
            if label.is_empty() || &label == from {
                continue;
            }
            deps.entry(label).or_default().push(import);
        }
        deps
    }
}
