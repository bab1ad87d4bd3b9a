//! Symbols: fully-qualified names bound to the label that provides them.
//!
//! Symbols are shared as [`SymbolRef`] (`Arc<Symbol>`). Identity is pointer
//! identity; the scope hands back the very `Arc` that was inserted. The only
//! mutable parts are the `conflicts` list (grows as more labels claim the
//! same name) and the `requires` edges (attached by the class-index provider
//! during OnResolve). `requires` edges are weak so that cycles among class
//! hierarchies do not leak.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::base::Label;
use crate::error::Error;

/// Shared handle to a symbol.
pub type SymbolRef = Arc<Symbol>;

// ============================================================================
// SYMBOL TYPE
// ============================================================================

/// What kind of entity a symbol names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolType {
    Package,
    Class,
    Object,
    Trait,
    Interface,
    Type,
    Value,
    ProtoPackage,
    ProtoMessage,
    ProtoEnum,
    ProtoService,
    CrossResolve,
    Override,
}

impl SymbolType {
    /// Every variant, in declaration order.
    pub const ALL: [SymbolType; 13] = [
        SymbolType::Package,
        SymbolType::Class,
        SymbolType::Object,
        SymbolType::Trait,
        SymbolType::Interface,
        SymbolType::Type,
        SymbolType::Value,
        SymbolType::ProtoPackage,
        SymbolType::ProtoMessage,
        SymbolType::ProtoEnum,
        SymbolType::ProtoService,
        SymbolType::CrossResolve,
        SymbolType::Override,
    ];

    /// Upper-case tag used in annotations and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolType::Package => "PACKAGE",
            SymbolType::Class => "CLASS",
            SymbolType::Object => "OBJECT",
            SymbolType::Trait => "TRAIT",
            SymbolType::Interface => "INTERFACE",
            SymbolType::Type => "TYPE",
            SymbolType::Value => "VALUE",
            SymbolType::ProtoPackage => "PROTO_PACKAGE",
            SymbolType::ProtoMessage => "PROTO_MESSAGE",
            SymbolType::ProtoEnum => "PROTO_ENUM",
            SymbolType::ProtoService => "PROTO_SERVICE",
            SymbolType::CrossResolve => "CROSS_RESOLVE",
            SymbolType::Override => "OVERRIDE",
        }
    }

    /// Whether this symbol names a package-like namespace.
    pub fn is_package(self) -> bool {
        matches!(self, SymbolType::Package | SymbolType::ProtoPackage)
    }

    /// Whether this symbol names an entity generated from a proto file.
    pub fn is_proto_entity(self) -> bool {
        matches!(
            self,
            SymbolType::ProtoMessage | SymbolType::ProtoEnum | SymbolType::ProtoService
        )
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymbolType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        SymbolType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::config(format!("unknown symbol type: {s}")))
    }
}

// ============================================================================
// SYMBOL
// ============================================================================

/// A fully-qualified name bound to the label that provides it.
pub struct Symbol {
    /// Entity kind.
    pub symbol_type: SymbolType,
    /// Fully-qualified, dot-separated name.
    pub name: Arc<str>,
    /// The providing label; empty for built-ins.
    pub label: Label,
    /// Tag of the provider that registered the symbol.
    pub provider: Arc<str>,
    requires: RwLock<Vec<Weak<Symbol>>>,
    conflicts: RwLock<Vec<SymbolRef>>,
}

impl Symbol {
    /// Create a new symbol.
    pub fn new(
        symbol_type: SymbolType,
        name: impl Into<Arc<str>>,
        provider: impl Into<Arc<str>>,
        label: Label,
    ) -> Self {
        Self {
            symbol_type,
            name: name.into(),
            label,
            provider: provider.into(),
            requires: RwLock::new(Vec::new()),
            conflicts: RwLock::new(Vec::new()),
        }
    }

    /// Create a new shared symbol.
    pub fn shared(
        symbol_type: SymbolType,
        name: impl Into<Arc<str>>,
        provider: impl Into<Arc<str>>,
        label: Label,
    ) -> SymbolRef {
        Arc::new(Self::new(symbol_type, name, provider, label))
    }

    /// Whether `other` has the same (name, label) identity.
    pub fn same_identity(&self, other: &Symbol) -> bool {
        self.name == other.name && self.label == other.label
    }

    /// Snapshot of the alternative symbols claiming the same name.
    pub fn conflicts(&self) -> Vec<SymbolRef> {
        self.conflicts.read().clone()
    }

    /// Whether any other label claims this name.
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.read().is_empty()
    }

    /// Record an alternative provider of this name.
    ///
    /// Built-ins (empty label) are never recorded as conflicts, and an
    /// alternative with the same (name, label) identity is recorded once.
    pub fn add_conflict(&self, other: SymbolRef) {
        if other.label.is_empty() || self.same_identity(&other) {
            return;
        }
        let mut conflicts = self.conflicts.write();
        if conflicts.iter().any(|c| c.same_identity(&other)) {
            return;
        }
        conflicts.push(other);
    }

    /// Symbols this one pulls in (superclasses, interfaces).
    pub fn requires(&self) -> Vec<SymbolRef> {
        self.requires.read().iter().filter_map(Weak::upgrade).collect()
    }

    /// Attach a `requires` edge; repeated edges are ignored.
    pub fn require(&self, other: &SymbolRef) {
        let mut requires = self.requires.write();
        let exists = requires
            .iter()
            .filter_map(Weak::upgrade)
            .any(|r| r.same_identity(other));
        if !exists {
            requires.push(Arc::downgrade(other));
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Symbol")
            .field("type", &self.symbol_type)
            .field("name", &self.name)
            .field("label", &self.label.to_string())
            .field("provider", &self.provider)
            .field("conflicts", &self.conflicts.read().len())
            .finish()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}<{}> {}<{}>)",
            self.name, self.symbol_type, self.label, self.provider
        )
    }
}

/// Human-readable explanation of an unresolved ambiguity, with the resolve
/// directives that would settle it.
pub fn conflict_message(symbol: &Symbol, import: &str, from: &Label) -> String {
    let conflicts = symbol.conflicts();
    if conflicts.is_empty() {
        return String::new();
    }
    let mut lines = Vec::with_capacity(conflicts.len() + 4);
    lines.push(format!(
        "Ambiguous resolve of {} {:?} (symbol is provided by {} labels) [{}]",
        symbol.symbol_type,
        symbol.name,
        conflicts.len() + 1,
        import
    ));
    if symbol.symbol_type.is_package() {
        lines.push(" - Possible action: remove wildcard or package import".to_string());
    }
    lines.push(format!(
        " - Possible action: add an override directive to {}:",
        Label::new(from.repo(), from.pkg(), "BUILD.bazel")
    ));
    let mut labels: Vec<String> = std::iter::once(symbol.label.to_string())
        .chain(conflicts.iter().map(|c| c.label.to_string()))
        .collect();
    labels.sort();
    for label in labels {
        lines.push(format!("     # gazelle:override scala glob {} {}", symbol.name, label));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(s: &str) -> Label {
        Label::parse(s).unwrap()
    }

    #[test]
    fn test_symbol_type_round_trip() {
        for t in SymbolType::ALL {
            assert_eq!(t.as_str().parse::<SymbolType>().unwrap(), t);
        }
        assert!("NOPE".parse::<SymbolType>().is_err());
    }

    #[test]
    fn test_add_conflict_skips_builtins_and_duplicates() {
        let a = Symbol::shared(SymbolType::Class, "lib.A", "source", label("//lib:a"));
        let b = Symbol::shared(SymbolType::Class, "lib.A", "source", label("//lib:b"));
        let builtin = Symbol::shared(SymbolType::Class, "lib.A", "java", Label::no_label());

        a.add_conflict(b.clone());
        a.add_conflict(b.clone());
        a.add_conflict(builtin);
        a.add_conflict(a.clone());

        let conflicts = a.conflicts();
        assert_eq!(conflicts.len(), 1);
        assert!(Arc::ptr_eq(&conflicts[0], &b));
    }

    #[test]
    fn test_requires_cycle_is_benign() {
        let a = Symbol::shared(SymbolType::Class, "x.A", "java", label("//x:a"));
        let b = Symbol::shared(SymbolType::Interface, "x.B", "java", label("//x:b"));
        a.require(&b);
        b.require(&a);
        a.require(&b);

        assert_eq!(a.requires().len(), 1);
        assert_eq!(b.requires()[0].name.as_ref(), "x.A");
    }

    #[test]
    fn test_conflict_message_lists_all_labels() {
        let a = Symbol::shared(SymbolType::ProtoPackage, "proto.api", "protobuf", label("//p:api_proto_scala_library"));
        let b = Symbol::shared(SymbolType::ProtoPackage, "proto.api", "protobuf", label("//p:api_grpc_scala_library"));
        a.add_conflict(b);
        let msg = conflict_message(&a, "proto.api._", &label("//app:app"));
        assert!(msg.starts_with("Ambiguous resolve of PROTO_PACKAGE"));
        assert!(msg.contains("remove wildcard"));
        assert!(msg.contains("//p:api_grpc_scala_library"));
        assert!(msg.contains("//p:api_proto_scala_library"));
    }

    #[test]
    fn test_conflict_message_empty_without_conflicts() {
        let a = Symbol::new(SymbolType::Class, "lib.A", "source", label("//lib:a"));
        assert!(conflict_message(&a, "lib.A", &label("//lib:b")).is_empty());
    }
}
