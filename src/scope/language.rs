//! Language-aware overlay with the Scala and Java built-in packages.

use std::sync::Arc;

use super::{Scope, TrimPrefixScope};
use crate::symbol::SymbolRef;

/// Packages whose members are visible without an import.
pub const BUILTIN_PACKAGES: [&str; 2] = ["scala", "java.lang"];

/// Root prefix that forces absolute resolution in Scala source.
pub const ROOT_PREFIX: &str = "_root_.";

/// Layers `[parent, scala.*, java.lang.*, _root_-trimmed parent]`.
///
/// The built-in sub-scopes are looked up on every query so that symbols
/// registered after construction are visible. Lookups that land on the
/// built-in package symbols or scopes themselves fall through to the next
/// layer, so the bare names `scala` and `java.lang` never resolve to a
/// package.
#[derive(Clone)]
pub struct LanguageScope {
    parent: Arc<dyn Scope>,
    root: Arc<dyn Scope>,
}

impl LanguageScope {
    /// Wrap `parent`.
    pub fn new(parent: Arc<dyn Scope>) -> Self {
        let root = Arc::new(TrimPrefixScope::new(ROOT_PREFIX, parent.clone()));
        Self { parent, root }
    }

    fn layers(&self) -> (Vec<Arc<dyn Scope>>, Vec<usize>) {
        let mut layers = Vec::with_capacity(4);
        let mut builtin_ids = Vec::with_capacity(2);
        layers.push(self.parent.clone());
        for name in BUILTIN_PACKAGES {
            if let Some(scope) = self.parent.get_scope(name) {
                if let Some(id) = scope.node_id() {
                    builtin_ids.push(id);
                }
                layers.push(scope);
            }
        }
        layers.push(self.root.clone());
        (layers, builtin_ids)
    }
}

impl Scope for LanguageScope {
    fn get_symbol(&self, name: &str) -> Option<SymbolRef> {
        let (layers, _) = self.layers();
        layers
            .iter()
            .filter_map(|layer| layer.get_symbol(name))
            .find(|symbol| !BUILTIN_PACKAGES.contains(&symbol.name.as_ref()))
    }

    fn get_scope(&self, name: &str) -> Option<Arc<dyn Scope>> {
        let (layers, builtin_ids) = self.layers();
        layers.iter().filter_map(|layer| layer.get_scope(name)).find(|scope| {
            scope
                .node_id()
                .is_none_or(|id| !builtin_ids.contains(&id))
        })
    }

    fn get_symbols(&self, prefix: &str) -> Vec<SymbolRef> {
        let (layers, _) = self.layers();
        layers
            .iter()
            .map(|layer| layer.get_symbols(prefix))
            .find(|symbols| !symbols.is_empty())
            .unwrap_or_default()
    }
}
