//! Ordered composition of scopes.

use std::sync::Arc;

use super::Scope;
use crate::symbol::SymbolRef;

/// Consults its layers in order; the first layer with an answer wins.
#[derive(Clone, Default)]
pub struct ChainScope {
    layers: Vec<Arc<dyn Scope>>,
}

impl ChainScope {
    /// Create a chain over the given layers.
    pub fn new(layers: Vec<Arc<dyn Scope>>) -> Self {
        Self { layers }
    }

    /// Append a layer at the lowest priority.
    pub fn push(&mut self, layer: Arc<dyn Scope>) {
        self.layers.push(layer);
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the chain has no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Scope for ChainScope {
    fn get_symbol(&self, name: &str) -> Option<SymbolRef> {
        self.layers.iter().find_map(|layer| layer.get_symbol(name))
    }

    fn get_scope(&self, name: &str) -> Option<Arc<dyn Scope>> {
        self.layers.iter().find_map(|layer| layer.get_scope(name))
    }

    fn get_symbols(&self, prefix: &str) -> Vec<SymbolRef> {
        self.layers
            .iter()
            .map(|layer| layer.get_symbols(prefix))
            .find(|symbols| !symbols.is_empty())
            .unwrap_or_default()
    }
}
