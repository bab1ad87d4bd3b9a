//! Trie-backed scope.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use smol_str::SmolStr;

use super::{Scope, segments};
use crate::error::{Error, Result};
use crate::symbol::SymbolRef;

type NodeRef = Arc<RwLock<Node>>;

#[derive(Default)]
struct Node {
    symbol: Option<SymbolRef>,
    children: BTreeMap<SmolStr, NodeRef>,
}

/// A scope indexed by dot-segments: `a.b.c` lives at the node reached by
/// `a`, then `b`, then `c`.
///
/// Sub-scopes returned by [`Scope::get_scope`] share nodes with their parent,
/// so symbols inserted later through the parent are visible through them.
#[derive(Clone, Default)]
pub struct TrieScope {
    root: NodeRef,
}

impl TrieScope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    fn find_node(&self, name: &str) -> Option<NodeRef> {
        let mut node = self.root.clone();
        for segment in segments(name) {
            let next = node.read().children.get(segment).cloned()?;
            node = next;
        }
        Some(node)
    }

    /// Insert `symbol` at key `name`.
    ///
    /// When the key already holds a symbol of the same name:
    /// - a different label is recorded as a conflict of the canonical symbol,
    ///   except that a built-in (empty label) takes the canonical slot;
    /// - the same label from the same provider is a [`Error::DuplicateProvider`];
    /// - the same label from another provider replaces the entry.
    pub fn put(&self, name: &str, symbol: SymbolRef) -> Result<()> {
        if symbol.provider.is_empty() || name.is_empty() {
            return Err(Error::config(format!("invalid symbol: {symbol}")));
        }

        let mut node = self.root.clone();
        for segment in segments(name) {
            let next = {
                let mut guard = node.write();
                guard
                    .children
                    .entry(SmolStr::new(segment))
                    .or_default()
                    .clone()
            };
            node = next;
        }

        let mut leaf = node.write();
        let Some(current) = leaf.symbol.clone() else {
            leaf.symbol = Some(symbol);
            return Ok(());
        };

        if current.label == symbol.label {
            if current.provider == symbol.provider {
                return Err(Error::DuplicateProvider {
                    name: symbol.name.to_string(),
                    provider: symbol.provider.to_string(),
                    label: symbol.label.to_string(),
                });
            }
            for conflict in current.conflicts() {
                symbol.add_conflict(conflict);
            }
            leaf.symbol = Some(symbol);
            return Ok(());
        }

        if symbol.label.is_empty() {
            symbol.add_conflict(current.clone());
            for conflict in current.conflicts() {
                symbol.add_conflict(conflict);
            }
            leaf.symbol = Some(symbol);
            return Ok(());
        }

        current.add_conflict(symbol);
        Ok(())
    }

    /// Every symbol in the scope, sorted by name.
    pub fn symbols(&self) -> Vec<SymbolRef> {
        self.get_symbols("")
    }

    /// Number of symbols in the scope.
    pub fn len(&self) -> usize {
        let mut count = 0;
        walk(&self.root, &mut |_| count += 1);
        count
    }

    /// Whether the scope holds no symbols.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn walk(node: &NodeRef, f: &mut dyn FnMut(&SymbolRef)) {
    let guard = node.read();
    if let Some(symbol) = &guard.symbol {
        f(symbol);
    }
    for child in guard.children.values() {
        walk(child, f);
    }
}

impl Scope for TrieScope {
    fn put_symbol(&self, symbol: SymbolRef) -> Result<()> {
        let name = symbol.name.clone();
        self.put(&name, symbol)
    }

    fn get_symbol(&self, name: &str) -> Option<SymbolRef> {
        let mut node = self.root.clone();
        let mut last = None;
        for segment in segments(name) {
            let next = node.read().children.get(segment).cloned();
            let Some(next) = next else { break };
            if let Some(symbol) = &next.read().symbol {
                last = Some(symbol.clone());
            }
            node = next;
        }
        last
    }

    fn get_scope(&self, name: &str) -> Option<Arc<dyn Scope>> {
        let root = self.find_node(name)?;
        Some(Arc::new(TrieScope { root }))
    }

    fn get_symbols(&self, prefix: &str) -> Vec<SymbolRef> {
        let Some(node) = self.find_node(prefix) else {
            return Vec::new();
        };
        let mut symbols = Vec::new();
        walk(&node, &mut |s| symbols.push(s.clone()));
        symbols.sort_by(|a, b| a.name.cmp(&b.name));
        symbols
    }

    fn node_id(&self) -> Option<usize> {
        Some(Arc::as_ptr(&self.root) as usize)
    }
}

impl fmt::Debug for TrieScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        walk(&self.root, &mut |s| {
            list.entry(&format_args!("{s}"));
        });
        list.finish()
    }
}
