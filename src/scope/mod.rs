//! Scopes: prefix-indexed containers of symbols.
//!
//! The universe's symbol table is a [`TrieScope`] keyed by dot-segments.
//! Composite scopes layer lookups over it without mutating anything:
//!
//! - [`ChainScope`] - ordered layers, first hit wins
//! - [`TrimPrefixScope`] - strips a literal prefix before delegating
//! - [`LanguageScope`] - the root plus the `scala` and `java.lang` built-in
//!   sub-scopes plus a `_root_.` trimming layer

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::symbol::SymbolRef;

mod chain;
mod language;
mod trie;
mod trim_prefix;

pub use chain::ChainScope;
pub use language::{BUILTIN_PACKAGES, LanguageScope, ROOT_PREFIX};
pub use trie::TrieScope;
pub use trim_prefix::TrimPrefixScope;

/// A container of symbols that can be queried by fully-qualified name.
pub trait Scope: Send + Sync {
    /// Insert a symbol under its own name.
    fn put_symbol(&self, symbol: SymbolRef) -> Result<()> {
        let _ = symbol;
        Err(Error::Unsupported("put_symbol"))
    }

    /// Longest-prefix lookup: the symbol registered at the deepest prefix of
    /// `name`, or `None` if no prefix is registered.
    fn get_symbol(&self, name: &str) -> Option<SymbolRef>;

    /// The sub-scope rooted at exactly `name`.
    fn get_scope(&self, name: &str) -> Option<Arc<dyn Scope>>;

    /// Every symbol at or below `prefix`, sorted by name.
    fn get_symbols(&self, prefix: &str) -> Vec<SymbolRef>;

    /// Identity of the backing trie node, for scopes that have one.
    fn node_id(&self) -> Option<usize> {
        None
    }
}

/// Split a dotted name into its segments, ignoring empty ones.
pub(crate) fn segments(name: &str) -> impl Iterator<Item = &str> {
    name.split('.').filter(|s| !s.is_empty())
}
