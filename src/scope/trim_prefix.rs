//! Scope that strips a literal prefix before delegating.

use std::sync::Arc;

use super::Scope;
use crate::symbol::SymbolRef;

/// Strips `prefix` from every query (when present) and forwards to `next`.
#[derive(Clone)]
pub struct TrimPrefixScope {
    prefix: String,
    next: Arc<dyn Scope>,
}

impl TrimPrefixScope {
    /// Create a trimming layer.
    pub fn new(prefix: impl Into<String>, next: Arc<dyn Scope>) -> Self {
        Self {
            prefix: prefix.into(),
            next,
        }
    }

    fn trim<'a>(&self, name: &'a str) -> &'a str {
        name.strip_prefix(self.prefix.as_str()).unwrap_or(name)
    }
}

impl Scope for TrimPrefixScope {
    fn get_symbol(&self, name: &str) -> Option<SymbolRef> {
        self.next.get_symbol(self.trim(name))
    }

    fn get_scope(&self, name: &str) -> Option<Arc<dyn Scope>> {
        self.next.get_scope(self.trim(name))
    }

    fn get_symbols(&self, prefix: &str) -> Vec<SymbolRef> {
        self.next.get_symbols(self.trim(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Label;
    use crate::scope::TrieScope;
    use crate::symbol::{Symbol, SymbolType};

    #[test]
    fn test_trims_root_prefix() {
        let trie = TrieScope::new();
        trie.put_symbol(Symbol::shared(
            SymbolType::Class,
            "com.foo.Bar",
            "source",
            Label::parse("//foo:bar").unwrap(),
        ))
        .unwrap();
        let scope = TrimPrefixScope::new("_root_.", Arc::new(trie));

        assert!(scope.get_symbol("_root_.com.foo.Bar").is_some());
        assert!(scope.get_symbol("com.foo.Bar").is_some());
        assert!(scope.get_scope("_root_.com.foo").is_some());
        assert_eq!(scope.get_symbols("_root_.com").len(), 1);
    }
}
