//! The symbol resolver cascade.
//!
//! Each layer answers `resolve_symbol(config, index, from, lang, name)` with
//! a symbol or a [`ResolveError`]; a [`ChainSymbolResolver`] returns the
//! first success. The default cascade built by the orchestrator is:
//!
//! ```text
//! NormalizingSymbolResolver   strip `_root_.` and trailing `._`
//!   └─ Chain
//!        ├─ OverrideSymbolResolver       per-directory, never memoized
//!        └─ MemoSymbolResolver
//!             └─ Chain
//!                  ├─ ScopeSymbolResolver(universe)
//!                  ├─ CrossSymbolResolver(rule index)
//!                  └─ ScopeSymbolResolver(language scope)
//! ```
//!
//! Ambiguous hits are returned unchanged; conflicts are settled later by
//! the dep writer, which sees the sibling imports of the rule.

use std::sync::Arc;

use thiserror::Error;

use crate::base::Label;
use crate::host::{Config, RuleIndex};
use crate::symbol::SymbolRef;

mod chain;
mod cross;
mod memo;
mod normalize;
mod overrides;
mod scope;

pub use chain::ChainSymbolResolver;
pub use cross::{CROSS_RESOLVE_PROVIDER, CrossSymbolResolver};
pub use memo::MemoSymbolResolver;
pub use normalize::{NormalizingSymbolResolver, normalize_import};
pub use overrides::{OVERRIDE_PROVIDER, OverrideSymbolResolver};
pub use scope::ScopeSymbolResolver;

/// Why a single import could not be resolved. Recorded on the import;
/// never aborts a run.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No layer knows the name.
    #[error("symbol not found: {0}")]
    NotFound(String),

    /// The layer does not answer for the requested language.
    #[error("language not supported: {0}")]
    Unsupported(String),
}

/// One layer of the cascade.
pub trait SymbolResolver: Send + Sync {
    /// Resolve `name`, requested by the rule `from` in language `lang`.
    fn resolve_symbol(
        &self,
        c: &Config,
        ix: &RuleIndex,
        from: &Label,
        lang: &str,
        name: &str,
    ) -> Result<SymbolRef, ResolveError>;
}

impl<T: SymbolResolver + ?Sized> SymbolResolver for Arc<T> {
    fn resolve_symbol(
        &self,
        c: &Config,
        ix: &RuleIndex,
        from: &Label,
        lang: &str,
        name: &str,
    ) -> Result<SymbolRef, ResolveError> {
        (**self).resolve_symbol(c, ix, from, lang, name)
    }
}
