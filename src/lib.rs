//! # scala-gazelle
//!
//! Dependency resolution for Scala build rules: parse each rule's sources,
//! map every imported name to the rule that provides it, and rewrite the
//! rule's `deps` and `exports`.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! lang      → The extension the host drives (phases, flags, run cache)
//!   ↓
//! deps      → Dep writer: keep/add/clean passes, annotations
//! rule      → Per-rule import derivation and resolution
//! config    → Per-directory directives
//!   ↓
//! resolver  → Override → memo(scope → cross index → built-ins)
//! conflict  → Ambiguity strategies
//! cleaner   → Deps cleaners
//! provider  → Symbol sources (source, java, maven, protobuf, semanticdb)
//! parser    → Parser protocol, subprocess client, memo, scanner
//! cache     → Protobuf run cache
//!   ↓
//! universe  → Registries, known rules, global scope
//! scope     → Trie and overlay scopes
//! imports   → Import / ImportMap
//! symbol    → Symbol records
//! host      → Host build tool contract
//!   ↓
//! base      → Labels, intents, hashes, registries
//! ```

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod base;
pub mod error;
pub mod host;

// ============================================================================
// SYMBOLS & RESOLUTION
// ============================================================================

pub mod imports;
pub mod resolver;
pub mod scope;
pub mod symbol;
pub mod universe;

pub mod cleaner;
pub mod conflict;
pub mod provider;

// ============================================================================
// PARSING & CACHING
// ============================================================================

pub mod cache;
pub mod parser;

// ============================================================================
// EXTENSION
// ============================================================================

pub mod config;
pub mod deps;
pub mod lang;
pub mod rule;

pub use base::Label;
pub use error::{Error, Result};
pub use lang::{Env, ScalaLang};
pub use universe::Universe;
