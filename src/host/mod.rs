//! The host build tool's extension surface.
//!
//! The host owns directory traversal, build-file parsing and printing, and
//! the cross-rule import index. This module carries a typed rendering of
//! that contract so the extension can be driven end to end:
//!
//! - [`Rule`], [`Expr`], [`BuildFile`] - Build-file model
//! - [`Config`] - Per-directory host configuration with extension slots
//! - [`RuleIndex`], [`ImportSpec`] - Cross-rule import index
//! - [`Language`] - The callbacks an extension implements
//! - [`Walk`] - A two-phase driver over a set of build files
//! - [`flag_values`] and friends - Shared flag declaration and lookup

mod config;
mod flags;
mod language;
mod resolve;
mod rule;
mod walk;

pub use config::{Config, ResolveOverride};
pub use flags::{flag_value, flag_values, repeated_flag, string_flag};
pub use language::{GenerateArgs, GenerateResult, ImportsRaw, KindInfo, Language, LoadInfo};
pub use resolve::{FindResult, ImportSpec, RuleIndex};
pub use rule::{BuildFile, Comments, Directive, Expr, ExprKind, KEEP_COMMENT, Load, Rule, is_keep_comment};
pub use walk::Walk;
