//! Foundation types shared by every other module.
//!
//! - [`Label`] - Build target identifiers
//! - [`Intent`] - `+name` / `-name` directive arguments
//! - [`sha256_files`] and friends - Content hashes for the run cache
//! - [`Registry`] - Named, additive registries of pluggable implementations
//!
//! This module has NO dependencies on other scala-gazelle modules except the
//! error type.

mod hash;
mod intent;
mod label;
mod registry;

pub use hash::{sha256_bytes, sha256_file, sha256_files};
pub use intent::{Intent, parse_bool};
pub use label::Label;
pub use registry::Registry;
