//! Crate-level error type.
//!
//! Fatal conditions (bad directives, unknown names, unreadable index files,
//! a dead or stuck parser) surface as [`Error`]. Per-import and per-file
//! failures are recorded on the import or file instead and never abort a run.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that abort the current operation.
#[derive(Debug, Error)]
pub enum Error {
    /// A malformed directive or flag value.
    #[error("{0}")]
    Config(String),

    /// An index or manifest file could not be loaded.
    #[error("{provider}: failed to load {path}: {message}")]
    ProviderInit {
        /// Name of the provider that owns the file.
        provider: String,
        /// The offending file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// The parser rejected a batch.
    #[error("parse error: {0}")]
    Parse(String),

    /// The parser did not answer within the deadline.
    #[error("parser did not respond within {0:?}")]
    ParserTimeout(std::time::Duration),

    /// The parser process went away.
    #[error("parser process exited: {0}")]
    ParserExited(String),

    /// The same provider registered the same name twice.
    #[error("duplicate symbol {name} from provider {provider} ({label})")]
    DuplicateProvider {
        /// Fully-qualified symbol name.
        name: String,
        /// Provider tag.
        provider: String,
        /// Label the symbol points at.
        label: String,
    },

    /// Two registry entries share a name.
    #[error("duplicate {registry} registration: {name}")]
    DuplicateRegistration {
        /// Which registry rejected the entry.
        registry: &'static str,
        /// The conflicting name.
        name: String,
    },

    /// A flag or directive referenced something that is not registered.
    #[error("{registry} not found: {name}")]
    UnknownName {
        /// Which registry was consulted.
        registry: &'static str,
        /// The missing name.
        name: String,
    },

    /// A label string could not be parsed.
    #[error("invalid label {0:?}")]
    InvalidLabel(String),

    /// The scope does not support the operation.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Filesystem failure with the path that caused it.
    #[error("{path}: {error}")]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        error: std::io::Error,
    },

    /// Raw I/O failure (pipes, processes).
    #[error(transparent)]
    Process(#[from] std::io::Error),

    /// JSON encode/decode failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Cache file could not be decoded.
    #[error("cache decode: {0}")]
    CacheDecode(#[from] prost::DecodeError),

    /// Command-line flags were rejected.
    #[error(transparent)]
    Flags(#[from] clap::Error),
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Attach a path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            error,
        }
    }
}
