//! Process environment knobs, read once per run.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Error, Result};

pub const LOG_FILE_ENV: &str = "SCALA_GAZELLE_LOG_FILE";
pub const SHOW_PROGRESS_ENV: &str = "SCALA_GAZELLE_SHOW_PROGRESS";
pub const SHOW_COVERAGE_ENV: &str = "SCALA_GAZELLE_SHOW_COVERAGE";
pub const UNMANAGED_DEPS_FILE_ENV: &str = "SCALA_GAZELLE_UNMANAGED_DEPS_FILE";

/// Environment settings of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Env {
    /// Where to write the log, if anywhere.
    pub log_file: Option<PathBuf>,
    /// Log each configured package.
    pub show_progress: bool,
    /// Log the managed/recognized rule ratio at the end.
    pub show_coverage: bool,
    /// Where to dump deps kept because no provider manages them.
    pub unmanaged_deps_file: Option<PathBuf>,
}

impl Default for Env {
    fn default() -> Self {
        Self {
            log_file: None,
            show_progress: false,
            show_coverage: true,
            unmanaged_deps_file: None,
        }
    }
}

impl Env {
    /// Read the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let path = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        Self {
            log_file: path(LOG_FILE_ENV),
            show_progress: lookup_bool(&lookup, SHOW_PROGRESS_ENV, defaults.show_progress),
            show_coverage: lookup_bool(&lookup, SHOW_COVERAGE_ENV, defaults.show_coverage),
            unmanaged_deps_file: path(UNMANAGED_DEPS_FILE_ENV),
        }
    }
}

/// `true|1` and `false|0`; anything else, or nothing, is `default`.
fn lookup_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match lookup(key).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}

/// Send `tracing` output to `path`. A subscriber installed earlier stays
/// in place.
pub fn init_logging(path: &Path, level: tracing::Level) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    let installed = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .try_init();
    if installed.is_ok() {
        tracing::info!(path = %path.display(), %level, "logging initialized");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> Env {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Env::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let e = env(&[]);
        assert_eq!(e, Env::default());
        assert!(e.show_coverage);
        assert!(!e.show_progress);
    }

    #[rstest]
    #[case("1", true)]
    #[case("true", true)]
    #[case("0", false)]
    #[case("false", false)]
    #[case("yes", false)]
    fn test_show_progress(#[case] value: &str, #[case] want: bool) {
        assert_eq!(env(&[(SHOW_PROGRESS_ENV, value)]).show_progress, want);
    }

    #[test]
    fn test_unparsable_bool_keeps_default() {
        assert!(env(&[(SHOW_COVERAGE_ENV, "maybe")]).show_coverage);
        assert!(!env(&[(SHOW_COVERAGE_ENV, "0")]).show_coverage);
    }

    #[test]
    fn test_paths() {
        let e = env(&[(LOG_FILE_ENV, "/tmp/sg.log"), (UNMANAGED_DEPS_FILE_ENV, "")]);
        assert_eq!(e.log_file, Some(PathBuf::from("/tmp/sg.log")));
        assert_eq!(e.unmanaged_deps_file, None);
    }
}
