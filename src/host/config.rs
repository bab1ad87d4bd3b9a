//! Host configuration passed to every extension callback.

use std::any::Any;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::ImportSpec;
use crate::base::Label;
use crate::error::{Error, Result};

/// A host-level `# gazelle:resolve IMP_LANG LANG IMP LABEL` directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveOverride {
    /// The import being answered.
    pub spec: ImportSpec,
    /// Language of the rule doing the lookup.
    pub lang: String,
    /// The label to answer with.
    pub label: Label,
}

impl ResolveOverride {
    /// Parse the payload of a `resolve` directive. The language of the
    /// import may be omitted, in which case it equals the rule language.
    pub fn parse(value: &str) -> Result<Self> {
        let fields: Vec<&str> = value.split_whitespace().collect();
        let (imp_lang, lang, imp, label) = match fields.as_slice() {
            [lang, imp, label] => (*lang, *lang, *imp, *label),
            [imp_lang, lang, imp, label] => (*imp_lang, *lang, *imp, *label),
            _ => {
                return Err(Error::config(format!(
                    "invalid resolve directive {value:?}: want [IMP_LANG] LANG IMP LABEL"
                )));
            }
        };
        Ok(Self {
            spec: ImportSpec::new(imp_lang, imp),
            lang: lang.to_string(),
            label: Label::parse(label)?,
        })
    }
}

/// Per-directory configuration owned by the host.
///
/// Extensions keep their own state in [`Config::exts`], keyed by extension
/// name. The host clones the parent directory's config before configuring a
/// child, so values stored as `Arc` are shared until replaced.
#[derive(Clone, Default)]
pub struct Config {
    /// Absolute path of the repository root.
    pub repo_root: PathBuf,
    /// Directory the tool was invoked from.
    pub work_dir: PathBuf,
    /// Name of the main repository, used to normalize labels.
    pub repo_name: String,
    /// `resolve` directives in effect for this directory, innermost last.
    pub resolve_overrides: Vec<ResolveOverride>,
    /// Extension-specific configuration.
    pub exts: FxHashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Config {
    /// Create a config rooted at `repo_root`.
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        let repo_root = repo_root.into();
        Self {
            work_dir: repo_root.clone(),
            repo_root,
            ..Default::default()
        }
    }

    /// Typed access to an extension value.
    pub fn ext<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.exts.get(key).cloned()?.downcast::<T>().ok()
    }

    /// Store an extension value.
    pub fn set_ext<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: Arc<T>) {
        self.exts.insert(key.into(), value);
    }

    /// The innermost `resolve` directive answering `spec` for `lang`.
    pub fn find_resolve_override(&self, spec: &ImportSpec, lang: &str) -> Option<&Label> {
        self.resolve_overrides
            .iter()
            .rev()
            .find(|o| o.lang == lang && &o.spec == spec)
            .map(|o| &o.label)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.exts.keys().collect();
        keys.sort();
        f.debug_struct("Config")
            .field("repo_root", &self.repo_root)
            .field("repo_name", &self.repo_name)
            .field("resolve_overrides", &self.resolve_overrides.len())
            .field("exts", &keys)
            .finish()
    }
}
