//! The extension contract the host drives.

use std::any::Any;
use std::path::PathBuf;

use indexmap::IndexMap;

use super::{BuildFile, Config, FindResult, ImportSpec, Rule, RuleIndex};
use crate::base::Label;
use crate::error::Result;

/// Attributes the host should treat specially for a rule kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KindInfo {
    /// Attributes whose values are computed during resolution.
    pub resolve_attrs: Vec<String>,
}

/// Rule kinds provided by a load statement.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadInfo {
    pub name: String,
    pub symbols: Vec<String>,
}

/// Inputs of [`Language::generate_rules`].
pub struct GenerateArgs<'a> {
    pub config: &'a Config,
    /// Absolute path of the directory being visited.
    pub dir: PathBuf,
    /// Directory relative to the repository root.
    pub rel: &'a str,
    /// The existing build file, if any.
    pub file: Option<&'a BuildFile>,
}

/// Opaque per-rule data handed back to [`Language::resolve`].
pub type ImportsRaw = Box<dyn Any + Send + Sync>;

/// Output of [`Language::generate_rules`].
#[derive(Default)]
pub struct GenerateResult {
    /// Rules to merge into the build file.
    pub rules: Vec<Rule>,
    /// Rules that should be removed if they exist.
    pub empty: Vec<Rule>,
    /// One entry per rule in `rules`.
    pub imports: Vec<ImportsRaw>,
}

/// A language extension.
pub trait Language {
    /// Extension name, also used as the config extension key.
    fn name(&self) -> &str;

    /// Directive keys this extension understands.
    fn known_directives(&self) -> Vec<&'static str>;

    /// Rule kinds this extension manages.
    fn kinds(&self) -> IndexMap<String, KindInfo>;

    /// Load statements for the managed kinds.
    fn loads(&self) -> Vec<LoadInfo>;

    /// Declare command-line flags.
    fn register_flags(&mut self, cmd: clap::Command, c: &mut Config) -> clap::Command;

    /// Validate parsed flags and finish initialization.
    fn check_flags(&mut self, matches: &clap::ArgMatches, c: &mut Config) -> Result<()>;

    /// Apply the directives of the build file in `rel`.
    fn configure(&mut self, c: &mut Config, rel: &str, file: Option<&BuildFile>) -> Result<()>;

    /// Produce the rules for one directory.
    fn generate_rules(&mut self, args: GenerateArgs<'_>) -> Result<GenerateResult>;

    /// Called once after every directory has been generated.
    fn done_generating_rules(&mut self) -> Result<()> {
        Ok(())
    }

    /// Import specs a rule advertises to the rule index.
    fn imports(&self, c: &Config, r: &Rule, f: &BuildFile) -> Vec<ImportSpec>;

    /// Labels embedded by a rule.
    fn embeds(&self, r: &Rule, from: &Label) -> Vec<Label>;

    /// Compute the resolve attributes of a generated rule.
    fn resolve(
        &mut self,
        c: &Config,
        ix: &RuleIndex,
        r: &mut Rule,
        imports_raw: Option<&ImportsRaw>,
        from: &Label,
    ) -> Result<()>;

    /// Answer an import on behalf of another language.
    fn cross_resolve(&self, c: &Config, ix: &RuleIndex, spec: &ImportSpec, lang: &str) -> Vec<FindResult>;
}
