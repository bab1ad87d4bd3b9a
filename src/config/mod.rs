//! Per-directory Scala configuration.
//!
//! A [`ScalaConfig`] is created for the root directory when flags are
//! checked and cloned into every child directory before that directory's
//! directives are applied. It lives in the host [`Config`] extension map
//! under [`EXTENSION_NAME`].
//!
//! Recognized directives:
//!
//! | Key | Payload |
//! |-----|---------|
//! | `scala_rule` | `NAME PARAM VALUE...` |
//! | `override` | `LANG glob PATTERN LABEL` |
//! | `implicit_import` | `LANG IMP DEP...` |
//! | `indirect_dependency` | `LANG IMP DEP...` |
//! | `resolve_with` | `KIND NAME LABEL...` |
//! | `resolve_kind_rewrite_name` | `KIND SRC DST` |
//! | `resolve_conflicts` | `[+|-]NAME...` |
//! | `scala_deps_cleaner` | `[+|-]NAME...` |
//! | `scala_explain_dependencies` | `true|false` |
//! | `scala_annotate_imports` | `true|false` |
//! | `scala_log_level` | `debug|info|warn|error` |

use std::str::FromStr;
use std::sync::Arc;

use globset::{Glob, GlobBuilder, GlobMatcher};
use indexmap::IndexMap;

use crate::base::{Intent, Label, parse_bool};
use crate::cleaner::DepsCleaner;
use crate::conflict::{ConflictContext, ConflictResolution, ConflictResolver};
use crate::error::{Error, Result};
use crate::host::{Config, Directive, Rule};
use crate::imports::{Import, ImportMap};
use crate::symbol::SymbolRef;
use crate::universe::Universe;

mod rule_config;

pub use rule_config::RuleConfig;

/// Key of the Scala config in the host extension map.
pub const EXTENSION_NAME: &str = "scala";

pub const SCALA_RULE_DIRECTIVE: &str = "scala_rule";
pub const OVERRIDE_DIRECTIVE: &str = "override";
pub const IMPLICIT_IMPORT_DIRECTIVE: &str = "implicit_import";
pub const INDIRECT_DEPENDENCY_DIRECTIVE: &str = "indirect_dependency";
pub const RESOLVE_WITH_DIRECTIVE: &str = "resolve_with";
pub const RESOLVE_KIND_REWRITE_NAME_DIRECTIVE: &str = "resolve_kind_rewrite_name";
pub const RESOLVE_CONFLICTS_DIRECTIVE: &str = "resolve_conflicts";
pub const DEPS_CLEANER_DIRECTIVE: &str = "scala_deps_cleaner";
pub const EXPLAIN_DEPENDENCIES_DIRECTIVE: &str = "scala_explain_dependencies";
pub const ANNOTATE_IMPORTS_DIRECTIVE: &str = "scala_annotate_imports";
pub const LOG_LEVEL_DIRECTIVE: &str = "scala_log_level";

/// Every directive key this module understands.
pub const DIRECTIVES: [&str; 11] = [
    SCALA_RULE_DIRECTIVE,
    OVERRIDE_DIRECTIVE,
    IMPLICIT_IMPORT_DIRECTIVE,
    INDIRECT_DEPENDENCY_DIRECTIVE,
    RESOLVE_WITH_DIRECTIVE,
    RESOLVE_KIND_REWRITE_NAME_DIRECTIVE,
    RESOLVE_CONFLICTS_DIRECTIVE,
    DEPS_CLEANER_DIRECTIVE,
    EXPLAIN_DEPENDENCIES_DIRECTIVE,
    ANNOTATE_IMPORTS_DIRECTIVE,
    LOG_LEVEL_DIRECTIVE,
];

// ============================================================================
// NAME PATTERNS
// ============================================================================

/// A glob over dotted names. `*` stays within one name segment and `**`
/// crosses segments.
#[derive(Clone, Debug)]
pub struct NameGlob {
    pattern: String,
    matcher: GlobMatcher,
}

impl NameGlob {
    /// Compile `pattern`.
    pub fn new(pattern: &str) -> Result<Self> {
        let glob: Glob = GlobBuilder::new(&pattern.replace('.', "/"))
            .literal_separator(true)
            .build()
            .map_err(|e| Error::config(format!("invalid name pattern {pattern:?}: {e}")))?;
        Ok(Self {
            pattern: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    /// Whether `name` matches.
    pub fn is_match(&self, name: &str) -> bool {
        self.matcher.is_match(name.replace('.', "/"))
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

/// `override LANG glob PATTERN LABEL`.
#[derive(Clone, Debug)]
pub struct OverrideSpec {
    pub lang: String,
    pub pattern: NameGlob,
    pub label: Label,
}

/// `implicit_import LANG IMP DEP...`: seeing IMP implies importing the DEPs.
#[derive(Clone, Debug)]
pub struct ImplicitImportSpec {
    pub lang: String,
    pub imp: NameGlob,
    pub deps: Vec<String>,
}

/// `indirect_dependency LANG IMP DEP...`: resolving IMP implies the DEP labels.
#[derive(Clone, Debug)]
pub struct IndirectDependencySpec {
    pub lang: String,
    pub imp: NameGlob,
    pub deps: Vec<Label>,
}

/// Rewrites a label's name; `%{name}` stands for the current name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelNameRewriteSpec {
    pub src: String,
    pub dst: String,
}

impl LabelNameRewriteSpec {
    pub fn rewrite(&self, from: &Label) -> Label {
        if !(self.src == from.name() || self.src == "%{name}") {
            return from.clone();
        }
        from.with_name(self.dst.replace("%{name}", from.name()))
    }
}

// ============================================================================
// SCALA CONFIG
// ============================================================================

/// Scala configuration of one directory.
#[derive(Clone)]
pub struct ScalaConfig {
    universe: Arc<Universe>,
    rel: String,
    rules: IndexMap<String, RuleConfig>,
    overrides: Vec<OverrideSpec>,
    implicit_imports: Vec<ImplicitImportSpec>,
    indirect_deps: Vec<IndirectDependencySpec>,
    label_name_rewrites: IndexMap<String, LabelNameRewriteSpec>,
    preferred: IndexMap<String, IndexMap<String, Vec<Label>>>,
    conflict_resolvers: Vec<Arc<dyn ConflictResolver>>,
    deps_cleaners: Vec<Arc<dyn DepsCleaner>>,
    explain_dependencies: bool,
    annotate_imports: bool,
    log_level: Option<tracing::Level>,
}

impl ScalaConfig {
    /// An empty config for directory `rel`.
    pub fn new(universe: Arc<Universe>, rel: &str) -> Self {
        Self {
            universe,
            rel: rel.to_string(),
            rules: IndexMap::new(),
            overrides: Vec::new(),
            implicit_imports: Vec::new(),
            indirect_deps: Vec::new(),
            label_name_rewrites: IndexMap::new(),
            preferred: IndexMap::new(),
            conflict_resolvers: Vec::new(),
            deps_cleaners: Vec::new(),
            explain_dependencies: false,
            annotate_imports: false,
            log_level: None,
        }
    }

    /// The config stored in `c`, if any.
    pub fn get(c: &Config) -> Option<Arc<ScalaConfig>> {
        c.ext::<ScalaConfig>(EXTENSION_NAME)
    }

    /// Store this config in `c`.
    pub fn store(self, c: &mut Config) {
        c.set_ext(EXTENSION_NAME, Arc::new(self));
    }

    /// A copy for the child directory `rel`.
    pub fn child(&self, rel: &str) -> Self {
        let mut child = self.clone();
        child.rel = rel.to_string();
        child
    }

    pub fn universe(&self) -> &Arc<Universe> {
        &self.universe
    }

    /// Directory relative to the repository root.
    pub fn rel(&self) -> &str {
        &self.rel
    }

    // ------------------------------------------------------------------------
    // Directive parsing
    // ------------------------------------------------------------------------

    /// Apply every recognized directive in order. Unrecognized keys belong
    /// to other extensions and are skipped.
    pub fn parse_directives(&mut self, directives: &[Directive]) -> Result<()> {
        for d in directives {
            if DIRECTIVES.contains(&d.key.as_str()) {
                self.parse_directive(&d.key, &d.value)
                    .map_err(|e| Error::config(format!("invalid directive \"gazelle:{} {}\": {e}", d.key, d.value)))?;
            }
        }
        Ok(())
    }

    /// Apply a single directive.
    pub fn parse_directive(&mut self, key: &str, value: &str) -> Result<()> {
        let fields: Vec<&str> = value.split_whitespace().collect();
        match key {
            SCALA_RULE_DIRECTIVE => {
                let [name, param, rest @ ..] = fields.as_slice() else {
                    return Err(Error::config(format!("expected three or more fields, got {}", fields.len())));
                };
                if rest.is_empty() {
                    return Err(Error::config(format!("expected three or more fields, got {}", fields.len())));
                }
                let rc = self
                    .rules
                    .entry(name.to_string())
                    .or_insert_with(|| RuleConfig::new(*name, *name));
                rc.parse_directive(param, &rest.join(" "))
            }
            OVERRIDE_DIRECTIVE => {
                let [lang, mode, pattern, label] = fields.as_slice() else {
                    return Err(Error::config(format!("expected LANG glob PATTERN LABEL, got {fields:?}")));
                };
                if *mode != "glob" {
                    return Err(Error::config(format!("unknown override mode {mode:?}")));
                }
                self.overrides.push(OverrideSpec {
                    lang: lang.to_string(),
                    pattern: NameGlob::new(pattern)?,
                    label: Label::parse(label)?,
                });
                Ok(())
            }
            IMPLICIT_IMPORT_DIRECTIVE => {
                let [lang, imp, deps @ ..] = fields.as_slice() else {
                    return Err(Error::config(format!("expected LANG IMP DEP..., got {fields:?}")));
                };
                if deps.is_empty() {
                    return Err(Error::config(format!("expected LANG IMP DEP..., got {fields:?}")));
                }
                self.implicit_imports.push(ImplicitImportSpec {
                    lang: lang.to_string(),
                    imp: NameGlob::new(imp)?,
                    deps: deps.iter().map(|d| d.to_string()).collect(),
                });
                Ok(())
            }
            INDIRECT_DEPENDENCY_DIRECTIVE => {
                let [lang, imp, deps @ ..] = fields.as_slice() else {
                    return Err(Error::config(format!("expected LANG IMP DEP..., got {fields:?}")));
                };
                if deps.is_empty() {
                    return Err(Error::config(format!("expected LANG IMP DEP..., got {fields:?}")));
                }
                self.indirect_deps.push(IndirectDependencySpec {
                    lang: lang.to_string(),
                    imp: NameGlob::new(imp)?,
                    deps: deps.iter().map(|d| Label::parse(d)).collect::<Result<_>>()?,
                });
                Ok(())
            }
            RESOLVE_WITH_DIRECTIVE => {
                let [kind, name, labels @ ..] = fields.as_slice() else {
                    return Err(Error::config(format!("expected KIND NAME LABEL..., got {fields:?}")));
                };
                if labels.is_empty() {
                    return Err(Error::config(format!("expected KIND NAME LABEL..., got {fields:?}")));
                }
                let labels = labels.iter().map(|l| Label::parse(l)).collect::<Result<Vec<_>>>()?;
                self.preferred
                    .entry(kind.to_string())
                    .or_default()
                    .insert(name.to_string(), labels);
                Ok(())
            }
            RESOLVE_KIND_REWRITE_NAME_DIRECTIVE => {
                let [kind, src, dst] = fields.as_slice() else {
                    return Err(Error::config(format!("expected KIND SRC_NAME DST_NAME, got {fields:?}")));
                };
                self.label_name_rewrites.insert(
                    kind.to_string(),
                    LabelNameRewriteSpec {
                        src: src.to_string(),
                        dst: dst.to_string(),
                    },
                );
                Ok(())
            }
            RESOLVE_CONFLICTS_DIRECTIVE => {
                for intent in fields.iter().map(|f| Intent::parse(f)) {
                    self.conflict_resolvers.retain(|r| r.name() != intent.value);
                    if intent.want {
                        let resolver = self.universe.conflict_resolver(&intent.value)?;
                        self.conflict_resolvers.push(resolver);
                    }
                }
                Ok(())
            }
            DEPS_CLEANER_DIRECTIVE => {
                for intent in fields.iter().map(|f| Intent::parse(f)) {
                    self.deps_cleaners.retain(|c| c.name() != intent.value);
                    if intent.want {
                        let cleaner = self.universe.deps_cleaner(&intent.value)?;
                        self.deps_cleaners.push(cleaner);
                    }
                }
                Ok(())
            }
            EXPLAIN_DEPENDENCIES_DIRECTIVE => {
                self.explain_dependencies = bool_payload(key, value)?;
                Ok(())
            }
            ANNOTATE_IMPORTS_DIRECTIVE => {
                self.annotate_imports = bool_payload(key, value)?;
                Ok(())
            }
            LOG_LEVEL_DIRECTIVE => {
                let level = tracing::Level::from_str(value.trim())
                    .map_err(|_| Error::config(format!("{key}: unknown level {value:?}")))?;
                self.log_level = Some(level);
                Ok(())
            }
            _ => Err(Error::config(format!("unknown directive {key:?}"))),
        }
    }

    // ------------------------------------------------------------------------
    // Rule configs
    // ------------------------------------------------------------------------

    /// Register or replace a rule config.
    pub fn put_rule_config(&mut self, rc: RuleConfig) {
        self.rules.insert(rc.name.clone(), rc);
    }

    /// A rule config by name.
    pub fn rule_config(&self, name: &str) -> Option<&RuleConfig> {
        self.rules.get(name)
    }

    /// The enabled rule config whose implementation produces `kind`.
    pub fn rule_config_for_kind(&self, kind: &str) -> Option<&RuleConfig> {
        self.rules.values().find(|rc| rc.enabled && rc.kind() == kind)
    }

    /// Rule configs ordered by name.
    pub fn rule_configs(&self) -> Vec<&RuleConfig> {
        let mut configs: Vec<_> = self.rules.values().collect();
        configs.sort_by(|a, b| a.name.cmp(&b.name));
        configs
    }

    // ------------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------------

    /// The innermost `override` matching `name`.
    pub fn resolve_override(&self, lang: &str, name: &str) -> Option<&Label> {
        self.overrides
            .iter()
            .rev()
            .find(|o| o.lang == lang && o.pattern.is_match(name))
            .map(|o| &o.label)
    }

    /// Names implied by importing `name`, in directive order.
    pub fn implicit_imports(&self, lang: &str, name: &str) -> Vec<&str> {
        self.implicit_imports
            .iter()
            .filter(|spec| spec.lang == lang && spec.imp.is_match(name))
            .flat_map(|spec| spec.deps.iter().map(String::as_str))
            .collect()
    }

    /// Labels implied by resolving `name`, in directive order.
    pub fn indirect_deps(&self, lang: &str, name: &str) -> Vec<&Label> {
        self.indirect_deps
            .iter()
            .filter(|spec| spec.lang == lang && spec.imp.is_match(name))
            .flat_map(|spec| spec.deps.iter())
            .collect()
    }

    /// Labels preferred for `name` by rules of `kind`.
    pub fn preferred_deps(&self, kind: &str, name: &str) -> Option<&[Label]> {
        self.preferred.get(kind)?.get(name).map(Vec::as_slice)
    }

    /// Apply the name rewrite configured for `kind`, if any.
    pub fn rewrite_label(&self, kind: &str, from: &Label) -> Label {
        match self.label_name_rewrites.get(kind) {
            Some(spec) => spec.rewrite(from),
            None => from.clone(),
        }
    }

    // ------------------------------------------------------------------------
    // Strategies
    // ------------------------------------------------------------------------

    /// Replace the active conflict resolvers.
    pub fn set_conflict_resolvers(&mut self, resolvers: Vec<Arc<dyn ConflictResolver>>) {
        self.conflict_resolvers = resolvers;
    }

    /// Active conflict resolver names in order.
    pub fn conflict_resolver_names(&self) -> Vec<&str> {
        self.conflict_resolvers.iter().map(|r| r.name()).collect()
    }

    /// Ask each active conflict resolver in turn; the first to recognize
    /// the conflict decides.
    pub fn resolve_conflict(
        &self,
        ctx: &ConflictContext<'_>,
        imports: &mut ImportMap,
        import: &Import,
        symbol: &SymbolRef,
    ) -> ConflictResolution {
        for resolver in &self.conflict_resolvers {
            match resolver.resolve_conflict(ctx, imports, import, symbol) {
                ConflictResolution::Unrecognized => continue,
                decided => return decided,
            }
        }
        ConflictResolution::Unrecognized
    }

    /// Replace the active deps cleaners.
    pub fn set_deps_cleaners(&mut self, cleaners: Vec<Arc<dyn DepsCleaner>>) {
        self.deps_cleaners = cleaners;
    }

    /// Run every active deps cleaner over `deps`.
    pub fn clean_deps(&self, deps: &mut IndexMap<Label, bool>, rule: &Rule, from: &Label) {
        for cleaner in &self.deps_cleaners {
            cleaner.clean_deps(deps, rule, from);
        }
    }

    // ------------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------------

    pub fn explain_dependencies(&self) -> bool {
        self.explain_dependencies
    }

    pub fn annotate_imports(&self) -> bool {
        self.annotate_imports
    }

    /// Log level set by `scala_log_level`.
    pub fn log_level(&self) -> Option<tracing::Level> {
        self.log_level
    }
}

fn bool_payload(key: &str, value: &str) -> Result<bool> {
    parse_bool(value).ok_or_else(|| Error::config(format!("{key}: not a bool: {value:?}")))
}
