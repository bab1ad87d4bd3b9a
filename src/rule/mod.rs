//! Per-rule aggregation of parsed files.
//!
//! A [`RuleSymbols`] owns the parsed inventory of one rule's sources. From
//! it the rule advertises what it provides to the rule index and derives the
//! ordered set of imports it requires:
//!
//! 1. direct imports, file by file in filename order
//! 2. the `main_class` attribute
//! 3. parents named in extends clauses, attributed to the defining symbol
//! 4. semantic-database imports
//! 5. implicit imports triggered by any of the above, to a fixed point

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use tracing::trace;

use crate::base::Label;
use crate::cache::CachedRule;
use crate::config::ScalaConfig;
use crate::host::{Config, ImportSpec, Rule, RuleIndex};
use crate::imports::{Import, ImportMap};
use crate::parser::File;
use crate::resolver::SymbolResolver;
use crate::scope::Scope;

mod kinds;

pub use kinds::{ExistingRuleKind, RULES_SCALA_LOAD, RuleFlavor, RuleKinds};

/// Language tag used for every lookup this extension performs.
pub const SCALA_LANG: &str = "scala";

/// What a rule needs to resolve its imports.
pub struct ResolveContext<'a> {
    pub config: &'a Config,
    pub scala: &'a ScalaConfig,
    pub index: &'a RuleIndex,
    pub resolver: &'a dyn SymbolResolver,
    /// Symbols visible to extends clauses.
    pub scope: &'a dyn Scope,
}

/// The parsed sources of one rule.
#[derive(Clone, Debug)]
pub struct RuleSymbols {
    from: Label,
    kind: String,
    binary: bool,
    main_class: Option<String>,
    files: Vec<Arc<File>>,
}

impl RuleSymbols {
    /// Aggregate `cached` for the host rule `rule`.
    pub fn new(from: Label, rule: &Rule, cached: CachedRule, binary: bool) -> Self {
        let mut files: Vec<Arc<File>> = cached.files.into_iter().map(Arc::new).collect();
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        Self {
            from,
            kind: rule.kind().to_string(),
            binary,
            main_class: rule
                .attr_string("main_class")
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            files,
        }
    }

    pub fn label(&self) -> &Label {
        &self.from
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn is_binary(&self) -> bool {
        self.binary
    }

    /// Parsed files in filename order.
    pub fn files(&self) -> &[Arc<File>] {
        &self.files
    }

    /// Files the parser could not read.
    pub fn parse_errors(&self) -> impl Iterator<Item = &File> {
        self.files.iter().filter(|f| !f.parse_error.is_empty()).map(|f| &**f)
    }

    /// Names this rule advertises: its top-level definitions and packages.
    /// Binary-like rules advertise nothing.
    pub fn provides(&self) -> Vec<ImportSpec> {
        if self.binary {
            return Vec::new();
        }
        let mut names = BTreeSet::new();
        for file in self.files.iter().filter(|f| f.parse_error.is_empty()) {
            names.extend(file.definitions().map(|(_, name)| name));
            names.extend(file.packages.iter().map(String::as_str));
        }
        names
            .into_iter()
            .map(|name| ImportSpec::new(SCALA_LANG, name))
            .collect()
    }

    /// Derive and resolve the imports of the rule.
    pub fn resolve_imports(&self, ctx: &ResolveContext<'_>) -> ImportMap {
        let mut imports = ImportMap::new();

        for file in &self.files {
            for name in &file.imports {
                imports.put(Import::direct(name.as_str(), file.clone()));
            }
        }

        if let Some(main_class) = &self.main_class {
            imports.put(Import::main_class(main_class.as_str()));
        }

        for file in &self.files {
            for (key, parents) in &file.extends {
                let symbol = key.split_once(' ').map(|(_, fqn)| fqn).unwrap_or(key.as_str());
                for parent in &parents.classes {
                    let name = qualify_in_file(ctx.scope, file, parent).unwrap_or_else(|| parent.clone());
                    if name == symbol {
                        continue;
                    }
                    let mut import = Import::extends(name, Some(file.clone()), symbol);
                    self.resolve(ctx, &mut import);
                    imports.put(import);
                }
            }
        }

        for file in &self.files {
            for name in &file.semantic_imports {
                imports.put(Import::semantic(name.as_str(), file.clone()));
            }
        }

        for import in imports.values_mut().filter(|i| i.is_pending()) {
            self.resolve(ctx, import);
        }

        let mut queue: VecDeque<String> = imports.keys().map(str::to_string).collect();
        let mut seen: BTreeSet<String> = queue.iter().cloned().collect();
        while let Some(src) = queue.pop_front() {
            for dst in ctx.scala.implicit_imports(SCALA_LANG, &src) {
                if !seen.insert(dst.to_string()) {
                    continue;
                }
                let mut import = Import::implicit(dst, src.as_str());
                self.resolve(ctx, &mut import);
                if imports.put(import) {
                    queue.push_back(dst.to_string());
                }
            }
        }

        imports
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, import: &mut Import) {
        match ctx
            .resolver
            .resolve_symbol(ctx.config, ctx.index, &self.from, SCALA_LANG, &import.name)
        {
            Ok(symbol) => import.set_symbol(symbol),
            Err(err) => {
                trace!(label = %self.from, import = %import.name, %err, "unresolved");
                import.set_error(err);
            }
        }
    }
}

/// Qualify a parent type as written in `file`: through an import with the
/// same base name, then relative to the enclosing packages (innermost
/// first), then through wildcard imports, then as a fully-qualified name.
/// The first candidate `scope` knows wins; the symbol itself comes from the
/// resolver chain so overrides apply to parents too.
fn qualify_in_file(scope: &dyn Scope, file: &File, parent: &str) -> Option<String> {
    let (head, tail) = match parent.split_once('.') {
        Some((head, tail)) => (head, Some(tail)),
        None => (parent, None),
    };
    let qualify = |prefix: &str| match tail {
        Some(tail) => format!("{prefix}.{tail}"),
        None => prefix.to_string(),
    };

    let mut candidates = Vec::new();
    for imp in &file.imports {
        if imp.rsplit('.').next() == Some(head) {
            candidates.push(qualify(imp));
        }
    }
    for pkg in file.packages.iter().rev() {
        candidates.push(format!("{pkg}.{parent}"));
    }
    for imp in &file.imports {
        if let Some(prefix) = imp.strip_suffix("._") {
            candidates.push(format!("{prefix}.{parent}"));
        }
    }
    candidates.push(parent.to_string());

    candidates.into_iter().find_map(|name| {
        let found = scope.get_symbol(&name)?;
        (*found.name == *name || !found.symbol_type.is_package()).then_some(name)
    })
}
