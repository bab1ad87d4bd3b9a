//! The dep writer: turns a rule's resolved imports into its `deps` and
//! `exports` attributes.
//!
//! Existing entries survive when they carry a `# keep` comment, when they
//! are not plain labels, or when no active provider manages their label.
//! Every other entry is dropped and the computed labels are added back,
//! so the output depends only on the imports and the kept entries. Lists
//! are sorted by their printed text.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::base::Label;
use crate::config::ScalaConfig;
use crate::conflict::{ConflictContext, ConflictResolution};
use crate::host::{Expr, ExprKind, Rule};
use crate::imports::{Import, ImportKind, ImportMap};
use crate::rule::SCALA_LANG;
use crate::symbol::{SymbolRef, conflict_message};
use crate::universe::Universe;

/// Prefix of the comments written above `srcs` by `scala_annotate_imports`.
pub const IMPORT_ANNOTATION_PREFIX: &str = "# import: ";

/// What writing one rule's deps observed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DepsReport {
    /// Deps kept because no provider manages them.
    pub unmanaged: Vec<Label>,
    /// Imports no resolver layer could answer.
    pub unresolved: Vec<String>,
    /// Imports whose ambiguity no conflict resolver settled.
    pub ambiguous: Vec<String>,
}

/// Writes the resolved dependencies of one rule.
pub struct DepWriter<'a> {
    pub universe: &'a Universe,
    pub scala: &'a ScalaConfig,
    /// Name of the main repository, stripped from labels.
    pub repo_name: &'a str,
    pub from: &'a Label,
    /// Binary-like rules carry no `exports`.
    pub binary: bool,
}

impl DepWriter<'_> {
    /// Settle ambiguous imports, then rewrite `deps`, `exports` and the
    /// configured attributes of `rule`.
    pub fn write(&self, rule: &mut Rule, imports: &mut ImportMap) -> DepsReport {
        // Parents claimed by several labels are never exported, whichever
        // label the conflict resolvers settle on.
        let conflicted_parents: BTreeSet<String> = imports
            .values()
            .filter(|i| i.kind == ImportKind::Extends && i.symbol().is_some_and(|s| s.has_conflicts()))
            .map(|i| i.name.clone())
            .collect();
        for name in &conflicted_parents {
            debug!(from = %self.from, parent = %name, "not exporting conflicted parent");
        }
        let ambiguous = self.resolve_conflicts(rule, imports);
        let mut report = DepsReport {
            unresolved: imports
                .values()
                .filter(|i| i.error().is_some())
                .map(|i| i.name.clone())
                .collect(),
            ambiguous: ambiguous.keys().cloned().collect(),
            ..Default::default()
        };

        let mut wanted = self.wanted_deps(rule, imports, |_| true);
        self.add_configured_deps(rule, imports, &mut wanted);
        let mut flags: IndexMap<Label, bool> = wanted.keys().map(|l| (l.clone(), true)).collect();
        if let Some(rc) = self.scala.rule_config_for_kind(rule.kind()) {
            for dep in rc.unwanted_deps() {
                if let Ok(label) = Label::parse(dep) {
                    flags.insert(self.absolute(&label), false);
                }
            }
        }
        self.scala.clean_deps(&mut flags, rule, self.from);
        wanted.retain(|label, _| flags.get(label).copied().unwrap_or(false));

        self.merge_attr(rule, "deps", wanted, &ambiguous, &mut report.unmanaged);

        if !self.binary {
            let exports = self.wanted_deps(rule, imports, |i| {
                i.kind == ImportKind::Extends && !conflicted_parents.contains(&i.name)
            });
            self.merge_attr(rule, "exports", exports, &ambiguous, &mut report.unmanaged);
        }

        self.apply_configured_attrs(rule);
        if self.scala.annotate_imports() {
            annotate_imports(rule, imports);
        }
        report
    }

    /// Run the configured conflict resolvers over every ambiguous import.
    /// Returns the imports no resolver recognized, with their symbols.
    pub fn resolve_conflicts(&self, rule: &Rule, imports: &mut ImportMap) -> IndexMap<String, SymbolRef> {
        let ctx = ConflictContext {
            universe: self.universe,
            config: self.scala,
            rule,
            from: self.from,
        };
        let mut ambiguous = IndexMap::new();
        // Strategies may append imports, which are visited too.
        let mut index = 0;
        while index < imports.len() {
            let Some(import) = imports.get_index(index).cloned() else {
                break;
            };
            index += 1;
            let Some(symbol) = import.symbol().filter(|s| s.has_conflicts()).cloned() else {
                continue;
            };
            match self.scala.resolve_conflict(&ctx, imports, &import, &symbol) {
                ConflictResolution::Winner(winner) => {
                    debug!(from = %self.from, import = %import.name, winner = %winner.label, "conflict resolved");
                    if let Some(entry) = imports.get_index_mut(index - 1) {
                        entry.set_symbol(winner);
                    }
                }
                ConflictResolution::Elide => {
                    if let Some(entry) = imports.get_index_mut(index - 1) {
                        entry.elide();
                    }
                }
                ConflictResolution::Unrecognized => {
                    warn!("{}", conflict_message(&symbol, &import.name, self.from));
                    ambiguous.insert(import.name.clone(), symbol);
                }
            }
        }
        ambiguous
    }

    /// Labels required by the imports selected by `filter`, each with the
    /// imports that justify it, in first-seen order.
    fn wanted_deps(
        &self,
        rule: &Rule,
        imports: &ImportMap,
        filter: impl Fn(&Import) -> bool,
    ) -> IndexMap<Label, Vec<String>> {
        let own = self.scala.rewrite_label(rule.kind(), self.from);
        let mut wanted: IndexMap<Label, Vec<String>> = IndexMap::new();
        for import in imports.values().filter(|i| filter(i)) {
            let Some(symbol) = import.symbol() else {
                continue;
            };
            if symbol.label.is_empty() {
                continue;
            }
            let label = self.target_label(symbol);
            if label == *self.from || label == own {
                continue;
            }
            wanted
                .entry(label)
                .or_default()
                .push(format!("{} ({})", import.name, import.origin()));
        }
        wanted
    }

    /// The label a rule should depend on to get `symbol`: repo-normalized,
    /// then renamed by the rewrite configured for the target's kind.
    fn target_label(&self, symbol: &SymbolRef) -> Label {
        let label = self.absolute(&symbol.label);
        let kind = match self.universe.known_rule(&label) {
            Some(known) => known.kind,
            None => symbol.provider.to_string(),
        };
        self.scala.rewrite_label(&kind, &label)
    }

    fn add_configured_deps(&self, rule: &Rule, imports: &ImportMap, wanted: &mut IndexMap<Label, Vec<String>>) {
        for import in imports.values().filter(|i| i.symbol().is_some()) {
            for dep in self.scala.indirect_deps(SCALA_LANG, &import.name) {
                let label = self.absolute(dep);
                if label != *self.from {
                    wanted.entry(label).or_default().push(format!("indirect of {}", import.name));
                }
            }
        }
        if let Some(rc) = self.scala.rule_config_for_kind(rule.kind()) {
            for dep in rc.wanted_deps() {
                match Label::parse(dep) {
                    Ok(label) => wanted
                        .entry(self.absolute(&label))
                        .or_default()
                        .push(format!("scala_rule {}", rc.name)),
                    Err(err) => warn!(from = %self.from, dep, %err, "ignoring configured dep"),
                }
            }
        }
    }

    fn absolute(&self, label: &Label) -> Label {
        label
            .abs(self.from.repo(), self.from.pkg())
            .normalize_repo(self.repo_name)
    }

    fn dep_label(&self, expr: &Expr) -> Option<Label> {
        let text = match &expr.kind {
            ExprKind::Str(s) => s.as_str(),
            ExprKind::Call { func, args } if func == "scala_dep" && args.len() == 1 => args[0].as_str()?,
            _ => return None,
        };
        Label::parse(text).ok().map(|l| self.absolute(&l))
    }

    /// Merge `wanted` into the list attribute `attr`.
    fn merge_attr(
        &self,
        rule: &mut Rule,
        attr: &str,
        mut wanted: IndexMap<Label, Vec<String>>,
        ambiguous: &IndexMap<String, SymbolRef>,
        unmanaged: &mut Vec<Label>,
    ) {
        let mut items = Vec::new();
        let current = rule.attr(attr).cloned();
        if let Some(items_in) = current.as_ref().and_then(Expr::as_list) {
            for item in items_in {
                let label = self.dep_label(item);
                if item.has_keep() {
                    if let Some(label) = &label {
                        wanted.shift_remove(label);
                    }
                    items.push(item.clone());
                    continue;
                }
                let Some(label) = label else {
                    items.push(item.clone());
                    continue;
                };
                if !self.universe.can_provide(&label) {
                    wanted.shift_remove(&label);
                    if !unmanaged.contains(&label) {
                        unmanaged.push(label);
                    }
                    items.push(item.clone());
                }
            }
        }

        for (label, reasons) in wanted {
            let mut item = Expr::string(label.rel(self.from.repo(), self.from.pkg()).to_string());
            if self.scala.explain_dependencies() {
                for reason in reasons {
                    item = item.with_before(format!("# {reason}"));
                }
                for (name, symbol) in ambiguous {
                    if self.target_label(symbol) != label {
                        continue;
                    }
                    let others: BTreeSet<String> =
                        symbol.conflicts().iter().map(|c| c.label.to_string()).collect();
                    let others: Vec<String> = others.into_iter().collect();
                    item = item.with_before(format!("# ambiguous: {name} also provided by {}", others.join(", ")));
                }
            }
            items.push(item);
        }

        items.sort_by_cached_key(Expr::inline);
        if items.is_empty() {
            rule.del_attr(attr);
            return;
        }
        let mut expr = current.unwrap_or_else(|| Expr::list(Vec::new()));
        expr.kind = ExprKind::List(items);
        rule.set_attr(attr, expr);
    }

    /// Add and remove the attribute values configured by `scala_rule NAME
    /// attr ATTR VALUE...`.
    fn apply_configured_attrs(&self, rule: &mut Rule) {
        let Some(rc) = self.scala.rule_config_for_kind(rule.kind()) else {
            return;
        };
        for (attr, values) in &rc.attrs {
            let mut current = rule.attr_strings(attr).unwrap_or_default();
            for (value, want) in values {
                if *want && !current.contains(value) {
                    current.push(value.clone());
                } else if !*want {
                    current.retain(|v| v != value);
                }
            }
            if current.is_empty() {
                rule.del_attr(attr);
            } else {
                rule.set_attr(attr.as_str(), Expr::string_list(current));
            }
        }
    }
}

/// Replace the import annotations above `srcs` with one line per import.
pub fn annotate_imports(rule: &mut Rule, imports: &ImportMap) {
    let Some(srcs) = rule.attr_mut("srcs") else {
        return;
    };
    srcs.comments
        .before
        .retain(|c| !c.starts_with(IMPORT_ANNOTATION_PREFIX));
    for import in imports.values() {
        let line = match (import.symbol(), import.is_elided()) {
            (Some(symbol), _) if symbol.label.is_empty() => {
                format!("{} builtin ({})", import.name, import.origin())
            }
            (Some(symbol), _) => format!("{} -> {} ({})", import.name, symbol.label, import.origin()),
            (None, true) => format!("{} elided ({})", import.name, import.origin()),
            (None, false) => format!("{} unresolved ({})", import.name, import.origin()),
        };
        srcs.comments.before.push(format!("{IMPORT_ANNOTATION_PREFIX}{line}"));
    }
}
