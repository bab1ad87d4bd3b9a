//! The host's cross-rule import index.

use rustc_hash::FxHashMap;

use super::Config;
use crate::base::Label;

/// An importable name advertised by a rule, qualified by language.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImportSpec {
    pub lang: String,
    pub imp: String,
}

impl ImportSpec {
    /// Create an import spec.
    pub fn new(lang: impl Into<String>, imp: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            imp: imp.into(),
        }
    }
}

/// A rule that advertises a matching import spec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FindResult {
    pub label: Label,
}

#[derive(Clone, Debug)]
struct IndexedRule {
    label: Label,
    lang: String,
}

/// Maps import specs to the rules that advertise them.
///
/// Populated during generation, frozen by [`RuleIndex::finish`], and queried
/// during resolution.
#[derive(Debug, Default)]
pub struct RuleIndex {
    rules: Vec<IndexedRule>,
    by_import: FxHashMap<ImportSpec, Vec<usize>>,
    finished: bool,
}

impl RuleIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the rule `label`, generated by language `lang`, provides
    /// `imports`. Ignored once the index is finished.
    pub fn add_rule(&mut self, label: Label, lang: &str, imports: Vec<ImportSpec>) {
        if self.finished {
            return;
        }
        let index = self.rules.len();
        self.rules.push(IndexedRule {
            label,
            lang: lang.to_string(),
        });
        for spec in imports {
            let entry = self.by_import.entry(spec).or_default();
            if !entry.contains(&index) {
                entry.push(index);
            }
        }
    }

    /// Freeze the index.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Rules of language `lang` advertising `spec`, in registration order.
    /// A `resolve` directive in `c` answers before the index.
    pub fn find_rules_by_import_with_config(&self, c: &Config, spec: &ImportSpec, lang: &str) -> Vec<FindResult> {
        if let Some(label) = c.find_resolve_override(spec, lang) {
            return vec![FindResult { label: label.clone() }];
        }
        self.by_import
            .get(spec)
            .into_iter()
            .flatten()
            .filter_map(|&i| self.rules.get(i))
            .filter(|rule| rule.lang == lang)
            .map(|rule| FindResult {
                label: rule.label.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_filters_by_language() {
        let mut ix = RuleIndex::new();
        let scala = Label::parse("//a:a").unwrap();
        let java = Label::parse("//j:j").unwrap();
        ix.add_rule(scala.clone(), "scala", vec![ImportSpec::new("scala", "a.A")]);
        ix.add_rule(java.clone(), "java", vec![ImportSpec::new("scala", "a.A")]);
        ix.finish();
        ix.add_rule(Label::parse("//late:late").unwrap(), "scala", vec![ImportSpec::new("scala", "a.A")]);

        let c = Config::default();
        let found = ix.find_rules_by_import_with_config(&c, &ImportSpec::new("scala", "a.A"), "scala");
        assert_eq!(found, vec![FindResult { label: scala }]);
        let found = ix.find_rules_by_import_with_config(&c, &ImportSpec::new("scala", "a.A"), "java");
        assert_eq!(found, vec![FindResult { label: java }]);
        assert!(ix
            .find_rules_by_import_with_config(&c, &ImportSpec::new("scala", "b.B"), "scala")
            .is_empty());
    }
}
