//! Symbols parsed from the rules' own source files.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use clap::ArgMatches;
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::SymbolProvider;
use crate::base::Label;
use crate::cache::CachedRule;
use crate::error::{Error, Result};
use crate::host::Config;
use crate::parser::{ParseRequest, Parser, RuleParser};
use crate::scope::Scope;
use crate::symbol::{Symbol, SymbolType};
use crate::universe::KnownRule;

/// Parses rule sources and registers their top-level definitions, with
/// the rule's label and the rule's kind as provider tag.
pub struct SourceProvider {
    parser: Arc<dyn Parser>,
    scope: RwLock<Arc<dyn Scope>>,
}

impl SourceProvider {
    /// Register into `scope` (replaced by the scope handed to
    /// `check_flags`), parsing with `parser`.
    pub fn new(scope: Arc<dyn Scope>, parser: Arc<dyn Parser>) -> Self {
        Self {
            parser,
            scope: RwLock::new(scope),
        }
    }

    fn put(&self, symbol_type: SymbolType, name: &str, kind: &str, from: &Label) {
        let symbol = Symbol::shared(symbol_type, name, kind, from.clone());
        if let Err(err) = self.scope.read().put_symbol(symbol) {
            warn!(label = %from, symbol = name, %err, "symbol not registered");
        }
    }
}

impl SymbolProvider for SourceProvider {
    fn name(&self) -> &str {
        "source"
    }

    fn check_flags(&self, _matches: &ArgMatches, _c: &Config, scope: Arc<dyn Scope>) -> Result<()> {
        *self.scope.write() = scope;
        Ok(())
    }

    fn can_provide(&self, label: &Label, known_rule: &dyn Fn(&Label) -> Option<KnownRule>) -> bool {
        known_rule(label).is_some()
    }
}

impl RuleParser for SourceProvider {
    fn parse_rule(&self, from: &Label, kind: &str, dir: &Path, srcs: &[String]) -> Result<CachedRule> {
        let mut filenames: Vec<String> = srcs
            .iter()
            .map(|src| dir.join(src).to_string_lossy().into_owned())
            .collect();
        filenames.sort();

        let mut rule = CachedRule {
            label: from.to_string(),
            kind: kind.to_string(),
            ..Default::default()
        };
        if filenames.is_empty() {
            return Ok(rule);
        }

        let start = Instant::now();
        let response = self.parser.parse(&ParseRequest { filenames })?;
        if let Some(error) = response.error.filter(|e| !e.is_empty()) {
            return Err(Error::Parse(format!("{from}: {error}")));
        }
        rule.files = response.files;
        rule.files.sort_by(|a, b| a.filename.cmp(&b.filename));
        rule.parse_time_millis = i64::try_from(start.elapsed().as_millis()).unwrap_or(i64::MAX);

        debug!(
            label = %from,
            kind,
            files = rule.files.len(),
            millis = rule.parse_time_millis,
            "parsed rule"
        );
        self.load_rule(&rule)?;
        Ok(rule)
    }

    fn load_rule(&self, rule: &CachedRule) -> Result<()> {
        let from = Label::parse(&rule.label)?;
        let mut seen = BTreeSet::new();
        let mut packages = BTreeSet::new();

        for file in &rule.files {
            if !file.parse_error.is_empty() {
                warn!(label = %from, file = %file.filename, error = %file.parse_error, "skipping unparsable file");
                continue;
            }
            for (tag, name) in file.definitions() {
                if !seen.insert(name) {
                    continue;
                }
                let symbol_type = match tag {
                    "class" => SymbolType::Class,
                    "object" => SymbolType::Object,
                    "trait" => SymbolType::Trait,
                    "type" => SymbolType::Type,
                    _ => SymbolType::Value,
                };
                self.put(symbol_type, name, &rule.kind, &from);
            }
            packages.extend(file.packages.iter().map(String::as_str));
        }

        for package in packages {
            if seen.contains(package) {
                continue;
            }
            self.put(SymbolType::Package, package, &rule.kind, &from);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{File, ParseResponse};
    use crate::scope::TrieScope;

    struct Canned(ParseResponse);

    impl Parser for Canned {
        fn parse(&self, _request: &ParseRequest) -> Result<ParseResponse> {
            Ok(self.0.clone())
        }
    }

    fn file(name: &str, package: &str, classes: &[&str]) -> File {
        File {
            filename: name.to_string(),
            packages: vec![package.to_string()],
            classes: classes.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_registers_definitions_and_packages() {
        let scope = Arc::new(TrieScope::new());
        let response = ParseResponse {
            files: vec![
                file("B.scala", "lib", &["lib.B"]),
                file("A.scala", "lib", &["lib.A"]),
            ],
            ..Default::default()
        };
        let provider = SourceProvider::new(scope.clone(), Arc::new(Canned(response)));
        let from = Label::parse("//lib:lib").unwrap();

        let rule = provider
            .parse_rule(&from, "scala_library", Path::new("/repo/lib"), &["B.scala".into(), "A.scala".into()])
            .unwrap();
        assert_eq!(rule.files[0].filename, "A.scala");

        let a = scope.get_symbol("lib.A").unwrap();
        assert_eq!(a.symbol_type, SymbolType::Class);
        assert_eq!(&*a.provider, "scala_library");
        assert_eq!(a.label, from);
        let package = scope.get_symbol("lib").unwrap();
        assert_eq!(package.symbol_type, SymbolType::Package);
    }

    #[test]
    fn test_batch_error_is_a_parse_error() {
        let scope = Arc::new(TrieScope::new());
        let response = ParseResponse {
            error: Some("boom".to_string()),
            ..Default::default()
        };
        let provider = SourceProvider::new(scope.clone(), Arc::new(Canned(response)));
        let err = provider
            .parse_rule(&Label::parse("//a:a").unwrap(), "scala_library", Path::new("/r/a"), &["A.scala".into()])
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(scope.is_empty());
    }

    #[test]
    fn test_files_with_parse_errors_register_nothing() {
        let scope = Arc::new(TrieScope::new());
        let mut bad = file("A.scala", "lib", &["lib.A"]);
        bad.parse_error = "unexpected token".to_string();
        let provider = SourceProvider::new(scope.clone(), Arc::new(Canned(ParseResponse::default())));
        provider
            .load_rule(&CachedRule {
                label: "//lib:lib".to_string(),
                kind: "scala_library".to_string(),
                files: vec![bad],
                ..Default::default()
            })
            .unwrap();
        assert!(scope.is_empty());
    }

    #[test]
    fn test_can_provide_known_rules_only() {
        let provider = SourceProvider::new(Arc::new(TrieScope::new()), Arc::new(Canned(ParseResponse::default())));
        let known = Label::parse("//a:a").unwrap();
        let lookup = |l: &Label| {
            (l == &known).then(|| KnownRule {
                label: l.clone(),
                kind: "scala_library".to_string(),
            })
        };
        assert!(provider.can_provide(&Label::parse("//a:a").unwrap(), &lookup));
        assert!(!provider.can_provide(&Label::parse("//b:b").unwrap(), &lookup));
    }
}
