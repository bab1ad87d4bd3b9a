//! Rule kinds the extension manages.

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Load file of the rules_scala rule kinds.
pub const RULES_SCALA_LOAD: &str = "@io_bazel_rules_scala//scala:scala.bzl";

/// What a kind behaves like.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuleFlavor {
    Library,
    Binary,
    Test,
}

impl RuleFlavor {
    /// Flag suffix naming this flavor, e.g. `library`.
    pub fn as_str(self) -> &'static str {
        match self {
            RuleFlavor::Library => "library",
            RuleFlavor::Binary => "binary",
            RuleFlavor::Test => "test",
        }
    }
}

/// A rule kind declared by a load statement, e.g.
/// `//rules:scala.bzl%my_scala_library`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExistingRuleKind {
    pub load: String,
    pub kind: String,
    pub flavor: RuleFlavor,
}

impl ExistingRuleKind {
    /// Parse a `LOAD%KIND` spec.
    pub fn parse(spec: &str, flavor: RuleFlavor) -> Result<Self> {
        match spec.split_once('%') {
            Some((load, kind)) if !load.is_empty() && !kind.is_empty() && !kind.contains('%') => Ok(Self {
                load: load.to_string(),
                kind: kind.to_string(),
                flavor,
            }),
            _ => Err(Error::config(format!(
                "invalid scala_existing_scala_{}_rule {spec:?}: want LOAD%KIND",
                flavor.as_str()
            ))),
        }
    }

    /// `LOAD%KIND`.
    pub fn implementation(&self) -> String {
        format!("{}%{}", self.load, self.kind)
    }

    /// Binaries and tests advertise nothing and carry no `exports`.
    pub fn is_binary(&self) -> bool {
        self.flavor != RuleFlavor::Library || self.kind.contains("binary") || self.kind.contains("test")
    }
}

/// The kinds known to a run, in registration order.
#[derive(Clone, Debug)]
pub struct RuleKinds {
    kinds: IndexMap<String, ExistingRuleKind>,
}

impl Default for RuleKinds {
    fn default() -> Self {
        let mut kinds = IndexMap::new();
        for (kind, flavor) in [
            ("scala_library", RuleFlavor::Library),
            ("scala_macro_library", RuleFlavor::Library),
            ("scala_binary", RuleFlavor::Binary),
            ("scala_test", RuleFlavor::Test),
        ] {
            kinds.insert(
                kind.to_string(),
                ExistingRuleKind {
                    load: RULES_SCALA_LOAD.to_string(),
                    kind: kind.to_string(),
                    flavor,
                },
            );
        }
        Self { kinds }
    }
}

impl RuleKinds {
    /// Add a kind; a later registration of the same kind replaces the
    /// earlier one.
    pub fn add(&mut self, kind: ExistingRuleKind) {
        self.kinds.insert(kind.kind.clone(), kind);
    }

    pub fn get(&self, kind: &str) -> Option<&ExistingRuleKind> {
        self.kinds.get(kind)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Whether rules of `kind` are binary-like. Unknown kinds use the
    /// naming convention.
    pub fn is_binary(&self, kind: &str) -> bool {
        match self.kinds.get(kind) {
            Some(k) => k.is_binary(),
            None => kind.contains("binary") || kind.contains("test"),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExistingRuleKind> {
        self.kinds.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("//rules:scala.bzl%my_library", RuleFlavor::Library, false)]
    #[case("//rules:scala.bzl%my_binary", RuleFlavor::Binary, true)]
    #[case("//rules:scala.bzl%my_test_suite", RuleFlavor::Library, true)]
    fn test_parse_existing_rule(#[case] spec: &str, #[case] flavor: RuleFlavor, #[case] binary: bool) {
        let kind = ExistingRuleKind::parse(spec, flavor).unwrap();
        assert_eq!(kind.load, "//rules:scala.bzl");
        assert_eq!(kind.implementation(), spec);
        assert_eq!(kind.is_binary(), binary);
    }

    #[rstest]
    #[case("no_separator")]
    #[case("%kind")]
    #[case("//load:x.bzl%")]
    #[case("a%b%c")]
    fn test_reject_bad_spec(#[case] spec: &str) {
        let err = ExistingRuleKind::parse(spec, RuleFlavor::Test).unwrap_err();
        assert!(err.to_string().contains("scala_existing_scala_test_rule"));
    }

    #[test]
    fn test_default_kinds() {
        let mut kinds = RuleKinds::default();
        assert!(kinds.contains("scala_library"));
        assert!(!kinds.is_binary("scala_macro_library"));
        assert!(kinds.is_binary("scala_test"));
        assert!(kinds.is_binary("junit_test"));
        assert!(!kinds.is_binary("java_library"));

        kinds.add(ExistingRuleKind::parse("//r:r.bzl%scala_library", RuleFlavor::Library).unwrap());
        assert_eq!(kinds.get("scala_library").unwrap().load, "//r:r.bzl");
        assert_eq!(kinds.iter().count(), 4);
    }
}
