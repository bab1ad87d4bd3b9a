//! Per-kind rule knobs set with `scala_rule NAME PARAM VALUE`.

use indexmap::IndexMap;

use crate::base::{Intent, Label, parse_bool};
use crate::error::{Error, Result};

/// Configuration of one rule kind the extension manages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleConfig {
    /// Name the directives refer to.
    pub name: String,
    /// `LOAD%KIND`, e.g. `@io_bazel_rules_scala//scala:scala.bzl%scala_library`.
    pub implementation: String,
    /// Whether rules of this kind are managed at all.
    pub enabled: bool,
    /// Extra deps to add (`true`) or remove (`false`).
    pub deps: IndexMap<String, bool>,
    /// Attribute values to add (`true`) or remove (`false`).
    pub attrs: IndexMap<String, IndexMap<String, bool>>,
}

impl RuleConfig {
    /// An enabled config.
    pub fn new(name: impl Into<String>, implementation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            implementation: implementation.into(),
            enabled: true,
            deps: IndexMap::new(),
            attrs: IndexMap::new(),
        }
    }

    /// The load part of the implementation.
    pub fn load(&self) -> &str {
        match self.implementation.split_once('%') {
            Some((load, _)) => load,
            None => "",
        }
    }

    /// The rule kind of the implementation.
    pub fn kind(&self) -> &str {
        match self.implementation.split_once('%') {
            Some((_, kind)) => kind,
            None => &self.implementation,
        }
    }

    /// Apply one `PARAM VALUE` pair.
    pub fn parse_directive(&mut self, param: &str, value: &str) -> Result<()> {
        let invalid = |message: String| Error::config(format!("scala_rule {}: {message}", self.name));
        match param {
            "dep" | "deps" => {
                for arg in value.split_whitespace() {
                    let intent = Intent::parse(arg);
                    Label::parse(&intent.value)?;
                    self.deps.insert(intent.value, intent.want);
                }
            }
            "attr" => {
                let mut fields = value.split_whitespace();
                let Some(attr) = fields.next() else {
                    return Err(invalid("attr wants NAME VALUE...".to_string()));
                };
                let values = self.attrs.entry(attr.to_string()).or_default();
                for arg in fields {
                    let intent = Intent::parse(arg);
                    values.insert(intent.value, intent.want);
                }
            }
            "implementation" => {
                if !value.contains('%') {
                    return Err(invalid(format!("implementation {value:?} wants LOAD%KIND")));
                }
                self.implementation = value.to_string();
            }
            "enabled" => {
                self.enabled = parse_bool(value).ok_or_else(|| invalid(format!("enabled: not a bool: {value:?}")))?;
            }
            _ => return Err(invalid(format!("unknown parameter {param:?}"))),
        }
        Ok(())
    }

    /// Deps the rule must always carry.
    pub fn wanted_deps(&self) -> impl Iterator<Item = &str> {
        self.deps.iter().filter(|(_, want)| **want).map(|(dep, _)| dep.as_str())
    }

    /// Deps the rule must never carry.
    pub fn unwanted_deps(&self) -> impl Iterator<Item = &str> {
        self.deps.iter().filter(|(_, want)| !**want).map(|(dep, _)| dep.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        let mut rc = RuleConfig::new("scala_library", "@io_bazel_rules_scala//scala:scala.bzl%scala_library");
        rc.parse_directive("deps", "//a:a -//b:b").unwrap();
        rc.parse_directive("attr", "scalacopts +-Xfatal-warnings -Ywarn").unwrap();
        rc.parse_directive("implementation", "//rules:scala.bzl%my_library").unwrap();
        rc.parse_directive("enabled", "false").unwrap();

        assert_eq!(rc.wanted_deps().collect::<Vec<_>>(), vec!["//a:a"]);
        assert_eq!(rc.unwanted_deps().collect::<Vec<_>>(), vec!["//b:b"]);
        assert!(rc.attrs["scalacopts"]["-Xfatal-warnings"]);
        assert!(!rc.attrs["scalacopts"]["Ywarn"]);
        assert_eq!(rc.load(), "//rules:scala.bzl");
        assert_eq!(rc.kind(), "my_library");
        assert!(!rc.enabled);
    }

    #[test]
    fn test_rejects_bad_params() {
        let mut rc = RuleConfig::new("x", "//x:x.bzl%x");
        assert!(rc.parse_directive("implementation", "no_percent").is_err());
        assert!(rc.parse_directive("enabled", "maybe").is_err());
        assert!(rc.parse_directive("colour", "red").is_err());
        let err = rc.parse_directive("colour", "red").unwrap_err();
        assert!(err.to_string().contains("unknown parameter \"colour\""));
    }
}
