//! Build target labels.
//!
//! A label names a rule: `@repo//path/to/pkg:name`. The empty label is the
//! "no label" sentinel used for language built-ins that need no dependency.

use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;

use crate::error::{Error, Result};

/// A parsed target label.
///
/// Relative labels (`:name`, bare `name`) carry only a name until they are
/// made absolute with [`Label::abs`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label {
    repo: SmolStr,
    pkg: SmolStr,
    name: SmolStr,
    relative: bool,
}

impl Label {
    /// The empty "no label" sentinel.
    pub const fn no_label() -> Self {
        Self {
            repo: SmolStr::new_inline(""),
            pkg: SmolStr::new_inline(""),
            name: SmolStr::new_inline(""),
            relative: false,
        }
    }

    /// Create an absolute label from its parts.
    pub fn new(repo: impl Into<SmolStr>, pkg: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self {
            repo: repo.into(),
            pkg: pkg.into(),
            name: name.into(),
            relative: false,
        }
    }

    /// Parse a label string.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidLabel(s.to_string());
        if s.is_empty() || s.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
            return Err(invalid());
        }

        let (repo, rest) = if let Some(stripped) = s.strip_prefix('@') {
            let stripped = stripped.strip_prefix('@').unwrap_or(stripped);
            match stripped.find("//") {
                Some(idx) => (&stripped[..idx], &stripped[idx..]),
                None => {
                    // `@repo` is shorthand for `@repo//:repo`
                    if stripped.is_empty() || stripped.contains(':') || stripped.contains('/') {
                        return Err(invalid());
                    }
                    return Ok(Self::new(stripped, "", stripped));
                }
            }
        } else {
            ("", s)
        };

        if let Some(abs) = rest.strip_prefix("//") {
            let (pkg, name) = match abs.split_once(':') {
                Some((pkg, name)) => (pkg, name),
                None => (abs, abs.rsplit('/').next().unwrap_or(abs)),
            };
            if pkg.starts_with('/') || pkg.ends_with('/') || pkg.contains("//") {
                return Err(invalid());
            }
            if name.is_empty() {
                return Err(invalid());
            }
            return Ok(Self::new(repo, pkg, name));
        }

        if !repo.is_empty() {
            return Err(invalid());
        }

        let name = rest.strip_prefix(':').unwrap_or(rest);
        if name.is_empty() || name.contains(':') {
            return Err(invalid());
        }
        Ok(Self {
            repo: SmolStr::default(),
            pkg: SmolStr::default(),
            name: name.into(),
            relative: true,
        })
    }

    /// Whether this is the no-label sentinel.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.pkg.is_empty() && self.repo.is_empty()
    }

    /// The external repository name, empty for the main workspace.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// The package path.
    pub fn pkg(&self) -> &str {
        &self.pkg
    }

    /// The target name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the label was written relative to its package.
    pub fn is_relative(&self) -> bool {
        self.relative
    }

    /// Resolve a relative label against a repo and package.
    pub fn abs(&self, repo: &str, pkg: &str) -> Self {
        if !self.relative {
            return self.clone();
        }
        Self::new(repo, pkg, self.name.clone())
    }

    /// Express the label relative to `repo` and `pkg` where possible.
    pub fn rel(&self, repo: &str, pkg: &str) -> Self {
        if self.relative || self.is_empty() {
            return self.clone();
        }
        if self.repo == repo {
            if self.pkg == pkg {
                return Self {
                    repo: SmolStr::default(),
                    pkg: SmolStr::default(),
                    name: self.name.clone(),
                    relative: true,
                };
            }
            return Self::new("", self.pkg.clone(), self.name.clone());
        }
        self.clone()
    }

    /// Drop the repo component when it names the main workspace.
    pub fn normalize_repo(&self, repo_name: &str) -> Self {
        if !repo_name.is_empty() && self.repo == repo_name {
            return Self::new("", self.pkg.clone(), self.name.clone());
        }
        self.clone()
    }

    /// Replace the name component.
    pub fn with_name(&self, name: impl Into<SmolStr>) -> Self {
        Self {
            repo: self.repo.clone(),
            pkg: self.pkg.clone(),
            name: name.into(),
            relative: self.relative,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        if self.relative {
            return write!(f, ":{}", self.name);
        }
        if !self.repo.is_empty() {
            write!(f, "@{}", self.repo)?;
        }
        write!(f, "//{}:{}", self.pkg, self.name)
    }
}

impl FromStr for Label {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
