//! Symbols from rules_jvm_external `NAME_install.json` manifests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{ArgMatches, Command};
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{debug, trace};

use super::SymbolProvider;
use crate::base::Label;
use crate::error::{Error, Result};
use crate::host::{Config, flag_values, repeated_flag};
use crate::scope::Scope;
use crate::symbol::{Symbol, SymbolType};
use crate::universe::KnownRule;

const INSTALL_FILE_FLAG: &str = "maven_install_file";
const INSTALL_FILE_SUFFIX: &str = "_install.json";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InstallFile {
    /// Version 1 layout.
    dependency_tree: Option<DependencyTree>,
    /// Version 2 layout: `group:artifact` → packages.
    packages: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DependencyTree {
    dependencies: Vec<Dependency>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Dependency {
    coord: String,
    packages: Vec<String>,
}

/// The label rules_jvm_external generates for `group:artifact`.
pub fn artifact_label(repo: &str, group: &str, artifact: &str) -> Label {
    let name: String = format!("{group}:{artifact}")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    Label::new(repo, "", name)
}

fn parse_coordinate(coord: &str) -> Result<(&str, &str)> {
    let mut parts = coord.split(':');
    match (parts.next(), parts.next()) {
        (Some(group), Some(artifact)) if !group.is_empty() && !artifact.is_empty() => Ok((group, artifact)),
        _ => Err(Error::config(format!("invalid maven coordinate {coord:?}"))),
    }
}

/// Registers a PACKAGE symbol for every package of every artifact listed
/// in `--maven_install_file` manifests. The manifest base name
/// `NAME_install.json` names the external repository.
#[derive(Default)]
pub struct MavenProvider {
    repos: RwLock<Vec<String>>,
}

impl MavenProvider {
    /// Create the provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one manifest into `scope`; returns the repository name.
    pub fn read_install_file(&self, path: &Path, scope: &Arc<dyn Scope>) -> Result<String> {
        let init_error = |message: String| Error::ProviderInit {
            provider: self.name().to_string(),
            path: path.to_path_buf(),
            message,
        };
        let basename = path.file_name().and_then(|s| s.to_str()).unwrap_or_default();
        let repo = basename
            .strip_suffix(INSTALL_FILE_SUFFIX)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| init_error(format!("base name must match NAME{INSTALL_FILE_SUFFIX}")))?
            .to_string();

        let data = fs::read_to_string(path).map_err(|e| init_error(e.to_string()))?;
        let install: InstallFile = serde_json::from_str(&data).map_err(|e| init_error(e.to_string()))?;

        let mut artifacts: Vec<(Label, Vec<String>)> = Vec::new();
        if let Some(tree) = install.dependency_tree {
            for dep in tree.dependencies {
                let (group, artifact) = parse_coordinate(&dep.coord).map_err(|e| init_error(e.to_string()))?;
                artifacts.push((artifact_label(&repo, group, artifact), dep.packages));
            }
        }
        for (coord, packages) in install.packages {
            let (group, artifact) = parse_coordinate(&coord).map_err(|e| init_error(e.to_string()))?;
            artifacts.push((artifact_label(&repo, group, artifact), packages));
        }

        for (label, packages) in &artifacts {
            for package in packages {
                let symbol = Symbol::shared(SymbolType::Package, package.as_str(), self.name(), label.clone());
                if let Err(err) = scope.put_symbol(symbol) {
                    trace!(%err, "maven symbol not registered");
                }
            }
        }
        debug!(repo, artifacts = artifacts.len(), "loaded maven install file");

        let mut repos = self.repos.write();
        if !repos.contains(&repo) {
            repos.push(repo.clone());
        }
        Ok(repo)
    }
}

impl SymbolProvider for MavenProvider {
    fn name(&self) -> &str {
        "maven"
    }

    fn register_flags(&self, cmd: Command) -> Command {
        cmd.arg(repeated_flag(
            INSTALL_FILE_FLAG,
            "path to a rules_jvm_external NAME_install.json file",
        ))
    }

    fn check_flags(&self, matches: &ArgMatches, c: &Config, scope: Arc<dyn Scope>) -> Result<()> {
        for filename in flag_values(matches, INSTALL_FILE_FLAG) {
            let mut path = PathBuf::from(filename);
            if path.is_relative() {
                path = c.work_dir.join(path);
            }
            self.read_install_file(&path, &scope)?;
        }
        Ok(())
    }

    fn can_provide(&self, label: &Label, _known_rule: &dyn Fn(&Label) -> Option<KnownRule>) -> bool {
        !label.repo().is_empty() && self.repos.read().iter().any(|r| r == label.repo())
    }
}
