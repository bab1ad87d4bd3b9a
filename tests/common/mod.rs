//! Shared harness: a temporary repository driven through the host walk
//! with an in-process parser.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use scala_gazelle::error::Result;
use scala_gazelle::host::{BuildFile, Config, Expr, Rule, Walk};
use scala_gazelle::parser::{ParseRequest, ParseResponse, Parser, server};
use scala_gazelle::{Env, ScalaLang};
use tempfile::TempDir;

/// Scans files in-process and counts requests.
pub struct ScanningParser {
    root: PathBuf,
    calls: AtomicUsize,
}

impl ScanningParser {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Parser for ScanningParser {
    fn parse(&self, request: &ParseRequest) -> Result<ParseResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut response = server::handle(request);
        let prefix = format!("{}/", self.root.display());
        for file in &mut response.files {
            if let Some(rel) = file.filename.strip_prefix(&prefix) {
                file.filename = rel.to_string();
            }
        }
        response.elapsed_ms = 0;
        Ok(response)
    }
}

/// Output of one run.
pub struct Run {
    pub files: Vec<BuildFile>,
    pub parse_calls: usize,
}

impl Run {
    pub fn file(&self, pkg: &str) -> &BuildFile {
        self.files
            .iter()
            .find(|f| f.pkg == pkg)
            .unwrap_or_else(|| panic!("no build file for {pkg:?}"))
    }

    pub fn rule(&self, pkg: &str, name: &str) -> &Rule {
        self.file(pkg)
            .rule(name)
            .unwrap_or_else(|| panic!("no rule {pkg}:{name}"))
    }

    /// String items of a list attribute; empty when absent.
    pub fn attr(&self, pkg: &str, name: &str, attr: &str) -> Vec<String> {
        self.rule(pkg, name).attr_strings(attr).unwrap_or_default()
    }

    /// Every build file rendered, in walk order.
    pub fn formatted(&self) -> String {
        self.files.iter().map(|f| format!("## {}\n{}", f.pkg, f.format())).collect()
    }
}

/// A source tree in a temporary directory.
pub struct Repo {
    dir: TempDir,
}

impl Repo {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn run(&self, files: Vec<BuildFile>, args: &[String]) -> Run {
        self.run_with_env(files, args, quiet_env())
    }

    pub fn run_with_env(&self, files: Vec<BuildFile>, args: &[String], env: Env) -> Run {
        let parser = Arc::new(ScanningParser::new(self.path()));
        let mut lang = ScalaLang::with_parser(env, parser.clone()).unwrap();
        let files = Walk::new(Config::new(self.path()))
            .run(&mut lang, args, files)
            .unwrap();
        assert!(lang.is_ended());
        Run {
            files,
            parse_calls: parser.calls(),
        }
    }
}

pub fn quiet_env() -> Env {
    Env {
        show_coverage: false,
        ..Env::default()
    }
}

pub fn library(name: &str, srcs: &[&str]) -> Rule {
    Rule::new("scala_library", name).with_attr("srcs", Expr::string_list(srcs.iter().copied()))
}

pub fn binary(name: &str, srcs: &[&str], main_class: &str) -> Rule {
    Rule::new("scala_binary", name)
        .with_attr("srcs", Expr::string_list(srcs.iter().copied()))
        .with_attr("main_class", Expr::string(main_class))
}

pub fn flag(name: &str, value: impl AsRef<Path>) -> String {
    format!("--{name}={}", value.as_ref().display())
}
