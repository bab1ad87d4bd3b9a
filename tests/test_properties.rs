//! Properties that hold for any run: determinism, idempotence, and the
//! scope and import-map contracts.

mod common;

use std::fs;

use common::{Repo, flag, library};
use proptest::prelude::*;
use scala_gazelle::Label;
use scala_gazelle::cache::read_cache;
use scala_gazelle::host::{BuildFile, Expr};
use scala_gazelle::imports::{Import, ImportMap};
use scala_gazelle::scope::{Scope, TrieScope};
use scala_gazelle::symbol::{Symbol, SymbolType};

fn seed(repo: &Repo) -> Vec<BuildFile> {
    repo.write("lib/A.scala", "package lib\n\ntrait A\n");
    repo.write("lib/B.scala", "package lib\n\nimport lib.A\n\nclass B extends A\n");
    repo.write(
        "app/App.scala",
        "package app\n\nimport lib.{A, B}\n\nobject App {\n  val b: B = new B\n}\n",
    );
    vec![
        BuildFile::new("lib")
            .with_rule(library("a", &["A.scala"]))
            .with_rule(library("b", &["B.scala"])),
        BuildFile::new("app").with_rule(library("app", &["App.scala"])),
    ]
}

#[test]
fn test_identical_inputs_give_identical_outputs() {
    let (left, right) = (Repo::new(), Repo::new());
    let left_cache = left.path().join("cache.pb");
    let right_cache = right.path().join("cache.pb");

    let a = left.run(seed(&left), &[flag("scala_rule_cache_file", &left_cache)]);
    let b = right.run(seed(&right), &[flag("scala_rule_cache_file", &right_cache)]);

    assert_eq!(a.formatted(), b.formatted());
    assert_eq!(fs::read(&left_cache).unwrap(), fs::read(&right_cache).unwrap());
    assert_eq!(read_cache(&left_cache).unwrap().rules.len(), 3);
}

#[test]
fn test_second_pass_changes_nothing() {
    let repo = Repo::new();
    let first = repo.run(seed(&repo), &[]);
    let second = repo.run(first.files.clone(), &[]);
    assert_eq!(second.formatted(), first.formatted());
}

#[test]
fn test_rule_never_depends_on_itself() {
    let repo = Repo::new();
    repo.write("lib/A.scala", "package lib\n\nclass A\n");
    repo.write("lib/B.scala", "package lib\n\nimport lib.A\n\nclass B(a: A)\n");

    let run = repo.run(
        vec![BuildFile::new("lib").with_rule(library("ab", &["A.scala", "B.scala"]))],
        &[],
    );

    assert!(run.attr("lib", "ab", "deps").is_empty());
}

#[test]
fn test_keep_marked_deps_survive() {
    let repo = Repo::new();
    repo.write("lib/A.scala", "package lib\n\nclass A\n");
    repo.write("lib/B.scala", "package lib\n\nclass B\n");

    let run = repo.run(
        vec![
            BuildFile::new("lib")
                .with_rule(library("a", &["A.scala"]))
                .with_rule(library("b", &["B.scala"]).with_attr(
                    "deps",
                    Expr::list(vec![Expr::string("//lib:a").with_suffix("# keep")]),
                )),
        ],
        &[],
    );

    let deps = run.rule("lib", "b").attr("deps").unwrap().as_list().unwrap().to_vec();
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].as_str(), Some("//lib:a"));
    assert!(deps[0].has_keep());
}

#[test]
fn test_import_map_keeps_first_provenance() {
    let mut imports = ImportMap::new();
    assert!(imports.put(Import::implicit("lib.A", "first")));
    assert!(!imports.put(Import::implicit("lib.A", "second")));
    assert!(imports.put(Import::implicit("lib.B", "third")));

    assert_eq!(imports.len(), 2);
    assert_eq!(imports.get("lib.A").unwrap().src, "first");
    assert_eq!(imports.keys().collect::<Vec<_>>(), vec!["lib.A", "lib.B"]);
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-c]{1,2}(\\.[a-c]{1,2}){0,3}"
}

proptest! {
    #[test]
    fn prop_put_then_get_returns_symbol(names in prop::collection::btree_set(name_strategy(), 1..12)) {
        let scope = TrieScope::new();
        for (i, name) in names.iter().enumerate() {
            let label = Label::new("", "pkg", format!("r{i}"));
            scope.put(name, Symbol::shared(SymbolType::Class, name.as_str(), "test", label)).unwrap();
        }
        for name in &names {
            let found = scope.get_symbol(name).unwrap();
            prop_assert_eq!(found.name.as_ref(), name.as_str());
        }
    }

    #[test]
    fn prop_lookup_finds_longest_prefix(names in prop::collection::btree_set(name_strategy(), 1..12)) {
        let scope = TrieScope::new();
        for (i, name) in names.iter().enumerate() {
            let label = Label::new("", "pkg", format!("r{i}"));
            scope.put(name, Symbol::shared(SymbolType::Class, name.as_str(), "test", label)).unwrap();
        }
        for name in &names {
            let query = format!("{name}.zz.yy");
            let found = scope.get_symbol(&query).unwrap();
            prop_assert_eq!(found.name.as_ref(), name.as_str());
        }
    }
}
