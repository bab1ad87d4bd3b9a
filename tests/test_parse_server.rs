//! The parse server driven as a child process.

mod common;

use std::path::PathBuf;
use std::time::Duration;

use common::{Repo, flag, library, quiet_env};
use scala_gazelle::ScalaLang;
use scala_gazelle::host::{BuildFile, Config, Walk};
use scala_gazelle::parser::{ParseRequest, Parser, ParserClient, ParserOptions};

fn server() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_scala-parse-server"))
}

#[test]
fn test_client_round_trip() {
    let _ = tracing_subscriber::fmt::try_init();
    let repo = Repo::new();
    let path = repo.write("a/A.scala", "package a\n\nimport b.B\n\nclass A extends B\n");

    let client = ParserClient::new(ParserOptions {
        command: server(),
        args: Vec::new(),
        timeout: Duration::from_secs(30),
        strip_prefix: Some(repo.path().to_path_buf()),
    });
    let response = client
        .parse(&ParseRequest {
            filenames: vec![path.display().to_string()],
        })
        .unwrap();
    assert!(client.is_running());

    assert!(response.error.is_none());
    let file = &response.files[0];
    assert_eq!(file.filename, "a/A.scala");
    assert_eq!(file.packages, vec!["a"]);
    assert_eq!(file.classes, vec!["a.A"]);
    assert_eq!(file.imports, vec!["b.B"]);
    assert_eq!(file.extends["class a.A"].classes, vec!["B"]);

    client.stop();
    assert!(!client.is_running());
}

#[test]
fn test_client_reports_missing_command() {
    let client = ParserClient::new(ParserOptions {
        command: PathBuf::from("/nonexistent/scala-parse-server"),
        ..ParserOptions::default()
    });
    let result = client.parse(&ParseRequest {
        filenames: vec!["A.scala".to_string()],
    });
    assert!(result.is_err());
    assert!(!client.is_running());
}

#[test]
fn test_extension_with_subprocess_parser() {
    let repo = Repo::new();
    repo.write("lib/A.scala", "package lib\n\nclass A\n");
    repo.write("app/App.scala", "package app\n\nimport lib.A\n\nclass App(a: A)\n");

    let mut lang = ScalaLang::new(quiet_env()).unwrap();
    let files = Walk::new(Config::new(repo.path()))
        .run(
            &mut lang,
            &[flag("scala_parser_command", server())],
            vec![
                BuildFile::new("lib").with_rule(library("a", &["A.scala"])),
                BuildFile::new("app").with_rule(library("app", &["App.scala"])),
            ],
        )
        .unwrap();

    assert!(lang.is_ended());
    let app = files.iter().find(|f| f.pkg == "app").unwrap().rule("app").unwrap();
    assert_eq!(app.attr_strings("deps").unwrap(), vec!["//lib:a"]);
}
