//! A lexical scanner producing the [`File`] inventory of a Scala source.
//!
//! It does not build a syntax tree. Comments and literals are blanked out,
//! then each line is matched against a handful of patterns while brace
//! depth is tracked, which is enough for package clauses, imports,
//! top-level definitions, their parents and the capitalized names a file
//! mentions.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{ClassList, File};

static DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:private|protected|final|sealed|abstract|implicit|case|lazy|override|open|transparent|inline)(?:\[[^\]]*\])?\s+)*(class|object|trait|type|val|enum)\s+([A-Za-z_][A-Za-z0-9_]*)",
    )
    .unwrap_or_else(|e| panic!("definition pattern: {e}"))
});

static CAPITALIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][A-Za-z0-9_]*\b").unwrap_or_else(|e| panic!("name pattern: {e}")));

static EXTENDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bextends\b").unwrap_or_else(|e| panic!("extends pattern: {e}")));

static WITH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bwith\b|,").unwrap_or_else(|e| panic!("with pattern: {e}")));

static TYPE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap_or_else(|e| panic!("path pattern: {e}")));

/// Scan `source`, reported under `filename`.
pub fn scan(filename: &str, source: &str) -> File {
    let text = blank_comments_and_literals(source);
    let lines: Vec<&str> = text.lines().collect();

    let mut file = File {
        filename: filename.to_string(),
        ..Default::default()
    };
    let mut names = BTreeSet::new();
    // (segment, brace depth at which the clause is in effect)
    let mut packages: Vec<(String, usize)> = Vec::new();
    let mut depth = 0usize;
    let mut index = 0;

    while index < lines.len() {
        let trimmed = lines[index].trim();
        index += 1;
        let package_depth = packages.last().map_or(0, |(_, d)| *d);
        let current = current_package(&packages);

        if let Some(rest) = keyword(trimmed, "import") {
            let mut statement = rest.to_string();
            while brace_balance(&statement) > 0 && index < lines.len() {
                statement.push(' ');
                statement.push_str(lines[index].trim());
                index += 1;
            }
            file.imports.extend(parse_import(&statement));
            continue;
        }

        if let Some(rest) = keyword(trimmed, "package") {
            if let Some(name) = keyword(rest, "object") {
                let name = identifier(name);
                if !name.is_empty() {
                    let fqn = qualify(&current, name);
                    file.objects.push(fqn.clone());
                    push_unique(&mut file.packages, fqn);
                }
            } else {
                let name: String = rest
                    .chars()
                    .take_while(|c| !c.is_whitespace() && *c != '{' && *c != ';')
                    .collect();
                if !name.is_empty() {
                    let opens = rest.contains('{');
                    packages.push((name, if opens { depth + 1 } else { depth }));
                    push_unique(&mut file.packages, current_package(&packages));
                }
            }
            depth = apply_braces(depth, trimmed);
            packages.retain(|(_, d)| *d <= depth);
            continue;
        }

        for m in CAPITALIZED.find_iter(trimmed) {
            names.insert(m.as_str().to_string());
        }

        if depth == package_depth {
            if let Some(caps) = DEFINITION.captures(trimmed) {
                let kind = &caps[1];
                let fqn = qualify(&current, &caps[2]);
                let mut declaration = trimmed.to_string();
                while !declaration.contains('{') && index < lines.len() {
                    let next = lines[index].trim();
                    if keyword(next, "extends").is_none() && keyword(next, "with").is_none() {
                        break;
                    }
                    for m in CAPITALIZED.find_iter(next) {
                        names.insert(m.as_str().to_string());
                    }
                    declaration.push(' ');
                    declaration.push_str(next);
                    depth = apply_braces(depth, next);
                    index += 1;
                }
                let parents = parents(&declaration);
                match kind {
                    "class" | "enum" => file.classes.push(fqn.clone()),
                    "object" => file.objects.push(fqn.clone()),
                    "trait" => file.traits.push(fqn.clone()),
                    "type" => file.types.push(fqn.clone()),
                    _ => file.vals.push(fqn.clone()),
                }
                if !parents.is_empty() {
                    let tag = if kind == "enum" { "class" } else { kind };
                    file.extends.insert(format!("{tag} {fqn}"), ClassList { classes: parents });
                }
            }
        }

        depth = apply_braces(depth, trimmed);
        packages.retain(|(_, d)| *d <= depth);
    }

    file.names = names.into_iter().collect();
    file
}

fn keyword<'a>(line: &'a str, word: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(word)?;
    match rest.chars().next() {
        Some(c) if c.is_whitespace() => Some(rest.trim_start()),
        _ => None,
    }
}

fn identifier(text: &str) -> &str {
    let end = text
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    &text[..end]
}

fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}.{name}")
    }
}

fn current_package(packages: &[(String, usize)]) -> String {
    packages
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

fn brace_balance(text: &str) -> isize {
    text.chars().fold(0, |n, c| match c {
        '{' => n + 1,
        '}' => n - 1,
        _ => n,
    })
}

fn apply_braces(depth: usize, line: &str) -> usize {
    let balance = brace_balance(line);
    depth.saturating_add_signed(balance)
}

/// Imported names of one import statement (without the keyword).
fn parse_import(statement: &str) -> Vec<String> {
    let mut imports = Vec::new();
    for clause in split_top_level(statement.trim_end_matches(';')) {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }
        let Some(open) = clause.find('{') else {
            let path: String = clause.chars().filter(|c| !c.is_whitespace()).collect();
            let path = match clause.split_once(" as ") {
                Some((name, _)) => name.trim().to_string(),
                None => path,
            };
            match path.strip_suffix(".*") {
                Some(prefix) => imports.push(format!("{prefix}._")),
                None => imports.push(path),
            }
            continue;
        };
        let prefix: String = clause[..open]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let prefix = prefix.trim_end_matches('.');
        let close = clause.rfind('}').filter(|c| *c > open).unwrap_or(clause.len());
        for selector in clause[open + 1..close].split(',') {
            let selector = selector.trim();
            if selector.is_empty() || selector == "given" || selector.starts_with("given ") {
                continue;
            }
            if selector == "_" || selector == "*" {
                imports.push(format!("{prefix}._"));
                continue;
            }
            let (name, rename) = match selector.split_once("=>").or_else(|| selector.split_once(" as ")) {
                Some((name, rename)) => (name.trim(), Some(rename.trim())),
                None => (selector, None),
            };
            if rename == Some("_") {
                continue;
            }
            imports.push(format!("{prefix}.{name}"));
        }
    }
    imports
}

fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Parent types named after `extends` in a declaration.
fn parents(declaration: &str) -> Vec<String> {
    let Some(m) = EXTENDS.find(declaration) else {
        return Vec::new();
    };
    let rest = &declaration[m.end()..];
    let rest = rest.split(['{', '=']).next().unwrap_or(rest);
    let rest = rest.strip_suffix(':').unwrap_or(rest);
    let flat = drop_groups(rest);
    WITH.split(&flat)
        .map(str::trim)
        .filter(|p| TYPE_PATH.is_match(p))
        .map(str::to_string)
        .collect()
}

/// Remove `[...]` and `(...)` groups, including nested ones.
fn drop_groups(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            c if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Replace comments and string/char literals by blanks, keeping newlines
/// so line structure survives.
fn blank_comments_and_literals(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let at = |i: usize| chars.get(i).copied();
    let mut out = String::with_capacity(source.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match (c, at(i + 1)) {
            ('/', Some('/')) => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            ('/', Some('*')) => {
                let mut nesting = 1;
                i += 2;
                while i < chars.len() && nesting > 0 {
                    match (chars[i], at(i + 1)) {
                        ('/', Some('*')) => {
                            nesting += 1;
                            i += 2;
                        }
                        ('*', Some('/')) => {
                            nesting -= 1;
                            i += 2;
                        }
                        ('\n', _) => {
                            out.push('\n');
                            i += 1;
                        }
                        _ => i += 1,
                    }
                }
                out.push(' ');
            }
            ('"', Some('"')) if at(i + 2) == Some('"') => {
                i += 3;
                while i < chars.len() && !(chars[i] == '"' && at(i + 1) == Some('"') && at(i + 2) == Some('"')) {
                    if chars[i] == '\n' {
                        out.push('\n');
                    }
                    i += 1;
                }
                i += 3;
                out.push_str("\"\"");
            }
            ('"', _) => {
                i += 1;
                while i < chars.len() && chars[i] != '"' && chars[i] != '\n' {
                    if chars[i] == '\\' {
                        i += 1;
                    }
                    i += 1;
                }
                i += 1;
                out.push_str("\"\"");
            }
            ('\'', Some('\\')) => {
                let close = (i + 2..(i + 9).min(chars.len())).find(|&j| chars[j] == '\'');
                match close {
                    Some(j) => {
                        i = j + 1;
                        out.push_str("' '");
                    }
                    None => {
                        out.push(c);
                        i += 1;
                    }
                }
            }
            ('\'', Some(_)) if at(i + 2) == Some('\'') => {
                i += 3;
                out.push_str("' '");
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a.b.C", &["a.b.C"])]
    #[case("a.b._", &["a.b._"])]
    #[case("a.b.*", &["a.b._"])]
    #[case("a.b.{C, D => E, F => _, _}", &["a.b.C", "a.b.D", "a.b._"])]
    #[case("a.b.C, x.y.Z", &["a.b.C", "x.y.Z"])]
    #[case("a.b.{given, C}", &["a.b.C"])]
    #[case("a.b.C as D", &["a.b.C"])]
    fn test_parse_import(#[case] statement: &str, #[case] want: &[&str]) {
        assert_eq!(parse_import(statement), want);
    }

    #[test]
    fn test_scan_inventory() {
        let source = r#"
package com.example
package service

import com.google.common.base.Optional
import scala.collection.{
  mutable,
  immutable => im
}

// class Commented extends Nope
/* object AlsoCommented */
sealed abstract class Base[T](val x: Int) extends Parent[T] with Logging
case class Impl(name: String)
  extends Base[String](1)
  with Serializable {
  val label = "class InString extends Nope"
  def run(): Option[String] = None
  class Inner
}
object Impl extends (String => Impl)
trait Api
type Alias = Map[String, Int]
"#;
        let file = scan("svc/Impl.scala", source);
        assert_eq!(file.filename, "svc/Impl.scala");
        assert_eq!(file.packages, vec!["com.example", "com.example.service"]);
        assert_eq!(
            file.imports,
            vec![
                "com.google.common.base.Optional",
                "scala.collection.mutable",
                "scala.collection.immutable"
            ]
        );
        assert_eq!(
            file.classes,
            vec!["com.example.service.Base", "com.example.service.Impl"]
        );
        assert_eq!(file.objects, vec!["com.example.service.Impl"]);
        assert_eq!(file.traits, vec!["com.example.service.Api"]);
        assert_eq!(file.types, vec!["com.example.service.Alias"]);
        assert_eq!(
            file.extends["class com.example.service.Base"].classes,
            vec!["Parent", "Logging"]
        );
        assert_eq!(
            file.extends["class com.example.service.Impl"].classes,
            vec!["Base", "Serializable"]
        );
        assert!(!file.extends.contains_key("object com.example.service.Impl"));
        assert!(file.names.contains(&"Option".to_string()));
        assert!(!file.names.contains(&"InString".to_string()));
        assert!(!file.names.contains(&"Commented".to_string()));
    }

    #[test]
    fn test_package_blocks_and_package_objects() {
        let source = "package a {\n  package object b {\n    val x = 1\n  }\n  class C\n}\nclass D\n";
        let file = scan("a.scala", source);
        assert_eq!(file.packages, vec!["a", "a.b"]);
        assert_eq!(file.objects, vec!["a.b"]);
        assert_eq!(file.classes, vec!["a.C", "D"]);
        assert!(file.vals.is_empty());
    }

    #[test]
    fn test_literals_do_not_leak() {
        let text = blank_comments_and_literals("val a = 'x'\nval b = '\\n'\nval s = \"\"\"{\n}\"\"\"\n/* { /* } */ */");
        assert_eq!(brace_balance(&text), 0);
        assert_eq!(text.lines().count(), 5);
    }
}
