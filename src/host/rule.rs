//! Build-file model: rules, attribute expressions, comments, loads and
//! directives, plus a small deterministic printer.

use std::fmt::Write as _;

use indexmap::IndexMap;

/// The marker comment that pins a dependency.
pub const KEEP_COMMENT: &str = "# keep";

// ============================================================================
// EXPRESSIONS
// ============================================================================

/// Comments attached to an expression or attribute.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Comments {
    /// Whole-line comments printed above the expression.
    pub before: Vec<String>,
    /// Trailing comments printed after the expression on the same line.
    pub suffix: Vec<String>,
}

impl Comments {
    /// Whether there are no comments.
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.suffix.is_empty()
    }
}

/// The shape of an attribute value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExprKind {
    Str(String),
    Ident(String),
    Bool(bool),
    List(Vec<Expr>),
    Call { func: String, args: Vec<Expr> },
}

/// An attribute value with its comments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub comments: Comments,
}

impl Expr {
    fn bare(kind: ExprKind) -> Self {
        Self {
            kind,
            comments: Comments::default(),
        }
    }

    /// A string literal.
    pub fn string(value: impl Into<String>) -> Self {
        Self::bare(ExprKind::Str(value.into()))
    }

    /// A list expression.
    pub fn list(items: Vec<Expr>) -> Self {
        Self::bare(ExprKind::List(items))
    }

    /// A list of string literals.
    pub fn string_list<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Self::list(items.into_iter().map(Expr::string).collect())
    }

    /// A function call with positional arguments.
    pub fn call(func: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::bare(ExprKind::Call {
            func: func.into(),
            args,
        })
    }

    /// An identifier reference.
    pub fn ident(name: impl Into<String>) -> Self {
        Self::bare(ExprKind::Ident(name.into()))
    }

    /// A boolean literal.
    pub fn boolean(value: bool) -> Self {
        Self::bare(ExprKind::Bool(value))
    }

    /// Add a comment line above the expression.
    pub fn with_before(mut self, comment: impl Into<String>) -> Self {
        self.comments.before.push(comment.into());
        self
    }

    /// Add a trailing comment.
    pub fn with_suffix(mut self, comment: impl Into<String>) -> Self {
        self.comments.suffix.push(comment.into());
        self
    }

    /// The string value, if this is a string literal.
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The items, if this is a list.
    pub fn as_list(&self) -> Option<&[Expr]> {
        match &self.kind {
            ExprKind::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether the expression is marked `# keep`.
    pub fn has_keep(&self) -> bool {
        self.comments
            .before
            .iter()
            .chain(&self.comments.suffix)
            .any(|c| is_keep_comment(c))
    }

    /// Render the expression on one line, without comments.
    pub fn inline(&self) -> String {
        match &self.kind {
            ExprKind::Str(s) => quote(s),
            ExprKind::Ident(name) => name.clone(),
            ExprKind::Bool(true) => "True".to_string(),
            ExprKind::Bool(false) => "False".to_string(),
            ExprKind::List(items) => {
                let items: Vec<String> = items.iter().map(Expr::inline).collect();
                format!("[{}]", items.join(", "))
            }
            ExprKind::Call { func, args } => {
                let args: Vec<String> = args.iter().map(Expr::inline).collect();
                format!("{}({})", func, args.join(", "))
            }
        }
    }
}

/// Whether `comment` is a keep marker (`# keep` optionally followed by a
/// reason).
pub fn is_keep_comment(comment: &str) -> bool {
    let body = comment.trim_start_matches('#').trim();
    body == "keep" || body.starts_with("keep:") || body.starts_with("keep ")
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

// ============================================================================
// RULES
// ============================================================================

/// A rule declaration in a build file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    kind: String,
    name: String,
    attrs: IndexMap<String, Expr>,
}

impl Rule {
    /// Create a rule with no attributes besides its name.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            attrs: IndexMap::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: Expr) -> Self {
        self.set_attr(key, value);
        self
    }

    /// The rule kind as written, e.g. `scala_library`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Change the rule kind.
    pub fn set_kind(&mut self, kind: impl Into<String>) {
        self.kind = kind.into();
    }

    /// The rule name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// An attribute value.
    pub fn attr(&self, key: &str) -> Option<&Expr> {
        self.attrs.get(key)
    }

    /// Mutable attribute value.
    pub fn attr_mut(&mut self, key: &str) -> Option<&mut Expr> {
        self.attrs.get_mut(key)
    }

    /// Set or replace an attribute, keeping its position if it exists.
    pub fn set_attr(&mut self, key: impl Into<String>, value: Expr) {
        self.attrs.insert(key.into(), value);
    }

    /// Remove an attribute.
    pub fn del_attr(&mut self, key: &str) -> Option<Expr> {
        self.attrs.shift_remove(key)
    }

    /// A string attribute.
    pub fn attr_string(&self, key: &str) -> Option<&str> {
        self.attr(key).and_then(Expr::as_str)
    }

    /// A list-of-strings attribute; non-string items are skipped.
    pub fn attr_strings(&self, key: &str) -> Option<Vec<String>> {
        let items = self.attr(key)?.as_list()?;
        Some(
            items
                .iter()
                .filter_map(Expr::as_str)
                .map(str::to_string)
                .collect(),
        )
    }

    /// Attribute names in declaration order.
    pub fn attr_keys(&self) -> impl Iterator<Item = &str> {
        self.attrs.keys().map(String::as_str)
    }
}

// ============================================================================
// BUILD FILE
// ============================================================================

/// A `load("module", "symbol", ...)` statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Load {
    pub module: String,
    pub symbols: Vec<String>,
}

impl Load {
    /// Create a load statement.
    pub fn new<S: Into<String>>(module: impl Into<String>, symbols: impl IntoIterator<Item = S>) -> Self {
        Self {
            module: module.into(),
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }
}

/// A `# gazelle:key value` comment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Directive {
    pub key: String,
    pub value: String,
}

impl Directive {
    /// Create a directive.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse a directive comment line.
    pub fn parse(line: &str) -> Option<Self> {
        let body = line.trim().strip_prefix('#')?.trim_start();
        let rest = body.strip_prefix("gazelle:")?;
        let (key, value) = match rest.split_once(char::is_whitespace) {
            Some((key, value)) => (key, value.trim()),
            None => (rest.trim(), ""),
        };
        if key.is_empty() {
            return None;
        }
        Some(Self::new(key, value))
    }
}

/// A build file: the package it belongs to plus its statements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildFile {
    /// Package path relative to the repository root.
    pub pkg: String,
    pub directives: Vec<Directive>,
    pub loads: Vec<Load>,
    pub rules: Vec<Rule>,
}

impl BuildFile {
    /// Create an empty build file for `pkg`.
    pub fn new(pkg: impl Into<String>) -> Self {
        Self {
            pkg: pkg.into(),
            ..Default::default()
        }
    }

    /// Builder-style directive.
    pub fn with_directive(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.directives.push(Directive::new(key, value));
        self
    }

    /// Builder-style load.
    pub fn with_load(mut self, load: Load) -> Self {
        self.loads.push(load);
        self
    }

    /// Builder-style rule.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// The module a kind is loaded from, if any.
    pub fn load_for_kind(&self, kind: &str) -> Option<&str> {
        self.loads
            .iter()
            .find(|load| load.symbols.iter().any(|s| s == kind))
            .map(|load| load.module.as_str())
    }

    /// A rule by name.
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name() == name)
    }

    /// A mutable rule by name.
    pub fn rule_mut(&mut self, name: &str) -> Option<&mut Rule> {
        self.rules.iter_mut().find(|r| r.name() == name)
    }

    /// Render the file. Output depends only on the file's contents.
    pub fn format(&self) -> String {
        let mut out = String::new();
        for directive in &self.directives {
            if directive.value.is_empty() {
                let _ = writeln!(out, "# gazelle:{}", directive.key);
            } else {
                let _ = writeln!(out, "# gazelle:{} {}", directive.key, directive.value);
            }
        }
        if !self.directives.is_empty() {
            out.push('\n');
        }
        for load in &self.loads {
            let symbols: Vec<String> = load.symbols.iter().map(|s| quote(s)).collect();
            let _ = writeln!(out, "load({}, {})", quote(&load.module), symbols.join(", "));
        }
        if !self.loads.is_empty() {
            out.push('\n');
        }
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            format_rule(&mut out, rule);
        }
        out
    }
}

fn format_rule(out: &mut String, rule: &Rule) {
    let _ = writeln!(out, "{}(", rule.kind);
    let _ = writeln!(out, "    name = {},", quote(&rule.name));
    for (key, value) in &rule.attrs {
        for comment in &value.comments.before {
            let _ = writeln!(out, "    {comment}");
        }
        match &value.kind {
            ExprKind::List(items) if !items.is_empty() => {
                let _ = writeln!(out, "    {key} = [");
                for item in items {
                    for comment in &item.comments.before {
                        let _ = writeln!(out, "        {comment}");
                    }
                    let _ = write!(out, "        {},", item.inline());
                    for comment in &item.comments.suffix {
                        let _ = write!(out, "  {comment}");
                    }
                    out.push('\n');
                }
                out.push_str("    ],");
            }
            _ => {
                let _ = write!(out, "    {key} = {},", value.inline());
            }
        }
        for comment in &value.comments.suffix {
            let _ = write!(out, "  {comment}");
        }
        out.push('\n');
    }
    out.push_str(")\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("# keep", true)]
    #[case("#keep", true)]
    #[case("# keep: needed at runtime", true)]
    #[case("# keeper", false)]
    #[case("# unresolved", false)]
    fn test_keep_comment(#[case] comment: &str, #[case] expected: bool) {
        assert_eq!(is_keep_comment(comment), expected);
    }

    #[rstest]
    #[case("# gazelle:scala_explain_dependencies true", Some(("scala_explain_dependencies", "true")))]
    #[case("#gazelle:override scala glob com.foo.** //custom:lib", Some(("override", "scala glob com.foo.** //custom:lib")))]
    #[case("# gazelle:scala_deps_cleaner", Some(("scala_deps_cleaner", "")))]
    #[case("# not a directive", None)]
    #[case("gazelle:missing_hash x", None)]
    fn test_directive_parse(#[case] line: &str, #[case] expected: Option<(&str, &str)>) {
        let parsed = Directive::parse(line);
        assert_eq!(
            parsed.as_ref().map(|d| (d.key.as_str(), d.value.as_str())),
            expected
        );
    }

    #[test]
    fn test_attr_helpers() {
        let mut rule = Rule::new("scala_library", "a")
            .with_attr("srcs", Expr::string_list(["A.scala", "B.scala"]))
            .with_attr("main_class", Expr::string("app.Main"));
        assert_eq!(rule.attr_strings("srcs").unwrap(), vec!["A.scala", "B.scala"]);
        assert_eq!(rule.attr_string("main_class"), Some("app.Main"));
        assert!(rule.attr_strings("main_class").is_none());

        rule.del_attr("srcs");
        assert_eq!(rule.attr_keys().collect::<Vec<_>>(), vec!["main_class"]);
    }

    #[test]
    fn test_format_is_stable() {
        let file = BuildFile::new("lib")
            .with_directive("scala_explain_dependencies", "true")
            .with_load(Load::new("@io_bazel_rules_scala//scala:scala.bzl", ["scala_library"]))
            .with_rule(
                Rule::new("scala_library", "b")
                    .with_attr("srcs", Expr::string_list(["B.scala"]).with_before("# x.Y unresolved"))
                    .with_attr(
                        "deps",
                        Expr::list(vec![
                            Expr::string(":a").with_before("# lib.A (DIRECT of B.scala)"),
                            Expr::string("//x:y").with_suffix(KEEP_COMMENT),
                            Expr::call("scala_dep", vec![Expr::string("//z:z")]),
                        ]),
                    ),
            );
        let expected = "\
# gazelle:scala_explain_dependencies true

load(\"@io_bazel_rules_scala//scala:scala.bzl\", \"scala_library\")

scala_library(
    name = \"b\",
    # x.Y unresolved
    srcs = [
        \"B.scala\",
    ],
    deps = [
        # lib.A (DIRECT of B.scala)
        \":a\",
        \"//x:y\",  # keep
        scala_dep(\"//z:z\"),
    ],
)
";
        assert_eq!(file.format(), expected);
        assert_eq!(file.format(), file.clone().format());
    }

    #[test]
    fn test_expr_keep_and_inline() {
        let kept = Expr::string("//x:y").with_suffix("# keep");
        assert!(kept.has_keep());
        assert!(!Expr::string("//x:y").has_keep());
        assert_eq!(Expr::string("a\"b").inline(), "\"a\\\"b\"");
        assert_eq!(Expr::list(vec![]).inline(), "[]");
        assert_eq!(Expr::boolean(true).inline(), "True");
    }
}
