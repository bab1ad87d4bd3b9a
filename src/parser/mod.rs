//! Source parsing: the parsed-file inventory, the parser subprocess client,
//! the content-hash memo in front of it, and the reference scanner used by
//! the bundled `scala-parse-server` binary.
//!
//! ```text
//! MemoParser  → cache hit? return cached files
//!     ↓
//! RuleParser  (SourceProvider: parse + register symbols)
//!     ↓
//! dyn Parser  (ParserClient → child process, or a test double)
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

mod client;
mod memo;
pub mod scanner;
pub mod server;

pub use client::{ParserClient, ParserOptions};
pub use memo::{MemoParser, RuleParser};

// ============================================================================
// WIRE TYPES
// ============================================================================

/// The symbol inventory of one source file.
///
/// Shared by the parser protocol (JSON) and the run cache (protobuf).
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct File {
    /// Path of the file, relative to the repository root after stripping.
    #[prost(string, tag = "1")]
    pub filename: String,
    /// Package clauses, outermost first, each fully qualified.
    #[prost(string, repeated, tag = "2")]
    pub packages: Vec<String>,
    /// Fully-qualified top-level classes.
    #[prost(string, repeated, tag = "3")]
    pub classes: Vec<String>,
    /// Fully-qualified top-level objects.
    #[prost(string, repeated, tag = "4")]
    pub objects: Vec<String>,
    /// Fully-qualified top-level traits.
    #[prost(string, repeated, tag = "5")]
    pub traits: Vec<String>,
    /// Fully-qualified top-level type aliases.
    #[prost(string, repeated, tag = "6")]
    pub types: Vec<String>,
    /// Fully-qualified top-level vals.
    #[prost(string, repeated, tag = "7")]
    pub vals: Vec<String>,
    /// Names referenced in the file body.
    #[prost(string, repeated, tag = "8")]
    pub names: Vec<String>,
    /// Textual imports, one entry per imported name.
    #[prost(string, repeated, tag = "9")]
    pub imports: Vec<String>,
    /// `"<kind> <fqn>"` → parent types as written.
    #[prost(btree_map = "string, message", tag = "10")]
    pub extends: BTreeMap<String, ClassList>,
    /// Imports reported by a semantic database, if any.
    #[prost(string, repeated, tag = "11")]
    pub semantic_imports: Vec<String>,
    /// Non-empty when the file could not be parsed.
    #[prost(string, tag = "12")]
    pub parse_error: String,
}

/// A list of class names.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassList {
    #[prost(string, repeated, tag = "1")]
    pub classes: Vec<String>,
}

impl File {
    /// Every top-level definition in the file with its symbol kind tag.
    pub fn definitions(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("class", &self.classes),
            ("object", &self.objects),
            ("trait", &self.traits),
            ("type", &self.types),
            ("val", &self.vals),
        ]
        .into_iter()
        .flat_map(|(tag, list)| list.iter().map(move |name| (tag, name.as_str())))
    }

    /// Base name of the file, for annotations.
    pub fn basename(&self) -> &str {
        self.filename.rsplit('/').next().unwrap_or(&self.filename)
    }
}

/// A batch of files to parse.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseRequest {
    pub filenames: Vec<String>,
}

/// Reply to a [`ParseRequest`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseResponse {
    pub files: Vec<File>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: i64,
}

/// Handshake line the parser process prints once it accepts requests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserReady {
    pub ready: bool,
}

// ============================================================================
// PARSER TRAIT
// ============================================================================

/// Anything that can turn a batch of source paths into file inventories.
pub trait Parser: Send + Sync {
    /// Parse the files named in `request`.
    fn parse(&self, request: &ParseRequest) -> Result<ParseResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    fn sample() -> File {
        let mut extends = BTreeMap::new();
        extends.insert(
            "object lib.B".to_string(),
            ClassList {
                classes: vec!["A".to_string()],
            },
        );
        File {
            filename: "lib/B.scala".to_string(),
            packages: vec!["lib".to_string()],
            objects: vec!["lib.B".to_string()],
            imports: vec!["lib.A".to_string()],
            extends,
            ..Default::default()
        }
    }

    #[test]
    fn test_file_json_wire_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["filename"], "lib/B.scala");
        assert_eq!(json["extends"]["object lib.B"]["classes"][0], "A");

        let partial: File = serde_json::from_str(r#"{"filename":"x.scala"}"#).unwrap();
        assert_eq!(partial.filename, "x.scala");
        assert!(partial.imports.is_empty());
    }

    #[test]
    fn test_file_protobuf_preserves_extends() {
        let file = sample();
        let decoded = File::decode(file.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded, file);
    }

    #[test]
    fn test_definitions_and_basename() {
        let file = sample();
        let defs: Vec<_> = file.definitions().collect();
        assert_eq!(defs, vec![("object", "lib.B")]);
        assert_eq!(file.basename(), "B.scala");
    }

    #[test]
    fn test_response_omits_missing_error() {
        let text = serde_json::to_string(&ParseResponse::default()).unwrap();
        assert!(!text.contains("error"));
    }
}
