//! The run cache: parsed rules from the previous run, keyed by label and
//! validated by content hash.
//!
//! The on-disk format is a protobuf [`RuleCache`]. Reads are best-effort;
//! a missing or corrupt file only costs a full re-parse.

use std::fs;
use std::path::Path;

use prost::Message;
use tracing::debug;

use crate::error::{Error, Result};
use crate::parser::File;

/// One parsed rule.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct CachedRule {
    /// Label of the rule, in canonical string form.
    #[prost(string, tag = "1")]
    pub label: String,
    /// Kind the rule was declared as.
    #[prost(string, tag = "2")]
    pub kind: String,
    /// SHA-256 over the concatenated hashes of the sorted source files.
    #[prost(string, tag = "3")]
    pub sha256: String,
    /// Wall time spent parsing the rule. Held in memory for logging only;
    /// written as zero.
    #[prost(int64, tag = "4")]
    pub parse_time_millis: i64,
    /// Parsed files, sorted by filename.
    #[prost(message, repeated, tag = "5")]
    pub files: Vec<File>,
}

impl CachedRule {
    /// The first file parse error, if any file failed.
    pub fn parse_error(&self) -> Option<(&str, &str)> {
        self.files
            .iter()
            .find(|f| !f.parse_error.is_empty())
            .map(|f| (f.filename.as_str(), f.parse_error.as_str()))
    }
}

/// The cache file.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RuleCache {
    /// Number of packages visited by the run that wrote the file.
    #[prost(int32, tag = "1")]
    pub package_count: i32,
    /// Rules sorted by label.
    #[prost(message, repeated, tag = "2")]
    pub rules: Vec<CachedRule>,
}

/// Read a cache file.
pub fn read_cache(path: &Path) -> Result<RuleCache> {
    let data = fs::read(path).map_err(|e| Error::io(path, e))?;
    let cache = RuleCache::decode(data.as_slice())?;
    debug!(path = %path.display(), rules = cache.rules.len(), "read rule cache");
    Ok(cache)
}

/// Write a cache file, creating parent directories as needed. Rules are
/// sorted by label and timings dropped so identical runs produce identical
/// bytes.
pub fn write_cache(path: &Path, cache: &RuleCache) -> Result<()> {
    let mut cache = cache.clone();
    cache.rules.sort_by(|a, b| a.label.cmp(&b.label));
    for rule in &mut cache.rules {
        rule.parse_time_millis = 0;
        rule.files.sort_by(|a, b| a.filename.cmp(&b.filename));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, cache.encode_to_vec()).map_err(|e| Error::io(path, e))?;
    debug!(path = %path.display(), rules = cache.rules.len(), "wrote rule cache");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(label: &str) -> CachedRule {
        CachedRule {
            label: label.to_string(),
            kind: "scala_library".to_string(),
            sha256: "abc".to_string(),
            parse_time_millis: 3,
            files: vec![
                File {
                    filename: "B.scala".to_string(),
                    ..Default::default()
                },
                File {
                    filename: "A.scala".to_string(),
                    classes: vec!["lib.A".to_string()],
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn test_write_sorts_and_read_restores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.pb");
        let cache = RuleCache {
            package_count: 2,
            rules: vec![rule("//b:b"), rule("//a:a")],
        };
        write_cache(&path, &cache).unwrap();

        let read = read_cache(&path).unwrap();
        assert_eq!(read.package_count, 2);
        assert_eq!(read.rules[0].label, "//a:a");
        assert_eq!(read.rules[0].files[0].filename, "A.scala");
        assert_eq!(read.rules[0].files[0].classes, vec!["lib.A"]);
    }

    #[test]
    fn test_timings_do_not_change_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let (fast, slow) = (dir.path().join("fast.pb"), dir.path().join("slow.pb"));
        let mut other = rule("//a:a");
        other.parse_time_millis = 250;
        write_cache(&fast, &RuleCache { package_count: 1, rules: vec![rule("//a:a")] }).unwrap();
        write_cache(&slow, &RuleCache { package_count: 1, rules: vec![other] }).unwrap();

        assert_eq!(fs::read(&fast).unwrap(), fs::read(&slow).unwrap());
        assert_eq!(read_cache(&slow).unwrap().rules[0].parse_time_millis, 0);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.pb");
        fs::write(&path, [0xff, 0xff, 0xff]).unwrap();
        assert!(matches!(read_cache(&path), Err(Error::CacheDecode(_))));
        assert!(matches!(read_cache(&dir.path().join("missing.pb")), Err(Error::Io { .. })));
    }

    #[test]
    fn test_parse_error_reports_first_failing_file() {
        let mut r = rule("//a:a");
        assert!(r.parse_error().is_none());
        r.files[1].parse_error = "unexpected token".to_string();
        assert_eq!(r.parse_error(), Some(("A.scala", "unexpected token")));
    }
}
