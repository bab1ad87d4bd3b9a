use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::base::{Label, sha256_files};
use crate::cache::CachedRule;
use crate::error::Result;

/// Parses a rule's sources and registers the resulting symbols.
pub trait RuleParser: Send + Sync {
    /// Parse the `srcs` of `from` (relative to `dir`) and register symbols.
    fn parse_rule(&self, from: &Label, kind: &str, dir: &Path, srcs: &[String]) -> Result<CachedRule>;

    /// Register the symbols of an already-parsed rule.
    fn load_rule(&self, rule: &CachedRule) -> Result<()>;
}

/// Content-hash memo in front of a [`RuleParser`].
///
/// Rules read from the run cache are held until the rule is visited. A
/// visit whose content hash matches replays the cached files instead of
/// parsing; rules never visited pass through to the next cache file
/// untouched and register nothing.
pub struct MemoParser {
    next: Arc<dyn RuleParser>,
    rules: RwLock<IndexMap<String, CachedRule>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl MemoParser {
    /// Wrap `next`.
    pub fn new(next: Arc<dyn RuleParser>) -> Self {
        Self {
            next,
            rules: RwLock::new(IndexMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Seed the memo with rules from a previous run.
    pub fn load_rules(&self, rules: impl IntoIterator<Item = CachedRule>) {
        let mut memo = self.rules.write();
        for rule in rules {
            memo.insert(rule.label.clone(), rule);
        }
    }

    /// Every known rule, sorted by label.
    pub fn rules(&self) -> Vec<CachedRule> {
        let mut rules: Vec<CachedRule> = self.rules.read().values().cloned().collect();
        rules.sort_by(|a, b| a.label.cmp(&b.label));
        rules
    }

    /// Cache hits so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Cache misses so far.
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    /// Parse `from`, reusing the cached result when the source hash and
    /// kind are unchanged.
    pub fn parse_rule(&self, from: &Label, kind: &str, dir: &Path, srcs: &[String]) -> Result<CachedRule> {
        let mut paths: Vec<_> = srcs.iter().map(|src| dir.join(src)).collect();
        paths.sort();
        let sha256 = sha256_files(&paths)?;
        let key = from.to_string();

        let cached = self
            .rules
            .read()
            .get(&key)
            .filter(|rule| rule.sha256 == sha256 && rule.kind == kind)
            .cloned();
        if let Some(rule) = cached {
            debug!(label = %from, "rule cache hit");
            self.hits.fetch_add(1, Ordering::Relaxed);
            self.next.load_rule(&rule)?;
            return Ok(rule);
        }

        debug!(label = %from, %sha256, "rule cache miss");
        self.misses.fetch_add(1, Ordering::Relaxed);
        let mut rule = self.next.parse_rule(from, kind, dir, srcs)?;
        rule.sha256 = sha256;
        self.rules.write().insert(key, rule.clone());
        Ok(rule)
    }
}
