//! Named registries of pluggable implementations.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// An insertion-ordered map from name to a shared implementation.
///
/// Registration is additive; registering a name twice is an error.
pub struct Registry<T: ?Sized> {
    kind: &'static str,
    entries: IndexMap<String, Arc<T>>,
}

impl<T: ?Sized> Registry<T> {
    /// Create an empty registry. `kind` names the registry in errors.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: IndexMap::new(),
        }
    }

    /// Register `value` under `name`.
    pub fn put(&mut self, name: impl Into<String>, value: Arc<T>) -> Result<()> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(Error::DuplicateRegistration {
                registry: self.kind,
                name,
            });
        }
        self.entries.insert(name, value);
        Ok(())
    }

    /// Look up an entry.
    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.entries.get(name).cloned()
    }

    /// Look up an entry, failing with [`Error::UnknownName`].
    pub fn lookup(&self, name: &str) -> Result<Arc<T>> {
        self.get(name).ok_or_else(|| Error::UnknownName {
            registry: self.kind,
            name: name.to_string(),
        })
    }

    /// Look up several entries, preserving the requested order.
    pub fn lookup_all<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Arc<T>>> {
        names.iter().map(|n| self.lookup(n.as_ref())).collect()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Registered entries in registration order.
    pub fn values(&self) -> impl Iterator<Item = &Arc<T>> {
        self.entries.values()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
