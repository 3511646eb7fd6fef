//! Case-insensitive identifier map.
//!
//! Every name in the language (classes, fields, methods, variables,
//! namespaces) is case-insensitive. [`IdentMap`] normalizes keys internally so
//! call sites never lower-case by hand, keeps the spelling used at insertion
//! for display, and iterates in insertion order so diagnostics come out in
//! declaration order.

use std::fmt;

use rustc_hash::FxHashMap;

/// Map keyed by case-insensitive identifier, preserving the original spelling.
#[derive(Clone, PartialEq)]
pub struct IdentMap<V> {
    entries: Vec<(String, V)>,
    index: FxHashMap<String, usize>,
}

impl<V> Default for IdentMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<V> IdentMap<V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn key(name: &str) -> String {
        name.to_ascii_lowercase()
    }

    /// Insert a value, returning the previous value for the same name.
    ///
    /// The original spelling of an existing entry is kept.
    pub fn insert(&mut self, name: impl Into<String>, value: V) -> Option<V> {
        let name = name.into();
        let key = Self::key(&name);
        match self.index.get(&key) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Look up a value by name.
    pub fn get(&self, name: &str) -> Option<&V> {
        self.index.get(&Self::key(name)).map(|&i| &self.entries[i].1)
    }

    /// Look up a value mutably by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut V> {
        match self.index.get(&Self::key(name)) {
            Some(&i) => Some(&mut self.entries[i].1),
            None => None,
        }
    }

    /// Get the entry for `name`, inserting `V::default()` if absent.
    pub fn entry_or_default(&mut self, name: &str) -> &mut V
    where
        V: Default,
    {
        let key = Self::key(name);
        let i = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((name.to_string(), V::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[i].1
    }

    /// The spelling a name was first inserted with.
    pub fn original_name(&self, name: &str) -> Option<&str> {
        self.index
            .get(&Self::key(name))
            .map(|&i| self.entries[i].0.as_str())
    }

    /// Whether the map contains `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&Self::key(name))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(original_name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate values mutably in insertion order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    /// Iterate values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Iterate names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<V: fmt::Debug> fmt::Debug for IdentMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for IdentMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = IdentMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
