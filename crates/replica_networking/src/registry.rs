//! Name-keyed registry used for an object's properties and functions.
//!
//! Lookup is by exact name. Iteration is in name order, which is the order
//! entries are written into a property block.

use std::collections::BTreeMap;

/// An entry that knows its own registry key.
pub trait Named {
    /// Registry key.
    fn name(&self) -> &str;
}

/// Map from name to entry. The first registration of a name wins.
#[derive(Debug)]
pub struct Registry<T> {
    entries: BTreeMap<String, T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: Named> Registry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry. Returns false, leaving the registry untouched, if the
    /// name is already taken.
    pub fn register(&mut self, entry: T) -> bool {
        if self.entries.contains_key(entry.name()) {
            return false;
        }
        self.entries.insert(entry.name().to_owned(), entry);
        true
    }

    /// Looks up an entry by name.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }

    /// Looks up an entry by name, mutably.
    #[inline]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.entries.get_mut(name)
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterates entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
