//! Class factory: maps a class name to the constructor that builds it.
//!
//! Engines resolve every spawn through the registry they were given, so
//! two engines in one process may use different schemas.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use replica_core::Guid;

use crate::object::Object;
use crate::role::Role;

/// Builds an object of one class. The constructor registers the class's
/// properties and functions.
pub type ObjectConstructor = fn(Guid, Role) -> Object;

/// Name to constructor map.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: RwLock<BTreeMap<String, ObjectConstructor>>,
}

impl ClassRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class. Returns false and keeps the first constructor if
    /// the name is already registered.
    pub fn register_class(&self, name: &str, constructor: ObjectConstructor) -> bool {
        let mut classes = self.classes.write();
        if classes.contains_key(name) {
            return false;
        }
        classes.insert(name.to_owned(), constructor);
        true
    }

    /// Looks up a constructor.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<ObjectConstructor> {
        self.classes.read().get(name).copied()
    }

    /// Builds an object of class `name`, if registered.
    #[must_use]
    pub fn construct(&self, name: &str, guid: Guid, role: Role) -> Option<Object> {
        self.find(name).map(|constructor| constructor(guid, role))
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.classes.read().contains_key(name)
    }

    /// Registered class names in order.
    #[must_use]
    pub fn class_names(&self) -> Vec<String> {
        self.classes.read().keys().cloned().collect()
    }

    /// Number of registered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    /// Returns true if no class is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }
}
