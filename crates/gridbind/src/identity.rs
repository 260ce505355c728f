//! Stable identity keys for bound items.
//!
//! The [`IdentityRegistry`] hands out an opaque [`IdentityKey`] for every
//! logical item a table displays. "Logical item" is decided by an identifier
//! function: by default the item itself (structural equality), or any field
//! the consumer chooses, such as a database id.
//!
//! Keys are minted from a monotonic counter. The registry forgets every
//! mapping on [`IdentityRegistry::remove_all`], which tables call at the start
//! of each full reset, but the counter keeps running so a key is never
//! handed to a different item after a reset.
//!
//! # Identifier swaps
//!
//! Replacing the identifier function with [`IdentityRegistry::set_identifier`]
//! does not rewrite keys that were already issued. Lookups made after the swap
//! use the new function, so an item can receive a second key until the next
//! reset clears the registry.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Extracts the identity of an item.
pub type IdentifierFn<T, I> = Arc<dyn Fn(&T) -> I + Send + Sync>;

/// An opaque, engine-generated token identifying one logical item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(Arc<str>);

impl IdentityKey {
    fn from_counter(value: u64) -> Self {
        Self(Arc::from(value.to_string()))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps item identities to stable keys.
pub struct IdentityRegistry<T, I> {
    identifier: IdentifierFn<T, I>,
    keys: HashMap<I, IdentityKey>,
    last_key: u64,
}

impl<T, I> IdentityRegistry<T, I>
where
    I: Eq + Hash + Clone,
{
    /// Creates a registry using the given identifier function.
    pub fn new(identifier: IdentifierFn<T, I>) -> Self {
        Self {
            identifier,
            keys: HashMap::new(),
            last_key: 0,
        }
    }

    /// Returns the key for `item`, minting a new one if its identity is unknown.
    pub fn key(&mut self, item: &T) -> IdentityKey {
        let identity = (self.identifier)(item);
        if let Some(key) = self.keys.get(&identity) {
            return key.clone();
        }
        self.last_key += 1;
        let key = IdentityKey::from_counter(self.last_key);
        self.keys.insert(identity, key.clone());
        key
    }

    /// Returns the key for `item` without minting one.
    pub fn get(&self, item: &T) -> Option<IdentityKey> {
        self.keys.get(&(self.identifier)(item)).cloned()
    }

    /// Returns `true` if `item`'s identity has a key.
    pub fn contains(&self, item: &T) -> bool {
        self.keys.contains_key(&(self.identifier)(item))
    }

    /// Computes the identity of `item` with the active identifier function.
    pub fn identity(&self, item: &T) -> I {
        (self.identifier)(item)
    }

    /// Returns the active identifier function.
    pub fn identifier(&self) -> IdentifierFn<T, I> {
        self.identifier.clone()
    }

    /// Replaces the identifier function. Issued keys are kept as they are.
    pub fn set_identifier(&mut self, identifier: IdentifierFn<T, I>) {
        self.identifier = identifier;
    }

    /// Discards every mapping.
    pub fn remove_all(&mut self) {
        self.keys.clear();
    }

    /// Number of identities with a key.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no key has been issued since the last reset.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<T> IdentityRegistry<T, T>
where
    T: Eq + Hash + Clone + 'static,
{
    /// Creates a registry that identifies items by value.
    pub fn by_value() -> Self {
        Self::new(Arc::new(|item: &T| item.clone()))
    }
}

impl<T, I> fmt::Debug for IdentityRegistry<T, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityRegistry")
            .field("keys", &self.keys.len())
            .field("last_key", &self.last_key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Person {
        id: u32,
        name: String,
    }

    fn person(id: u32, name: &str) -> Person {
        Person {
            id,
            name: name.into(),
        }
    }

    #[test]
    fn test_same_identity_same_key() {
        let mut registry = IdentityRegistry::by_value();
        let first = registry.key(&"alpha".to_string());
        let again = registry.key(&"alpha".to_string());
        let other = registry.key(&"beta".to_string());

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_identifier_function_decides_identity() {
        let mut registry: IdentityRegistry<Person, u32> =
            IdentityRegistry::new(Arc::new(|p: &Person| p.id));

        let before = registry.key(&person(1, "Ann"));
        let renamed = registry.key(&person(1, "Anne"));
        assert_eq!(before, renamed);
    }

    #[test]
    fn test_remove_all_never_reuses_keys() {
        let mut registry = IdentityRegistry::by_value();
        let before = registry.key(&1);
        registry.remove_all();
        assert!(registry.is_empty());

        let after = registry.key(&1);
        assert_ne!(before, after);
    }

    #[test]
    fn test_get_does_not_mint() {
        let mut registry = IdentityRegistry::by_value();
        assert_eq!(registry.get(&7), None);
        assert!(registry.is_empty());

        let key = registry.key(&7);
        assert_eq!(registry.get(&7), Some(key));
        assert!(registry.contains(&7));
    }

    #[test]
    fn test_identifier_swap_keeps_issued_keys() {
        let mut registry: IdentityRegistry<Person, String> =
            IdentityRegistry::new(Arc::new(|p: &Person| p.id.to_string()));
        let ann = person(1, "Ann");
        let by_id = registry.key(&ann);

        registry.set_identifier(Arc::new(|p: &Person| p.name.clone()));

        // The old mapping is untouched, the new identity gets a fresh key.
        assert_eq!(registry.len(), 1);
        let by_name = registry.key(&ann);
        assert_ne!(by_id, by_name);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_key_display() {
        let mut registry = IdentityRegistry::by_value();
        let key = registry.key(&"x");
        assert_eq!(key.to_string(), key.as_str());
        assert_eq!(key.as_str(), "1");
    }
}
