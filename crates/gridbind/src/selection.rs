//! Identity-keyed selection.
//!
//! [`SelectionTracker`] keeps the selected items keyed by the identity the
//! table's identifier function extracts, so a selection survives full resets
//! and page changes: items off the current page stay selected.
//!
//! The tracker only records membership. Every mutating call returns a
//! [`SelectionDelta`]; the table turns a non-empty delta into exactly one
//! [`SelectionChanged`] event and re-decorates affected rows.
//!
//! # Example
//!
//! ```
//! use gridbind::selection::SelectionTracker;
//! use std::sync::Arc;
//!
//! let mut selection: SelectionTracker<&str, String> =
//!     SelectionTracker::new(Arc::new(|name: &&str| name.to_lowercase()));
//!
//! assert!(!selection.select(["Ann", "Ben"]).is_empty());
//! // "ANN" has the same identity as "Ann": nothing changes.
//! assert!(selection.select(["ANN"]).is_empty());
//! assert_eq!(selection.selected(), vec!["Ann", "Ben"]);
//! ```

use std::collections::HashMap;
use std::hash::Hash;

use crate::identity::{IdentifierFn, IdentityKey};

/// Where a selection change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOrigin {
    /// A user interaction (toggle, row click).
    Client,
    /// An API call.
    Programmatic,
}

/// Emitted once per selection call that changed membership.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChanged<T> {
    /// The whole selection after the change, in selection order.
    pub selected: Vec<T>,
    /// Where the change came from.
    pub origin: ChangeOrigin,
}

impl<T> SelectionChanged<T> {
    /// Returns `true` for user-driven changes.
    pub fn is_from_client(&self) -> bool {
        self.origin == ChangeOrigin::Client
    }
}

/// Emitted when the user clicks a row.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemClicked<T> {
    /// The clicked item.
    pub item: T,
    /// The clicked row's key.
    pub key: IdentityKey,
}

/// Identities whose membership changed in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionDelta<I> {
    /// Identities added to the selection.
    pub selected: Vec<I>,
    /// Identities removed from the selection.
    pub deselected: Vec<I>,
}

impl<I> SelectionDelta<I> {
    fn new() -> Self {
        Self {
            selected: Vec::new(),
            deselected: Vec::new(),
        }
    }

    /// Returns `true` if membership did not change.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.deselected.is_empty()
    }
}

impl<I: PartialEq> SelectionDelta<I> {
    /// The new state of `identity`, if this delta touched it.
    pub fn state_of(&self, identity: &I) -> Option<bool> {
        if self.selected.contains(identity) {
            Some(true)
        } else if self.deselected.contains(identity) {
            Some(false)
        } else {
            None
        }
    }
}

/// A multi-selection keyed by item identity.
pub struct SelectionTracker<T, I> {
    identifier: IdentifierFn<T, I>,
    items: HashMap<I, T>,
    order: Vec<I>,
}

impl<T, I> SelectionTracker<T, I>
where
    T: Clone,
    I: Eq + Hash + Clone,
{
    /// Creates an empty selection using `identifier` to compare items.
    pub fn new(identifier: IdentifierFn<T, I>) -> Self {
        Self {
            identifier,
            items: HashMap::new(),
            order: Vec::new(),
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Adds items. Already-selected identities are skipped.
    pub fn select<It: IntoIterator<Item = T>>(&mut self, items: It) -> SelectionDelta<I> {
        let mut delta = SelectionDelta::new();
        for item in items {
            let identity = (self.identifier)(&item);
            if !self.items.contains_key(&identity) {
                self.items.insert(identity.clone(), item);
                self.order.push(identity.clone());
                delta.selected.push(identity);
            }
        }
        delta
    }

    /// Removes items. Unselected identities are skipped.
    pub fn deselect<It: IntoIterator<Item = T>>(&mut self, items: It) -> SelectionDelta<I> {
        let mut delta = SelectionDelta::new();
        for item in items {
            let identity = (self.identifier)(&item);
            if self.items.remove(&identity).is_some() {
                self.order.retain(|selected| selected != &identity);
                delta.deselected.push(identity);
            }
        }
        delta
    }

    /// Clears the selection.
    pub fn deselect_all(&mut self) -> SelectionDelta<I> {
        self.items.clear();
        SelectionDelta {
            selected: Vec::new(),
            deselected: std::mem::take(&mut self.order),
        }
    }

    /// Flips the membership of one item.
    pub fn toggle(&mut self, item: &T) -> SelectionDelta<I> {
        if self.contains(item) {
            self.deselect([item.clone()])
        } else {
            self.select([item.clone()])
        }
    }

    /// Replaces the identifier function. Stored identities are kept, so items
    /// selected before the swap only match again once re-selected.
    pub fn set_identifier(&mut self, identifier: IdentifierFn<T, I>) {
        self.identifier = identifier;
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns `true` if `item`'s identity is selected.
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains_key(&(self.identifier)(item))
    }

    /// Returns `true` if `identity` is selected.
    pub fn contains_identity(&self, identity: &I) -> bool {
        self.items.contains_key(identity)
    }

    /// The identity of `item`.
    pub fn identity(&self, item: &T) -> I {
        (self.identifier)(item)
    }

    /// The selected items in selection order.
    pub fn selected(&self) -> Vec<T> {
        self.order
            .iter()
            .filter_map(|identity| self.items.get(identity).cloned())
            .collect()
    }

    /// Number of selected items.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<T, I> std::fmt::Debug for SelectionTracker<T, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionTracker")
            .field("selected", &self.order.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        id: u32,
        name: &'static str,
    }

    fn tracker() -> SelectionTracker<Person, u32> {
        SelectionTracker::new(Arc::new(|p: &Person| p.id))
    }

    fn person(id: u32, name: &'static str) -> Person {
        Person { id, name }
    }

    #[test]
    fn test_select_is_idempotent() {
        let mut selection = tracker();
        let delta = selection.select([person(1, "Ann")]);
        assert_eq!(delta.selected, vec![1]);

        assert!(selection.select([person(1, "Ann")]).is_empty());
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_batch_reports_only_changes() {
        let mut selection = tracker();
        selection.select([person(1, "Ann")]);

        let delta = selection.select([person(1, "Ann"), person(2, "Ben"), person(2, "Ben")]);
        assert_eq!(delta.selected, vec![2]);
        assert!(delta.deselected.is_empty());
    }

    #[test]
    fn test_deselect_unknown_is_noop() {
        let mut selection = tracker();
        assert!(selection.deselect([person(9, "Zed")]).is_empty());
        assert!(selection.deselect_all().is_empty());
    }

    #[test]
    fn test_toggle() {
        let mut selection = tracker();
        let ann = person(1, "Ann");

        assert_eq!(selection.toggle(&ann).state_of(&1), Some(true));
        assert!(selection.contains(&ann));
        assert_eq!(selection.toggle(&ann).state_of(&1), Some(false));
        assert!(!selection.contains(&ann));
    }

    #[test]
    fn test_identity_matching() {
        let mut selection = tracker();
        selection.select([person(1, "Ann")]);

        // Same id, new content: still selected, original item kept.
        assert!(selection.contains(&person(1, "Anne")));
        assert_eq!(selection.selected()[0].name, "Ann");

        let delta = selection.deselect([person(1, "Anne")]);
        assert_eq!(delta.deselected, vec![1]);
    }

    #[test]
    fn test_selection_order_and_deselect_all() {
        let mut selection = tracker();
        selection.select([person(3, "Cid"), person(1, "Ann"), person(2, "Ben")]);
        selection.deselect([person(1, "Ann")]);

        let ids: Vec<u32> = selection.selected().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 2]);

        let delta = selection.deselect_all();
        assert_eq!(delta.deselected, vec![3, 2]);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_origin() {
        let event = SelectionChanged {
            selected: vec![1],
            origin: ChangeOrigin::Client,
        };
        assert!(event.is_from_client());
    }
}
