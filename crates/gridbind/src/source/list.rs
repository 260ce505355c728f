//! In-memory list source.

use std::cmp::Ordering;
use std::sync::Arc;

use gridbind_core::logging::targets;
use gridbind_core::{Signal, Subscription};
use parking_lot::{RwLock, RwLockReadGuard};

use super::{DataChange, PageSource};
use crate::error::FetchError;
use crate::paging::ItemCount;
use crate::query::{CompareFn, FilterFn, Query};

struct ListState<T> {
    items: Vec<T>,
    filter: Option<FilterFn<T>>,
    compare: Option<CompareFn<T>>,
}

impl<T> ListState<T> {
    /// Indices of the items passing the filter, in comparator order.
    fn visible_rows(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = (0..self.items.len())
            .filter(|&row| match self.filter {
                Some(ref filter) => filter(&self.items[row]),
                None => true,
            })
            .collect();

        if let Some(ref compare) = self.compare {
            rows.sort_by(|&a, &b| compare(&self.items[a], &self.items[b]));
        }
        rows
    }
}

/// A bound collection held entirely in memory.
///
/// Items, filter and comparator live behind one lock, so a [`ListView`]
/// sees the size and the page of one consistent snapshot even while another
/// thread mutates the list. Mutations announce themselves through
/// [`changes`](Self::changes) after the lock is released.
///
/// # Example
///
/// ```
/// use gridbind::source::ListSource;
///
/// let list = ListSource::new(vec![5, 3, 8, 1]);
/// list.set_filter(|n: &i32| *n > 2);
/// list.set_sort(|a: &i32, b: &i32| a.cmp(b));
///
/// assert_eq!(list.visible_items(), vec![3, 5, 8]);
/// assert_eq!(list.len(), 4);
/// ```
pub struct ListSource<T> {
    state: RwLock<ListState<T>>,
    changes: Signal<DataChange<T>>,
}

impl<T: Clone + Send + Sync + 'static> ListSource<T> {
    /// Creates a list source over `items`.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            state: RwLock::new(ListState {
                items,
                filter: None,
                compare: None,
            }),
            changes: Signal::new(),
        }
    }

    /// Creates an empty list source.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Opens a consistent read view over the filtered and sorted items.
    ///
    /// The view holds a read lock until dropped. Nested views on the same
    /// thread are allowed.
    pub fn view(&self) -> ListView<'_, T> {
        let guard = self.state.read_recursive();
        let visible_rows = guard.visible_rows();
        ListView {
            guard,
            visible_rows,
        }
    }

    /// Number of items, ignoring the filter.
    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    /// Returns `true` if the list holds no items.
    pub fn is_empty(&self) -> bool {
        self.state.read().items.is_empty()
    }

    /// Number of items passing the filter.
    pub fn filtered_len(&self) -> usize {
        self.view().len()
    }

    /// A copy of every item in insertion order, ignoring filter and sort.
    pub fn items(&self) -> Vec<T> {
        self.state.read().items.clone()
    }

    /// A copy of the items passing the filter, in sort order.
    pub fn visible_items(&self) -> Vec<T> {
        self.view().iter().cloned().collect()
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Appends an item.
    pub fn add_item(&self, item: T) {
        self.state.write().items.push(item);
        self.refresh_all();
    }

    /// Appends several items with one change notification.
    pub fn add_items<I: IntoIterator<Item = T>>(&self, items: I) {
        self.state.write().items.extend(items);
        self.refresh_all();
    }

    /// Replaces every item.
    pub fn set_items(&self, items: Vec<T>) {
        self.state.write().items = items;
        self.refresh_all();
    }

    /// Removes every item.
    pub fn clear(&self) {
        self.state.write().items.clear();
        self.refresh_all();
    }

    /// Removes the first item equal to `item`. Returns `true` if one was
    /// removed.
    pub fn remove_item(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        let removed = {
            let mut state = self.state.write();
            match state.items.iter().position(|candidate| candidate == item) {
                Some(position) => {
                    state.items.remove(position);
                    true
                }
                None => false,
            }
        };
        if removed {
            self.refresh_all();
        }
        removed
    }

    /// Mutates the item at `index` (insertion order) in place and announces
    /// it as a single-item refresh. Returns `false` if the index is out of
    /// range.
    ///
    /// Tables locate the row through their identifier function, so the
    /// identity of the item should not change here.
    pub fn update_item<F>(&self, index: usize, update: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let updated = {
            let mut state = self.state.write();
            state.items.get_mut(index).map(|item| {
                update(item);
                item.clone()
            })
        };
        match updated {
            Some(item) => {
                self.refresh_item(item);
                true
            }
            None => false,
        }
    }

    // -------------------------------------------------------------------------
    // Filter and sort
    // -------------------------------------------------------------------------

    /// Sets the filter predicate. Items for which it returns `false` are
    /// hidden.
    pub fn set_filter<F>(&self, filter: F)
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.state.write().filter = Some(Arc::new(filter));
        self.refresh_all();
    }

    /// Removes the filter predicate.
    pub fn clear_filter(&self) {
        self.state.write().filter = None;
        self.refresh_all();
    }

    /// Returns `true` if a filter predicate is set.
    pub fn has_filter(&self) -> bool {
        self.state.read().filter.is_some()
    }

    /// Sets the comparator.
    pub fn set_sort<F>(&self, compare: F)
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.state.write().compare = Some(Arc::new(compare));
        self.refresh_all();
    }

    /// Removes the comparator; items show in insertion order again.
    pub fn clear_sort(&self) {
        self.state.write().compare = None;
        self.refresh_all();
    }

    // -------------------------------------------------------------------------
    // Change notification
    // -------------------------------------------------------------------------

    /// Change notifications.
    pub fn changes(&self) -> &Signal<DataChange<T>> {
        &self.changes
    }

    /// Registers a change listener for as long as the returned subscription
    /// lives.
    pub fn add_change_listener<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&DataChange<T>) + Send + Sync + 'static,
    {
        self.changes.subscribe(listener)
    }

    /// Announces that everything may have changed.
    pub fn refresh_all(&self) {
        tracing::trace!(target: targets::SOURCE, kind = "list", "refresh all");
        self.changes.emit(DataChange::RefreshAll);
    }

    /// Announces that one item's content changed.
    pub fn refresh_item(&self, item: T) {
        tracing::trace!(target: targets::SOURCE, kind = "list", "refresh item");
        self.changes.emit(DataChange::RefreshItem(item));
    }
}

impl<T: Clone + Send + Sync + 'static> Default for ListSource<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Clone + Send + Sync + 'static> FromIterator<T> for ListSource<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<T> std::fmt::Debug for ListSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("ListSource")
            .field("items", &state.items.len())
            .field("filtered", &state.filter.is_some())
            .field("sorted", &state.compare.is_some())
            .finish()
    }
}

/// A read-locked snapshot of a [`ListSource`]'s filtered, sorted items.
pub struct ListView<'a, T> {
    guard: RwLockReadGuard<'a, ListState<T>>,
    visible_rows: Vec<usize>,
}

impl<T> ListView<'_, T> {
    /// Number of visible items.
    pub fn len(&self) -> usize {
        self.visible_rows.len()
    }

    /// Returns `true` if no item is visible.
    pub fn is_empty(&self) -> bool {
        self.visible_rows.is_empty()
    }

    /// The visible item at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.visible_rows
            .get(index)
            .map(|&row| &self.guard.items[row])
    }

    /// Iterates visible items in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.visible_rows.iter().map(|&row| &self.guard.items[row])
    }
}

impl<T: Clone> PageSource<T> for ListView<'_, T> {
    fn item_count(&self, _query: &Query) -> Result<ItemCount, FetchError> {
        Ok(ItemCount::Exact(self.len()))
    }

    fn fetch(&self, query: &Query) -> Result<Vec<T>, FetchError> {
        Ok(query
            .window(&self.visible_rows)
            .iter()
            .map(|&row| self.guard.items[row].clone())
            .collect())
    }
}

static_assertions::assert_impl_all!(ListSource<String>: Send, Sync);
