//! Fetch requests and sort descriptors.
//!
//! A [`Query`] describes one window of a data set: where it starts, how many
//! items it wants, how the data should be ordered, and which filter the data
//! source should apply. Tables build the window part; data sources attach
//! their own filter value through [`Query::with_filter`] before handing the
//! query to a provider callback.

use std::cmp::Ordering;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Predicate used by in-memory filtering. Returns `true` to keep the item.
pub type FilterFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Comparator used by in-memory sorting.
pub type CompareFn<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Direction of a sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortDirection {
    /// Applies the direction to an ordering computed in ascending terms.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// A backend sort instruction: a property name and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SortOrder {
    /// The property (column key, field name) to sort by.
    pub property: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl SortOrder {
    /// Ascending order on `property`.
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Descending order on `property`.
    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// A request for one window of a data set.
///
/// `limit == None` requests every item from `offset` on, which is how
/// unpaged tables fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Query<F = ()> {
    /// Index of the first requested item.
    pub offset: usize,
    /// Maximum number of items, or `None` for all.
    pub limit: Option<usize>,
    /// Backend sort orders, most significant first.
    pub sort_orders: Vec<SortOrder>,
    /// The data source's filter value, if any.
    pub filter: Option<F>,
}

impl Default for Query {
    fn default() -> Self {
        Self::all()
    }
}

impl Query {
    /// A query for the whole data set.
    pub fn all() -> Self {
        Self {
            offset: 0,
            limit: None,
            sort_orders: Vec::new(),
            filter: None,
        }
    }

    /// A query for `limit` items starting at `offset`.
    pub fn page(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit: Some(limit),
            sort_orders: Vec::new(),
            filter: None,
        }
    }
}

impl<F> Query<F> {
    /// Replaces the sort orders.
    pub fn with_sort_orders(mut self, sort_orders: Vec<SortOrder>) -> Self {
        self.sort_orders = sort_orders;
        self
    }

    /// Re-types the query with a filter value.
    pub fn with_filter<G>(self, filter: Option<G>) -> Query<G> {
        Query {
            offset: self.offset,
            limit: self.limit,
            sort_orders: self.sort_orders,
            filter,
        }
    }

    /// The filter value, if any.
    pub fn filter(&self) -> Option<&F> {
        self.filter.as_ref()
    }

    /// Returns `true` if the query asks for every item.
    pub fn is_unbounded(&self) -> bool {
        self.limit.is_none()
    }

    /// Exclusive end index of the requested window, if bounded.
    pub fn end(&self) -> Option<usize> {
        self.limit.map(|limit| self.offset.saturating_add(limit))
    }

    /// Returns the part of `items` this query covers.
    ///
    /// Out-of-range windows yield an empty slice instead of panicking, so a
    /// provider serving a collection that shrank since its size was taken
    /// still answers with a (shorter) page.
    pub fn window<'a, X>(&self, items: &'a [X]) -> &'a [X] {
        let start = self.offset.min(items.len());
        let end = self.end().map_or(items.len(), |end| end.min(items.len()));
        &items[start..end]
    }
}
