//! Data sources a table can bind to.
//!
//! A table binds to exactly one [`DataSource`], a tagged union over the three
//! binding modes:
//!
//! - [`DataSource::InMemory`]: a [`ListSource`] holding the whole collection.
//!   Filtering and sorting happen in-process.
//! - [`DataSource::Pull`]: any [`PullProvider`], a fetch plus an authoritative
//!   size. [`CallbackSource`] builds one from two closures.
//! - [`DataSource::Lazy`]: any [`LazyProvider`], a fetch plus an exact,
//!   estimated or unknown size. [`LazySource`] builds one from closures.
//!
//! Every source announces changes through a [`Signal`] of [`DataChange`]
//! values. Tables subscribe when bound and release the [`Subscription`] when
//! they bind something else.
//!
//! # Example
//!
//! ```
//! use gridbind::source::{DataSource, ListSource};
//! use std::sync::Arc;
//!
//! let people = Arc::new(ListSource::new(vec!["Ann", "Ben", "Cid"]));
//! let source = DataSource::from(people.clone());
//!
//! assert_eq!(source.mode(), gridbind::source::BindingMode::InMemory);
//! people.add_item("Dee");
//! assert_eq!(people.len(), 4);
//! ```

mod callback;
mod lazy;
mod list;

pub use callback::{CallbackSource, FetchCallback, SizeCallback};
pub use lazy::LazySource;
pub use list::{ListSource, ListView};

use std::fmt;
use std::sync::Arc;

use gridbind_core::{Signal, Subscription};

use crate::error::FetchError;
use crate::paging::ItemCount;
use crate::query::Query;

/// A change announced by a data source.
#[derive(Debug, Clone, PartialEq)]
pub enum DataChange<T> {
    /// Anything may have changed; bound tables perform a full reset.
    RefreshAll,
    /// One item's content changed; bound tables patch its row if visible.
    RefreshItem(T),
}

/// A fetch plus an authoritative size.
///
/// Queries carry the window and backend sort orders. Filtering is the
/// provider's own business.
pub trait PullProvider<T>: Send + Sync {
    /// Returns the items in the query's window.
    fn fetch(&self, query: &Query) -> Result<Vec<T>, FetchError>;

    /// Returns the total number of items the query's filter matches.
    fn size(&self, query: &Query) -> Result<usize, FetchError>;

    /// Change notifications.
    fn changes(&self) -> &Signal<DataChange<T>>;
}

/// An offset/limit fetch plus whatever size knowledge the backend offers.
pub trait LazyProvider<T>: Send + Sync {
    /// Returns the items in the query's window.
    fn fetch(&self, query: &Query) -> Result<Vec<T>, FetchError>;

    /// Returns the exact size, an estimate, or [`ItemCount::Unknown`].
    fn item_count(&self, query: &Query) -> Result<ItemCount, FetchError>;

    /// How far an estimate grows when a fetch reaches it. `None` lets the
    /// table decide.
    fn estimate_increase(&self) -> Option<usize> {
        None
    }

    /// Change notifications.
    fn changes(&self) -> &Signal<DataChange<T>>;
}

/// A size-then-fetch session over one data source.
///
/// Tables run one session per reset, inside a single critical section.
pub trait PageSource<T> {
    /// Size knowledge for the query's filter.
    fn item_count(&self, query: &Query) -> Result<ItemCount, FetchError>;

    /// Items in the query's window.
    fn fetch(&self, query: &Query) -> Result<Vec<T>, FetchError>;
}

impl<T> PageSource<T> for dyn PullProvider<T> {
    fn item_count(&self, query: &Query) -> Result<ItemCount, FetchError> {
        self.size(query).map(ItemCount::Exact)
    }

    fn fetch(&self, query: &Query) -> Result<Vec<T>, FetchError> {
        PullProvider::fetch(self, query)
    }
}

impl<T> PageSource<T> for dyn LazyProvider<T> {
    fn item_count(&self, query: &Query) -> Result<ItemCount, FetchError> {
        LazyProvider::item_count(self, query)
    }

    fn fetch(&self, query: &Query) -> Result<Vec<T>, FetchError> {
        LazyProvider::fetch(self, query)
    }
}

/// The binding mode of a [`DataSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingMode {
    /// In-memory list.
    InMemory,
    /// Pull provider.
    Pull,
    /// Lazy provider.
    Lazy,
}

/// A data source resolved to one binding mode.
pub enum DataSource<T> {
    /// In-memory list.
    InMemory(Arc<ListSource<T>>),
    /// Pull provider.
    Pull(Arc<dyn PullProvider<T>>),
    /// Lazy provider.
    Lazy(Arc<dyn LazyProvider<T>>),
}

impl<T> Clone for DataSource<T> {
    fn clone(&self) -> Self {
        match self {
            DataSource::InMemory(list) => DataSource::InMemory(list.clone()),
            DataSource::Pull(provider) => DataSource::Pull(provider.clone()),
            DataSource::Lazy(provider) => DataSource::Lazy(provider.clone()),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> DataSource<T> {
    /// Wraps any pull provider.
    pub fn pull<P: PullProvider<T> + 'static>(provider: Arc<P>) -> Self {
        DataSource::Pull(provider)
    }

    /// Wraps any lazy provider.
    pub fn lazy<L: LazyProvider<T> + 'static>(provider: Arc<L>) -> Self {
        DataSource::Lazy(provider)
    }

    /// The binding mode.
    pub fn mode(&self) -> BindingMode {
        match self {
            DataSource::InMemory(_) => BindingMode::InMemory,
            DataSource::Pull(_) => BindingMode::Pull,
            DataSource::Lazy(_) => BindingMode::Lazy,
        }
    }

    /// The in-memory list, for list-only operations.
    pub fn as_list(&self) -> Option<&Arc<ListSource<T>>> {
        match self {
            DataSource::InMemory(list) => Some(list),
            _ => None,
        }
    }

    /// Returns `true` if predicates can be applied through the table.
    pub fn supports_filter(&self) -> bool {
        self.as_list().is_some()
    }

    /// Returns `true` if comparators can be applied through the table.
    pub fn supports_sort(&self) -> bool {
        self.as_list().is_some()
    }

    /// Returns `true` if backend sort orders reach the source.
    pub fn supports_sort_orders(&self) -> bool {
        !self.supports_sort()
    }

    /// The estimate increase a lazy provider asks for.
    pub fn estimate_increase(&self) -> Option<usize> {
        match self {
            DataSource::Lazy(provider) => provider.estimate_increase(),
            _ => None,
        }
    }

    /// The source's change signal.
    pub fn changes(&self) -> &Signal<DataChange<T>> {
        match self {
            DataSource::InMemory(list) => list.changes(),
            DataSource::Pull(provider) => provider.changes(),
            DataSource::Lazy(provider) => provider.changes(),
        }
    }

    /// Registers a change listener for as long as the returned subscription
    /// lives.
    pub fn add_change_listener<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&DataChange<T>) + Send + Sync + 'static,
    {
        self.changes().subscribe(listener)
    }

    /// Announces that everything may have changed.
    pub fn refresh_all(&self) {
        self.changes().emit(DataChange::RefreshAll);
    }

    /// Announces that one item's content changed.
    pub fn refresh_item(&self, item: T) {
        self.changes().emit(DataChange::RefreshItem(item));
    }
}

impl<T> fmt::Debug for DataSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self {
            DataSource::InMemory(_) => "InMemory",
            DataSource::Pull(_) => "Pull",
            DataSource::Lazy(_) => "Lazy",
        };
        f.debug_tuple("DataSource").field(&mode).finish()
    }
}

impl<T> From<Arc<ListSource<T>>> for DataSource<T> {
    fn from(list: Arc<ListSource<T>>) -> Self {
        DataSource::InMemory(list)
    }
}

impl<T, F> From<Arc<CallbackSource<T, F>>> for DataSource<T>
where
    T: Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    fn from(source: Arc<CallbackSource<T, F>>) -> Self {
        DataSource::Pull(source)
    }
}

impl<T, F> From<Arc<LazySource<T, F>>> for DataSource<T>
where
    T: Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    fn from(source: Arc<LazySource<T, F>>) -> Self {
        DataSource::Lazy(source)
    }
}

static_assertions::assert_impl_all!(DataSource<String>: Send, Sync);
