//! Pull provider built from a fetch and a size callback.

use std::sync::Arc;

use gridbind_core::logging::targets;
use gridbind_core::{Signal, Subscription};
use parking_lot::RwLock;

use super::{DataChange, PullProvider};
use crate::error::FetchError;
use crate::query::Query;

/// Fetch callback receiving the query with the source's filter attached.
pub type FetchCallback<T, F> = Arc<dyn Fn(&Query<F>) -> Result<Vec<T>, FetchError> + Send + Sync>;

/// Size callback receiving the query with the source's filter attached.
pub type SizeCallback<F> = Arc<dyn Fn(&Query<F>) -> Result<usize, FetchError> + Send + Sync>;

/// A [`PullProvider`] made of two closures and a filter value of any type.
///
/// The filter is owned by the source, not by the table: changing it with
/// [`set_filter`](Self::set_filter) announces a refresh-all, and every query
/// the callbacks receive carries the current value.
///
/// # Example
///
/// ```
/// use gridbind::query::Query;
/// use gridbind::source::CallbackSource;
///
/// let words = vec!["alpha", "beta", "gamma"];
/// let fetch_words = words.clone();
///
/// let source = CallbackSource::new(
///     move |query: &Query<String>| {
///         let matching: Vec<&str> = fetch_words
///             .iter()
///             .copied()
///             .filter(|w| query.filter().is_none_or(|f| w.contains(f.as_str())))
///             .collect();
///         Ok(query.window(&matching).to_vec())
///     },
///     move |query: &Query<String>| {
///         Ok(words
///             .iter()
///             .filter(|w| query.filter().is_none_or(|f| w.contains(f.as_str())))
///             .count())
///     },
/// );
/// source.set_filter(Some("a".to_string()));
/// ```
pub struct CallbackSource<T, F = ()> {
    fetch: FetchCallback<T, F>,
    size: SizeCallback<F>,
    filter: RwLock<Option<F>>,
    changes: Signal<DataChange<T>>,
}

impl<T, F> CallbackSource<T, F>
where
    T: Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    /// Creates a source from a fetch and a size callback.
    pub fn new<FetchFn, SizeFn>(fetch: FetchFn, size: SizeFn) -> Self
    where
        FetchFn: Fn(&Query<F>) -> Result<Vec<T>, FetchError> + Send + Sync + 'static,
        SizeFn: Fn(&Query<F>) -> Result<usize, FetchError> + Send + Sync + 'static,
    {
        Self {
            fetch: Arc::new(fetch),
            size: Arc::new(size),
            filter: RwLock::new(None),
            changes: Signal::new(),
        }
    }

    /// Sets the filter value passed to both callbacks and announces a
    /// refresh-all.
    pub fn set_filter(&self, filter: Option<F>) {
        *self.filter.write() = filter;
        self.refresh_all();
    }

    /// The current filter value.
    pub fn filter(&self) -> Option<F> {
        self.filter.read().clone()
    }

    /// Registers a change listener for as long as the returned subscription
    /// lives.
    pub fn add_change_listener<L>(&self, listener: L) -> Subscription
    where
        L: Fn(&DataChange<T>) + Send + Sync + 'static,
    {
        self.changes.subscribe(listener)
    }

    /// Announces that everything may have changed.
    pub fn refresh_all(&self) {
        tracing::trace!(target: targets::SOURCE, kind = "pull", "refresh all");
        self.changes.emit(DataChange::RefreshAll);
    }

    /// Announces that one item's content changed.
    pub fn refresh_item(&self, item: T) {
        tracing::trace!(target: targets::SOURCE, kind = "pull", "refresh item");
        self.changes.emit(DataChange::RefreshItem(item));
    }

    fn filtered(&self, query: &Query) -> Query<F> {
        query.clone().with_filter(self.filter())
    }
}

impl<T, F> PullProvider<T> for CallbackSource<T, F>
where
    T: Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    fn fetch(&self, query: &Query) -> Result<Vec<T>, FetchError> {
        (self.fetch)(&self.filtered(query))
    }

    fn size(&self, query: &Query) -> Result<usize, FetchError> {
        (self.size)(&self.filtered(query))
    }

    fn changes(&self) -> &Signal<DataChange<T>> {
        &self.changes
    }
}

impl<T: Send + 'static, F> std::fmt::Debug for CallbackSource<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackSource")
            .field("filtered", &self.filter.read().is_some())
            .field("listeners", &self.changes.connection_count())
            .finish()
    }
}

static_assertions::assert_impl_all!(CallbackSource<String, String>: Send, Sync);
