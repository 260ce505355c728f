//! Lazy provider built from callbacks, with exact, estimated or unknown size.

use std::sync::Arc;

use gridbind_core::logging::targets;
use gridbind_core::{Signal, Subscription};
use parking_lot::{Mutex, RwLock};

use super::callback::{FetchCallback, SizeCallback};
use super::{DataChange, LazyProvider};
use crate::error::FetchError;
use crate::paging::ItemCount;
use crate::query::Query;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CountMode {
    Provider,
    Estimate(usize),
    Unknown,
}

#[derive(Debug)]
struct CountSettings {
    mode: CountMode,
    increase: Option<usize>,
}

/// A [`LazyProvider`] for back ends that page with offset and limit.
///
/// The size comes from one of three places:
///
/// - a size callback ([`with_size`](Self::with_size), or
///   [`set_item_count_from_provider`](Self::set_item_count_from_provider)),
/// - an estimate set with
///   [`set_item_count_estimate`](Self::set_item_count_estimate), which tables
///   treat as a lower bound they may page one step past,
/// - nowhere ([`set_item_count_unknown`](Self::set_item_count_unknown)); tables
///   then page forward until a fetch comes back short.
///
/// # Example
///
/// ```
/// use gridbind::query::Query;
/// use gridbind::source::LazySource;
///
/// let source = LazySource::new(|query: &Query<()>| {
///     let end = query.end().unwrap_or(1000).min(1000);
///     Ok((query.offset..end).collect::<Vec<usize>>())
/// });
/// source.set_item_count_estimate(200);
/// assert_eq!(source.item_count_estimate(), Some(200));
/// ```
pub struct LazySource<T, F = ()> {
    fetch: FetchCallback<T, F>,
    size: Option<SizeCallback<F>>,
    count: Mutex<CountSettings>,
    filter: RwLock<Option<F>>,
    changes: Signal<DataChange<T>>,
}

impl<T, F> LazySource<T, F>
where
    T: Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    /// Creates a source with a fetch callback only. The size starts unknown.
    pub fn new<FetchFn>(fetch: FetchFn) -> Self
    where
        FetchFn: Fn(&Query<F>) -> Result<Vec<T>, FetchError> + Send + Sync + 'static,
    {
        Self {
            fetch: Arc::new(fetch),
            size: None,
            count: Mutex::new(CountSettings {
                mode: CountMode::Unknown,
                increase: None,
            }),
            filter: RwLock::new(None),
            changes: Signal::new(),
        }
    }

    /// Creates a source whose size comes from `size`.
    pub fn with_size<FetchFn, SizeFn>(fetch: FetchFn, size: SizeFn) -> Self
    where
        FetchFn: Fn(&Query<F>) -> Result<Vec<T>, FetchError> + Send + Sync + 'static,
        SizeFn: Fn(&Query<F>) -> Result<usize, FetchError> + Send + Sync + 'static,
    {
        let mut source = Self::new(fetch);
        source.size = Some(Arc::new(size));
        source.count.get_mut().mode = CountMode::Provider;
        source
    }

    // -------------------------------------------------------------------------
    // Item count
    // -------------------------------------------------------------------------

    /// Uses `estimate` as the size and announces a refresh-all.
    pub fn set_item_count_estimate(&self, estimate: usize) {
        self.count.lock().mode = CountMode::Estimate(estimate);
        self.refresh_all();
    }

    /// The estimate, if the size is estimated.
    pub fn item_count_estimate(&self) -> Option<usize> {
        match self.count.lock().mode {
            CountMode::Estimate(estimate) => Some(estimate),
            _ => None,
        }
    }

    /// Asks the size callback for the size and announces a refresh-all.
    ///
    /// Without a size callback the size stays unknown.
    pub fn set_item_count_from_provider(&self) {
        self.count.lock().mode = CountMode::Provider;
        self.refresh_all();
    }

    /// Forgets any size and announces a refresh-all.
    pub fn set_item_count_unknown(&self) {
        self.count.lock().mode = CountMode::Unknown;
        self.refresh_all();
    }

    /// Returns `true` if the size callback is in use.
    pub fn is_item_count_from_provider(&self) -> bool {
        self.size.is_some() && self.count.lock().mode == CountMode::Provider
    }

    /// Sets how far the estimate grows when a fetch reaches it.
    pub fn set_item_count_estimate_increase(&self, increase: usize) {
        self.count.lock().increase = Some(increase);
    }

    // -------------------------------------------------------------------------
    // Filter and notifications
    // -------------------------------------------------------------------------

    /// Sets the filter value passed to the callbacks and announces a
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
        tracing::trace!(target: targets::SOURCE, kind = "lazy", "refresh all");
        self.changes.emit(DataChange::RefreshAll);
    }

    /// Announces that one item's content changed.
    pub fn refresh_item(&self, item: T) {
        tracing::trace!(target: targets::SOURCE, kind = "lazy", "refresh item");
        self.changes.emit(DataChange::RefreshItem(item));
    }

    fn filtered(&self, query: &Query) -> Query<F> {
        query.clone().with_filter(self.filter())
    }
}

impl<T, F> LazyProvider<T> for LazySource<T, F>
where
    T: Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    fn fetch(&self, query: &Query) -> Result<Vec<T>, FetchError> {
        (self.fetch)(&self.filtered(query))
    }

    fn item_count(&self, query: &Query) -> Result<ItemCount, FetchError> {
        let mode = self.count.lock().mode;
        match (mode, &self.size) {
            (CountMode::Provider, Some(size)) => size(&self.filtered(query)).map(ItemCount::Exact),
            (CountMode::Estimate(estimate), _) => Ok(ItemCount::Estimate(estimate)),
            _ => Ok(ItemCount::Unknown),
        }
    }

    fn estimate_increase(&self) -> Option<usize> {
        self.count.lock().increase
    }

    fn changes(&self) -> &Signal<DataChange<T>> {
        &self.changes
    }
}

impl<T: Send + 'static, F> std::fmt::Debug for LazySource<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazySource")
            .field("count", &*self.count.lock())
            .field("has_size", &self.size.is_some())
            .field("listeners", &self.changes.connection_count())
            .finish()
    }
}

static_assertions::assert_impl_all!(LazySource<String, String>: Send, Sync);
