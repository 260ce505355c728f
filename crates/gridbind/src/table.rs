//! The binding controller.
//!
//! A [`Table`] binds to one [`DataSource`], fetches the current page, keys
//! every row through its [`IdentityRegistry`], and hands immutable
//! [`RowSnapshot`]s to its renderer and signal subscribers.
//!
//! # Resets
//!
//! Binding, paging, filter and sort changes and refresh-all notifications all
//! run a full reset:
//!
//! 1. Bump the reset generation and copy the page state, under the state lock.
//! 2. Ask the source for its size and the page, as one critical section
//!    (the list's read lock, or the table's fetch lock for providers). The
//!    state lock is not held, so sources may call back into the table.
//! 3. Re-take the state lock. If another reset started meanwhile, drop the
//!    result. Otherwise clear the registry, key the rows in fetch order, swap
//!    in the new snapshot and page state.
//! 4. Render and emit outside the lock.
//!
//! # Size notifications
//!
//! A reset never emits [`TableSignals::size_changed`] directly. It posts one
//! task to the table's [`FlushQueue`] unless one is already pending, and that
//! task reports the latest size when the queue is flushed, and only if it
//! differs from the last reported size. Any number of resets between two
//! flushes therefore produce at most one notification.
//!
//! # Example
//!
//! ```
//! use gridbind::prelude::*;
//! use std::sync::Arc;
//!
//! let people = Arc::new(ListSource::new(
//!     (1..=45).map(|n| format!("person {n}")).collect::<Vec<_>>(),
//! ));
//!
//! let table: Table<String> = Table::paged(20).unwrap();
//! table.bind(people.clone());
//! table.set_page(5).unwrap();
//!
//! assert_eq!(table.page(), 2);
//! assert_eq!(table.rows().len(), 5);
//!
//! let _subscription = table.signals().size_changed.subscribe(|size| {
//!     println!("{size} items");
//! });
//! table.flush();
//! ```

use std::hash::Hash;
use std::sync::{Arc, Weak};

use gridbind_core::logging::{span_names, targets};
use gridbind_core::{FlushQueue, PerfSpan, Signal, Subscription, TaskId};
use parking_lot::{Mutex, ReentrantMutex, RwLock};

use crate::column::{header_from_key, CellValue, Column, ColumnId, Columns};
use crate::config::{TableBuilder, TableConfig};
use crate::error::{FetchError, Result, TableError};
use crate::identity::{IdentifierFn, IdentityKey, IdentityRegistry};
use crate::paging::{ItemCount, PageChrome, PageState, Reconciliation};
use crate::query::{Query, SortOrder};
use crate::render::TableRenderer;
use crate::row::{RowModel, RowSnapshot};
use crate::selection::{
    ChangeOrigin, ItemClicked, SelectionChanged, SelectionDelta, SelectionTracker,
};
use crate::source::{BindingMode, DataChange, DataSource, ListSource, PageSource};

/// Where a table is in its binding lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingPhase {
    /// No data source.
    Unbound,
    /// Bound and idle.
    Bound(BindingMode),
    /// A full reset is fetching.
    Resetting(BindingMode),
    /// A single row is being patched.
    Refreshing(BindingMode),
}

impl BindingPhase {
    /// The binding mode, if bound.
    pub fn mode(self) -> Option<BindingMode> {
        match self {
            BindingPhase::Unbound => None,
            BindingPhase::Bound(mode)
            | BindingPhase::Resetting(mode)
            | BindingPhase::Refreshing(mode) => Some(mode),
        }
    }
}

/// Page navigation requests, as issued by paging controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNavigation {
    /// Page 0.
    First,
    /// One page back.
    Previous,
    /// One page forward.
    Next,
    /// The last known page.
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResetCause {
    Bind,
    DataChange,
    Navigation,
    Configuration,
}

/// Signals emitted by a [`Table`].
pub struct TableSignals<T> {
    /// The number of rows changed. Emitted on flush, at most once per flush.
    pub size_changed: Signal<usize>,
    /// Selection membership changed.
    pub selection_changed: Signal<SelectionChanged<T>>,
    /// A row was clicked.
    pub item_clicked: Signal<ItemClicked<T>>,
    /// A full reset swapped in new rows.
    pub rows_reset: Signal<Arc<RowSnapshot<T>>>,
    /// A single row was patched in place.
    pub row_refreshed: Signal<Arc<RowModel<T>>>,
}

impl<T: Send + Sync + 'static> TableSignals<T> {
    fn new() -> Self {
        Self {
            size_changed: Signal::new(),
            selection_changed: Signal::new(),
            item_clicked: Signal::new(),
            rows_reset: Signal::new(),
            row_refreshed: Signal::new(),
        }
    }
}

struct TableState<T, I> {
    config: TableConfig,
    source: Option<DataSource<T>>,
    subscription: Option<Subscription>,
    registry: IdentityRegistry<T, I>,
    selection: SelectionTracker<T, I>,
    columns: Columns<T>,
    page: PageState,
    sort_orders: Vec<SortOrder>,
    snapshot: Arc<RowSnapshot<T>>,
    generation: u64,
    phase: BindingPhase,
    fetched_size: Option<usize>,
    notified_size: Option<usize>,
    size_request: Option<TaskId>,
}

struct RenderPass<T> {
    snapshot: Arc<RowSnapshot<T>>,
    columns: Vec<Arc<Column<T>>>,
    selected: Vec<bool>,
    column_span: usize,
    chrome: Option<PageChrome>,
}

impl<T, I> TableState<T, I>
where
    T: Clone,
    I: Eq + Hash + Clone,
{
    fn mode(&self) -> Option<BindingMode> {
        self.phase.mode()
    }

    /// Moves the page. A reset still in flight was computed for the old
    /// page, so it is superseded along with the write.
    fn move_to_page(&mut self, page: usize) {
        self.generation += 1;
        self.page.set_current_page(page);
    }

    fn render_pass(&self) -> RenderPass<T> {
        RenderPass {
            snapshot: self.snapshot.clone(),
            columns: self.columns.to_vec(),
            selected: self
                .snapshot
                .rows()
                .iter()
                .map(|row| self.selection.contains(&row.item))
                .collect(),
            column_span: self.columns.visible_span(),
            chrome: self.page.is_paged().then(|| self.page.chrome()),
        }
    }
}

struct TableInner<T, I> {
    state: Mutex<TableState<T, I>>,
    fetch_lock: ReentrantMutex<()>,
    flush_queue: Arc<FlushQueue>,
    renderer: RwLock<Option<Arc<dyn TableRenderer<T>>>>,
    signals: TableSignals<T>,
}

/// A paged, identity-keyed view over a data source.
///
/// `Table` is a cheap handle: clones share the same state. `I` is the
/// identity type the identifier function extracts; it defaults to the item
/// type itself.
pub struct Table<T, I = T> {
    inner: Arc<TableInner<T, I>>,
}

impl<T, I> Clone for Table<T, I> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Table<T, T>
where
    T: Eq + Hash + Clone + Send + Sync + 'static,
{
    /// Creates an unpaged table identifying items by value.
    pub fn new() -> Self {
        Self::from_parts(
            TableConfig::default(),
            Arc::new(|item: &T| item.clone()),
            Arc::default(),
            None,
        )
    }

    /// Creates a paged table identifying items by value.
    pub fn paged(page_length: usize) -> Result<Self> {
        TableBuilder::new().page_length(page_length).build()
    }

    /// Starts a builder.
    pub fn builder() -> TableBuilder<T, T> {
        TableBuilder::new()
    }
}

impl<T> Default for Table<T, T>
where
    T: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, I> Table<T, I>
where
    T: Clone + Send + Sync + 'static,
    I: Eq + Hash + Clone + Send + Sync + 'static,
{
    pub(crate) fn from_parts(
        config: TableConfig,
        identifier: IdentifierFn<T, I>,
        flush_queue: Arc<FlushQueue>,
        renderer: Option<Arc<dyn TableRenderer<T>>>,
    ) -> Self {
        let state = TableState {
            page: PageState::new(config.page_length),
            config,
            source: None,
            subscription: None,
            registry: IdentityRegistry::new(identifier.clone()),
            selection: SelectionTracker::new(identifier),
            columns: Columns::new(),
            sort_orders: Vec::new(),
            snapshot: Arc::new(RowSnapshot::unbound()),
            generation: 0,
            phase: BindingPhase::Unbound,
            fetched_size: None,
            notified_size: None,
            size_request: None,
        };
        Self {
            inner: Arc::new(TableInner {
                state: Mutex::new(state),
                fetch_lock: ReentrantMutex::new(()),
                flush_queue,
                renderer: RwLock::new(renderer),
                signals: TableSignals::new(),
            }),
        }
    }

    /// Creates an unpaged table with a custom identifier function.
    pub fn with_identifier<F>(identifier: F) -> Self
    where
        F: Fn(&T) -> I + Send + Sync + 'static,
    {
        Self::from_parts(TableConfig::default(), Arc::new(identifier), Arc::default(), None)
    }

    /// The table's signals.
    pub fn signals(&self) -> &TableSignals<T> {
        &self.inner.signals
    }

    /// The flush queue holding deferred notifications.
    pub fn flush_queue(&self) -> &Arc<FlushQueue> {
        &self.inner.flush_queue
    }

    /// Runs deferred notifications. Returns the number of tasks run.
    pub fn flush(&self) -> usize {
        self.inner.flush_queue.flush()
    }

    /// The current configuration.
    pub fn config(&self) -> TableConfig {
        self.inner.state.lock().config.clone()
    }

    /// Replaces the renderer and redraws the current rows with it.
    pub fn set_renderer(&self, renderer: Arc<dyn TableRenderer<T>>) {
        *self.inner.renderer.write() = Some(renderer);
        self.inner.rerender();
    }

    // =========================================================================
    // Binding
    // =========================================================================

    /// Binds a data source, replacing any previous one, and resets.
    pub fn bind(&self, source: impl Into<DataSource<T>>) {
        let source = source.into();
        let weak: Weak<TableInner<T, I>> = Arc::downgrade(&self.inner);
        let subscription = source.add_change_listener(move |change| {
            if let Some(inner) = weak.upgrade() {
                inner.on_data_change(change);
            }
        });

        let previous = {
            let mut state = self.inner.state.lock();
            state.phase = BindingPhase::Bound(source.mode());
            state.source = Some(source);
            state.sort_orders.clear();
            state.subscription.replace(subscription)
        };
        drop(previous);

        tracing::debug!(target: targets::BINDING, mode = ?self.phase().mode(), "bound data source");
        self.inner.reset(ResetCause::Bind);
    }

    /// Releases the data source and clears the rows.
    pub fn unbind(&self) {
        let previous = {
            let mut state = self.inner.state.lock();
            state.generation += 1;
            state.source = None;
            state.phase = BindingPhase::Unbound;
            state.registry.remove_all();
            state.snapshot = Arc::new(RowSnapshot::unbound());
            state.subscription.take()
        };
        drop(previous);
        self.inner.rerender();
    }

    /// The bound data source.
    pub fn source(&self) -> Option<DataSource<T>> {
        self.inner.state.lock().source.clone()
    }

    /// The binding phase.
    pub fn phase(&self) -> BindingPhase {
        self.inner.state.lock().phase
    }

    /// Refetches the current page.
    pub fn refresh_all(&self) {
        self.inner.reset(ResetCause::DataChange);
    }

    /// Patches the row showing `item`'s identity, if it is on the current
    /// page. Does nothing otherwise.
    pub fn refresh_item(&self, item: &T) {
        self.inner.refresh_item(item);
    }

    // =========================================================================
    // Paging
    // =========================================================================

    /// Moves to `page`, clamped to the data set. Fails on an unpaged table.
    pub fn set_page(&self, page: usize) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if !state.page.is_paged() {
                return Err(TableError::Unpaged);
            }
            state.move_to_page(page);
        }
        self.inner.reset(ResetCause::Navigation);
        Ok(())
    }

    /// The current page, 0-based.
    pub fn page(&self) -> usize {
        self.inner.state.lock().page.current_page()
    }

    /// Moves as a paging control would. Returns `true` if the page changed.
    pub fn navigate(&self, navigation: PageNavigation) -> Result<bool> {
        let target = {
            let state = self.inner.state.lock();
            let page = &state.page;
            if !page.is_paged() {
                return Err(TableError::Unpaged);
            }
            let current = page.current_page();
            match navigation {
                PageNavigation::First => (current > 0).then_some(0),
                PageNavigation::Previous => page.can_go_previous().then(|| current - 1),
                PageNavigation::Next => page.can_go_next().then(|| current + 1),
                PageNavigation::Last => page.last_page().filter(|&last| last != current),
            }
        };
        match target {
            Some(page) => {
                self.set_page(page)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Changes the page length (`None` for unpaged) and resets to page 0.
    pub fn set_page_length(&self, page_length: Option<usize>) -> Result<()> {
        if page_length == Some(0) {
            return Err(TableError::InvalidPageLength);
        }
        {
            let mut state = self.inner.state.lock();
            state.config.page_length = page_length;
            state.generation += 1;
            state.page.set_page_length(page_length);
        }
        self.inner.reset(ResetCause::Configuration);
        Ok(())
    }

    /// The page length, `None` when unpaged.
    pub fn page_length(&self) -> Option<usize> {
        self.inner.state.lock().page.page_length()
    }

    /// The last page index, if any size is known.
    pub fn last_page(&self) -> Option<usize> {
        self.inner.state.lock().page.last_page()
    }

    /// What the table knows about the size of the data set.
    pub fn item_count(&self) -> ItemCount {
        self.inner.state.lock().page.item_count()
    }

    /// Paging chrome, for paged tables.
    pub fn page_chrome(&self) -> Option<PageChrome> {
        let state = self.inner.state.lock();
        state.page.is_paged().then(|| state.page.chrome())
    }

    /// Number of rows: the known size when paged, the fetched count when
    /// unpaged.
    pub fn row_count(&self) -> usize {
        self.inner.state.lock().fetched_size.unwrap_or(0)
    }

    // =========================================================================
    // Filter and sort
    // =========================================================================

    /// Filters an in-memory list and returns to page 0.
    pub fn set_filter<F>(&self, filter: F) -> Result<()>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let list = self.inner.list_for("set_filter")?;
        list.set_filter(filter);
        Ok(())
    }

    /// Removes an in-memory list's filter and returns to page 0.
    pub fn clear_filter(&self) -> Result<()> {
        let list = self.inner.list_for("clear_filter")?;
        list.clear_filter();
        Ok(())
    }

    /// Sorts an in-memory list and returns to page 0.
    pub fn set_sort<F>(&self, compare: F) -> Result<()>
    where
        F: Fn(&T, &T) -> std::cmp::Ordering + Send + Sync + 'static,
    {
        let list = self.inner.list_for("set_sort")?;
        list.set_sort(compare);
        Ok(())
    }

    /// Removes an in-memory list's comparator and returns to page 0.
    pub fn clear_sort(&self) -> Result<()> {
        let list = self.inner.list_for("clear_sort")?;
        list.clear_sort();
        Ok(())
    }

    /// Passes backend sort orders to a pull or lazy provider and returns to
    /// page 0.
    pub fn set_sort_orders(&self, sort_orders: Vec<SortOrder>) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            match &state.source {
                Some(source) if source.supports_sort_orders() => {}
                Some(_) => return Err(TableError::not_backend_bound("set_sort_orders")),
                None => return Err(TableError::Unbound),
            }
            state.sort_orders = sort_orders;
            state.move_to_page(0);
        }
        self.inner.reset(ResetCause::Configuration);
        Ok(())
    }

    /// The backend sort orders.
    pub fn sort_orders(&self) -> Vec<SortOrder> {
        self.inner.state.lock().sort_orders.clone()
    }

    // =========================================================================
    // Rows
    // =========================================================================

    /// The current rows.
    pub fn rows(&self) -> Arc<RowSnapshot<T>> {
        self.inner.state.lock().snapshot.clone()
    }

    /// The items on the current page.
    pub fn items(&self) -> Vec<T> {
        self.rows().items()
    }

    /// The key issued for `item`'s identity since the last reset.
    pub fn key_of(&self, item: &T) -> Option<IdentityKey> {
        self.inner.state.lock().registry.get(item)
    }

    /// Fetches the item at `index` of the filtered, sorted data set.
    pub fn fetch_item(&self, index: usize) -> Result<Option<T>> {
        let (source, sort_orders) = {
            let state = self.inner.state.lock();
            let source = state.source.clone().ok_or(TableError::Unbound)?;
            (source, state.sort_orders.clone())
        };
        let query = Query::page(index, 1).with_sort_orders(sort_orders);

        let _session = self.inner.fetch_lock.lock();
        let items = match &source {
            DataSource::InMemory(list) => {
                let view = list.view();
                if index >= view.len() {
                    return Err(TableError::IndexOutOfRange {
                        index,
                        size: view.len(),
                    });
                }
                view.fetch(&query)?
            }
            DataSource::Pull(provider) => PageSource::fetch(provider.as_ref(), &query)?,
            DataSource::Lazy(provider) => PageSource::fetch(provider.as_ref(), &query)?,
        };
        Ok(items.into_iter().next())
    }

    /// Replaces the identifier function used for keys and selection.
    ///
    /// Keys already issued are not regenerated, and selected items keep the
    /// identity they were selected under; both follow the new function after
    /// the next reset or re-selection.
    pub fn set_identifier<F>(&self, identifier: F)
    where
        F: Fn(&T) -> I + Send + Sync + 'static,
    {
        let identifier: IdentifierFn<T, I> = Arc::new(identifier);
        let mut state = self.inner.state.lock();
        state.registry.set_identifier(identifier.clone());
        state.selection.set_identifier(identifier);
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Appends a column without a key.
    pub fn add_column<F>(&self, header: impl Into<String>, value: F) -> ColumnId
    where
        F: Fn(&T) -> CellValue + Send + Sync + 'static,
    {
        self.update_columns(|columns| columns.add_column(header, value))
    }

    /// Appends a keyed column with a header derived from the key.
    pub fn add_keyed_column<F>(&self, key: &str, value: F) -> Result<ColumnId>
    where
        F: Fn(&T) -> CellValue + Send + Sync + 'static,
    {
        self.add(Column::new(header_from_key(key), value).with_key(key))
    }

    /// Appends a fully configured column.
    pub fn add(&self, column: Column<T>) -> Result<ColumnId> {
        self.update_columns(|columns| columns.add(column))
    }

    /// Removes a column.
    pub fn remove_column(&self, id: ColumnId) -> Result<()> {
        self.update_columns(|columns| columns.remove_column(id).map(drop))
    }

    /// Edits the columns and redraws the current rows.
    pub fn update_columns<R, F>(&self, edit: F) -> R
    where
        F: FnOnce(&mut Columns<T>) -> R,
    {
        let result = edit(&mut self.inner.state.lock().columns);
        self.inner.rerender();
        result
    }

    /// The column with `key`.
    pub fn column(&self, key: &str) -> Option<Arc<Column<T>>> {
        self.inner.state.lock().columns.column(key).cloned()
    }

    /// Every column in display order.
    pub fn columns(&self) -> Vec<Arc<Column<T>>> {
        self.inner.state.lock().columns.to_vec()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Selects items. Emits one event if membership changed.
    pub fn select<It: IntoIterator<Item = T>>(&self, items: It) -> bool {
        self.inner
            .apply_selection(ChangeOrigin::Programmatic, |selection| selection.select(items))
    }

    /// Deselects items. Emits one event if membership changed.
    pub fn deselect<It: IntoIterator<Item = T>>(&self, items: It) -> bool {
        self.inner
            .apply_selection(ChangeOrigin::Programmatic, |selection| selection.deselect(items))
    }

    /// Clears the selection. Emits one event if anything was selected.
    pub fn deselect_all(&self) -> bool {
        self.inner
            .apply_selection(ChangeOrigin::Programmatic, SelectionTracker::deselect_all)
    }

    /// Flips `item`'s selection on behalf of the user. Ignored while client
    /// selection is disabled.
    pub fn toggle(&self, item: &T) -> bool {
        if !self.is_selection_enabled() {
            tracing::trace!(target: targets::SELECTION, "toggle ignored, selection disabled");
            return false;
        }
        self.inner
            .apply_selection(ChangeOrigin::Client, |selection| selection.toggle(item))
    }

    /// Handles a click on the row with `key`: toggles its selection when
    /// enabled and emits [`TableSignals::item_clicked`]. Returns `false` if
    /// no visible row has the key.
    pub fn click_row(&self, key: &IdentityKey) -> bool {
        let Some(row) = self.rows().find(key).cloned() else {
            return false;
        };
        self.toggle(&row.item);
        self.inner.signals.item_clicked.emit(ItemClicked {
            item: row.item.clone(),
            key: row.key.clone(),
        });
        true
    }

    /// The selected items in selection order.
    pub fn selected(&self) -> Vec<T> {
        self.inner.state.lock().selection.selected()
    }

    /// Returns `true` if `item`'s identity is selected.
    pub fn is_selected(&self, item: &T) -> bool {
        self.inner.state.lock().selection.contains(item)
    }

    /// Enables or disables client-driven selection.
    pub fn set_selection_enabled(&self, enabled: bool) {
        self.inner.state.lock().config.selection_enabled = enabled;
    }

    /// Returns `true` if client-driven selection is enabled.
    pub fn is_selection_enabled(&self) -> bool {
        self.inner.state.lock().config.selection_enabled
    }
}

impl<T, I> std::fmt::Debug for Table<T, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Table")
            .field("phase", &state.phase)
            .field("page", &state.page)
            .field("generation", &state.generation)
            .field("rows", &state.snapshot.len())
            .finish()
    }
}

impl<T, I> TableInner<T, I>
where
    T: Clone + Send + Sync + 'static,
    I: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn on_data_change(self: &Arc<Self>, change: &DataChange<T>) {
        match change {
            DataChange::RefreshAll => self.reset(ResetCause::DataChange),
            DataChange::RefreshItem(item) => self.refresh_item(item),
        }
    }

    fn list_for(
        &self,
        operation: &'static str,
    ) -> Result<Arc<ListSource<T>>> {
        let mut state = self.state.lock();
        let list = match &state.source {
            Some(DataSource::InMemory(list)) => list.clone(),
            Some(_) => return Err(TableError::not_list_bound(operation)),
            None => return Err(TableError::Unbound),
        };
        // The list's refresh-all notification performs the reset.
        state.move_to_page(0);
        Ok(list)
    }

    fn reset(self: &Arc<Self>, cause: ResetCause) {
        let _perf = PerfSpan::new(span_names::RESET);

        let (source, generation, mut page, sort_orders, config) = {
            let mut state = self.state.lock();
            let Some(source) = state.source.clone() else {
                return;
            };
            state.generation += 1;
            state.phase = BindingPhase::Resetting(source.mode());
            (
                source,
                state.generation,
                state.page.clone(),
                state.sort_orders.clone(),
                state.config.clone(),
            )
        };
        let estimate_increase = match source.estimate_increase() {
            Some(increase) => increase.max(1),
            None => config.effective_estimate_increase(page.page_length().unwrap_or(1)),
        };

        tracing::debug!(
            target: targets::BINDING,
            generation,
            ?cause,
            page = page.current_page(),
            "full reset"
        );

        let result = {
            let _session = self.fetch_lock.lock();
            match &source {
                DataSource::InMemory(list) => {
                    let view = list.view();
                    load_page(&view, &mut page, &sort_orders, estimate_increase, cause)
                }
                DataSource::Pull(provider) => load_page(
                    provider.as_ref(),
                    &mut page,
                    &sort_orders,
                    estimate_increase,
                    cause,
                ),
                DataSource::Lazy(provider) => load_page(
                    provider.as_ref(),
                    &mut page,
                    &sort_orders,
                    estimate_increase,
                    cause,
                ),
            }
        };

        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.generation != generation {
            tracing::debug!(
                target: targets::BINDING,
                generation,
                current = state.generation,
                "dropping superseded fetch result"
            );
            return;
        }

        state.registry.remove_all();
        let offset = page.offset();
        let snapshot = match result {
            Ok(items) => {
                let fetched = items.len();
                let registry = &mut state.registry;
                let rows = items
                    .into_iter()
                    .enumerate()
                    .map(|(position, item)| RowModel {
                        key: registry.key(&item),
                        item,
                        index: offset + position,
                    })
                    .collect();

                let size = page.item_count().value().unwrap_or(offset + fetched);
                tracing::debug!(
                    target: targets::BINDING,
                    generation,
                    offset,
                    limit = ?page.page_length(),
                    fetched,
                    size,
                    "page loaded"
                );
                state.fetched_size = Some(size);
                self.schedule_size_notification(state);
                RowSnapshot::from_rows(generation, rows)
            }
            Err(error) => {
                tracing::error!(target: targets::BINDING, generation, %error, "fetch failed");
                RowSnapshot::failed(generation, &error)
            }
        };

        state.page = page;
        state.snapshot = Arc::new(snapshot);
        state.phase = BindingPhase::Bound(source.mode());
        let pass = state.render_pass();
        drop(guard);

        self.render(&pass);
        self.signals.rows_reset.emit(pass.snapshot);
    }

    fn refresh_item(&self, item: &T) {
        let _perf = PerfSpan::new(span_names::REFRESH_ITEM);

        let (mode, row, columns, selected) = {
            let mut state = self.state.lock();
            let Some(mode) = state.mode() else {
                return;
            };
            let Some(key) = state.registry.get(item) else {
                tracing::trace!(target: targets::BINDING, "refreshed item is not on the page");
                return;
            };
            let Some(position) = state.snapshot.position(&key) else {
                return;
            };
            let Some(index) = state.snapshot.get(position).map(|row| row.index) else {
                return;
            };

            state.phase = BindingPhase::Refreshing(mode);
            let snapshot = Arc::new(state.snapshot.with_row(
                position,
                RowModel {
                    key,
                    item: item.clone(),
                    index,
                },
            ));
            state.snapshot = snapshot.clone();

            let Some(row) = snapshot.get(position).cloned() else {
                state.phase = BindingPhase::Bound(mode);
                return;
            };
            (mode, row, state.columns.to_vec(), state.selection.contains(item))
        };

        tracing::debug!(target: targets::BINDING, key = %row.key, "row refreshed");
        if let Some(renderer) = self.renderer() {
            renderer.render_row(&row, &columns, selected);
        }
        self.signals.row_refreshed.emit(row);

        // A reset started by a listener owns the phase from here on.
        let mut state = self.state.lock();
        if state.phase == BindingPhase::Refreshing(mode) {
            state.phase = BindingPhase::Bound(mode);
        }
    }

    fn apply_selection<F>(&self, origin: ChangeOrigin, apply: F) -> bool
    where
        F: FnOnce(&mut SelectionTracker<T, I>) -> SelectionDelta<I>,
    {
        let (event, decorations) = {
            let mut state = self.state.lock();
            let delta = apply(&mut state.selection);
            if delta.is_empty() {
                return false;
            }
            let decorations: Vec<(IdentityKey, bool)> = state
                .snapshot
                .rows()
                .iter()
                .filter_map(|row| {
                    let identity = state.selection.identity(&row.item);
                    delta
                        .state_of(&identity)
                        .map(|selected| (row.key.clone(), selected))
                })
                .collect();
            let event = SelectionChanged {
                selected: state.selection.selected(),
                origin,
            };
            (event, decorations)
        };

        tracing::debug!(
            target: targets::SELECTION,
            ?origin,
            selected = event.selected.len(),
            "selection changed"
        );
        if let Some(renderer) = self.renderer() {
            for (key, selected) in &decorations {
                renderer.decorate_selection(key, *selected);
            }
        }
        self.signals.selection_changed.emit(event);
        true
    }

    fn schedule_size_notification(self: &Arc<Self>, state: &mut TableState<T, I>) {
        if state.size_request.is_some() {
            return;
        }
        let weak = Arc::downgrade(self);
        let task = self.flush_queue.post(move || {
            if let Some(inner) = weak.upgrade() {
                inner.fire_size_event();
            }
        });
        state.size_request = Some(task);
    }

    fn fire_size_event(&self) {
        let size = {
            let mut state = self.state.lock();
            state.size_request = None;
            match state.fetched_size {
                Some(size) if state.notified_size != Some(size) => {
                    state.notified_size = Some(size);
                    size
                }
                _ => return,
            }
        };
        tracing::debug!(target: targets::BINDING, size, "size changed");
        self.signals.size_changed.emit(size);
    }

    fn renderer(&self) -> Option<Arc<dyn TableRenderer<T>>> {
        self.renderer.read().clone()
    }

    fn rerender(&self) {
        let pass = self.state.lock().render_pass();
        self.render(&pass);
    }

    fn render(&self, pass: &RenderPass<T>) {
        let Some(renderer) = self.renderer() else {
            return;
        };
        renderer.clear_rows();
        match pass.snapshot.placeholder() {
            Some(placeholder) => renderer.render_placeholder(placeholder, pass.column_span),
            None => {
                for (row, selected) in pass.snapshot.rows().iter().zip(&pass.selected) {
                    renderer.render_row(row, &pass.columns, *selected);
                }
            }
        }
        if let Some(chrome) = &pass.chrome {
            renderer.render_page_chrome(chrome);
        }
    }
}

/// Resolves the size and fetches the current page from one session.
///
/// `page` is updated in place: size knowledge, clamped page, and whatever the
/// fetch revealed about the end of the data.
fn load_page<T, S>(
    session: &S,
    page: &mut PageState,
    sort_orders: &[SortOrder],
    estimate_increase: usize,
    cause: ResetCause,
) -> std::result::Result<Vec<T>, FetchError>
where
    S: PageSource<T> + ?Sized,
{
    let Some(page_length) = page.page_length() else {
        let items = session.fetch(&page.query(sort_orders))?;
        page.reconcile(items.len(), estimate_increase);
        return Ok(items);
    };

    let count_query = Query::all().with_sort_orders(sort_orders.to_vec());
    let fresh = session.item_count(&count_query)?;
    let count = match (cause, page.item_count(), fresh) {
        // Paging keeps what earlier pages revealed past the source's own
        // estimate, or the end found for an unknown size.
        (ResetCause::Navigation, ItemCount::Estimate(believed), ItemCount::Estimate(estimate)) => {
            ItemCount::Estimate(believed.max(estimate))
        }
        (ResetCause::Navigation, ItemCount::Exact(known), ItemCount::Unknown) => {
            ItemCount::Exact(known)
        }
        _ => fresh,
    };
    page.set_item_count(count);

    let mut attempts = 0;
    loop {
        let mut items = session.fetch(&page.query(sort_orders))?;
        items.truncate(page_length);

        match page.reconcile(items.len(), estimate_increase) {
            Reconciliation::PastEnd => {
                attempts += 1;
                tracing::debug!(
                    target: targets::BINDING,
                    page = page.current_page(),
                    attempts,
                    "page past the end of data"
                );
                if attempts == 1 {
                    page.clamp();
                } else {
                    page.set_item_count(ItemCount::Unknown);
                    page.set_current_page(0);
                }
            }
            Reconciliation::Resized => {
                tracing::debug!(
                    target: targets::BINDING,
                    count = ?page.item_count(),
                    "size corrected by fetch"
                );
                return Ok(items);
            }
            Reconciliation::Unchanged => return Ok(items),
        }
    }
}

static_assertions::assert_impl_all!(Table<String>: Send, Sync);
static_assertions::assert_impl_all!(Table<String, u64>: Send, Sync);
