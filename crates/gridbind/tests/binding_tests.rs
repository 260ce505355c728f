//! Tests for binding, paging and refresh behavior across source kinds.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use gridbind::prelude::*;
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq)]
struct Person {
    id: u32,
    name: String,
}

fn people() -> Vec<Person> {
    (1..=109)
        .map(|id| {
            let name = match id {
                12 => "Ben Carter".to_string(),
                47 => "Reuben Diaz".to_string(),
                88 => "Benita Ruiz".to_string(),
                _ => format!("Person {id}"),
            };
            Person { id, name }
        })
        .collect()
}

fn matching(all: &[Person], query: &Query<String>) -> Vec<Person> {
    all.iter()
        .filter(|person| {
            query.filter().is_none_or(|needle| {
                person
                    .name
                    .to_lowercase()
                    .contains(&needle.to_lowercase())
            })
        })
        .cloned()
        .collect()
}

/// Logs to the test output when `RUST_LOG` is set, e.g. `RUST_LOG=gridbind=debug`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn person_table(page_length: usize) -> Table<Person, u32> {
    TableBuilder::with_identifier(Arc::new(|person: &Person| person.id))
        .page_length(page_length)
        .build()
        .unwrap()
}

fn record_sizes<T, I>(table: &Table<T, I>) -> (Arc<Mutex<Vec<usize>>>, Subscription)
where
    T: Clone + Send + Sync + 'static,
    I: Eq + std::hash::Hash + Clone + Send + Sync + 'static,
{
    let sizes = Arc::new(Mutex::new(Vec::new()));
    let sizes_clone = sizes.clone();
    let subscription = table
        .signals()
        .size_changed
        .subscribe(move |size| sizes_clone.lock().push(*size));
    (sizes, subscription)
}

fn count<Args: Send + 'static>(signal: &Signal<Args>) -> (Arc<AtomicUsize>, Subscription) {
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = counter.clone();
    let subscription = signal.subscribe(move |_| {
        counter_clone.fetch_add(1, Ordering::SeqCst);
    });
    (counter, subscription)
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Clear,
    Row(String, bool),
    Placeholder(Placeholder, usize),
    Chrome(String),
}

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<Call>>,
}

impl Recorder {
    fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock())
    }
}

impl TableRenderer<Person> for Recorder {
    fn clear_rows(&self) {
        self.calls.lock().push(Call::Clear);
    }

    fn render_row(&self, row: &RowModel<Person>, _columns: &[Arc<Column<Person>>], selected: bool) {
        self.calls
            .lock()
            .push(Call::Row(row.item.name.clone(), selected));
    }

    fn render_placeholder(&self, placeholder: &Placeholder, column_span: usize) {
        self.calls
            .lock()
            .push(Call::Placeholder(placeholder.clone(), column_span));
    }

    fn render_page_chrome(&self, chrome: &PageChrome) {
        self.calls.lock().push(Call::Chrome(chrome.label()));
    }
}

// ============================================================================
// Lazy provider
// ============================================================================

#[test]
fn test_lazy_filter_scenario() {
    init_tracing();
    let all = Arc::new(people());
    let fetch_all = all.clone();
    let source = Arc::new(LazySource::with_size(
        move |query: &Query<String>| {
            let rows = matching(&fetch_all, query);
            Ok(query.window(&rows).to_vec())
        },
        move |query: &Query<String>| Ok(matching(&all, query).len()),
    ));

    let table = person_table(20);
    let (sizes, _subscription) = record_sizes(&table);

    table.bind(source.clone());
    assert_eq!(table.last_page(), Some(5));
    table.set_page(3).unwrap();
    assert_eq!(table.rows().rows()[0].item.id, 61);

    source.set_filter(Some("ben".to_string()));
    assert!(sizes.lock().is_empty());

    table.flush();
    assert_eq!(*sizes.lock(), vec![3]);
    assert_eq!(table.page(), 0);
    assert_eq!(table.last_page(), Some(0));

    let ids: Vec<u32> = table.items().iter().map(|person| person.id).collect();
    assert_eq!(ids, vec![12, 47, 88]);
}

#[test]
fn test_lazy_size_failure_keeps_previous_size() {
    let fail = Arc::new(AtomicUsize::new(0));
    let size_fail = fail.clone();
    let source: Arc<LazySource<u32>> = Arc::new(LazySource::with_size(
        |query: &Query<()>| {
            let start = query.offset as u32;
            Ok((start..start + 10).collect())
        },
        move |_: &Query<()>| {
            if size_fail.load(Ordering::SeqCst) > 0 {
                Err(FetchError::new("size service unavailable"))
            } else {
                Ok(40)
            }
        },
    ));

    let table: Table<u32> = Table::paged(10).unwrap();
    let (sizes, _subscription) = record_sizes(&table);
    table.bind(source.clone());
    table.flush();
    assert_eq!(*sizes.lock(), vec![40]);

    fail.store(1, Ordering::SeqCst);
    source.refresh_all();
    table.flush();

    assert!(table.rows().placeholder().is_some_and(Placeholder::is_failure));
    assert_eq!(*sizes.lock(), vec![40]);
    assert_eq!(table.row_count(), 40);
}

// ============================================================================
// Size notifications
// ============================================================================

#[test]
fn test_size_events_coalesce_per_flush() {
    let list = Arc::new(ListSource::new((0..109u32).collect()));
    let table: Table<u32> = Table::paged(20).unwrap();
    let (sizes, _subscription) = record_sizes(&table);

    table.bind(list.clone());
    table.set_page(4).unwrap();
    table.set_filter(|n: &u32| n % 10 == 0).unwrap();
    assert!(sizes.lock().is_empty());

    assert_eq!(table.flush(), 1);
    assert_eq!(*sizes.lock(), vec![11]);

    // Nothing new to report.
    assert_eq!(table.flush(), 0);
    assert_eq!(*sizes.lock(), vec![11]);

    list.add_item(200);
    table.flush();
    assert_eq!(*sizes.lock(), vec![11, 12]);
}

#[test]
fn test_shared_flush_queue() {
    let queue = Arc::new(FlushQueue::new());
    let first: Table<u32> = TableBuilder::new()
        .page_length(5)
        .flush_queue(queue.clone())
        .build()
        .unwrap();
    let second: Table<u32> = TableBuilder::new().flush_queue(queue.clone()).build().unwrap();
    let (first_sizes, _first) = record_sizes(&first);
    let (second_sizes, _second) = record_sizes(&second);

    first.bind(Arc::new(ListSource::new(vec![1, 2, 3])));
    second.bind(Arc::new(ListSource::new(vec![4, 5])));
    assert_eq!(queue.pending_count(), 2);

    queue.flush();
    assert_eq!(*first_sizes.lock(), vec![3]);
    assert_eq!(*second_sizes.lock(), vec![2]);
}

// ============================================================================
// Refresh
// ============================================================================

#[test]
fn test_refresh_item_patches_single_row() {
    let list = Arc::new(ListSource::new(people()));
    let recorder = Arc::new(Recorder::default());
    let table = person_table(10);
    table.set_renderer(recorder.clone());
    table.bind(list.clone());

    let (resets, _resets) = count(&table.signals().rows_reset);
    let (patches, _patches) = count(&table.signals().row_refreshed);
    let key_before: IdentityKey = table.rows().rows()[3].key.clone();
    recorder.take();

    list.update_item(3, |person| person.name = "Renamed".to_string());

    assert_eq!(recorder.take(), vec![Call::Row("Renamed".to_string(), false)]);
    assert_eq!(resets.load(Ordering::SeqCst), 0);
    assert_eq!(patches.load(Ordering::SeqCst), 1);
    assert_eq!(table.rows().rows()[3].key, key_before);
    assert_eq!(table.rows().rows()[3].item.name, "Renamed");
    assert_eq!(table.rows().rows()[3].index, 3);
}

#[test]
fn test_refresh_item_off_page_is_noop() {
    let list = Arc::new(ListSource::new(people()));
    let recorder = Arc::new(Recorder::default());
    let table = person_table(10);
    table.set_renderer(recorder.clone());
    table.bind(list.clone());
    let before = table.rows();
    recorder.take();

    list.update_item(50, |person| person.name = "Elsewhere".to_string());
    table.refresh_item(&Person {
        id: 999,
        name: "Nobody".to_string(),
    });

    assert!(recorder.take().is_empty());
    assert!(Arc::ptr_eq(&before, &table.rows()));
}

#[test]
fn test_refresh_all_rebuilds_rows() {
    let list = Arc::new(ListSource::new(people()));
    let recorder = Arc::new(Recorder::default());
    let table = person_table(20);
    table.set_renderer(recorder.clone());
    table.bind(list.clone());
    recorder.take();

    table.refresh_all();

    let calls = recorder.take();
    assert_eq!(calls.first(), Some(&Call::Clear));
    assert_eq!(calls.iter().filter(|call| matches!(call, Call::Row(..))).count(), 20);
    assert_eq!(calls.last(), Some(&Call::Chrome("1/6".to_string())));
}

#[test]
fn test_superseded_fetch_is_dropped() {
    init_tracing();
    let version = Arc::new(AtomicUsize::new(0));
    let trigger: Arc<Mutex<Option<Table<u32>>>> = Arc::new(Mutex::new(None));

    let fetch_version = version.clone();
    let fetch_trigger = trigger.clone();
    let source: Arc<CallbackSource<u32>> = Arc::new(CallbackSource::new(
        move |_: &Query<()>| {
            let base = fetch_version.load(Ordering::SeqCst) as u32 * 100;
            let pending = fetch_trigger.lock().take();
            if let Some(table) = pending {
                // A refresh arrives while this fetch is still running.
                fetch_version.store(1, Ordering::SeqCst);
                table.refresh_all();
            }
            Ok((base..base + 5).collect())
        },
        |_: &Query<()>| Ok(5),
    ));

    let table: Table<u32> = Table::paged(10).unwrap();
    table.bind(source);
    assert_eq!(table.items(), vec![0, 1, 2, 3, 4]);

    let (resets, _subscription) = count(&table.signals().rows_reset);
    *trigger.lock() = Some(table.clone());
    table.refresh_all();

    assert_eq!(table.items(), vec![100, 101, 102, 103, 104]);
    assert_eq!(resets.load(Ordering::SeqCst), 1);
    assert_eq!(table.phase(), BindingPhase::Bound(gridbind::source::BindingMode::Pull));
}

// ============================================================================
// Placeholders
// ============================================================================

#[test]
fn test_filter_change_during_reset_lands_on_first_page() {
    init_tracing();
    let table: Table<u32> = Table::paged(10).unwrap();
    table.bind(Arc::new(ListSource::new((0..200u32).collect())));

    let armed = Arc::new(AtomicBool::new(false));
    let entered = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));
    let gate = (armed.clone(), entered.clone(), release.clone());
    table
        .set_filter(move |_: &u32| {
            if gate.0.swap(false, Ordering::SeqCst) {
                gate.1.wait();
                gate.2.wait();
            }
            true
        })
        .unwrap();
    table.set_page(3).unwrap();
    assert_eq!(table.items()[0], 30);

    // This reset stalls inside the list's read lock, having copied page 3.
    armed.store(true, Ordering::SeqCst);
    let stalled = table.clone();
    let resetting = std::thread::spawn(move || stalled.refresh_all());
    entered.wait();

    let filtering = table.clone();
    let filter = std::thread::spawn(move || filtering.set_filter(|n: &u32| *n < 150));
    while table.page() != 0 {
        std::thread::yield_now();
    }
    release.wait();

    resetting.join().unwrap();
    filter.join().unwrap().unwrap();

    assert_eq!(table.page(), 0);
    assert_eq!(table.items(), (0..10).collect::<Vec<u32>>());
    assert_eq!(table.item_count(), ItemCount::Exact(150));
}

#[test]
fn test_failure_and_empty_placeholders() {
    let recorder = Arc::new(Recorder::default());
    let table = person_table(10);
    table.add_column("Id", |person: &Person| person.id.into());
    table.add_column("Name", |person: &Person| person.name.clone().into());
    table.set_renderer(recorder.clone());
    recorder.take();

    let failing: Arc<CallbackSource<Person>> = Arc::new(CallbackSource::new(
        |_: &Query<()>| Err(FetchError::new("connection reset")),
        |_: &Query<()>| Ok(3),
    ));
    table.bind(failing);
    assert_eq!(
        recorder.take(),
        vec![
            Call::Clear,
            Call::Placeholder(
                Placeholder::FetchFailed {
                    message: "connection reset".to_string()
                },
                2
            ),
            Call::Chrome("1/1".to_string()),
        ]
    );

    table.bind(Arc::new(ListSource::<Person>::empty()));
    assert_eq!(
        recorder.take(),
        vec![
            Call::Clear,
            Call::Placeholder(Placeholder::NoData, 2),
            Call::Chrome("1/1".to_string()),
        ]
    );
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_list_mutation() {
    init_tracing();
    let list = Arc::new(ListSource::new((0..100u32).collect()));
    let table: Table<u32> = Table::paged(10).unwrap();
    table.bind(list.clone());

    let writer = {
        let list = list.clone();
        std::thread::spawn(move || {
            for n in 100..300 {
                list.add_item(n);
            }
        })
    };

    for step in 0..200 {
        table.set_page(step % 25).unwrap();
        let rows = table.rows();
        assert!(rows.len() <= 10);
        for (position, row) in rows.rows().iter().enumerate() {
            assert_eq!(row.index, rows.rows()[0].index + position);
            assert_eq!(row.item as usize, row.index);
        }
    }

    writer.join().unwrap();
    table.refresh_all();
    assert_eq!(table.row_count(), 300);
}

#[test]
fn test_concurrent_tables_share_source() {
    let list = Arc::new(ListSource::new((0..50u32).collect()));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let list = list.clone();
            std::thread::spawn(move || {
                let table: Table<u32> = Table::paged(7).unwrap();
                table.bind(list);
                for page in 0..8 {
                    table.set_page(page).unwrap();
                }
                table.page()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 7);
    }
    assert_eq!(list.changes().connection_count(), 0);
}
