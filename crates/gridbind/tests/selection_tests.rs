//! Tests for identity-keyed selection and row clicks on a bound table.

use std::sync::Arc;

use gridbind::prelude::*;
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq)]
struct Task {
    id: u32,
    title: String,
}

fn task(id: u32) -> Task {
    Task {
        id,
        title: format!("Task {id}"),
    }
}

fn bound_table(selection_enabled: bool) -> (Table<Task, u32>, Arc<ListSource<Task>>) {
    let list = Arc::new(ListSource::new((1..=25).map(task).collect()));
    let table = TableBuilder::with_identifier(Arc::new(|task: &Task| task.id))
        .page_length(10)
        .selection_enabled(selection_enabled)
        .build()
        .unwrap();
    table.bind(list.clone());
    (table, list)
}

fn record_selection(
    table: &Table<Task, u32>,
) -> (Arc<Mutex<Vec<SelectionChanged<Task>>>>, Subscription) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    let subscription = table
        .signals()
        .selection_changed
        .subscribe(move |event| events_clone.lock().push(event.clone()));
    (events, subscription)
}

#[derive(Default)]
struct Decorations {
    marked: Mutex<Vec<(IdentityKey, bool)>>,
    rows: Mutex<Vec<(u32, bool)>>,
}

impl TableRenderer<Task> for Decorations {
    fn render_row(&self, row: &RowModel<Task>, _columns: &[Arc<Column<Task>>], selected: bool) {
        self.rows.lock().push((row.item.id, selected));
    }

    fn decorate_selection(&self, key: &IdentityKey, selected: bool) {
        self.marked.lock().push((key.clone(), selected));
    }
}

#[test]
fn test_select_is_idempotent() {
    let (table, _list) = bound_table(false);
    let (events, _subscription) = record_selection(&table);

    assert!(table.select([task(1), task(2)]));
    assert!(!table.select([task(1)]));
    assert!(!table.select([task(2), task(1)]));

    let events = events.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].selected, vec![task(1), task(2)]);
    assert_eq!(events[0].origin, ChangeOrigin::Programmatic);
}

#[test]
fn test_deselect_reports_once() {
    let (table, _list) = bound_table(false);
    table.select([task(3), task(4), task(5)]);
    let (events, _subscription) = record_selection(&table);

    assert!(table.deselect([task(4), task(99)]));
    assert!(!table.deselect([task(4)]));
    assert!(table.deselect_all());
    assert!(!table.deselect_all());

    let events = events.lock();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].selected, vec![task(3), task(5)]);
    assert!(events[1].selected.is_empty());
}

#[test]
fn test_selection_by_identity() {
    let (table, _list) = bound_table(false);
    table.select([task(7)]);

    let renamed = Task {
        id: 7,
        title: "Renamed".to_string(),
    };
    assert!(table.is_selected(&renamed));
    assert!(!table.select([renamed.clone()]));
    assert!(table.deselect([renamed]));
    assert!(table.selected().is_empty());
}

#[test]
fn test_selection_survives_paging_and_resets() {
    let (table, list) = bound_table(false);
    table.select([task(2), task(15)]);

    table.set_page(2).unwrap();
    list.add_item(task(26));
    table.set_page(0).unwrap();

    assert!(table.is_selected(&task(2)));
    assert!(table.is_selected(&task(15)));
    assert_eq!(table.selected(), vec![task(2), task(15)]);
}

#[test]
fn test_client_toggle_respects_enabled_flag() {
    let (table, _list) = bound_table(false);
    let (events, _subscription) = record_selection(&table);

    assert!(!table.toggle(&task(1)));
    assert!(events.lock().is_empty());

    table.set_selection_enabled(true);
    assert!(table.toggle(&task(1)));
    assert!(table.toggle(&task(1)));

    let events = events.lock();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(SelectionChanged::is_from_client));
    assert_eq!(events[0].selected, vec![task(1)]);
    assert!(events[1].selected.is_empty());
}

#[test]
fn test_click_row() {
    let (table, _list) = bound_table(true);
    let clicks = Arc::new(Mutex::new(Vec::new()));
    let clicks_clone = clicks.clone();
    let _clicked = table
        .signals()
        .item_clicked
        .subscribe(move |event| clicks_clone.lock().push(event.item.id));

    let key = table.rows().rows()[4].key.clone();
    assert!(table.click_row(&key));
    assert!(table.is_selected(&task(5)));
    assert_eq!(*clicks.lock(), vec![5]);

    // Clicks still reach listeners with selection disabled.
    table.set_selection_enabled(false);
    assert!(table.click_row(&key));
    assert!(table.is_selected(&task(5)));
    assert_eq!(*clicks.lock(), vec![5, 5]);

    table.set_page(1).unwrap();
    assert!(!table.click_row(&key));
}

#[test]
fn test_decorations_follow_visible_rows() {
    let (table, _list) = bound_table(false);
    let renderer = Arc::new(Decorations::default());
    table.set_renderer(renderer.clone());

    table.select([task(3), task(20)]);
    let key = table.key_of(&task(3)).unwrap();
    assert_eq!(*renderer.marked.lock(), vec![(key, true)]);

    renderer.rows.lock().clear();
    table.set_page(1).unwrap();
    let rows = renderer.rows.lock();
    assert_eq!(rows.len(), 10);
    assert!(rows.contains(&(20, true)));
    assert!(rows.contains(&(19, false)));
}
