//! gridbind - data binding and pagination for row-oriented tables.
//!
//! A [`Table`] binds to one data source, fetches a page at a time, keys every
//! row by item identity, and hands immutable row snapshots to a
//! [`TableRenderer`] and to signal subscribers. Three kinds of source are
//! supported:
//!
//! - [`ListSource`]: an in-memory list with in-process filter and sort
//! - [`CallbackSource`]: a fetch callback plus an authoritative size
//! - [`LazySource`]: an offset/limit fetch with an exact, estimated or
//!   unknown size
//!
//! Size change notifications are deferred to the table's [`FlushQueue`] and
//! coalesced, so a burst of paging and filtering produces one event.
//!
//! # Example
//!
//! ```
//! use gridbind::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Person {
//!     id: u32,
//!     name: String,
//! }
//!
//! let people = Arc::new(ListSource::new(
//!     (1..=109)
//!         .map(|id| Person { id, name: format!("Person {id}") })
//!         .collect(),
//! ));
//!
//! let table = TableBuilder::with_identifier(Arc::new(|person: &Person| person.id))
//!     .page_length(20)
//!     .build()
//!     .unwrap();
//! table.add_keyed_column("name", |person: &Person| person.name.clone().into()).unwrap();
//! table.bind(people.clone());
//!
//! assert_eq!(table.rows().len(), 20);
//! assert_eq!(table.last_page(), Some(5));
//!
//! table.set_filter(|person: &Person| person.name.ends_with('7')).unwrap();
//! assert_eq!(table.row_count(), 11);
//! ```

pub mod column;
pub mod config;
pub mod error;
pub mod identity;
pub mod paging;
pub mod prelude;
pub mod query;
pub mod render;
pub mod row;
pub mod selection;
pub mod source;
pub mod table;

pub use column::{CellValue, Column, ColumnAlignment, ColumnId, Columns};
pub use config::{TableBuilder, TableConfig};
pub use error::{FetchError, Result, TableError};
pub use identity::IdentityKey;
pub use paging::{ItemCount, PageChrome, PageState};
pub use query::{Query, SortDirection, SortOrder};
pub use render::{NullRenderer, TableRenderer};
pub use row::{Placeholder, RowModel, RowSnapshot};
pub use selection::{ChangeOrigin, ItemClicked, SelectionChanged};
pub use source::{CallbackSource, DataChange, DataSource, LazySource, ListSource};
pub use table::{BindingPhase, PageNavigation, Table, TableSignals};

pub use gridbind_core::{FlushQueue, Signal, Subscription};
