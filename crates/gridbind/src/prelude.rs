//! Commonly used types.
//!
//! ```
//! use gridbind::prelude::*;
//! ```

// ============================================================================
// Table
// ============================================================================

pub use crate::config::{TableBuilder, TableConfig};
pub use crate::error::{FetchError, TableError};
pub use crate::table::{BindingPhase, PageNavigation, Table};

// ============================================================================
// Sources
// ============================================================================

pub use crate::query::{Query, SortDirection, SortOrder};
pub use crate::source::{
    CallbackSource, DataChange, DataSource, LazyProvider, LazySource, ListSource, PullProvider,
};

// ============================================================================
// Rows, columns and rendering
// ============================================================================

pub use crate::column::{CellValue, Column, ColumnAlignment};
pub use crate::identity::IdentityKey;
pub use crate::paging::{ItemCount, PageChrome};
pub use crate::render::TableRenderer;
pub use crate::row::{Placeholder, RowModel, RowSnapshot};
pub use crate::selection::{ChangeOrigin, ItemClicked, SelectionChanged};

// ============================================================================
// Signals
// ============================================================================

pub use gridbind_core::{FlushQueue, Signal, Subscription};
