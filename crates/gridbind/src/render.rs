//! The interface to whatever draws the table.
//!
//! The engine never builds visual elements. It calls a [`TableRenderer`] with
//! row models, placeholders, page chrome and selection changes, always after
//! releasing its own lock, so a renderer may call back into the table.

use std::sync::Arc;

use crate::column::Column;
use crate::identity::IdentityKey;
use crate::paging::PageChrome;
use crate::row::{Placeholder, RowModel};

/// Receives rendering instructions from a table.
///
/// Every method has an empty default, so a renderer implements only what it
/// draws.
pub trait TableRenderer<T>: Send + Sync {
    /// Drops every rendered row. Called at the start of each full reset.
    fn clear_rows(&self) {}

    /// Draws one row. On a single-row refresh this is called for that row
    /// only and replaces the row with the same key.
    fn render_row(&self, _row: &RowModel<T>, _columns: &[Arc<Column<T>>], _selected: bool) {}

    /// Fills the row area with a placeholder spanning `_column_span` cells.
    fn render_placeholder(&self, _placeholder: &Placeholder, _column_span: usize) {}

    /// Draws paging controls. Only called for paged tables.
    fn render_page_chrome(&self, _chrome: &PageChrome) {}

    /// Marks a visible row as selected or not.
    fn decorate_selection(&self, _key: &IdentityKey, _selected: bool) {}
}

/// A renderer that draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl<T> TableRenderer<T> for NullRenderer {}
