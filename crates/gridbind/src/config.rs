//! Table configuration and builder.

use std::hash::Hash;
use std::sync::Arc;

use gridbind_core::FlushQueue;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, TableError};
use crate::identity::IdentifierFn;
use crate::render::TableRenderer;
use crate::table::Table;

/// Configuration for creating a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TableConfig {
    /// Items per page. `None` shows every item at once.
    pub page_length: Option<usize>,
    /// Whether client toggles and row clicks change the selection.
    pub selection_enabled: bool,
    /// How far an estimated size grows when paging reaches it. `None` uses
    /// the page length.
    pub estimate_increase: Option<usize>,
}

impl TableConfig {
    /// A paged configuration.
    pub fn paged(page_length: usize) -> Self {
        Self {
            page_length: Some(page_length),
            ..Default::default()
        }
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.page_length == Some(0) {
            return Err(TableError::InvalidPageLength);
        }
        Ok(())
    }

    /// The estimate increase to use, falling back to the page length.
    pub(crate) fn effective_estimate_increase(&self, page_length: usize) -> usize {
        self.estimate_increase.unwrap_or(page_length).max(1)
    }
}

/// Builder for creating Tables with custom configuration.
pub struct TableBuilder<T, I = T> {
    config: TableConfig,
    identifier: IdentifierFn<T, I>,
    flush_queue: Option<Arc<FlushQueue>>,
    renderer: Option<Arc<dyn TableRenderer<T>>>,
}

impl<T> TableBuilder<T, T>
where
    T: Eq + Hash + Clone + Send + Sync + 'static,
{
    /// Create a builder identifying items by value.
    pub fn new() -> Self {
        Self::with_identifier(Arc::new(|item: &T| item.clone()))
    }
}

impl<T> Default for TableBuilder<T, T>
where
    T: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, I> TableBuilder<T, I>
where
    T: Clone + Send + Sync + 'static,
    I: Eq + Hash + Clone + Send + Sync + 'static,
{
    /// Create a builder identifying items with `identifier`.
    pub fn with_identifier(identifier: IdentifierFn<T, I>) -> Self {
        Self {
            config: TableConfig::default(),
            identifier,
            flush_queue: None,
            renderer: None,
        }
    }

    /// Switch to a different identifier function, and identity type.
    pub fn identifier<J, F>(self, identifier: F) -> TableBuilder<T, J>
    where
        J: Eq + Hash + Clone + Send + Sync + 'static,
        F: Fn(&T) -> J + Send + Sync + 'static,
    {
        TableBuilder {
            config: self.config,
            identifier: Arc::new(identifier),
            flush_queue: self.flush_queue,
            renderer: self.renderer,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the page length.
    pub fn page_length(mut self, page_length: usize) -> Self {
        self.config.page_length = Some(page_length);
        self
    }

    /// Enable or disable client-driven selection.
    pub fn selection_enabled(mut self, enabled: bool) -> Self {
        self.config.selection_enabled = enabled;
        self
    }

    /// Set the estimate increase.
    pub fn estimate_increase(mut self, increase: usize) -> Self {
        self.config.estimate_increase = Some(increase);
        self
    }

    /// Share a flush queue with other tables, so one `flush()` delivers
    /// every table's deferred notifications.
    pub fn flush_queue(mut self, queue: Arc<FlushQueue>) -> Self {
        self.flush_queue = Some(queue);
        self
    }

    /// Set the renderer.
    pub fn renderer(mut self, renderer: Arc<dyn TableRenderer<T>>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Build the table.
    pub fn build(self) -> Result<Table<T, I>> {
        self.config.validate()?;
        Ok(Table::from_parts(
            self.config,
            self.identifier,
            self.flush_queue.unwrap_or_default(),
            self.renderer,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert_eq!(TableConfig::default().validate(), Ok(()));
        assert_eq!(TableConfig::paged(20).validate(), Ok(()));
        assert_eq!(
            TableConfig::paged(0).validate(),
            Err(TableError::InvalidPageLength)
        );
    }

    #[test]
    fn test_estimate_increase_fallback() {
        assert_eq!(TableConfig::paged(20).effective_estimate_increase(20), 20);
        let config = TableConfig {
            estimate_increase: Some(100),
            ..TableConfig::paged(20)
        };
        assert_eq!(config.effective_estimate_increase(20), 100);
    }

    #[test]
    fn test_builder_rejects_zero_page_length() {
        let result = TableBuilder::<String>::new().page_length(0).build();
        assert!(matches!(result, Err(TableError::InvalidPageLength)));
    }

    #[test]
    fn test_builder_identifier() {
        let table = TableBuilder::<(u32, String)>::new()
            .identifier(|row: &(u32, String)| row.0)
            .page_length(10)
            .selection_enabled(true)
            .build()
            .unwrap();
        assert_eq!(table.page_length(), Some(10));
        assert!(table.is_selection_enabled());
    }
}
