//! Row models and immutable row snapshots.

use std::sync::Arc;

use crate::error::FetchError;
use crate::identity::IdentityKey;

/// One visible row: an item, its stable key and its absolute position.
#[derive(Debug, Clone, PartialEq)]
pub struct RowModel<T> {
    /// Stable key of the item's identity.
    pub key: IdentityKey,
    /// The item.
    pub item: T,
    /// Absolute index in the (filtered, sorted) data set.
    pub index: usize,
}

/// What occupies the row area when there are no rows to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// The fetch succeeded and returned nothing.
    NoData,
    /// The size or fetch request failed.
    FetchFailed {
        /// The failure message.
        message: String,
    },
}

impl Placeholder {
    /// Returns `true` for the failure placeholder.
    pub fn is_failure(&self) -> bool {
        matches!(self, Placeholder::FetchFailed { .. })
    }
}

impl From<&FetchError> for Placeholder {
    fn from(error: &FetchError) -> Self {
        Placeholder::FetchFailed {
            message: error.message().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
enum Body<T> {
    Rows(Vec<Arc<RowModel<T>>>),
    Placeholder(Placeholder),
}

/// The rows a table shows, as of one reset.
///
/// Snapshots are never mutated. A reset swaps in a new one; a single-row
/// refresh swaps in a copy sharing every other row.
#[derive(Debug, Clone)]
pub struct RowSnapshot<T> {
    generation: u64,
    body: Body<T>,
}

impl<T> RowSnapshot<T> {
    /// The snapshot of a table that never fetched.
    pub(crate) fn unbound() -> Self {
        Self {
            generation: 0,
            body: Body::Rows(Vec::new()),
        }
    }

    /// A snapshot of fetched rows; no rows means [`Placeholder::NoData`].
    pub(crate) fn from_rows(generation: u64, rows: Vec<RowModel<T>>) -> Self {
        let body = if rows.is_empty() {
            Body::Placeholder(Placeholder::NoData)
        } else {
            Body::Rows(rows.into_iter().map(Arc::new).collect())
        };
        Self { generation, body }
    }

    /// A snapshot of a failed fetch.
    pub(crate) fn failed(generation: u64, error: &FetchError) -> Self {
        Self {
            generation,
            body: Body::Placeholder(error.into()),
        }
    }

    /// A copy with the row at `position` replaced.
    pub(crate) fn with_row(&self, position: usize, row: RowModel<T>) -> Self {
        let body = match &self.body {
            Body::Rows(rows) => {
                let mut rows = rows.clone();
                if let Some(slot) = rows.get_mut(position) {
                    *slot = Arc::new(row);
                }
                Body::Rows(rows)
            }
            Body::Placeholder(placeholder) => Body::Placeholder(placeholder.clone()),
        };
        Self {
            generation: self.generation,
            body,
        }
    }

    /// The reset generation that produced this snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The rows, empty when a placeholder is shown.
    pub fn rows(&self) -> &[Arc<RowModel<T>>] {
        match &self.body {
            Body::Rows(rows) => rows,
            Body::Placeholder(_) => &[],
        }
    }

    /// The placeholder, if the row area shows one.
    pub fn placeholder(&self) -> Option<&Placeholder> {
        match &self.body {
            Body::Rows(_) => None,
            Body::Placeholder(placeholder) => Some(placeholder),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows().len()
    }

    /// Returns `true` if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    /// The row at `position`.
    pub fn get(&self, position: usize) -> Option<&Arc<RowModel<T>>> {
        self.rows().get(position)
    }

    /// Position of the row with `key`.
    pub fn position(&self, key: &IdentityKey) -> Option<usize> {
        self.rows().iter().position(|row| &row.key == key)
    }

    /// The row with `key`.
    pub fn find(&self, key: &IdentityKey) -> Option<&Arc<RowModel<T>>> {
        self.rows().iter().find(|row| &row.key == key)
    }

    /// The keys in display order.
    pub fn keys(&self) -> Vec<IdentityKey> {
        self.rows().iter().map(|row| row.key.clone()).collect()
    }
}

impl<T: Clone> RowSnapshot<T> {
    /// The items in display order.
    pub fn items(&self) -> Vec<T> {
        self.rows().iter().map(|row| row.item.clone()).collect()
    }
}
