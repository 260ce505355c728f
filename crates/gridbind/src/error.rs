//! Error types for gridbind.

/// Result type alias for table operations.
pub type Result<T> = std::result::Result<T, TableError>;

/// Configuration errors raised synchronously by the call that caused them.
///
/// These are programmer errors. The only exception is [`TableError::Fetch`],
/// returned by direct single-item fetches; fetch failures during resets are
/// recovered inside the table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// Page navigation was requested on a table without a page length.
    #[error("Page navigation requires a page length; the table is unpaged")]
    Unpaged,

    /// A page length of zero was configured.
    #[error("Page length must be greater than zero")]
    InvalidPageLength,

    /// A column key is already used by another column.
    #[error("Column key '{0}' is already in use")]
    DuplicateColumnKey(String),

    /// No column exists for the given key.
    #[error("No column with key '{0}'")]
    UnknownColumn(String),

    /// The operation needs an in-memory list binding.
    #[error("'{operation}' requires an in-memory list binding")]
    NotListBound {
        /// The rejected operation.
        operation: &'static str,
    },

    /// The operation needs a pull or lazy provider binding.
    #[error("'{operation}' requires a pull or lazy provider binding")]
    NotBackendBound {
        /// The rejected operation.
        operation: &'static str,
    },

    /// The table has no data source.
    #[error("No data source is bound")]
    Unbound,

    /// An item index is outside the data set.
    #[error("Index {index} is outside of the accepted range 0..{size}")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The size of the data set.
        size: usize,
    },

    /// A direct item fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl TableError {
    /// Create a list-binding error for an operation.
    pub fn not_list_bound(operation: &'static str) -> Self {
        Self::NotListBound { operation }
    }

    /// Create a backend-binding error for an operation.
    pub fn not_backend_bound(operation: &'static str) -> Self {
        Self::NotBackendBound { operation }
    }
}

/// A data source failed to answer a size or fetch request.
///
/// Returned by provider callbacks. The table renders a failure placeholder
/// and logs the error instead of propagating it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Fetch failed: {message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    /// Create a fetch error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Create a fetch error from any error value.
    pub fn from_error<E: std::error::Error>(error: E) -> Self {
        Self::new(error.to_string())
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}
