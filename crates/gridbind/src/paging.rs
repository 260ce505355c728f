//! Page arithmetic.
//!
//! [`PageState`] holds the current page, the page length and what is known
//! about the size of the data set. Everything here is pure: the table feeds
//! sizes and fetch results in, and reads queries and page chrome out.
//!
//! # Size knowledge
//!
//! | [`ItemCount`] | Clamping                                  | Next page            |
//! |---------------|-------------------------------------------|----------------------|
//! | `Exact(n)`    | to the last page once the offset passes n | up to the last page  |
//! | `Estimate(n)` | only once the offset is past n            | one past the estimate|
//! | `Unknown`     | never                                     | while pages are full |
//!
//! # Example
//!
//! ```
//! use gridbind::paging::{ItemCount, PageState};
//!
//! let mut page = PageState::paged(20);
//! page.set_current_page(5);
//! page.set_item_count(ItemCount::Exact(45));
//! page.clamp();
//!
//! assert_eq!(page.current_page(), 2);
//! assert_eq!(page.offset(), 40);
//! ```

use crate::query::{Query, SortOrder};

/// What the table knows about the size of its data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemCount {
    /// Authoritative size.
    Exact(usize),
    /// Approximate size; the data may extend past it.
    Estimate(usize),
    /// Nothing is known yet.
    #[default]
    Unknown,
}

impl ItemCount {
    /// The size, exact or estimated.
    pub fn value(self) -> Option<usize> {
        match self {
            ItemCount::Exact(size) | ItemCount::Estimate(size) => Some(size),
            ItemCount::Unknown => None,
        }
    }

    /// Returns `true` for an authoritative size.
    pub fn is_exact(self) -> bool {
        matches!(self, ItemCount::Exact(_))
    }
}

/// Index of the last page for `size` items.
///
/// An exact multiple of `page_length` does not produce a trailing empty page,
/// and an empty data set still has page 0.
///
/// # Panics
///
/// Panics if `page_length` is zero. Tables reject a zero page length when it
/// is configured.
pub fn last_page_index(size: usize, page_length: usize) -> usize {
    if size == 0 {
        0
    } else if size % page_length == 0 {
        size / page_length - 1
    } else {
        size / page_length
    }
}

/// Outcome of folding a fetch result back into the page state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The size belief still holds.
    Unchanged,
    /// The size belief changed (end of data found, estimate extended, or the
    /// data set changed between the size request and the fetch).
    Resized,
    /// A page past the end came back empty. The size is now exact and the
    /// page must be clamped and fetched again.
    PastEnd,
}

/// Paging chrome for the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChrome {
    /// Current page, 0-based.
    pub current_page: usize,
    /// Last page, 0-based, if any size is known.
    pub last_page: Option<usize>,
    /// Returns `true` when `last_page` comes from an estimate.
    pub estimated: bool,
    /// A previous page exists.
    pub can_go_previous: bool,
    /// A next page may exist.
    pub can_go_next: bool,
}

impl PageChrome {
    /// 1-based "current/last" label, e.g. `"1/6"`, or `"3/?"` for unknown
    /// sizes.
    pub fn label(&self) -> String {
        match self.last_page {
            Some(last) if self.estimated => format!("{}/~{}", self.current_page + 1, last + 1),
            Some(last) => format!("{}/{}", self.current_page + 1, last + 1),
            None => format!("{}/?", self.current_page + 1),
        }
    }
}

/// The current page, page length and size knowledge of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    current_page: usize,
    page_length: Option<usize>,
    item_count: ItemCount,
}

impl PageState {
    /// An unpaged state: every item is fetched at once.
    pub fn unpaged() -> Self {
        Self {
            current_page: 0,
            page_length: None,
            item_count: ItemCount::Unknown,
        }
    }

    /// A paged state at page 0. `page_length` must be non-zero.
    pub fn paged(page_length: usize) -> Self {
        Self {
            current_page: 0,
            page_length: Some(page_length),
            item_count: ItemCount::Unknown,
        }
    }

    /// Builds a state from an optional page length.
    pub fn new(page_length: Option<usize>) -> Self {
        match page_length {
            Some(length) => Self::paged(length),
            None => Self::unpaged(),
        }
    }

    /// Current page, 0-based.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Page length, `None` when unpaged.
    pub fn page_length(&self) -> Option<usize> {
        self.page_length
    }

    /// Returns `true` if a page length is set.
    pub fn is_paged(&self) -> bool {
        self.page_length.is_some()
    }

    /// Size knowledge.
    pub fn item_count(&self) -> ItemCount {
        self.item_count
    }

    /// Offset of the first item on the current page.
    pub fn offset(&self) -> usize {
        self.page_length
            .map_or(0, |length| length.saturating_mul(self.current_page))
    }

    /// Moves to `page` without clamping; the next [`clamp`](Self::clamp)
    /// corrects it against the size.
    pub fn set_current_page(&mut self, page: usize) {
        self.current_page = page;
    }

    /// Changes the page length and returns to page 0.
    pub fn set_page_length(&mut self, page_length: Option<usize>) {
        self.page_length = page_length;
        self.current_page = 0;
    }

    /// Replaces the size knowledge.
    pub fn set_item_count(&mut self, count: ItemCount) {
        self.item_count = count;
    }

    /// Index of the last page, if any size is known.
    pub fn last_page(&self) -> Option<usize> {
        let length = self.page_length?;
        self.item_count
            .value()
            .map(|size| last_page_index(size, length))
    }

    /// Pulls the current page back into range. Returns `true` if it moved.
    ///
    /// Exact sizes clamp to the last page. Estimates only clamp once the
    /// offset is past the estimate, which leaves room to step one page beyond
    /// the estimated last page. Unknown sizes never clamp.
    pub fn clamp(&mut self) -> bool {
        let Some(length) = self.page_length else {
            return false;
        };
        let offset = self.offset();
        let clamped = match self.item_count {
            ItemCount::Exact(size) if offset >= size && self.current_page > 0 => {
                Some(last_page_index(size, length))
            }
            ItemCount::Estimate(size) if offset > size => Some(size / length),
            _ => None,
        };
        match clamped {
            Some(page) if page != self.current_page => {
                self.current_page = page;
                true
            }
            _ => false,
        }
    }

    /// Clamps and builds the query for the current page.
    pub fn query(&mut self, sort_orders: &[SortOrder]) -> Query {
        self.clamp();
        let query = match self.page_length {
            Some(length) => Query::page(self.offset(), length),
            None => Query::all(),
        };
        query.with_sort_orders(sort_orders.to_vec())
    }

    /// Folds the number of fetched items back into the size knowledge.
    ///
    /// A short page fixes the exact size. A full page reaching an estimate
    /// extends it by `estimate_increase`. An empty page past page 0 means the
    /// current page is past the end.
    pub fn reconcile(&mut self, fetched: usize, estimate_increase: usize) -> Reconciliation {
        let Some(length) = self.page_length else {
            let before = self.item_count;
            self.item_count = ItemCount::Exact(fetched);
            return if before == self.item_count {
                Reconciliation::Unchanged
            } else {
                Reconciliation::Resized
            };
        };

        let offset = self.offset();
        if fetched == 0 && self.current_page > 0 {
            self.item_count = ItemCount::Exact(offset);
            return Reconciliation::PastEnd;
        }

        let end = offset + fetched;
        let before = self.item_count;
        self.item_count = match before {
            _ if fetched < length => ItemCount::Exact(end),
            ItemCount::Exact(size) => ItemCount::Exact(size.max(end)),
            ItemCount::Estimate(estimate) if end >= estimate => {
                ItemCount::Estimate(end + estimate_increase.max(1))
            }
            other => other,
        };
        if before == self.item_count {
            Reconciliation::Unchanged
        } else {
            Reconciliation::Resized
        }
    }

    /// Returns `true` if a previous page exists.
    pub fn can_go_previous(&self) -> bool {
        self.is_paged() && self.current_page > 0
    }

    /// Returns `true` if a next page may exist.
    pub fn can_go_next(&self) -> bool {
        let Some(length) = self.page_length else {
            return false;
        };
        match self.item_count {
            ItemCount::Exact(size) => self.current_page < last_page_index(size, length),
            ItemCount::Estimate(size) => self.offset() + length <= size,
            ItemCount::Unknown => true,
        }
    }

    /// Chrome for the current page.
    pub fn chrome(&self) -> PageChrome {
        PageChrome {
            current_page: self.current_page,
            last_page: self.last_page(),
            estimated: matches!(self.item_count, ItemCount::Estimate(_)),
            can_go_previous: self.can_go_previous(),
            can_go_next: self.can_go_next(),
        }
    }
}

impl Default for PageState {
    fn default() -> Self {
        Self::unpaged()
    }
}
