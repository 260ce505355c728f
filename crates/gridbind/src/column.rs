//! Column definitions.
//!
//! A [`Column`] pairs a header with an accessor that extracts a raw
//! [`CellValue`] from an item. How the value is turned into text, markup or an
//! embedded component is up to the renderer.
//!
//! [`Columns`] keeps columns in display order and enforces unique keys.
//!
//! # Example
//!
//! ```
//! use gridbind::column::{header_from_key, CellValue, Column, Columns};
//!
//! struct Person {
//!     first_name: String,
//!     age: u32,
//! }
//!
//! let mut columns = Columns::new();
//! columns.add_column("Name", |p: &Person| p.first_name.clone().into());
//! columns
//!     .add(Column::new(header_from_key("age"), |p: &Person| p.age.into()).with_key("age"))
//!     .unwrap();
//!
//! let ann = Person { first_name: "Ann".into(), age: 41 };
//! assert_eq!(columns.values(&ann), vec![CellValue::from("Ann"), CellValue::Int(41)]);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, TableError};

/// A raw cell value produced by a column accessor.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// No value.
    #[default]
    None,
    /// Text.
    String(String),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
}

impl CellValue {
    /// Returns `true` if this is `CellValue::None`.
    pub fn is_none(&self) -> bool {
        matches!(self, CellValue::None)
    }

    /// The value as a string slice, if it is text.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The value as an integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            CellValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The value as a float, if it is one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            CellValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// The value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::None => Ok(()),
            CellValue::String(s) => f.write_str(s),
            CellValue::Int(n) => write!(f, "{n}"),
            CellValue::Float(n) => write!(f, "{n}"),
            CellValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Int(value.into())
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Int(value.into())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<f32> for CellValue {
    fn from(value: f32) -> Self {
        CellValue::Float(value.into())
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl<V: Into<CellValue>> From<Option<V>> for CellValue {
    fn from(value: Option<V>) -> Self {
        value.map_or(CellValue::None, Into::into)
    }
}

/// Horizontal alignment of a column's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColumnAlignment {
    /// Align to the start of the cell.
    #[default]
    Start,
    /// Center.
    Center,
    /// Align to the end of the cell.
    End,
}

/// Identifies a column within one [`Columns`] registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(u64);

impl ColumnId {
    /// The raw id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Extracts a cell value from an item.
pub type ValueFn<T> = Arc<dyn Fn(&T) -> CellValue + Send + Sync>;

/// One column: header, accessor and presentation hints.
pub struct Column<T> {
    id: ColumnId,
    key: Option<String>,
    header: String,
    value: ValueFn<T>,
    alignment: ColumnAlignment,
    width: Option<String>,
    row_header: bool,
    visible: bool,
}

impl<T> Column<T> {
    /// Creates a visible, start-aligned column without a key.
    pub fn new<F>(header: impl Into<String>, value: F) -> Self
    where
        F: Fn(&T) -> CellValue + Send + Sync + 'static,
    {
        Self {
            id: ColumnId(0),
            key: None,
            header: header.into(),
            value: Arc::new(value),
            alignment: ColumnAlignment::Start,
            width: None,
            row_header: false,
            visible: true,
        }
    }

    /// Sets the key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the alignment.
    pub fn with_alignment(mut self, alignment: ColumnAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Sets the width, in any unit the renderer understands.
    pub fn with_width(mut self, width: impl Into<String>) -> Self {
        self.width = Some(width.into());
        self
    }

    /// Marks the column as the row header.
    pub fn with_row_header(mut self, row_header: bool) -> Self {
        self.row_header = row_header;
        self
    }

    /// Sets the visibility.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// The id assigned when the column was added to a registry.
    pub fn id(&self) -> ColumnId {
        self.id
    }

    /// The key, if any.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The header text.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// The alignment.
    pub fn alignment(&self) -> ColumnAlignment {
        self.alignment
    }

    /// The width, if set.
    pub fn width(&self) -> Option<&str> {
        self.width.as_deref()
    }

    /// Returns `true` if the column is the row header.
    pub fn is_row_header(&self) -> bool {
        self.row_header
    }

    /// Returns `true` if the column is shown.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Extracts this column's value from `item`.
    pub fn value(&self, item: &T) -> CellValue {
        (self.value)(item)
    }
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            key: self.key.clone(),
            header: self.header.clone(),
            value: self.value.clone(),
            alignment: self.alignment,
            width: self.width.clone(),
            row_header: self.row_header,
            visible: self.visible,
        }
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("header", &self.header)
            .field("alignment", &self.alignment)
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

/// Columns in display order, with unique keys.
///
/// Columns are shared as `Arc`s so a renderer can hold on to the set it was
/// handed while the registry changes; edits copy the edited column.
pub struct Columns<T> {
    columns: Vec<Arc<Column<T>>>,
    last_id: u64,
}

impl<T> Default for Columns<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Columns<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            last_id: 0,
        }
    }

    /// Appends a column without a key.
    pub fn add_column<F>(&mut self, header: impl Into<String>, value: F) -> ColumnId
    where
        F: Fn(&T) -> CellValue + Send + Sync + 'static,
    {
        self.insert(Column::new(header, value))
    }

    /// Appends a column. Fails if its key is already used.
    pub fn add(&mut self, column: Column<T>) -> Result<ColumnId> {
        if let Some(key) = column.key() {
            self.ensure_key_free(key, None)?;
        }
        Ok(self.insert(column))
    }

    /// Removes a column.
    pub fn remove_column(&mut self, id: ColumnId) -> Result<Arc<Column<T>>> {
        let position = self.position(id)?;
        Ok(self.columns.remove(position))
    }

    /// Sets a column's key. Fails if another column uses it.
    pub fn set_key(&mut self, id: ColumnId, key: impl Into<String>) -> Result<()> {
        let key = key.into();
        self.ensure_key_free(&key, Some(id))?;
        self.edit(id, |column| column.key = Some(key))
    }

    /// Sets a column's header text.
    pub fn set_header(&mut self, id: ColumnId, header: impl Into<String>) -> Result<()> {
        let header = header.into();
        self.edit(id, |column| column.header = header)
    }

    /// Shows or hides a column.
    pub fn set_visible(&mut self, id: ColumnId, visible: bool) -> Result<()> {
        self.edit(id, |column| column.visible = visible)
    }

    /// Sets a column's alignment.
    pub fn set_alignment(&mut self, id: ColumnId, alignment: ColumnAlignment) -> Result<()> {
        self.edit(id, |column| column.alignment = alignment)
    }

    /// Sets or clears a column's width.
    pub fn set_width(&mut self, id: ColumnId, width: Option<String>) -> Result<()> {
        self.edit(id, |column| column.width = width)
    }

    /// Marks or unmarks a column as the row header.
    pub fn set_row_header(&mut self, id: ColumnId, row_header: bool) -> Result<()> {
        self.edit(id, |column| column.row_header = row_header)
    }

    /// The column with `id`.
    pub fn get(&self, id: ColumnId) -> Option<&Arc<Column<T>>> {
        self.columns.iter().find(|column| column.id == id)
    }

    /// The column with `key`.
    pub fn column(&self, key: &str) -> Option<&Arc<Column<T>>> {
        self.columns.iter().find(|column| column.key() == Some(key))
    }

    /// Every column in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Column<T>>> {
        self.columns.iter()
    }

    /// A shareable copy of the column list.
    pub fn to_vec(&self) -> Vec<Arc<Column<T>>> {
        self.columns.clone()
    }

    /// The visible columns in display order.
    pub fn visible_columns(&self) -> Vec<Arc<Column<T>>> {
        self.columns
            .iter()
            .filter(|column| column.visible)
            .cloned()
            .collect()
    }

    /// Number of visible columns, at least 1 so placeholders always span a
    /// cell.
    pub fn visible_span(&self) -> usize {
        self.columns.iter().filter(|column| column.visible).count().max(1)
    }

    /// The visible columns' values for `item`.
    pub fn values(&self, item: &T) -> Vec<CellValue> {
        self.columns
            .iter()
            .filter(|column| column.visible)
            .map(|column| column.value(item))
            .collect()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn insert(&mut self, mut column: Column<T>) -> ColumnId {
        self.last_id += 1;
        column.id = ColumnId(self.last_id);
        let id = column.id;
        self.columns.push(Arc::new(column));
        id
    }

    fn position(&self, id: ColumnId) -> Result<usize> {
        self.columns
            .iter()
            .position(|column| column.id == id)
            .ok_or_else(|| TableError::UnknownColumn(id.to_string()))
    }

    fn ensure_key_free(&self, key: &str, owner: Option<ColumnId>) -> Result<()> {
        match self.column(key) {
            Some(existing) if Some(existing.id) != owner => {
                Err(TableError::DuplicateColumnKey(key.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn edit<F>(&mut self, id: ColumnId, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Column<T>),
    {
        let position = self.position(id)?;
        edit(Arc::make_mut(&mut self.columns[position]));
        Ok(())
    }
}

impl<T> fmt::Debug for Columns<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.columns.iter()).finish()
    }
}

/// Turns a property key into a header: `"firstName"` becomes `"First Name"`.
///
/// Words are split before an uppercase letter that follows a non-uppercase
/// character, between an acronym and the capitalized word after it, and
/// between a letter and a following non-letter.
pub fn header_from_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut header = String::with_capacity(key.len() + 4);

    for (i, &current) in chars.iter().enumerate() {
        if i > 0 {
            let previous = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let acronym_end = previous.is_ascii_uppercase()
                && current.is_ascii_uppercase()
                && next.is_some_and(|c| c.is_ascii_lowercase());
            let word_start = !previous.is_ascii_uppercase() && current.is_ascii_uppercase();
            let letter_end = previous.is_ascii_alphabetic() && !current.is_ascii_alphabetic();
            if acronym_end || word_start || letter_end {
                header.push(' ');
            }
        }
        if i == 0 {
            header.extend(current.to_uppercase());
        } else {
            header.push(current);
        }
    }
    header
}
