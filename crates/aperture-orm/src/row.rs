//! Row materialization.
//!
//! Converts arbitrary SQLite result rows into [`GenericRow`]s: ordered
//! `(column, Value)` pairs decoded by each cell's runtime storage class.

use serde::ser::{Serialize, SerializeMap, Serializer};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::value::Value;

/// One result row with columns in result-set order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericRow {
    columns: Vec<(String, Value)>,
}

impl GenericRow {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column. Column order is insertion order.
    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.columns.push((column.into(), value));
    }

    /// Returns the value for `column`, if present.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Returns the text value of `column`, if present and text.
    #[must_use]
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    /// Returns the column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over `(column, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true when the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl IntoIterator for GenericRow {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

impl FromIterator<(String, Value)> for GenericRow {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

impl Serialize for GenericRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl TryFrom<&SqliteRow> for GenericRow {
    type Error = sqlx::Error;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        let mut out = Self {
            columns: Vec::with_capacity(row.len()),
        };
        for column in row.columns() {
            let idx = column.ordinal();
            let raw = row.try_get_raw(idx)?;
            let value = if raw.is_null() {
                Value::Null
            } else {
                // SQLite reports the storage class of the cell itself, not
                // the declared column type.
                match raw.type_info().name() {
                    "INTEGER" | "BOOLEAN" => Value::Int(row.try_get_unchecked(idx)?),
                    "REAL" => Value::Float(row.try_get_unchecked(idx)?),
                    "BLOB" => Value::Blob(row.try_get_unchecked(idx)?),
                    _ => Value::Text(row.try_get_unchecked(idx)?),
                }
            };
            out.push(column.name(), value);
        }
        Ok(out)
    }
}

/// Materializes a result set. Zero rows yields an empty vector.
pub fn materialize(rows: &[SqliteRow]) -> Result<Vec<GenericRow>, sqlx::Error> {
    rows.iter().map(GenericRow::try_from).collect()
}
