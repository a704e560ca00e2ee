//! Declarative table descriptors.
//!
//! A [`TableSchema`] tells the generic [`Repository`](crate::Repository)
//! everything it needs about one entity: where it lives, how it is keyed,
//! which fields a caller may write, and how list calls are filtered.

use serde_json::Value as JsonValue;

use crate::error::{OrmError, Result};
use crate::query::{ListParams, QueryBuilder};
use crate::value::Value;

/// Storage kind of a writable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// TEXT column, accepts JSON strings.
    Text,
    /// INTEGER column, accepts JSON integers.
    Integer,
}

/// A caller-writable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    /// Column name.
    pub name: &'static str,
    /// Storage kind.
    pub kind: FieldKind,
    /// Whether the column accepts NULL. Non-nullable fields are required on
    /// create.
    pub nullable: bool,
}

impl FieldSchema {
    /// A NOT NULL text field.
    #[must_use]
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            nullable: false,
        }
    }

    /// A nullable text field.
    #[must_use]
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            nullable: true,
        }
    }

    /// A nullable integer field.
    #[must_use]
    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Integer,
            nullable: true,
        }
    }

    /// Converts a JSON input value for this field.
    ///
    /// JSON `null` maps to [`Value::Null`]; anything not matching the
    /// field's kind is a validation error.
    pub fn convert(&self, json: &JsonValue) -> Result<Value> {
        match (self.kind, json) {
            (_, JsonValue::Null) => Ok(Value::Null),
            (FieldKind::Text, JsonValue::String(s)) => Ok(Value::Text(s.clone())),
            (FieldKind::Integer, JsonValue::Number(n)) => n.as_i64().map(Value::Int).ok_or_else(|| {
                OrmError::validation(format!("field '{}' must be an integer", self.name))
            }),
            (FieldKind::Text, _) => Err(OrmError::validation(format!(
                "field '{}' must be a string",
                self.name
            ))),
            (FieldKind::Integer, _) => Err(OrmError::validation(format!(
                "field '{}' must be an integer",
                self.name
            ))),
        }
    }
}

/// Maps a query-string parameter to an exact-match column filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterParam {
    /// Query-string key.
    pub param: &'static str,
    /// Column compared with `=`.
    pub column: &'static str,
}

impl FilterParam {
    /// Parameter named like its column.
    #[must_use]
    pub const fn column(name: &'static str) -> Self {
        Self {
            param: name,
            column: name,
        }
    }

    /// Parameter with its own name.
    #[must_use]
    pub const fn aliased(param: &'static str, column: &'static str) -> Self {
        Self { param, column }
    }
}

/// Descriptor of one entity table.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    /// Table name.
    pub name: &'static str,
    /// Primary-key column. Keys are server-assigned UUIDs.
    pub primary_key: &'static str,
    /// Caller-writable fields, in insert order.
    pub fields: &'static [FieldSchema],
    /// Default list ordering column.
    pub order_by: &'static str,
    /// Column matched by the free-text `q` parameter.
    pub search_column: Option<&'static str>,
    /// Exact-match list filters.
    pub filters: &'static [FilterParam],
    /// Column set to `datetime('now')` on every update.
    pub touch_column: Option<&'static str>,
    /// Catalog tables reject writes.
    pub read_only: bool,
}

impl TableSchema {
    /// Looks up a writable field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Applies the descriptor's search column and exact filters for `params`.
    pub fn apply_filters(&self, params: &ListParams, qb: &mut QueryBuilder) {
        if let (Some(column), Some(term)) = (self.search_column, params.search()) {
            qb.add_like(column, term);
        }
        for filter in self.filters {
            if let Some(value) = params.get(filter.param) {
                qb.add_filter(&format!("{} = ?", filter.column), value);
            }
        }
    }

    pub(crate) fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(OrmError::validation(format!(
                "table '{}' is read-only",
                self.name
            )));
        }
        Ok(())
    }
}
