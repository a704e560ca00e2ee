//! Generic repository over a [`TableSchema`].
//!
//! One `Repository` per entity replaces hand-written per-table handlers:
//! list, get and delete only need the table, key and ordering column, while
//! create, update and bulk upsert are driven by the descriptor's field list.

use std::collections::HashSet;

use futures::TryStreamExt;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use sqlx::sqlite::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{OrmError, Result};
use crate::query::{ListParams, Pagination, QueryBuilder};
use crate::row::GenericRow;
use crate::schema::{FieldKind, TableSchema};
use crate::upsert::UpsertStatement;
use crate::value::{bind_all, Value};

/// JSON object supplied to create, update and upsert calls.
pub type Input = Map<String, JsonValue>;

/// One page of list results.
///
/// `count` is the number of rows in this page, not the number of rows
/// matching the filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    /// Rows in list order.
    pub data: Vec<GenericRow>,
    /// `data.len()`.
    pub count: usize,
}

impl Page {
    /// Wraps a page of rows.
    #[must_use]
    pub fn new(data: Vec<GenericRow>) -> Self {
        let count = data.len();
        Self { data, count }
    }
}

/// Outcome of a bulk upsert. `created + updated + errors == total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    /// Records whose key was new.
    pub created: usize,
    /// Records whose key already existed, in the table or earlier in the batch.
    pub updated: usize,
    /// Records rejected or failed.
    pub errors: usize,
    /// Records submitted.
    pub total: usize,
}

/// CRUD operations for one table.
///
/// # Example
///
/// ```ignore
/// use aperture_orm::{ListParams, Repository};
///
/// let workloads = Repository::new(&WORKLOADS);
/// let page = workloads
///     .list_params(db.pool(), &ListParams::new().with("q", "web"))
///     .await?;
/// let host = workloads.get(db.pool(), "3f1c...").await?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Repository {
    schema: &'static TableSchema,
}

impl Repository {
    /// Creates a repository for `schema`.
    #[must_use]
    pub const fn new(schema: &'static TableSchema) -> Self {
        Self { schema }
    }

    /// Returns the table descriptor.
    #[must_use]
    pub const fn schema(&self) -> &'static TableSchema {
        self.schema
    }

    /// Builds the paginated SELECT for a populated builder.
    #[must_use]
    pub fn build_list(&self, qb: &QueryBuilder) -> (String, Vec<Value>) {
        let sql = format!(
            "SELECT * FROM {}{} ORDER BY {} LIMIT ? OFFSET ?",
            self.schema.name,
            qb.where_clause(),
            self.schema.order_by
        );
        let pagination = qb.pagination();
        let mut params = qb.params();
        params.push(Value::Int(pagination.limit()));
        params.push(Value::Int(pagination.offset()));
        (sql, params)
    }

    /// Builds the sparse-patch UPDATE for `input`; the key is the last
    /// placeholder and is not included in the returned values.
    pub fn build_update(&self, input: &Input) -> Result<(String, Vec<Value>)> {
        let mut sets = Vec::with_capacity(self.schema.fields.len() + 1);
        let mut values = Vec::with_capacity(self.schema.fields.len());
        for field in self.schema.fields {
            sets.push(format!("{0} = COALESCE(?, {0})", field.name));
            values.push(match input.get(field.name) {
                Some(json) => field.convert(json)?,
                None => Value::Null,
            });
        }
        if let Some(touch) = self.schema.touch_column {
            sets.push(format!("{touch} = datetime('now')"));
        }
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            self.schema.name,
            sets.join(", "),
            self.schema.primary_key
        );
        Ok((sql, values))
    }

    /// Lists one page. `filter` adds predicates to an empty builder; the
    /// pagination window is applied afterwards.
    pub async fn list<F>(&self, pool: &SqlitePool, pagination: Pagination, filter: F) -> Result<Page>
    where
        F: FnOnce(&mut QueryBuilder),
    {
        let mut qb = QueryBuilder::new();
        filter(&mut qb);
        qb.paginate(pagination);

        let (sql, params) = self.build_list(&qb);
        debug!(table = self.schema.name, sql = %sql, "Listing rows");

        let mut rows = bind_all(sqlx::query(&sql), params).fetch(pool);
        let mut data = Vec::new();
        while let Some(row) = rows.try_next().await? {
            data.push(GenericRow::try_from(&row)?);
        }
        Ok(Page::new(data))
    }

    /// Lists one page using the descriptor's search column and filters.
    pub async fn list_params(&self, pool: &SqlitePool, params: &ListParams) -> Result<Page> {
        self.list(pool, params.pagination(), |qb| {
            self.schema.apply_filters(params, qb);
        })
        .await
    }

    /// Fetches a row by primary key.
    pub async fn get(&self, pool: &SqlitePool, id: &str) -> Result<GenericRow> {
        let id = require_id(id)?;
        self.fetch_by_key(pool, id).await?.ok_or(OrmError::NotFound)
    }

    /// Deletes a row by primary key.
    pub async fn delete(&self, pool: &SqlitePool, id: &str) -> Result<()> {
        self.schema.ensure_writable()?;
        let id = require_id(id)?;

        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            self.schema.name, self.schema.primary_key
        );
        let result = sqlx::query(&sql).bind(id).execute(pool).await?;
        if result.rows_affected() == 0 {
            return Err(OrmError::NotFound);
        }

        info!(table = self.schema.name, id = %id, "Row deleted");
        Ok(())
    }

    /// Inserts a row with a fresh UUID key and returns it as stored.
    pub async fn create(&self, pool: &SqlitePool, input: &Input) -> Result<GenericRow> {
        self.schema.ensure_writable()?;
        let values = self.insert_values(input)?;
        let id = Uuid::new_v4().to_string();

        let sql = self.insert_statement();
        debug!(table = self.schema.name, sql = %sql, "Inserting row");
        bind_all(sqlx::query(&sql).bind(id.as_str()), values)
            .execute(pool)
            .await?;

        info!(table = self.schema.name, id = %id, "Row created");
        self.fetch_by_key(pool, &id).await?.ok_or(OrmError::NotFound)
    }

    /// Applies a sparse patch and returns the row as stored.
    ///
    /// A field overwrites its column only when present and non-null. An
    /// explicit `null` is indistinguishable from an omitted field, so a
    /// nullable column cannot be reset to NULL through this call.
    pub async fn update(&self, pool: &SqlitePool, id: &str, input: &Input) -> Result<GenericRow> {
        self.schema.ensure_writable()?;
        let id = require_id(id)?;

        let (sql, values) = self.build_update(input)?;
        debug!(table = self.schema.name, sql = %sql, "Updating row");
        let result = bind_all(sqlx::query(&sql), values)
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(OrmError::NotFound);
        }

        // The row may be deleted between the write and the re-read.
        self.fetch_by_key(pool, id).await?.ok_or(OrmError::NotFound)
    }

    /// Inserts or merges a batch keyed on a unique text column, in one
    /// transaction.
    ///
    /// Existing rows only take the non-null incoming fields. A record with a
    /// missing or empty key, an ill-typed field, or a failing statement is
    /// counted as an error and skipped; the rest of the batch proceeds.
    pub async fn bulk_upsert(
        &self,
        pool: &SqlitePool,
        conflict_column: &str,
        records: &[Input],
    ) -> Result<BulkReport> {
        self.schema.ensure_writable()?;
        match self.schema.field(conflict_column) {
            Some(field) if field.kind == FieldKind::Text => {}
            _ => {
                return Err(OrmError::validation(format!(
                    "'{conflict_column}' is not a text field of '{}'",
                    self.schema.name
                )))
            }
        }

        let columns = self.insert_columns();
        let merged: Vec<&str> = self
            .schema
            .fields
            .iter()
            .map(|f| f.name)
            .filter(|name| *name != conflict_column)
            .collect();
        let mut statement = UpsertStatement::new(self.schema.name)
            .columns(&columns)
            .on_conflict(&[conflict_column])
            .coalesce(&merged);
        if let Some(touch) = self.schema.touch_column {
            statement = statement.touch(touch);
        }
        let sql = statement.build();

        let mut tx = pool.begin().await?;

        let existing_sql = format!("SELECT {conflict_column} FROM {}", self.schema.name);
        let existing: Vec<Option<String>> = sqlx::query_scalar(&existing_sql)
            .fetch_all(&mut *tx)
            .await?;
        let mut seen: HashSet<String> = existing.into_iter().flatten().collect();

        let mut report = BulkReport {
            total: records.len(),
            ..BulkReport::default()
        };

        for record in records {
            let key = match record.get(conflict_column) {
                Some(JsonValue::String(key)) if !key.is_empty() => key.clone(),
                _ => {
                    report.errors += 1;
                    continue;
                }
            };

            let values = match self.insert_values(record) {
                Ok(values) => values,
                Err(e) => {
                    debug!(table = self.schema.name, key = %key, error = %e, "Skipping record");
                    report.errors += 1;
                    continue;
                }
            };

            let id = Uuid::new_v4().to_string();
            if let Err(e) = bind_all(sqlx::query(&sql).bind(id), values)
                .execute(&mut *tx)
                .await
            {
                warn!(table = self.schema.name, key = %key, error = %e, "Upsert failed");
                report.errors += 1;
                continue;
            }

            if seen.insert(key) {
                report.created += 1;
            } else {
                report.updated += 1;
            }
        }

        tx.commit().await?;

        info!(
            table = self.schema.name,
            created = report.created,
            updated = report.updated,
            errors = report.errors,
            "Bulk upsert finished"
        );
        Ok(report)
    }

    async fn fetch_by_key(&self, pool: &SqlitePool, id: &str) -> Result<Option<GenericRow>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?",
            self.schema.name, self.schema.primary_key
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
        Ok(row.as_ref().map(GenericRow::try_from).transpose()?)
    }

    fn insert_columns(&self) -> Vec<&'static str> {
        std::iter::once(self.schema.primary_key)
            .chain(self.schema.fields.iter().map(|f| f.name))
            .collect()
    }

    fn insert_statement(&self) -> String {
        let columns = self.insert_columns();
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            self.schema.name,
            columns.join(", ")
        )
    }

    /// Converts `input` into one value per field, enforcing required fields.
    fn insert_values(&self, input: &Input) -> Result<Vec<Value>> {
        self.schema
            .fields
            .iter()
            .map(|field| {
                let value = match input.get(field.name) {
                    Some(json) => field.convert(json)?,
                    None => Value::Null,
                };
                if value.is_null() && !field.nullable {
                    return Err(OrmError::validation(format!(
                        "field '{}' is required",
                        field.name
                    )));
                }
                Ok(value)
            })
            .collect()
    }
}

fn require_id(id: &str) -> Result<&str> {
    if id.is_empty() {
        return Err(OrmError::validation("invalid id"));
    }
    Ok(id)
}
