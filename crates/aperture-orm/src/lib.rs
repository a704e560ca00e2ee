//! # aperture-orm
//!
//! A schema-agnostic CRUD engine over SQLite.
//!
//! This crate provides:
//! - `TableSchema` descriptors declaring an entity's table, key and fields
//! - `Repository` for list, get, create, sparse update, delete and bulk upsert
//! - `QueryBuilder` for ordered predicate/parameter accumulation
//! - `GenericRow` and `Value` for rows whose shape is only known at runtime
//! - `Database` for opening the file with WAL journaling and foreign keys on
//!
//! ## Quick Start
//!
//! ```ignore
//! use aperture_orm::{Database, DatabaseConfig, FieldSchema, ListParams, Repository, TableSchema};
//! use serde_json::json;
//!
//! static PORTFOLIOS: TableSchema = TableSchema {
//!     name: "portfolios",
//!     primary_key: "portfolio_id",
//!     fields: &[FieldSchema::required("name"), FieldSchema::text("description")],
//!     order_by: "name",
//!     search_column: Some("name"),
//!     filters: &[],
//!     touch_column: Some("updated_at"),
//!     read_only: false,
//! };
//!
//! async fn example() -> aperture_orm::Result<()> {
//!     let db = Database::open(&DatabaseConfig::from_env()?).await?;
//!     let repo = Repository::new(&PORTFOLIOS);
//!
//!     let input = json!({ "name": "Retail" });
//!     let row = repo.create(db.pool(), input.as_object().unwrap()).await?;
//!
//!     let page = repo.list_params(db.pool(), &ListParams::new().with("q", "ret")).await?;
//!     println!("{} rows, first: {:?}", page.count, row.get_str("portfolio_id"));
//!     Ok(())
//! }
//! ```
//!
//! ## Sparse updates
//!
//! `Repository::update` only overwrites columns for fields that are present
//! and non-null in the input. Sending `null` leaves the stored value as is.

mod db;
mod error;
pub mod query;
mod repository;
mod row;
mod schema;
mod upsert;
mod value;

pub use db::{Database, DatabaseConfig, DB_PATH_ENV};
pub use error::{OrmError, Result};
pub use query::{ListParams, Pagination, QueryBuilder};
pub use repository::{BulkReport, Input, Page, Repository};
pub use row::{materialize, GenericRow};
pub use schema::{FieldKind, FieldSchema, FilterParam, TableSchema};
pub use upsert::UpsertStatement;
pub use value::{ToValue, Value};
