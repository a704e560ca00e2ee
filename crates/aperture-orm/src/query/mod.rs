//! Query composition: WHERE predicates, pagination and caller parameters.

mod filter;
mod params;

pub use filter::{FilterPredicate, QueryBuilder};
pub use params::{ListParams, Pagination, DEFAULT_LIMIT, MAX_LIMIT};
