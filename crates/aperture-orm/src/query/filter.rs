//! AND-only predicate accumulation.
//!
//! Predicates are never grouped or OR-ed, so the generated SQL keeps a fixed
//! shape: identifiers come from code, every value is a bound parameter.

use crate::query::Pagination;
use crate::value::{ToValue, Value};

/// One boolean fragment with exactly one `?` placeholder and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPredicate {
    /// SQL fragment, e.g. `portfolio_id = ?`.
    pub clause: String,
    /// Value bound to the fragment's placeholder.
    pub value: Value,
}

/// Accumulates WHERE predicates and pagination for one list call.
///
/// Column names passed to [`add_filter`](Self::add_filter) and
/// [`add_like`](Self::add_like) are spliced into the SQL verbatim and must be
/// static, code-controlled identifiers. Never pass request-supplied strings.
///
/// # Example
///
/// ```
/// use aperture_orm::query::QueryBuilder;
///
/// let mut qb = QueryBuilder::new();
/// qb.add_like("name", "core");
/// qb.add_filter("portfolio_id = ?", "p-1");
/// assert_eq!(qb.where_clause(), " WHERE name LIKE ? AND portfolio_id = ?");
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    predicates: Vec<FilterPredicate>,
    pagination: Pagination,
}

impl QueryBuilder {
    /// Creates an empty builder with default pagination.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pre-formed fragment and its bound value.
    pub fn add_filter<V: ToValue>(&mut self, clause: &str, value: V) {
        debug_assert_eq!(
            clause.matches('?').count(),
            1,
            "predicate must carry exactly one placeholder: {clause}"
        );
        self.predicates.push(FilterPredicate {
            clause: clause.to_string(),
            value: value.to_value(),
        });
    }

    /// Appends `column LIKE ?` bound to `%value%`.
    pub fn add_like(&mut self, column: &str, value: &str) {
        self.predicates.push(FilterPredicate {
            clause: format!("{column} LIKE ?"),
            value: Value::Text(format!("%{value}%")),
        });
    }

    /// Sets the page window.
    pub fn paginate(&mut self, pagination: Pagination) {
        self.pagination = pagination;
    }

    /// Returns the page window.
    #[must_use]
    pub const fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Returns the accumulated predicates in insertion order.
    #[must_use]
    pub fn predicates(&self) -> &[FilterPredicate] {
        &self.predicates
    }

    /// Returns true when no predicate has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Renders `" WHERE p1 AND p2 ..."`, or the empty string.
    #[must_use]
    pub fn where_clause(&self) -> String {
        if self.predicates.is_empty() {
            return String::new();
        }
        let clauses: Vec<&str> = self.predicates.iter().map(|p| p.clause.as_str()).collect();
        format!(" WHERE {}", clauses.join(" AND "))
    }

    /// Returns the predicate values in placeholder order.
    #[must_use]
    pub fn params(&self) -> Vec<Value> {
        self.predicates.iter().map(|p| p.value.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_where_clause() {
        let qb = QueryBuilder::new();
        assert_eq!(qb.where_clause(), "");
        assert!(qb.params().is_empty());
        assert!(qb.is_empty());
    }

    #[test]
    fn test_single_filter() {
        let mut qb = QueryBuilder::new();
        qb.add_filter("hostname = ?", "web-01");
        assert_eq!(qb.where_clause(), " WHERE hostname = ?");
        assert_eq!(qb.params(), vec![Value::Text("web-01".into())]);
    }

    #[test]
    fn test_like_wraps_value() {
        let mut qb = QueryBuilder::new();
        qb.add_like("name", "pay");
        assert_eq!(qb.where_clause(), " WHERE name LIKE ?");
        assert_eq!(qb.params(), vec![Value::Text("%pay%".into())]);
    }

    #[test]
    fn test_predicates_joined_with_and_in_order() {
        let mut qb = QueryBuilder::new();
        qb.add_like("name", "a");
        qb.add_filter("asset_id = ?", "x");
        qb.add_filter("is_virtual = ?", 1_i64);
        assert_eq!(
            qb.where_clause(),
            " WHERE name LIKE ? AND asset_id = ? AND is_virtual = ?"
        );
        assert_eq!(
            qb.params(),
            vec![
                Value::Text("%a%".into()),
                Value::Text("x".into()),
                Value::Int(1)
            ]
        );
    }

    #[test]
    fn test_injection_attempt_stays_bound() {
        let mut qb = QueryBuilder::new();
        qb.add_filter("name = ?", "x' OR '1'='1");
        assert_eq!(qb.where_clause(), " WHERE name = ?");
        assert_eq!(qb.params(), vec![Value::Text("x' OR '1'='1".into())]);
    }
}
