//! Pagination and caller-supplied list parameters.

use std::collections::HashMap;

/// Page size used when the caller gives none or an out-of-range one.
pub const DEFAULT_LIMIT: i64 = 100;

/// Largest page size a caller may request.
pub const MAX_LIMIT: i64 = 1000;

/// A `(limit, offset)` window. Always `1 <= limit <= 1000` and `offset >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    limit: i64,
    offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    /// Builds a window, replacing out-of-range values with the defaults.
    #[must_use]
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = limit
            .filter(|l| (1..=MAX_LIMIT).contains(l))
            .unwrap_or(DEFAULT_LIMIT);
        let offset = offset.filter(|o| *o >= 0).unwrap_or(0);
        Self { limit, offset }
    }

    /// Parses raw query-string values. Unparsable values fall back to the
    /// defaults, the same as out-of-range ones.
    #[must_use]
    pub fn parse(limit: Option<&str>, offset: Option<&str>) -> Self {
        Self::new(
            limit.and_then(|l| l.trim().parse().ok()),
            offset.and_then(|o| o.trim().parse().ok()),
        )
    }

    /// Page size.
    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.limit
    }

    /// Number of rows skipped.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        self.offset
    }
}

/// Query-string parameters of a list call.
///
/// Empty values are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    params: HashMap<String, String>,
}

impl ListParams {
    /// Creates empty parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds parameters from `(key, value)` pairs. Later keys win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Sets a parameter.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Returns a non-empty parameter value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Free-text search term (`q`).
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.get("q")
    }

    /// Page window from `limit` and `offset`.
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        Pagination::parse(self.get("limit"), self.get("offset"))
    }
}
