//! SQLite `INSERT ... ON CONFLICT` statements.

/// Conflict resolution of an [`UpsertStatement`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum OnConflict {
    DoNothing,
    /// Columns overwritten only when the incoming value is non-null.
    Coalesce(Vec<String>),
}

/// Builds an UPSERT for one row of positional parameters.
///
/// # Example
///
/// ```
/// use aperture_orm::UpsertStatement;
///
/// let sql = UpsertStatement::new("workloads")
///     .columns(&["workload_id", "hostname", "os"])
///     .on_conflict(&["hostname"])
///     .coalesce(&["os"])
///     .touch("updated_at")
///     .build();
/// assert_eq!(
///     sql,
///     "INSERT INTO workloads (workload_id, hostname, os) VALUES (?, ?, ?) \
///      ON CONFLICT (hostname) DO UPDATE SET os = COALESCE(excluded.os, os), \
///      updated_at = datetime('now')"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct UpsertStatement {
    table: String,
    columns: Vec<String>,
    conflict_columns: Vec<String>,
    on_conflict: OnConflict,
    touch: Option<String>,
}

impl UpsertStatement {
    /// Starts a statement for `table`.
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            conflict_columns: Vec::new(),
            on_conflict: OnConflict::DoNothing,
            touch: None,
        }
    }

    /// Columns receiving one positional parameter each.
    #[must_use]
    pub fn columns(mut self, cols: &[&str]) -> Self {
        self.columns = cols.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Conflict target columns.
    #[must_use]
    pub fn on_conflict(mut self, cols: &[&str]) -> Self {
        self.conflict_columns = cols.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// On conflict, keep the existing row untouched.
    #[must_use]
    pub fn do_nothing(mut self) -> Self {
        self.on_conflict = OnConflict::DoNothing;
        self
    }

    /// On conflict, overwrite `cols` with the incoming values unless those
    /// are NULL.
    #[must_use]
    pub fn coalesce(mut self, cols: &[&str]) -> Self {
        self.on_conflict = OnConflict::Coalesce(cols.iter().map(|s| (*s).to_string()).collect());
        self
    }

    /// Column set to `datetime('now')` when an existing row is updated.
    #[must_use]
    pub fn touch(mut self, column: &str) -> Self {
        self.touch = Some(column.to_string());
        self
    }

    /// Renders the SQL text.
    #[must_use]
    pub fn build(&self) -> String {
        let placeholders = vec!["?"; self.columns.len()].join(", ");
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            self.table,
            self.columns.join(", ")
        );

        if self.conflict_columns.is_empty() {
            sql.push_str(" ON CONFLICT");
        } else {
            sql.push_str(&format!(" ON CONFLICT ({})", self.conflict_columns.join(", ")));
        }

        let mut sets: Vec<String> = match &self.on_conflict {
            OnConflict::DoNothing => Vec::new(),
            OnConflict::Coalesce(cols) => cols
                .iter()
                .map(|c| format!("{c} = COALESCE(excluded.{c}, {c})"))
                .collect(),
        };
        if !sets.is_empty() {
            if let Some(touch) = &self.touch {
                sets.push(format!("{touch} = datetime('now')"));
            }
        }

        if sets.is_empty() {
            sql.push_str(" DO NOTHING");
        } else {
            sql.push_str(" DO UPDATE SET ");
            sql.push_str(&sets.join(", "));
        }
        sql
    }
}
