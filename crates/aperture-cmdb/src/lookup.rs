//! Workload hierarchy lookup.
//!
//! Finds a workload by hostname or IP address and walks its component links
//! up through application, app grouping, asset and portfolio.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use aperture_orm::{materialize, GenericRow, OrmError, Result};

const HIERARCHY_SQL: &str = "\
SELECT c.component_id, c.name AS component_name, c.description AS component_description,
       ct.label AS component_type, ct.color AS component_color,
       a.application_id, a.name AS application_name,
       ag.app_grouping_id, ag.name AS app_grouping_name,
       ast.asset_id, ast.name AS asset_name, ast.criticality, ast.environment AS asset_environment,
       p.portfolio_id, p.name AS portfolio_name
FROM component_workloads cw
JOIN components c ON c.component_id = cw.component_id
LEFT JOIN component_types ct ON ct.component_type_id = c.component_type_id
JOIN applications a ON a.application_id = c.application_id
JOIN app_groupings ag ON ag.app_grouping_id = a.app_grouping_id
JOIN assets ast ON ast.asset_id = ag.asset_id
JOIN portfolios p ON p.portfolio_id = ast.portfolio_id
WHERE cw.workload_id = ?
ORDER BY p.name, ast.name, a.name, c.name";

/// How a workload is identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadKey<'a> {
    Hostname(&'a str),
    Ip(&'a str),
}

impl<'a> WorkloadKey<'a> {
    /// Picks the key from optional query parameters. A hostname wins over an
    /// IP address; empty values count as absent.
    pub fn from_params(hostname: Option<&'a str>, ip: Option<&'a str>) -> Result<Self> {
        match (hostname.filter(|h| !h.is_empty()), ip.filter(|i| !i.is_empty())) {
            (Some(hostname), _) => Ok(Self::Hostname(hostname)),
            (None, Some(ip)) => Ok(Self::Ip(ip)),
            (None, None) => Err(OrmError::validation("hostname or ip required")),
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Hostname(_) => "hostname",
            Self::Ip(_) => "ip_address",
        }
    }

    fn value(self) -> &'a str {
        match self {
            Self::Hostname(v) | Self::Ip(v) => v,
        }
    }
}

/// A workload and every component chain it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkloadLookup {
    /// The workload row.
    pub workload: GenericRow,
    /// One row per linked component, ordered by portfolio, asset,
    /// application and component name.
    pub hierarchy: Vec<GenericRow>,
}

/// Looks up a workload and its hierarchy. `None` when no workload matches.
///
/// When several workloads share an IP address the first one SQLite returns
/// is used.
pub async fn lookup_workload(pool: &SqlitePool, key: WorkloadKey<'_>) -> Result<Option<WorkloadLookup>> {
    let sql = format!("SELECT * FROM workloads WHERE {} = ?", key.column());
    let row = sqlx::query(&sql)
        .bind(key.value())
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        debug!(key = ?key, "No workload matched");
        return Ok(None);
    };
    let workload = GenericRow::try_from(&row)?;

    let workload_id = workload
        .get_str("workload_id")
        .ok_or(OrmError::NotFound)?
        .to_string();
    let rows = sqlx::query(HIERARCHY_SQL)
        .bind(workload_id.as_str())
        .fetch_all(pool)
        .await?;
    let hierarchy = materialize(&rows)?;

    debug!(workload_id = %workload_id, links = hierarchy.len(), "Workload resolved");
    Ok(Some(WorkloadLookup {
        workload,
        hierarchy,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_params() {
        assert_eq!(
            WorkloadKey::from_params(Some("web"), Some("10.0.0.1")).unwrap(),
            WorkloadKey::Hostname("web")
        );
        assert_eq!(
            WorkloadKey::from_params(Some(""), Some("10.0.0.1")).unwrap(),
            WorkloadKey::Ip("10.0.0.1")
        );
        assert!(matches!(
            WorkloadKey::from_params(None, Some("")),
            Err(OrmError::Validation(_))
        ));
    }
}
