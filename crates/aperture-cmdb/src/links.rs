//! Component to workload links.

use sqlx::sqlite::SqlitePool;
use tracing::info;

use aperture_orm::{materialize, OrmError, Page, Result, UpsertStatement};

/// Workloads linked to a component, ordered by hostname.
pub async fn list_component_workloads(pool: &SqlitePool, component_id: &str) -> Result<Page> {
    require("component_id", component_id)?;
    let rows = sqlx::query(
        "SELECT w.* FROM workloads w \
         JOIN component_workloads cw ON cw.workload_id = w.workload_id \
         WHERE cw.component_id = ? \
         ORDER BY w.hostname",
    )
    .bind(component_id)
    .fetch_all(pool)
    .await?;
    Ok(Page::new(materialize(&rows)?))
}

/// Links a workload to a component. Linking twice is a no-op; returns
/// whether a new link was made.
pub async fn link_workload(pool: &SqlitePool, component_id: &str, workload_id: &str) -> Result<bool> {
    require("component_id", component_id)?;
    require("workload_id", workload_id)?;

    let sql = UpsertStatement::new("component_workloads")
        .columns(&["component_id", "workload_id"])
        .do_nothing()
        .build();
    let result = sqlx::query(&sql)
        .bind(component_id)
        .bind(workload_id)
        .execute(pool)
        .await?;

    let linked = result.rows_affected() > 0;
    if linked {
        info!(component_id = %component_id, workload_id = %workload_id, "Workload linked");
    }
    Ok(linked)
}

/// Removes a link; `NotFound` when it did not exist.
pub async fn unlink_workload(pool: &SqlitePool, component_id: &str, workload_id: &str) -> Result<()> {
    require("component_id", component_id)?;
    require("workload_id", workload_id)?;

    let result =
        sqlx::query("DELETE FROM component_workloads WHERE component_id = ? AND workload_id = ?")
            .bind(component_id)
            .bind(workload_id)
            .execute(pool)
            .await?;
    if result.rows_affected() == 0 {
        return Err(OrmError::NotFound);
    }

    info!(component_id = %component_id, workload_id = %workload_id, "Workload unlinked");
    Ok(())
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(OrmError::validation(format!("{name} required")));
    }
    Ok(())
}
