use aperture_cmdb::{
    health, link_workload, list_component_workloads, lookup_workload, schema_tables,
    unlink_workload, Entity, WorkloadKey, WORKLOAD_KEY,
};
use aperture_migrate::{EmbeddedSource, MigrationRunner};
use aperture_orm::{BulkReport, Database, Input, ListParams, OrmError, Value};
use serde_json::json;

async fn setup() -> Database {
    let db = Database::in_memory().await.unwrap();
    MigrationRunner::for_database(&db, EmbeddedSource::bundled())
        .run()
        .await
        .unwrap();
    db
}

fn input(value: serde_json::Value) -> Input {
    value.as_object().cloned().expect("object literal")
}

async fn create(db: &Database, entity: Entity, value: serde_json::Value) -> String {
    let row = entity
        .repository()
        .create(db.pool(), &input(value))
        .await
        .unwrap();
    row.get_str(entity.schema().primary_key).unwrap().to_string()
}

struct Chain {
    portfolio: String,
    asset: String,
    component: String,
}

async fn seed_chain(db: &Database, portfolio: &str, component: &str) -> Chain {
    let portfolio_id = create(db, Entity::Portfolios, json!({ "name": portfolio })).await;
    let asset_id = create(
        db,
        Entity::Assets,
        json!({ "name": "Checkout", "portfolio_id": portfolio_id, "criticality": "high", "environment": "prod" }),
    )
    .await;
    let grouping_id = create(
        db,
        Entity::AppGroupings,
        json!({ "name": "Payments", "asset_id": asset_id }),
    )
    .await;
    let application_id = create(
        db,
        Entity::Applications,
        json!({ "name": "payment-api", "app_grouping_id": grouping_id }),
    )
    .await;
    let component_id = create(
        db,
        Entity::Components,
        json!({
            "name": component,
            "application_id": application_id,
            "component_class_id": "data",
            "component_type_id": "database"
        }),
    )
    .await;
    Chain {
        portfolio: portfolio_id,
        asset: asset_id,
        component: component_id,
    }
}

#[tokio::test]
async fn create_then_get_every_writable_entity() {
    let db = setup().await;
    let chain = seed_chain(&db, "Retail", "orders-db").await;
    let workload = create(&db, Entity::Workloads, json!({ "hostname": "db-01", "is_virtual": 1 })).await;

    let ids = [
        (Entity::Portfolios, chain.portfolio.clone()),
        (Entity::Assets, chain.asset.clone()),
        (Entity::Components, chain.component.clone()),
        (Entity::Workloads, workload),
    ];
    for (entity, id) in ids {
        let row = entity.repository().get(db.pool(), &id).await.unwrap();
        assert_eq!(row.get_str(entity.schema().primary_key), Some(id.as_str()));
        assert!(row.get_str("created_at").is_some(), "{entity} has no created_at");
    }

    let asset = Entity::Assets.repository().get(db.pool(), &chain.asset).await.unwrap();
    assert_eq!(asset.get_str("criticality"), Some("high"));
    assert_eq!(asset.get("full_name"), Some(&Value::Null));
}

#[tokio::test]
async fn empty_list_serializes_as_empty_array() {
    let db = setup().await;
    for entity in Entity::ALL.into_iter().filter(|e| e.is_writable()) {
        let page = entity
            .repository()
            .list_params(db.pool(), &ListParams::new())
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            json!({ "data": [], "count": 0 }),
            "{entity}"
        );
    }
}

#[tokio::test]
async fn list_pagination_and_defaults() {
    let db = setup().await;
    for name in ["e", "d", "c", "b", "a"] {
        create(&db, Entity::Portfolios, json!({ "name": name })).await;
    }
    let repo = Entity::Portfolios.repository();

    let params = ListParams::from_pairs([("limit", "2"), ("offset", "2")]);
    let page = repo.list_params(db.pool(), &params).await.unwrap();
    let names: Vec<&str> = page.data.iter().filter_map(|r| r.get_str("name")).collect();
    assert_eq!(names, vec!["c", "d"]);
    assert_eq!(page.count, 2);

    for limit in ["0", "-3", "5000", "abc"] {
        let page = repo
            .list_params(db.pool(), &ListParams::new().with("limit", limit))
            .await
            .unwrap();
        assert_eq!(page.count, 5, "limit={limit}");
    }

    let page = repo
        .list_params(db.pool(), &ListParams::new().with("offset", "-1"))
        .await
        .unwrap();
    assert_eq!(page.data[0].get_str("name"), Some("a"));
}

#[tokio::test]
async fn missing_keys_are_not_found() {
    let db = setup().await;
    for entity in [Entity::Portfolios, Entity::Workloads, Entity::Components] {
        let repo = entity.repository();
        assert!(matches!(repo.get(db.pool(), "nope").await, Err(OrmError::NotFound)));
        assert!(matches!(repo.delete(db.pool(), "nope").await, Err(OrmError::NotFound)));
        assert!(matches!(
            repo.update(db.pool(), "nope", &input(json!({ "description": "x" }))).await,
            Err(OrmError::NotFound)
        ));
    }
}

#[tokio::test]
async fn sparse_patch_keeps_unsent_and_null_fields() {
    let db = setup().await;
    let repo = Entity::Workloads.repository();
    let id = create(
        &db,
        Entity::Workloads,
        json!({ "hostname": "web-01", "os": "linux", "ip_address": "10.0.0.1" }),
    )
    .await;

    let row = repo
        .update(db.pool(), &id, &input(json!({ "os": "windows", "ip_address": null })))
        .await
        .unwrap();
    assert_eq!(row.get_str("os"), Some("windows"));
    assert_eq!(row.get_str("hostname"), Some("web-01"));
    assert_eq!(row.get_str("ip_address"), Some("10.0.0.1"));
}

#[tokio::test]
async fn bulk_upsert_workloads_counts_duplicates() {
    let db = setup().await;
    let repo = Entity::Workloads.repository();
    create(&db, Entity::Workloads, json!({ "hostname": "old-01", "os": "linux", "location": "dc1" })).await;

    let records = vec![
        input(json!({ "hostname": "old-01", "os": "rhel" })),
        input(json!({ "hostname": "new-01", "ip_address": "10.1.0.1" })),
        input(json!({ "hostname": "new-01", "fqdn": "new-01.example.com" })),
        input(json!({ "hostname": "", "os": "linux" })),
        input(json!({ "ip_address": "10.9.9.9" })),
    ];
    let report = repo.bulk_upsert(db.pool(), WORKLOAD_KEY, &records).await.unwrap();
    assert_eq!(
        report,
        BulkReport {
            created: 1,
            updated: 2,
            errors: 2,
            total: 5
        }
    );
    assert_eq!(report.created + report.updated + report.errors, report.total);

    let old = repo
        .list_params(db.pool(), &ListParams::new().with("hostname", "old-01"))
        .await
        .unwrap();
    assert_eq!(old.data[0].get_str("os"), Some("rhel"));
    assert_eq!(old.data[0].get_str("location"), Some("dc1"));

    let new = repo
        .list_params(db.pool(), &ListParams::new().with("ip", "10.1.0.1"))
        .await
        .unwrap();
    assert_eq!(new.count, 1);
    assert_eq!(new.data[0].get_str("fqdn"), Some("new-01.example.com"));
}

#[tokio::test]
async fn catalog_is_seeded_and_read_only() {
    let db = setup().await;
    let types = Entity::ComponentTypes.repository();

    let page = types
        .list_params(db.pool(), &ListParams::new().with("class_id", "data"))
        .await
        .unwrap();
    assert!(page.count > 0);
    assert!(page
        .data
        .iter()
        .all(|r| r.get_str("component_class_id") == Some("data")));

    let classes = Entity::ComponentClasses
        .repository()
        .list_params(db.pool(), &ListParams::new().with("q", "net"))
        .await
        .unwrap();
    assert_eq!(classes.count, 1);
    assert_eq!(classes.data[0].get_str("label"), Some("Network"));

    let err = types
        .create(db.pool(), &input(json!({ "component_class_id": "data", "label": "x" })))
        .await;
    assert!(matches!(err, Err(OrmError::Validation(_))));
}

#[tokio::test]
async fn component_filters_use_aliases() {
    let db = setup().await;
    let chain = seed_chain(&db, "Retail", "orders-db").await;
    let repo = Entity::Components.repository();

    let page = repo
        .list_params(db.pool(), &ListParams::new().with("type_id", "database"))
        .await
        .unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.data[0].get_str("component_id"), Some(chain.component.as_str()));

    let page = repo
        .list_params(db.pool(), &ListParams::new().with("type_id", "cache"))
        .await
        .unwrap();
    assert_eq!(page.count, 0);
}

#[tokio::test]
async fn foreign_keys_are_enforced() {
    let db = setup().await;
    let err = Entity::Assets
        .repository()
        .create(db.pool(), &input(json!({ "name": "orphan", "portfolio_id": "missing" })))
        .await;
    assert!(matches!(err, Err(OrmError::Database(_))));

    let chain = seed_chain(&db, "Retail", "orders-db").await;
    Entity::Portfolios
        .repository()
        .delete(db.pool(), &chain.portfolio)
        .await
        .unwrap();
    assert!(matches!(
        Entity::Assets.repository().get(db.pool(), &chain.asset).await,
        Err(OrmError::NotFound)
    ));
}

#[tokio::test]
async fn link_and_unlink_workloads() {
    let db = setup().await;
    let chain = seed_chain(&db, "Retail", "orders-db").await;
    let b = create(&db, Entity::Workloads, json!({ "hostname": "b-host" })).await;
    let a = create(&db, Entity::Workloads, json!({ "hostname": "a-host" })).await;

    assert!(link_workload(db.pool(), &chain.component, &b).await.unwrap());
    assert!(link_workload(db.pool(), &chain.component, &a).await.unwrap());
    assert!(!link_workload(db.pool(), &chain.component, &a).await.unwrap());

    let page = list_component_workloads(db.pool(), &chain.component).await.unwrap();
    let hosts: Vec<&str> = page.data.iter().filter_map(|r| r.get_str("hostname")).collect();
    assert_eq!(hosts, vec!["a-host", "b-host"]);

    unlink_workload(db.pool(), &chain.component, &a).await.unwrap();
    assert!(matches!(
        unlink_workload(db.pool(), &chain.component, &a).await,
        Err(OrmError::NotFound)
    ));
    assert_eq!(
        list_component_workloads(db.pool(), &chain.component).await.unwrap().count,
        1
    );
}

#[tokio::test]
async fn lookup_resolves_hierarchy() {
    let db = setup().await;
    let zeta = seed_chain(&db, "Zeta", "z-cache").await;
    let alpha = seed_chain(&db, "Alpha", "a-db").await;
    let host = create(
        &db,
        Entity::Workloads,
        json!({ "hostname": "shared-01", "ip_address": "10.2.0.5" }),
    )
    .await;
    link_workload(db.pool(), &zeta.component, &host).await.unwrap();
    link_workload(db.pool(), &alpha.component, &host).await.unwrap();

    let found = lookup_workload(db.pool(), WorkloadKey::Ip("10.2.0.5"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.workload.get_str("hostname"), Some("shared-01"));

    let portfolios: Vec<&str> = found
        .hierarchy
        .iter()
        .filter_map(|r| r.get_str("portfolio_name"))
        .collect();
    assert_eq!(portfolios, vec!["Alpha", "Zeta"]);
    let first = &found.hierarchy[0];
    assert_eq!(first.get_str("component_type"), Some("Database"));
    assert_eq!(first.get_str("asset_environment"), Some("prod"));

    let json = serde_json::to_value(&found).unwrap();
    assert_eq!(json["hierarchy"].as_array().unwrap().len(), 2);

    assert!(lookup_workload(db.pool(), WorkloadKey::Hostname("ghost"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn lookup_unlinked_workload_has_empty_hierarchy() {
    let db = setup().await;
    create(&db, Entity::Workloads, json!({ "hostname": "lonely" })).await;

    let found = lookup_workload(db.pool(), WorkloadKey::Hostname("lonely"))
        .await
        .unwrap()
        .unwrap();
    assert!(found.hierarchy.is_empty());
    assert_eq!(serde_json::to_value(&found).unwrap()["hierarchy"], json!([]));
}

#[tokio::test]
async fn health_and_schema() {
    let db = setup().await;
    let status = health(&db).await.unwrap();
    assert_eq!(status.status, "ok");
    assert_eq!(status.db_path, None);

    let tables = schema_tables(db.pool()).await.unwrap();
    let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "app_groupings",
            "applications",
            "assets",
            "component_classes",
            "component_types",
            "component_workloads",
            "components",
            "migrations",
            "portfolios",
            "workloads",
        ]
    );
    assert!(tables[0].sql.starts_with("CREATE TABLE app_groupings"));
}
