//! Descriptors for every inventory table.

use std::fmt;
use std::str::FromStr;

use aperture_orm::{FieldSchema, FilterParam, OrmError, Repository, TableSchema};

/// Top of the hierarchy.
pub static PORTFOLIOS: TableSchema = TableSchema {
    name: "portfolios",
    primary_key: "portfolio_id",
    fields: &[
        FieldSchema::required("name"),
        FieldSchema::text("snow_sys_id"),
        FieldSchema::text("state"),
        FieldSchema::text("description"),
    ],
    order_by: "name",
    search_column: Some("name"),
    filters: &[FilterParam::column("name")],
    touch_column: Some("updated_at"),
    read_only: false,
};

/// Business assets, owned by a portfolio.
pub static ASSETS: TableSchema = TableSchema {
    name: "assets",
    primary_key: "asset_id",
    fields: &[
        FieldSchema::required("name"),
        FieldSchema::required("portfolio_id"),
        FieldSchema::text("snow_sys_id"),
        FieldSchema::text("full_name"),
        FieldSchema::text("description"),
        FieldSchema::text("criticality"),
        FieldSchema::text("environment"),
        FieldSchema::text("category"),
        FieldSchema::text("infrastructure"),
    ],
    order_by: "name",
    search_column: Some("name"),
    filters: &[FilterParam::column("portfolio_id"), FilterParam::column("name")],
    touch_column: Some("updated_at"),
    read_only: false,
};

pub static APP_GROUPINGS: TableSchema = TableSchema {
    name: "app_groupings",
    primary_key: "app_grouping_id",
    fields: &[
        FieldSchema::required("name"),
        FieldSchema::required("asset_id"),
        FieldSchema::text("description"),
    ],
    order_by: "name",
    search_column: Some("name"),
    filters: &[FilterParam::column("asset_id"), FilterParam::column("name")],
    touch_column: Some("updated_at"),
    read_only: false,
};

pub static APPLICATIONS: TableSchema = TableSchema {
    name: "applications",
    primary_key: "application_id",
    fields: &[
        FieldSchema::required("name"),
        FieldSchema::required("app_grouping_id"),
        FieldSchema::text("description"),
    ],
    order_by: "name",
    search_column: Some("name"),
    filters: &[
        FilterParam::column("app_grouping_id"),
        FilterParam::column("name"),
    ],
    touch_column: Some("updated_at"),
    read_only: false,
};

/// Deployable parts of an application. Listed in creation order.
pub static COMPONENTS: TableSchema = TableSchema {
    name: "components",
    primary_key: "component_id",
    fields: &[
        FieldSchema::required("application_id"),
        FieldSchema::text("component_class_id"),
        FieldSchema::text("component_type_id"),
        FieldSchema::text("name"),
        FieldSchema::text("snow_sys_id"),
        FieldSchema::text("description"),
    ],
    order_by: "created_at",
    search_column: Some("name"),
    filters: &[
        FilterParam::column("application_id"),
        FilterParam::aliased("type_id", "component_type_id"),
        FilterParam::aliased("class_id", "component_class_id"),
        FilterParam::column("name"),
    ],
    touch_column: Some("updated_at"),
    read_only: false,
};

/// Seeded catalog.
pub static COMPONENT_CLASSES: TableSchema = TableSchema {
    name: "component_classes",
    primary_key: "component_class_id",
    fields: &[
        FieldSchema::required("label"),
        FieldSchema::text("description"),
    ],
    order_by: "label",
    search_column: Some("label"),
    filters: &[],
    touch_column: None,
    read_only: true,
};

/// Seeded catalog.
pub static COMPONENT_TYPES: TableSchema = TableSchema {
    name: "component_types",
    primary_key: "component_type_id",
    fields: &[
        FieldSchema::required("component_class_id"),
        FieldSchema::required("label"),
        FieldSchema::text("color"),
    ],
    order_by: "label",
    search_column: Some("label"),
    filters: &[FilterParam::aliased("class_id", "component_class_id")],
    touch_column: None,
    read_only: true,
};

/// Hosts, keyed for bulk import by their unique hostname.
pub static WORKLOADS: TableSchema = TableSchema {
    name: "workloads",
    primary_key: "workload_id",
    fields: &[
        FieldSchema::required("hostname"),
        FieldSchema::text("snow_sys_id"),
        FieldSchema::text("ip_address"),
        FieldSchema::text("fqdn"),
        FieldSchema::text("os"),
        FieldSchema::text("environment"),
        FieldSchema::text("location"),
        FieldSchema::text("class_type"),
        FieldSchema::integer("is_virtual"),
        FieldSchema::text("description"),
    ],
    order_by: "hostname",
    search_column: Some("hostname"),
    filters: &[
        FilterParam::column("hostname"),
        FilterParam::aliased("ip", "ip_address"),
    ],
    touch_column: Some("updated_at"),
    read_only: false,
};

/// Conflict key of workload bulk imports.
pub const WORKLOAD_KEY: &str = "hostname";

/// An inventory entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Portfolios,
    Assets,
    AppGroupings,
    Applications,
    Components,
    ComponentClasses,
    ComponentTypes,
    Workloads,
}

impl Entity {
    /// Every entity, parents before children.
    pub const ALL: [Self; 8] = [
        Self::Portfolios,
        Self::Assets,
        Self::AppGroupings,
        Self::Applications,
        Self::ComponentClasses,
        Self::ComponentTypes,
        Self::Components,
        Self::Workloads,
    ];

    /// Returns the table descriptor.
    #[must_use]
    pub fn schema(self) -> &'static TableSchema {
        match self {
            Self::Portfolios => &PORTFOLIOS,
            Self::Assets => &ASSETS,
            Self::AppGroupings => &APP_GROUPINGS,
            Self::Applications => &APPLICATIONS,
            Self::Components => &COMPONENTS,
            Self::ComponentClasses => &COMPONENT_CLASSES,
            Self::ComponentTypes => &COMPONENT_TYPES,
            Self::Workloads => &WORKLOADS,
        }
    }

    /// Returns a repository for this entity.
    #[must_use]
    pub fn repository(self) -> Repository {
        Repository::new(self.schema())
    }

    /// Path segment naming this entity, e.g. `app-groupings`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Portfolios => "portfolios",
            Self::Assets => "assets",
            Self::AppGroupings => "app-groupings",
            Self::Applications => "applications",
            Self::Components => "components",
            Self::ComponentClasses => "component-classes",
            Self::ComponentTypes => "component-types",
            Self::Workloads => "workloads",
        }
    }

    /// Whether callers may write this entity.
    #[must_use]
    pub fn is_writable(self) -> bool {
        !self.schema().read_only
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Entity {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.slug() == s || e.schema().name == s)
            .ok_or_else(|| OrmError::validation(format!("unknown entity '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_round_trip() {
        for entity in Entity::ALL {
            assert_eq!(entity.slug().parse::<Entity>().unwrap(), entity);
            assert_eq!(entity.schema().name.parse::<Entity>().unwrap(), entity);
        }
        assert!("hosts".parse::<Entity>().is_err());
    }

    #[test]
    fn test_catalogs_are_read_only() {
        let writable: Vec<Entity> = Entity::ALL.into_iter().filter(|e| e.is_writable()).collect();
        assert_eq!(writable.len(), 6);
        assert!(!Entity::ComponentClasses.is_writable());
        assert!(!Entity::ComponentTypes.is_writable());
    }

    #[test]
    fn test_filters_reference_known_columns() {
        for entity in Entity::ALL {
            let schema = entity.schema();
            for filter in schema.filters {
                assert!(
                    schema.field(filter.column).is_some(),
                    "{}: filter on unknown column {}",
                    schema.name,
                    filter.column
                );
            }
        }
    }

    #[test]
    fn test_workload_key_is_a_field() {
        assert!(WORKLOADS.field(WORKLOAD_KEY).is_some());
    }
}
