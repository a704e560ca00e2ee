//! # aperture-cmdb
//!
//! The Aperture inventory: portfolios, assets, app groupings, applications,
//! components and the workloads (hosts) they run on.
//!
//! Plain CRUD for every table goes through [`Entity::repository`]. The
//! operations that do not fit the generic repository live here:
//! - [`lookup_workload`] resolves a host to its full ownership chain
//! - [`link_workload`], [`unlink_workload`] and [`list_component_workloads`]
//!   manage the component to workload junction table
//! - [`health`] and [`schema_tables`] report on the database itself
//!
//! ```ignore
//! use aperture_cmdb::{lookup_workload, Entity, WorkloadKey};
//! use aperture_orm::ListParams;
//!
//! let page = Entity::Workloads
//!     .repository()
//!     .list_params(db.pool(), &ListParams::new().with("ip", "10.0.0.7"))
//!     .await?;
//!
//! if let Some(found) = lookup_workload(db.pool(), WorkloadKey::Hostname("web-01")).await? {
//!     for chain in &found.hierarchy {
//!         println!("{:?} > {:?}", chain.get_str("portfolio_name"), chain.get_str("component_name"));
//!     }
//! }
//! ```

pub mod entities;
mod health;
mod links;
mod lookup;

pub use entities::{Entity, WORKLOAD_KEY};
pub use health::{health, schema_tables, Health, TableInfo};
pub use links::{link_workload, list_component_workloads, unlink_workload};
pub use lookup::{lookup_workload, WorkloadKey, WorkloadLookup};
