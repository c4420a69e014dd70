//! resperm - Resource-scoped permission management.
//!
//! resperm lets administrators grant graduated permission levels (View, Edit,
//! Admin) to users, teams and built-in roles on individual resource
//! instances, and resolves each grant to the fine-grained actions it allows:
//!
//! - **Action**: per-kind level to action set maps, built by cascading
//! - **Validator**: checks a resource instance exists before permissions attach
//! - **Policy**: which principal categories a kind accepts
//! - **Store**: persistence interfaces, with a libsql implementation in `db`
//! - **Service**: set/list/revoke for one resource kind, plus role provisioning
//! - **Registry**: services keyed by kind name
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use resperm::{ConfigLoader, Principal, SqlStore};
//!
//! #[tokio::main]
//! async fn main() -> resperm::Result<()> {
//!     let config = ConfigLoader::new("MYAPP").load(None, None)?;
//!     let store = Arc::new(SqlStore::open(&config.database.url).await?);
//!
//!     let services = config.build_services(store.clone(), store.clone(), store)?;
//!     services.provision_all().await?;
//!
//!     let dashboards = services.dashboards().expect("stock kinds");
//!     dashboards.set_user_permission(1, "42", 7, Some("Edit")).await?;
//!     for grant in dashboards.list_permissions(1, "42").await? {
//!         println!("{} -> {}", grant.assignment.principal_id, grant.actions);
//!     }
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

pub mod action;
pub mod builtin;
pub mod config;
pub mod db;
pub mod error;
pub mod kind;
pub mod permission;
pub mod policy;
pub mod principal;
pub mod registry;
pub mod service;
pub mod store;
pub mod validator;

/// Boxed future returned by the collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// Re-export main types at crate root
pub use action::{ActionSet, ActionSets, Vocabulary};
pub use config::{Config, ConfigLoader};
pub use db::SqlStore;
pub use error::{Error, Result};
pub use kind::ResourceKindDefinition;
pub use permission::{Level, level};
pub use policy::AssignmentPolicy;
pub use principal::{BasicRole, Principal, PrincipalKind};
pub use registry::Services;
pub use service::{PermissionCommand, ResolvedAssignment, Service};
pub use store::{Assignment, PermissionStore, RoleStore};
pub use validator::ResourceValidator;
